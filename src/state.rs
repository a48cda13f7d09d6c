use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use log::{error, info, warn};

use crate::color::ColorMap;
use crate::config::{ExplorerConfig, SourceSpec};
use crate::data::derive::GdpMetric;
use crate::data::filter::NumericRange;
use crate::data::loader::{self, RemoteApiSource, SampleSource, TableSource};
use crate::data::model::{Column, RawTable};
use crate::data::pipeline::{self, PipelineInput, PipelineOutput, Selections};
use crate::data::{COUNTRY, GDP_PER_CAPITA};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which slot a loaded table goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    /// GDP by year, or a combined table that also has Average_IQ.
    Gdp,
    /// Average IQ by country, joined on Country.
    Iq,
}

/// Where a loaded table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOrigin {
    File,
    Api,
    /// The embedded sample. It already carries Average_IQ, so it cannot be
    /// joined with a separate IQ table.
    Sample,
}

impl TableOrigin {
    fn of(spec: &SourceSpec) -> Self {
        match spec {
            SourceSpec::File { .. } => TableOrigin::File,
            SourceSpec::Api { .. } => TableOrigin::Api,
            SourceSpec::Sample => TableOrigin::Sample,
        }
    }
}

/// A table plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub label: String,
    pub origin: TableOrigin,
    pub table: RawTable,
}

impl LoadedTable {
    fn from_api(url: String, table: RawTable) -> Self {
        LoadedTable {
            label: url,
            origin: TableOrigin::Api,
            table,
        }
    }

    pub fn is_sample(&self) -> bool {
        self.origin == TableOrigin::Sample
    }
}

/// The full UI state, independent of rendering.
///
/// Widgets only mutate `selections` or the loaded tables; every change is
/// followed by a fresh pipeline run, so `output` always reflects them.
pub struct AppState {
    pub config: ExplorerConfig,

    pub gdp: Option<LoadedTable>,
    pub iq: Option<LoadedTable>,

    /// Year / average choice and filter selections.
    pub selections: Selections,

    /// Result of the last pipeline run (None until it succeeds).
    pub output: Option<PipelineOutput>,

    /// Region colours for the plot and legend.
    pub color_map: ColorMap,

    /// URL typed into the top bar.
    pub api_url: String,

    /// Error message shown in the UI.
    pub status_message: Option<String>,

    /// Informational message shown in the UI.
    pub info_message: Option<String>,

    /// Successful API responses by URL, reused for the rest of the session.
    remote_cache: HashMap<String, RawTable>,
}

impl AppState {
    pub fn new(config: ExplorerConfig) -> Self {
        let api_url = config.api_url.clone().unwrap_or_default();
        let mut state = Self {
            config,
            gdp: None,
            iq: None,
            selections: Selections::default(),
            output: None,
            color_map: ColorMap::default(),
            api_url,
            status_message: None,
            info_message: None,
            remote_cache: HashMap::new(),
        };
        state.recompute();
        state
    }

    /// Load whatever the config names. The sample is only a fallback for
    /// an empty dashboard; with an IQ table configured it would collide on
    /// Average_IQ, so it is skipped.
    pub fn load_configured_sources(&mut self) {
        let gdp = self.config.gdp.clone();
        let iq = self.config.iq.clone();

        match gdp {
            Some(SourceSpec::Api { url }) => self.fetch_gdp(&url),
            Some(spec) => self.load_spec(TableRole::Gdp, &spec),
            None if self.config.sample_fallback && iq.is_none() => self.load_sample(),
            None => {}
        }
        if let Some(spec) = iq {
            self.load_spec(TableRole::Iq, &spec);
        }
    }

    fn load_spec(&mut self, role: TableRole, spec: &SourceSpec) {
        match self.config.source(spec) {
            Ok(source) => self.load_source(role, source.as_ref(), TableOrigin::of(spec)),
            Err(e) => self.report(e),
        }
    }

    /// Load a local file into `role`, choosing the adapter by extension.
    pub fn load_path(&mut self, role: TableRole, path: &Path) {
        match loader::source_for_path(path, self.config.delimiter_byte()) {
            Ok(source) => self.load_source(role, source.as_ref(), TableOrigin::File),
            Err(e) => self.report(e),
        }
    }

    pub fn load_source(&mut self, role: TableRole, source: &dyn TableSource, origin: TableOrigin) {
        match loader::load_one(source) {
            Ok(table) => {
                let label = source.describe();
                self.info_message = Some(format!("Data successfully loaded from {label}"));
                self.set_table(
                    role,
                    LoadedTable {
                        label,
                        origin,
                        table,
                    },
                );
            }
            Err(e) => self.report(e),
        }
    }

    pub fn load_sample(&mut self) {
        self.iq = None;
        self.load_source(TableRole::Gdp, &SampleSource, TableOrigin::Sample);
    }

    /// One request per URL per session; a failure leaves an empty GDP table
    /// in place so the rest of the dashboard keeps working.
    pub fn fetch_gdp(&mut self, url: &str) {
        let url = url.trim().to_string();
        if url.is_empty() {
            self.status_message = Some("Enter an API URL first.".to_string());
            return;
        }
        self.api_url = url.clone();

        if let Some(table) = self.remote_cache.get(&url).cloned() {
            info!("Using cached response for {url}");
            self.set_table(TableRole::Gdp, LoadedTable::from_api(url, table));
            return;
        }

        let source = RemoteApiSource {
            url: url.clone(),
            timeout: self.config.api_timeout(),
        };
        match loader::load_one(&source) {
            Ok(table) => {
                self.remote_cache.insert(url.clone(), table.clone());
                self.info_message =
                    Some(format!("Fetched {} countries from {url}", table.num_rows()));
                self.set_table(TableRole::Gdp, LoadedTable::from_api(url, table));
            }
            Err(e) => {
                warn!("GDP fetch failed, continuing with an empty table: {e}");
                self.set_table(TableRole::Gdp, LoadedTable::from_api(url, empty_gdp_table()));
                self.report(e);
            }
        }
    }

    pub fn clear(&mut self) {
        self.gdp = None;
        self.iq = None;
        self.selections = Selections::default();
        self.status_message = None;
        self.info_message = None;
        self.recompute();
    }

    /// Install a new table. Previous selections refer to the old data, so
    /// they are reset. An IQ table replaces the sample in the GDP slot, since
    /// the sample already has its own Average_IQ column.
    pub fn set_table(&mut self, role: TableRole, loaded: LoadedTable) {
        match role {
            TableRole::Gdp => self.gdp = Some(loaded),
            TableRole::Iq => {
                if self.gdp.as_ref().is_some_and(LoadedTable::is_sample) {
                    info!("Dropping the sample data in favour of {}", loaded.label);
                    self.gdp = None;
                }
                self.iq = Some(loaded);
            }
        }
        self.selections = Selections::default();
        self.status_message = None;
        self.recompute();
    }

    /// Run the pipeline over the current tables and selections.
    pub fn recompute(&mut self) {
        let Some(gdp) = &self.gdp else {
            self.output = None;
            self.color_map = ColorMap::default();
            if self.iq.is_some() {
                self.info_message = Some("Load a GDP table to join with the IQ data.".to_string());
            }
            return;
        };
        let input = PipelineInput {
            primary: gdp.table.clone(),
            secondary: self.iq.as_ref().map(|t| t.table.clone()),
        };

        match pipeline::run(&input, &self.selections) {
            Ok(output) => {
                self.color_map = ColorMap::new(&output.regions);
                self.output = Some(output);
            }
            Err(e) => {
                self.output = None;
                self.color_map = ColorMap::default();
                self.report(e);
            }
        }
    }

    fn report(&mut self, e: PipelineError) {
        error!("{e}");
        let message = match &e {
            PipelineError::Ingestion(_) => format!("Error loading data: {e}"),
            PipelineError::Schema(_) => format!(
                "{e}. Please make sure your data contains the columns: \
                 'Country', 'GDP_per_Capita' (or year columns), 'Average_IQ' \
                 and optionally 'Region'."
            ),
            PipelineError::RemoteFetch(_) => e.to_string(),
        };
        self.status_message = Some(message);
    }

    // -- Sidebar actions --

    pub fn set_metric(&mut self, metric: GdpMetric) {
        self.selections.metric = Some(metric);
        // GDP bounds depend on the metric.
        self.selections.filters.gdp_range = None;
        self.recompute();
    }

    pub fn set_gdp_range(&mut self, range: NumericRange) {
        self.selections.filters.gdp_range = Some(range);
        self.recompute();
    }

    pub fn set_iq_range(&mut self, range: NumericRange) {
        self.selections.filters.iq_range = Some(range);
        self.recompute();
    }

    /// Regions currently selected; no explicit selection means all of them.
    pub fn selected_regions(&self) -> BTreeSet<String> {
        match (&self.selections.filters.regions, &self.output) {
            (Some(selected), _) => selected.clone(),
            (None, Some(out)) => out.regions.clone(),
            (None, None) => BTreeSet::new(),
        }
    }

    pub fn toggle_region(&mut self, region: &str) {
        let mut selected = self.selected_regions();
        if !selected.remove(region) {
            selected.insert(region.to_string());
        }
        self.selections.filters.regions = Some(selected);
        self.recompute();
    }

    pub fn select_all_regions(&mut self) {
        self.selections.filters.regions = None;
        self.recompute();
    }

    pub fn select_no_regions(&mut self) {
        self.selections.filters.regions = Some(BTreeSet::new());
        self.recompute();
    }
}

fn empty_gdp_table() -> RawTable {
    RawTable::from_columns(vec![
        Column::new(COUNTRY, Vec::new()),
        Column::new(GDP_PER_CAPITA, Vec::new()),
    ])
    .unwrap_or_default()
}
