use std::collections::BTreeSet;

use log::debug;

use super::derive::{derive, GdpMetric};
use super::filter::{apply_filters, FilterState, SliderBounds};
use super::merge::merge;
use super::model::RawTable;
use super::stats::{correlation, CorrelationOutcome};
use super::{AVERAGE_IQ, COUNTRY, GDP_PER_CAPITA, REGION};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Request / response values
// ---------------------------------------------------------------------------

/// The loaded tables. `primary` carries GDP (year columns or an existing
/// `GDP_per_Capita`); `secondary`, when present, is joined on `Country`.
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    pub primary: RawTable,
    pub secondary: Option<RawTable>,
}

/// Everything the user picked in the sidebar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selections {
    /// `None` picks the first available year.
    pub metric: Option<GdpMetric>,
    pub filters: FilterState,
}

/// Result of one pipeline pass.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub year_columns: Vec<String>,
    /// Metric actually applied; `None` when the input already carried
    /// `GDP_per_Capita` and had no year columns.
    pub metric: Option<GdpMetric>,
    /// Derived and merged, before any filter.
    pub prepared: RawTable,
    pub gdp_bounds: Option<SliderBounds>,
    pub iq_bounds: Option<SliderBounds>,
    /// Distinct regions of `prepared`; empty when there is no `Region` column.
    pub regions: BTreeSet<String>,
    /// Filtered table: input to the scatter plot and the table view.
    pub working: RawTable,
    pub correlation: CorrelationOutcome,
}

impl PipelineOutput {
    pub fn has_regions(&self) -> bool {
        self.prepared.has_column(REGION)
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// derive → merge → validate → bounds → filter → correlate.
///
/// Pure: the same input and selections always give the same output.
pub fn run(input: &PipelineInput, selections: &Selections) -> Result<PipelineOutput> {
    let year_columns = input.primary.year_columns();

    // An input that already carries GDP_per_Capita and has no years to
    // derive from is used as is.
    let metric = if year_columns.is_empty() && input.primary.has_column(GDP_PER_CAPITA) {
        None
    } else {
        selections
            .metric
            .clone()
            .or_else(|| year_columns.first().map(|y| GdpMetric::SelectYear(y.clone())))
    };

    let derived = match &metric {
        Some(m) => derive(&input.primary, &year_columns, m)?,
        None => input.primary.clone(),
    };

    let prepared = match &input.secondary {
        Some(secondary) => merge(&derived, secondary, COUNTRY)?,
        None => derived,
    };

    let missing: Vec<String> = [COUNTRY, GDP_PER_CAPITA, AVERAGE_IQ]
        .into_iter()
        .filter(|c| !prepared.has_column(c))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Schema(missing));
    }

    let gdp_bounds = SliderBounds::from_column(&prepared, GDP_PER_CAPITA);
    let iq_bounds = SliderBounds::from_column(&prepared, AVERAGE_IQ);
    let regions = prepared.unique_strings(REGION);

    // Unset ranges default to the full slider extent.
    let filters = FilterState {
        gdp_range: selections
            .filters
            .gdp_range
            .or(gdp_bounds.map(|b| b.as_range())),
        iq_range: selections
            .filters
            .iq_range
            .or(iq_bounds.map(|b| b.as_range())),
        regions: selections.filters.regions.clone(),
    };
    let working = apply_filters(&prepared, &filters);
    let correlation = correlation(&working);

    debug!(
        "pipeline: {} prepared rows → {} working rows, r = {correlation}",
        prepared.num_rows(),
        working.num_rows()
    );

    Ok(PipelineOutput {
        year_columns,
        metric,
        prepared,
        gdp_bounds,
        iq_bounds,
        regions,
        working,
        correlation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::NumericRange;
    use crate::data::model::{f, s, table, CellValue};

    fn combined() -> RawTable {
        table(&[
            ("Country", vec![s("US"), s("CN"), s("JP")]),
            ("Region", vec![s("Americas"), s("Asia"), s("Asia")]),
            ("2020", vec![f(60000.0), f(10000.0), f(40000.0)]),
            ("Average_IQ", vec![f(98.0), f(105.0), f(105.0)]),
        ])
    }

    #[test]
    fn scenario_gdp_range_leaves_two_rows_with_negative_r() {
        let input = PipelineInput {
            primary: combined(),
            secondary: None,
        };
        let selections = Selections {
            metric: None,
            filters: FilterState {
                gdp_range: Some(NumericRange::new(15000.0, 70000.0)),
                ..Default::default()
            },
        };
        let out = run(&input, &selections).unwrap();
        assert_eq!(out.metric, Some(GdpMetric::SelectYear("2020".into())));
        assert_eq!(out.working.num_rows(), 2);
        assert!(!out.working.unique_strings("Country").contains("CN"));
        match out.correlation {
            CorrelationOutcome::Coefficient(r) => assert!(r < 0.0),
            other => panic!("expected coefficient, got {other:?}"),
        }
    }

    #[test]
    fn defaults_use_full_bounds_and_all_regions() {
        let input = PipelineInput {
            primary: combined(),
            secondary: None,
        };
        let out = run(&input, &Selections::default()).unwrap();
        assert_eq!(out.gdp_bounds, Some(SliderBounds { min: 10000, max: 60000 }));
        assert_eq!(out.iq_bounds, Some(SliderBounds { min: 98, max: 105 }));
        assert_eq!(out.regions.len(), 2);
        assert!(out.has_regions());
        assert_eq!(out.working.num_rows(), 3);
    }

    #[test]
    fn two_tables_are_inner_joined() {
        let gdp = table(&[
            ("Country", vec![s("Brazil"), s("Japan")]),
            ("2019", vec![f(100.0), f(300.0)]),
            ("2020", vec![f(200.0), f(500.0)]),
        ]);
        let iq = table(&[
            ("Country", vec![s("Japan")]),
            ("Average_IQ", vec![f(105.0)]),
        ]);
        let input = PipelineInput {
            primary: gdp,
            secondary: Some(iq),
        };
        let selections = Selections {
            metric: Some(GdpMetric::Average),
            ..Default::default()
        };
        let out = run(&input, &selections).unwrap();
        assert_eq!(out.prepared.num_rows(), 1);
        assert_eq!(out.prepared.cell("GDP_per_Capita", 0), Some(&f(400.0)));
        assert!(!out.has_regions());
        assert_eq!(out.correlation, CorrelationOutcome::InsufficientData);
    }

    #[test]
    fn api_shaped_gdp_skips_derivation() {
        let gdp = table(&[
            ("Country", vec![s("Japan"), s("Kenya")]),
            ("GDP_per_Capita", vec![f(40000.0), f(2000.0)]),
        ]);
        let iq = table(&[
            ("Country", vec![s("Kenya"), s("Japan")]),
            ("Average_IQ", vec![f(75.0), f(105.0)]),
        ]);
        let input = PipelineInput {
            primary: gdp,
            secondary: Some(iq),
        };
        let out = run(&input, &Selections::default()).unwrap();
        assert_eq!(out.metric, None);
        assert!(out.year_columns.is_empty());
        assert_eq!(out.working.num_rows(), 2);
        assert!(matches!(
            out.correlation,
            CorrelationOutcome::Coefficient(r) if (r - 1.0).abs() < 1e-12
        ));
    }

    #[test]
    fn missing_columns_are_all_reported() {
        let t = table(&[("Country", vec![s("US")]), ("2020", vec![f(1.0)])]);
        let input = PipelineInput {
            primary: t,
            secondary: None,
        };
        let err = run(&input, &Selections::default()).unwrap_err();
        assert_eq!(err, PipelineError::Schema(vec!["Average_IQ".into()]));

        let bare = PipelineInput {
            primary: table(&[("Name", vec![s("US")])]),
            secondary: None,
        };
        let err = run(&bare, &Selections::default()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::Schema(vec![
                "Country".into(),
                "GDP_per_Capita".into(),
                "Average_IQ".into()
            ])
        );
    }

    #[test]
    fn average_without_years_yields_empty_working_table() {
        let t = table(&[
            ("Country", vec![s("US"), s("JP")]),
            ("Average_IQ", vec![f(98.0), f(105.0)]),
        ]);
        let input = PipelineInput {
            primary: t,
            secondary: None,
        };
        let selections = Selections {
            metric: Some(GdpMetric::Average),
            ..Default::default()
        };
        let out = run(&input, &selections).unwrap();
        assert_eq!(out.gdp_bounds, None);
        assert_eq!(out.working.num_rows(), 0);
        assert_eq!(out.correlation, CorrelationOutcome::InsufficientData);
        assert!(out
            .prepared
            .column("GDP_per_Capita")
            .unwrap()
            .values
            .iter()
            .all(CellValue::is_null));
    }

    #[test]
    fn same_input_same_output() {
        let input = PipelineInput {
            primary: combined(),
            secondary: None,
        };
        let selections = Selections {
            metric: Some(GdpMetric::Average),
            filters: FilterState {
                regions: Some(["Asia".to_string()].into()),
                ..Default::default()
            },
        };
        let a = run(&input, &selections).unwrap();
        let b = run(&input, &selections).unwrap();
        assert_eq!(a.working, b.working);
        assert_eq!(a.correlation, b.correlation);
    }
}
