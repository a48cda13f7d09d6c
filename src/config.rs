use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::data::loader::{self, RemoteApiSource, SampleSource, TableSource};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "GDP per capita vs. average IQ explorer", long_about = None)]
pub struct Cli {
    /// JSON config file; command line flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// GDP table (or a combined table with Average_IQ)
    #[arg(long)]
    pub gdp: Option<PathBuf>,

    /// Average IQ table, joined on Country
    #[arg(long)]
    pub iq: Option<PathBuf>,

    /// Fetch GDP from this endpoint instead of a file
    #[arg(long, conflicts_with = "gdp")]
    pub gdp_api: Option<String>,

    /// Field delimiter for .csv/.txt files
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Timeout for the GDP API request
    #[arg(long)]
    pub api_timeout_secs: Option<u64>,

    /// Start empty instead of showing the built-in sample
    #[arg(long)]
    pub no_sample: bool,
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// Where a table comes from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSpec {
    File { path: PathBuf },
    Api { url: String },
    Sample,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub gdp: Option<SourceSpec>,
    pub iq: Option<SourceSpec>,
    /// Pre-filled URL for "Fetch GDP from API".
    pub api_url: Option<String>,
    pub api_timeout_secs: u64,
    pub delimiter: char,
    /// Load the built-in sample when no GDP source is configured.
    pub sample_fallback: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            gdp: None,
            iq: None,
            api_url: None,
            api_timeout_secs: 10,
            delimiter: ',',
            sample_fallback: true,
        }
    }
}

impl ExplorerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config file (if any) with command line overrides applied.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(path) = &cli.gdp {
            config.gdp = Some(SourceSpec::File { path: path.clone() });
        }
        if let Some(url) = &cli.gdp_api {
            config.gdp = Some(SourceSpec::Api { url: url.clone() });
            config.api_url = Some(url.clone());
        }
        if let Some(path) = &cli.iq {
            config.iq = Some(SourceSpec::File { path: path.clone() });
        }
        if let Some(d) = cli.delimiter {
            config.delimiter = d;
        }
        if let Some(secs) = cli.api_timeout_secs {
            config.api_timeout_secs = secs;
        }
        if cli.no_sample {
            config.sample_fallback = false;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() {
            bail!("delimiter must be a single ASCII character, got {:?}", self.delimiter);
        }
        if self.api_timeout_secs == 0 {
            bail!("api_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> u8 {
        // validate() guarantees ASCII
        self.delimiter as u8
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Build the ingestion adapter for a configured source.
    pub fn source(&self, spec: &SourceSpec) -> Result<Box<dyn TableSource>, PipelineError> {
        match spec {
            SourceSpec::File { path } => loader::source_for_path(path, self.delimiter_byte()),
            SourceSpec::Api { url } => Ok(Box::new(RemoteApiSource {
                url: url.clone(),
                timeout: self.api_timeout(),
            })),
            SourceSpec::Sample => Ok(Box::new(SampleSource)),
        }
    }
}
