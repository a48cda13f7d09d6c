/// Data layer: core types, loading, derivation, merge, filtering and statistics.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .parquet / JSON API / embedded sample
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  TableSource → RawTable(s)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  year column or cross-year mean → GDP_per_Capita
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  merge    │  inner join on Country (two-table input only)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  GDP range ∧ IQ range ∧ region set
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  Pearson r, OLS trendline
///   └──────────┘
/// ```
///
/// `pipeline::run` strings these together as one pure function.

pub mod derive;
pub mod filter;
pub mod loader;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod sample;
pub mod stats;

pub const COUNTRY: &str = "Country";
pub const GDP_PER_CAPITA: &str = "GDP_per_Capita";
pub const AVERAGE_IQ: &str = "Average_IQ";
pub const REGION: &str = "Region";
