use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Reader};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, RawTable};
use super::sample::SAMPLE_CSV;
use super::{COUNTRY, GDP_PER_CAPITA};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// TableSource – the one ingestion capability every input shares
// ---------------------------------------------------------------------------

/// Anything that yields zero or more raw tables, or fails with a
/// user-facing [`PipelineError`].
pub trait TableSource {
    /// Short label for status messages and logs.
    fn describe(&self) -> String;

    fn load(&self) -> Result<Vec<RawTable>, PipelineError>;
}

/// Delimited text with a header row.
pub struct DelimitedTextSource {
    pub path: PathBuf,
    pub delimiter: u8,
}

impl TableSource for DelimitedTextSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<RawTable>, PipelineError> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))
            .map_err(PipelineError::ingestion)?;
        let table = read_delimited(file, self.delimiter).map_err(PipelineError::ingestion)?;
        Ok(vec![table])
    }
}

/// First worksheet of an `.xlsx` / `.xls` / `.ods` workbook.
pub struct SpreadsheetSource {
    pub path: PathBuf,
}

impl TableSource for SpreadsheetSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<RawTable>, PipelineError> {
        load_spreadsheet(&self.path)
            .map(|t| vec![t])
            .map_err(PipelineError::ingestion)
    }
}

/// Every column of a Parquet file.
pub struct ParquetSource {
    pub path: PathBuf,
}

impl TableSource for ParquetSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<RawTable>, PipelineError> {
        load_parquet(&self.path)
            .map(|t| vec![t])
            .map_err(PipelineError::ingestion)
    }
}

/// Remote GDP endpoint returning `{"data": {"<country>": {"value": n}}}`.
///
/// Exactly one GET per `load`; no retry, no pagination.
pub struct RemoteApiSource {
    pub url: String,
    pub timeout: Duration,
}

impl TableSource for RemoteApiSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn load(&self) -> Result<Vec<RawTable>, PipelineError> {
        let remote = |e: anyhow::Error| PipelineError::RemoteFetch(format!("{e:#}"));

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("building HTTP client")
            .map_err(remote)?;
        let response = client
            .get(&self.url)
            .send()
            .with_context(|| format!("GET {}", self.url))
            .map_err(remote)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::RemoteFetch(format!(
                "GET {} returned {status}",
                self.url
            )));
        }

        let body: JsonValue = response
            .json()
            .context("decoding response body")
            .map_err(remote)?;
        let table = api_payload_to_table(&body).map_err(remote)?;
        info!("Fetched {} countries from {}", table.num_rows(), self.url);
        Ok(vec![table])
    }
}

/// The bundled fallback dataset.
pub struct SampleSource;

impl TableSource for SampleSource {
    fn describe(&self) -> String {
        "built-in sample data".to_string()
    }

    fn load(&self) -> Result<Vec<RawTable>, PipelineError> {
        read_delimited(SAMPLE_CSV.as_bytes(), b',')
            .map(|t| vec![t])
            .map_err(PipelineError::ingestion)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Pick a source for a local file by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma (or `delimiter`) separated, header row
/// * `.tsv`          – tab separated
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first sheet, header row
/// * `.parquet` / `.pq`
/// * `.json`         – a saved API payload
pub fn source_for_path(path: &Path, delimiter: u8) -> Result<Box<dyn TableSource>, PipelineError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let path = path.to_path_buf();
    let source: Box<dyn TableSource> = match ext.as_str() {
        "csv" | "txt" => Box::new(DelimitedTextSource { path, delimiter }),
        "tsv" => Box::new(DelimitedTextSource {
            path,
            delimiter: b'\t',
        }),
        "xlsx" | "xlsm" | "xls" | "ods" => Box::new(SpreadsheetSource { path }),
        "parquet" | "pq" => Box::new(ParquetSource { path }),
        "json" => Box::new(JsonFileSource { path }),
        other => {
            return Err(PipelineError::Ingestion(format!(
                "Unsupported file extension: .{other}"
            )))
        }
    };
    Ok(source)
}

/// Load exactly one table from `source`; extra tables are ignored and no
/// table at all is an ingestion error.
pub fn load_one(source: &dyn TableSource) -> Result<RawTable, PipelineError> {
    let mut tables = source.load()?;
    if tables.len() > 1 {
        warn!(
            "{} yielded {} tables; using the first",
            source.describe(),
            tables.len()
        );
    }
    if tables.is_empty() {
        return Err(PipelineError::Ingestion(format!(
            "{} contained no table",
            source.describe()
        )));
    }
    let table = tables.swap_remove(0);
    info!(
        "Loaded {} rows with columns {:?} from {}",
        table.num_rows(),
        table.column_names(),
        source.describe()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

pub fn read_delimited<R: std::io::Read>(input: R, delimiter: u8) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(input);
    let header: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if header.is_empty() || header.iter().all(String::is_empty) {
        bail!("missing header row");
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        rows.push(record.iter().map(CellValue::parse).collect());
    }

    Ok(RawTable::from_rows(header, rows)?)
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no sheets")?
        .context("reading first sheet")?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .context("first sheet is empty")?
        .iter()
        .map(header_name)
        .collect();
    let body = rows
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Ok(RawTable::from_rows(header, body)?)
}

/// Header cells like `2019` come back as floats; keep them digit-only so
/// they are still recognised as years.
fn header_name(cell: &Data) -> String {
    match cell {
        Data::Float(v) if v.fract() == 0.0 => format!("{}", *v as i64),
        Data::Int(i) => i.to_string(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(v) => CellValue::Float(*v),
        Data::String(s) => CellValue::parse(s),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty | Data::Error(_) => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Column> = names
        .into_iter()
        .map(|name| Column::new(name, Vec::new()))
        .collect();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(idx);
            column
                .values
                .extend((0..batch.num_rows()).map(|row| extract_cell(array, row)));
        }
    }

    Ok(RawTable::from_columns(columns)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => match any.downcast_ref::<StringArray>() {
            Some(s) => CellValue::String(s.value(row).to_string()),
            None => CellValue::Null,
        },
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => match any.downcast_ref::<Int32Array>() {
            Some(a) => CellValue::Integer(a.value(row) as i64),
            None => CellValue::Null,
        },
        DataType::Int64 => match any.downcast_ref::<Int64Array>() {
            Some(a) => CellValue::Integer(a.value(row)),
            None => CellValue::Null,
        },
        DataType::Float32 => match any.downcast_ref::<Float32Array>() {
            Some(a) => CellValue::Float(a.value(row) as f64),
            None => CellValue::Null,
        },
        DataType::Float64 => match any.downcast_ref::<Float64Array>() {
            Some(a) => CellValue::Float(a.value(row)),
            None => CellValue::Null,
        },
        DataType::Boolean => match any.downcast_ref::<BooleanArray>() {
            Some(a) => CellValue::Bool(a.value(row)),
            None => CellValue::Null,
        },
        other => CellValue::String(format!("{other:?}")),
    }
}

// ---------------------------------------------------------------------------
// JSON API payload
// ---------------------------------------------------------------------------

/// A saved API payload on disk, decoded like a live response.
pub struct JsonFileSource {
    pub path: PathBuf,
}

impl TableSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<RawTable>, PipelineError> {
        let text = std::fs::read_to_string(&self.path)
            .context("reading JSON file")
            .map_err(PipelineError::ingestion)?;
        let root: JsonValue = serde_json::from_str(&text)
            .context("parsing JSON")
            .map_err(PipelineError::ingestion)?;
        api_payload_to_table(&root)
            .map(|t| vec![t])
            .map_err(PipelineError::ingestion)
    }
}

/// Expected schema:
///
/// ```json
/// { "data": { "Japan": { "value": 40000.0 }, "Kenya": { "value": 2100 } } }
/// ```
///
/// Produces `Country` and `GDP_per_Capita`; a missing or non-numeric
/// `value` becomes a null cell.
pub fn api_payload_to_table(root: &JsonValue) -> Result<RawTable> {
    let data = root
        .get("data")
        .context("payload has no 'data' field")?
        .as_object()
        .context("'data' is not an object")?;

    let mut countries = Vec::with_capacity(data.len());
    let mut values = Vec::with_capacity(data.len());
    for (country, entry) in data {
        let obj = entry
            .as_object()
            .with_context(|| format!("entry for '{country}' is not an object"))?;
        countries.push(CellValue::String(country.clone()));
        values.push(match obj.get("value").and_then(JsonValue::as_f64) {
            Some(v) => CellValue::Float(v),
            None => CellValue::Null,
        });
    }

    Ok(RawTable::from_columns(vec![
        Column::new(COUNTRY, countries),
        Column::new(GDP_PER_CAPITA, values),
    ])?)
}
