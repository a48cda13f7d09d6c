use std::collections::BTreeSet;
use std::fmt;

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a table column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, the common denominator of CSV, spreadsheet,
/// Parquet and JSON inputs.
/// Used in `BTreeSet`s downstream, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.2}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell. Anything that is not an integer or a
    /// finite float counts as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Key used for joins and region matching. Null has no key; text is
    /// compared exactly and numbers in their plain form (`1.5`, not `1.50`).
    pub fn as_key(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) => Some(s.clone()),
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Float(v) => Some(v.to_string()),
            CellValue::Bool(b) => Some(b.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Infer a cell type from raw text. Surrounding whitespace is ignored
    /// when looking for a number or bool; text cells keep it.
    pub fn parse(raw: &str) -> CellValue {
        let s = raw.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(raw.to_string())
    }
}

// ---------------------------------------------------------------------------
// Column / RawTable
// ---------------------------------------------------------------------------

/// One named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }
}

/// A column-oriented table: ordered named columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    columns: Vec<Column>,
    n_rows: usize,
}

impl RawTable {
    /// Build a table, rejecting ragged or duplicate columns.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        let mut seen = BTreeSet::new();
        for col in &columns {
            if col.values.len() != n_rows {
                return Err(PipelineError::Ingestion(format!(
                    "column '{}' has {} values but expected {n_rows}",
                    col.name,
                    col.values.len()
                )));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(PipelineError::Ingestion(format!(
                    "duplicate column '{}'",
                    col.name
                )));
            }
        }
        Ok(RawTable { columns, n_rows })
    }

    /// Build a table from a header and row-major records. Short rows are
    /// padded with nulls; long rows are an error.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let mut columns: Vec<Column> = header
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();
        for (row_no, row) in rows.into_iter().enumerate() {
            if row.len() > columns.len() {
                return Err(PipelineError::Ingestion(format!(
                    "row {row_no} has {} fields but the header has {}",
                    row.len(),
                    columns.len()
                )));
            }
            let mut cells = row.into_iter();
            for col in &mut columns {
                col.values.push(cells.next().unwrap_or(CellValue::Null));
            }
        }
        Self::from_columns(columns)
    }

    pub fn num_rows(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Numeric view of a column; missing cells become `None`.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name)
            .map(|c| c.values.iter().map(CellValue::as_f64).collect())
    }

    /// Columns whose name is made of ASCII digits only, in table order.
    pub fn year_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !c.name.is_empty() && c.name.bytes().all(|b| b.is_ascii_digit()))
            .map(|c| c.name.clone())
            .collect()
    }

    /// Add a column, or overwrite an existing one in place.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.values.len() != self.n_rows {
            return Err(PipelineError::Ingestion(format!(
                "column '{}' has {} values but the table has {} rows",
                column.name,
                column.values.len(),
                self.n_rows
            )));
        }
        if self.columns.is_empty() {
            self.n_rows = column.values.len();
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// New table holding the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> RawTable {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();
        RawTable {
            columns,
            n_rows: indices.len(),
        }
    }

    /// First `n` rows (preview).
    pub fn head(&self, n: usize) -> RawTable {
        let indices: Vec<usize> = (0..self.n_rows.min(n)).collect();
        self.take_rows(&indices)
    }

    pub fn cell(&self, column: &str, row: usize) -> Option<&CellValue> {
        self.column(column).and_then(|c| c.values.get(row))
    }

    /// Sorted distinct non-null keys of a column.
    pub fn unique_strings(&self, name: &str) -> BTreeSet<String> {
        self.column(name)
            .map(|c| c.values.iter().filter_map(CellValue::as_key).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) fn table(columns: &[(&str, Vec<CellValue>)]) -> RawTable {
    RawTable::from_columns(
        columns
            .iter()
            .map(|(name, values)| Column::new(*name, values.clone()))
            .collect(),
    )
    .expect("valid test table")
}

#[cfg(test)]
pub(crate) fn s(v: &str) -> CellValue {
    CellValue::String(v.to_string())
}

#[cfg(test)]
pub(crate) fn f(v: f64) -> CellValue {
    CellValue::Float(v)
}
