use super::model::{CellValue, Column, RawTable};
use super::GDP_PER_CAPITA;
use crate::error::{PipelineError, Result};

/// How the per-country GDP figure is obtained from the year columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GdpMetric {
    /// Copy one year column verbatim.
    SelectYear(String),
    /// Row-wise mean over all year columns.
    Average,
}

/// Return a copy of `table` with `GDP_per_Capita` added or overwritten.
pub fn derive(table: &RawTable, year_columns: &[String], mode: &GdpMetric) -> Result<RawTable> {
    let values = match mode {
        GdpMetric::SelectYear(year) => {
            if !year_columns.contains(year) {
                return Err(PipelineError::missing_column(year));
            }
            table
                .column(year)
                .ok_or_else(|| PipelineError::missing_column(year))?
                .values
                .clone()
        }
        GdpMetric::Average => row_means(table, year_columns)?,
    };

    let mut out = table.clone();
    out.set_column(Column::new(GDP_PER_CAPITA, values))?;
    Ok(out)
}

/// Mean of the numeric cells of each row; rows without any become null.
fn row_means(table: &RawTable, year_columns: &[String]) -> Result<Vec<CellValue>> {
    let columns = year_columns
        .iter()
        .map(|y| table.column(y).ok_or_else(|| PipelineError::missing_column(y)))
        .collect::<Result<Vec<_>>>()?;

    Ok((0..table.num_rows())
        .map(|row| {
            let (sum, n) = columns
                .iter()
                .filter_map(|c| c.values[row].as_f64())
                .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
            if n == 0 {
                CellValue::Null
            } else {
                CellValue::Float(sum / n as f64)
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{f, s, table};

    fn gdp() -> RawTable {
        table(&[
            ("Country", vec![s("US"), s("JP"), s("BR")]),
            ("2019", vec![f(100.0), CellValue::Integer(300), CellValue::Null]),
            ("2020", vec![f(200.0), s("n/a"), CellValue::Null]),
        ])
    }

    #[test]
    fn select_year_copies_the_column_verbatim() {
        let t = gdp();
        let years = t.year_columns();
        let out = derive(&t, &years, &GdpMetric::SelectYear("2020".into())).unwrap();
        assert_eq!(
            out.column(GDP_PER_CAPITA).unwrap().values,
            t.column("2020").unwrap().values
        );
        // input untouched
        assert!(!t.has_column(GDP_PER_CAPITA));
    }

    #[test]
    fn select_year_rejects_unknown_year() {
        let t = gdp();
        let years = t.year_columns();
        let err = derive(&t, &years, &GdpMetric::SelectYear("1999".into())).unwrap_err();
        assert_eq!(err, PipelineError::Schema(vec!["1999".into()]));
    }

    #[test]
    fn average_of_2019_and_2020_is_150() {
        let t = gdp();
        let out = derive(&t, &t.year_columns(), &GdpMetric::Average).unwrap();
        let col = out.numeric_column(GDP_PER_CAPITA).unwrap();
        assert_eq!(col[0], Some(150.0));
    }

    #[test]
    fn average_skips_missing_cells() {
        let t = gdp();
        let out = derive(&t, &t.year_columns(), &GdpMetric::Average).unwrap();
        let col = out.column(GDP_PER_CAPITA).unwrap();
        assert_eq!(col.values[1], f(300.0));
        assert_eq!(col.values[2], CellValue::Null);
    }

    #[test]
    fn average_without_year_columns_is_all_null() {
        let t = table(&[("Country", vec![s("US"), s("JP")])]);
        let out = derive(&t, &[], &GdpMetric::Average).unwrap();
        let col = out.column(GDP_PER_CAPITA).unwrap();
        assert!(col.values.iter().all(CellValue::is_null));
        assert_eq!(col.values.len(), 2);
    }

    #[test]
    fn derive_overwrites_an_existing_metric_column() {
        let t = table(&[
            ("Country", vec![s("US")]),
            ("2021", vec![f(5.0)]),
            (GDP_PER_CAPITA, vec![f(1.0)]),
        ]);
        let out = derive(&t, &t.year_columns(), &GdpMetric::Average).unwrap();
        assert_eq!(out.column_names().len(), 3);
        assert_eq!(out.cell(GDP_PER_CAPITA, 0), Some(&f(5.0)));
    }
}
