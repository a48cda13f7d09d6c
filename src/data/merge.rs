use std::collections::{BTreeSet, HashMap};

use log::debug;

use super::model::{CellValue, Column, RawTable};
use crate::error::{PipelineError, Result};

/// Inner join of `left` and `right` on exact equality of `key`.
///
/// Rows without a counterpart on the other side are dropped. Duplicate keys
/// expand into one row per matching pair, ordered by left row then right row.
/// Non-key columns present on both sides get `_x` / `_y` suffixes.
pub fn merge(left: &RawTable, right: &RawTable, key: &str) -> Result<RawTable> {
    let left_key = left
        .column(key)
        .ok_or_else(|| PipelineError::missing_column(key))?;
    let right_key = right
        .column(key)
        .ok_or_else(|| PipelineError::missing_column(key))?;

    let mut right_index: HashMap<String, Vec<usize>> = HashMap::new();
    for (row, value) in right_key.values.iter().enumerate() {
        if let Some(k) = value.as_key() {
            right_index.entry(k).or_default().push(row);
        }
    }

    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for (l, value) in left_key.values.iter().enumerate() {
        let Some(k) = value.as_key() else { continue };
        if let Some(matches) = right_index.get(&k) {
            pairs.extend(matches.iter().map(|&r| (l, r)));
        }
    }

    let left_names: BTreeSet<&str> = left.column_names().into_iter().collect();
    let right_names: BTreeSet<&str> = right.column_names().into_iter().collect();

    let mut columns = vec![Column::new(
        key,
        pairs
            .iter()
            .map(|&(l, _)| left_key.values[l].clone())
            .collect(),
    )];
    for col in left.columns().iter().filter(|c| c.name != key) {
        let name = if right_names.contains(col.name.as_str()) {
            format!("{}_x", col.name)
        } else {
            col.name.clone()
        };
        columns.push(pick(name, &col.values, pairs.iter().map(|p| p.0)));
    }
    for col in right.columns().iter().filter(|c| c.name != key) {
        let name = if left_names.contains(col.name.as_str()) {
            format!("{}_y", col.name)
        } else {
            col.name.clone()
        };
        columns.push(pick(name, &col.values, pairs.iter().map(|p| p.1)));
    }

    debug!(
        "merged {} × {} rows on '{key}' → {} rows",
        left.num_rows(),
        right.num_rows(),
        pairs.len()
    );
    RawTable::from_columns(columns)
}

fn pick(name: String, values: &[CellValue], rows: impl Iterator<Item = usize>) -> Column {
    Column::new(name, rows.map(|r| values[r].clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_delimited;
    use crate::data::model::{f, s, table};

    fn gdp() -> RawTable {
        table(&[
            ("Country", vec![s("Brazil"), s("Japan"), s("Kenya")]),
            ("GDP_per_Capita", vec![f(9000.0), f(40000.0), f(2000.0)]),
        ])
    }

    fn iq() -> RawTable {
        table(&[
            ("Country", vec![s("Kenya"), s("Japan"), s("japan")]),
            ("Average_IQ", vec![f(75.0), f(105.0), f(1.0)]),
        ])
    }

    fn keys(t: &RawTable) -> BTreeSet<String> {
        t.unique_strings("Country")
    }

    #[test]
    fn unmatched_countries_are_dropped() {
        let out = merge(&gdp(), &iq(), "Country").unwrap();
        assert_eq!(out.num_rows(), 2);
        assert!(!keys(&out).contains("Brazil"));
        // exact match only, no case folding
        assert!(!keys(&out).contains("japan"));
        assert_eq!(out.column_names(), vec!["Country", "GDP_per_Capita", "Average_IQ"]);
    }

    #[test]
    fn preserves_left_order() {
        let out = merge(&gdp(), &iq(), "Country").unwrap();
        assert_eq!(out.cell("Country", 0), Some(&s("Japan")));
        assert_eq!(out.cell("Average_IQ", 0), Some(&f(105.0)));
        assert_eq!(out.cell("Country", 1), Some(&s("Kenya")));
    }

    #[test]
    fn key_set_is_commutative_and_bounded() {
        let ab = merge(&gdp(), &iq(), "Country").unwrap();
        let ba = merge(&iq(), &gdp(), "Country").unwrap();
        assert_eq!(keys(&ab), keys(&ba));
        assert!(ab.num_rows() <= gdp().num_rows().min(iq().num_rows()));
    }

    #[test]
    fn duplicate_keys_expand() {
        let right = table(&[
            ("Country", vec![s("Japan"), s("Japan")]),
            ("Average_IQ", vec![f(105.0), f(106.0)]),
        ]);
        let out = merge(&gdp(), &right, "Country").unwrap();
        assert_eq!(out.num_rows(), 2);
    }

    #[test]
    fn overlapping_columns_get_suffixes() {
        let left = table(&[("Country", vec![s("Japan")]), ("Region", vec![s("Asia")])]);
        let right = table(&[("Country", vec![s("Japan")]), ("Region", vec![s("East Asia")])]);
        let out = merge(&left, &right, "Country").unwrap();
        assert_eq!(out.column_names(), vec!["Country", "Region_x", "Region_y"]);
    }

    #[test]
    fn keys_compare_on_exact_text() {
        let csv = "Country,Average_IQ\n Japan,105\nKenya ,75\n";
        let right = read_delimited(csv.as_bytes(), b',').unwrap();
        assert_eq!(merge(&gdp(), &right, "Country").unwrap().num_rows(), 0);

        let left = table(&[("Country", vec![f(1.5)]), ("a", vec![f(1.0)])]);
        let right = table(&[("Country", vec![s("1.5")]), ("b", vec![f(2.0)])]);
        assert_eq!(merge(&left, &right, "Country").unwrap().num_rows(), 1);
    }

    #[test]
    fn null_keys_never_match() {
        let left = table(&[("Country", vec![CellValue::Null])]);
        let right = table(&[("Country", vec![CellValue::Null])]);
        assert_eq!(merge(&left, &right, "Country").unwrap().num_rows(), 0);
    }

    #[test]
    fn missing_key_is_a_schema_error() {
        let right = table(&[("Nation", vec![s("Japan")])]);
        let err = merge(&gdp(), &right, "Country").unwrap_err();
        assert_eq!(err, PipelineError::Schema(vec!["Country".into()]));
    }
}
