use std::collections::BTreeSet;

use super::model::RawTable;
use super::{AVERAGE_IQ, GDP_PER_CAPITA, REGION};

// ---------------------------------------------------------------------------
// Filter predicates: two numeric ranges and a region set
// ---------------------------------------------------------------------------

/// Inclusive numeric range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        NumericRange { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Whole-number slider bounds taken from a column's actual min / max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderBounds {
    pub min: i64,
    pub max: i64,
}

impl SliderBounds {
    /// Truncated min / max of the column's numeric cells, or `None` when the
    /// column is absent or holds no numbers.
    pub fn from_column(table: &RawTable, column: &str) -> Option<Self> {
        let values = table.numeric_column(column)?;
        let (lo, hi) = values
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        Some(SliderBounds {
            min: lo.trunc() as i64,
            max: hi.trunc() as i64,
        })
    }

    pub fn as_range(&self) -> NumericRange {
        NumericRange::new(self.min as f64, self.max as f64)
    }
}

/// Current sidebar selections.
///
/// `None` ranges mean "no range chosen": only the presence of a numeric
/// value is required. `None` regions means every region passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub gdp_range: Option<NumericRange>,
    pub iq_range: Option<NumericRange>,
    pub regions: Option<BTreeSet<String>>,
}

/// Row indices whose numeric value in `column` lies within `range`.
/// Missing and non-numeric cells never pass.
pub fn range_indices(table: &RawTable, column: &str, range: Option<NumericRange>) -> Vec<usize> {
    let Some(values) = table.numeric_column(column) else {
        return Vec::new();
    };
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| match (v, range) {
            (Some(v), Some(r)) => r.contains(*v),
            (Some(_), None) => true,
            (None, _) => false,
        })
        .map(|(i, _)| i)
        .collect()
}

pub fn filter_range(table: &RawTable, column: &str, range: Option<NumericRange>) -> RawTable {
    table.take_rows(&range_indices(table, column, range))
}

/// Keep rows whose `Region` is in `selected`.
///
/// Skipped (all rows pass) when the table has no `Region` column. No
/// selection means every region label, so a row with a missing region is
/// dropped either way.
pub fn filter_regions(table: &RawTable, selected: Option<&BTreeSet<String>>) -> RawTable {
    let Some(column) = table.column(REGION) else {
        return table.clone();
    };
    let indices: Vec<usize> = column
        .values
        .iter()
        .enumerate()
        .filter(|(_, v)| match (v.as_key(), selected) {
            (Some(k), Some(selected)) => selected.contains(&k),
            (Some(_), None) => true,
            (None, _) => false,
        })
        .map(|(i, _)| i)
        .collect();
    table.take_rows(&indices)
}

/// Apply the GDP range, IQ range and region filters.
pub fn apply_filters(table: &RawTable, filters: &FilterState) -> RawTable {
    let by_gdp = filter_range(table, GDP_PER_CAPITA, filters.gdp_range);
    let by_iq = filter_range(&by_gdp, AVERAGE_IQ, filters.iq_range);
    filter_regions(&by_iq, filters.regions.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{f, s, table, CellValue};

    fn sample() -> RawTable {
        table(&[
            ("Country", vec![s("US"), s("CN"), s("JP"), s("BR"), s("XX")]),
            (
                "GDP_per_Capita",
                vec![f(60000.0), f(10000.0), f(40000.0), f(9000.5), CellValue::Null],
            ),
            ("Average_IQ", vec![f(98.0), f(105.0), f(105.0), f(83.0), f(90.0)]),
            (
                "Region",
                vec![s("Americas"), s("Asia"), s("Asia"), s("Americas"), s("Asia")],
            ),
        ])
    }

    fn countries(t: &RawTable) -> Vec<String> {
        t.column("Country")
            .unwrap()
            .values
            .iter()
            .map(|v| v.to_string())
            .collect()
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let range = NumericRange::new(10000.0, 40000.0);
        let out = filter_range(&sample(), GDP_PER_CAPITA, Some(range));
        assert_eq!(countries(&out), vec!["CN", "JP"]);
    }

    #[test]
    fn gdp_range_excludes_cn() {
        let range = NumericRange::new(15000.0, 70000.0);
        let out = filter_range(&sample(), GDP_PER_CAPITA, Some(range));
        assert_eq!(countries(&out), vec!["US", "JP"]);
    }

    #[test]
    fn missing_values_never_pass_a_range() {
        let out = filter_range(&sample(), GDP_PER_CAPITA, None);
        assert!(!countries(&out).contains(&"XX".to_string()));
        assert_eq!(out.num_rows(), 4);
    }

    #[test]
    fn region_filter_uses_membership() {
        let selected: BTreeSet<String> = ["Asia".to_string()].into();
        let out = filter_regions(&sample(), Some(&selected));
        assert_eq!(countries(&out), vec!["CN", "JP", "XX"]);
        assert_eq!(filter_regions(&sample(), Some(&BTreeSet::new())).num_rows(), 0);
    }

    #[test]
    fn missing_region_is_dropped_with_or_without_a_selection() {
        let t = table(&[
            ("Country", vec![s("US"), s("XX"), s("JP")]),
            ("Region", vec![s("Americas"), CellValue::Null, s("Asia")]),
        ]);
        let every_label = t.unique_strings("Region");
        let all = filter_regions(&t, None);
        assert_eq!(countries(&all), vec!["US", "JP"]);
        assert_eq!(all, filter_regions(&t, Some(&every_label)));
    }

    #[test]
    fn region_filter_skipped_without_region_column() {
        let t = table(&[("Country", vec![s("US")])]);
        let selected: BTreeSet<String> = ["Asia".to_string()].into();
        assert_eq!(filter_regions(&t, Some(&selected)).num_rows(), 1);
    }

    #[test]
    fn filters_commute() {
        let t = sample();
        let gdp = Some(NumericRange::new(9000.0, 50000.0));
        let iq = Some(NumericRange::new(90.0, 110.0));
        let regions: BTreeSet<String> = ["Asia".to_string()].into();

        let passes: [&dyn Fn(&RawTable) -> RawTable; 3] = [
            &|t: &RawTable| filter_range(t, GDP_PER_CAPITA, gdp),
            &|t: &RawTable| filter_range(t, AVERAGE_IQ, iq),
            &|t: &RawTable| filter_regions(t, Some(&regions)),
        ];
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

        let mut results = orders.iter().map(|order| {
            let out = order.iter().fold(t.clone(), |acc, &i| passes[i](&acc));
            out.unique_strings("Country")
        });
        let first = results.next().unwrap();
        assert!(results.all(|r| r == first));
        assert_eq!(first, ["CN".to_string(), "JP".to_string()].into());
    }

    #[test]
    fn bounds_truncate_to_whole_numbers() {
        let t = table(&[("x", vec![f(-2.7), f(10.9), CellValue::Null, s("bad")])]);
        assert_eq!(
            SliderBounds::from_column(&t, "x"),
            Some(SliderBounds { min: -2, max: 10 })
        );
        let empty = table(&[("x", vec![CellValue::Null])]);
        assert_eq!(SliderBounds::from_column(&empty, "x"), None);
        assert_eq!(SliderBounds::from_column(&empty, "y"), None);
    }

    #[test]
    fn apply_filters_is_conjunctive() {
        let state = FilterState {
            gdp_range: Some(NumericRange::new(0.0, 70000.0)),
            iq_range: Some(NumericRange::new(95.0, 110.0)),
            regions: Some(["Americas".to_string()].into()),
        };
        assert_eq!(countries(&apply_filters(&sample(), &state)), vec!["US"]);
    }
}
