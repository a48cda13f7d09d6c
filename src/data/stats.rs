use std::fmt;

use super::model::RawTable;
use super::{AVERAGE_IQ, GDP_PER_CAPITA};

/// Result of correlating GDP per capita with average IQ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrelationOutcome {
    Coefficient(f64),
    /// Fewer than two rows; nothing was computed.
    InsufficientData,
    /// Enough rows, but fewer than two complete pairs or zero variance.
    Undefined,
}

impl fmt::Display for CorrelationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationOutcome::Coefficient(r) => write!(f, "{r:.2}"),
            CorrelationOutcome::InsufficientData => {
                write!(f, "Not enough data points to calculate correlation.")
            }
            CorrelationOutcome::Undefined => write!(f, "undefined (no variance)"),
        }
    }
}

/// Pearson correlation of `GDP_per_Capita` and `Average_IQ`.
pub fn correlation(table: &RawTable) -> CorrelationOutcome {
    if table.num_rows() < 2 {
        return CorrelationOutcome::InsufficientData;
    }
    let (xs, ys) = complete_pairs(table);
    match pearson(&xs, &ys) {
        Some(r) => CorrelationOutcome::Coefficient(r),
        None => CorrelationOutcome::Undefined,
    }
}

/// Rows where both GDP and IQ are numeric.
pub fn complete_pairs(table: &RawTable) -> (Vec<f64>, Vec<f64>) {
    let (Some(gdp), Some(iq)) = (
        table.numeric_column(GDP_PER_CAPITA),
        table.numeric_column(AVERAGE_IQ),
    ) else {
        return (Vec::new(), Vec::new());
    };
    gdp.into_iter()
        .zip(iq)
        .filter_map(|(x, y)| Some((x?, y?)))
        .unzip()
}

/// Pearson product-moment coefficient, `None` for < 2 points or zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (mx, my) = (mean(&xs[..n]), mean(&ys[..n]));
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys).take(n) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Ordinary least squares `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

pub fn ols_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (mx, my) = (mean(&xs[..n]), mean(&ys[..n]));
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in xs.iter().zip(ys).take(n) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: my - slope * mx,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{f, s, table, CellValue};

    fn pair_table(gdp: Vec<CellValue>, iq: Vec<CellValue>) -> RawTable {
        let countries = (0..gdp.len()).map(|i| s(&format!("C{i}"))).collect();
        table(&[
            ("Country", countries),
            ("GDP_per_Capita", gdp),
            ("Average_IQ", iq),
        ])
    }

    #[test]
    fn fewer_than_two_rows_is_insufficient() {
        let empty = pair_table(vec![], vec![]);
        assert_eq!(correlation(&empty), CorrelationOutcome::InsufficientData);
        let one = pair_table(vec![f(1.0)], vec![f(2.0)]);
        assert_eq!(correlation(&one), CorrelationOutcome::InsufficientData);
        assert_eq!(
            CorrelationOutcome::InsufficientData.to_string(),
            "Not enough data points to calculate correlation."
        );
    }

    #[test]
    fn two_points_with_opposite_trend_are_negative() {
        // US {60000, 98}, JP {40000, 105}
        let t = pair_table(vec![f(60000.0), f(40000.0)], vec![f(98.0), f(105.0)]);
        match correlation(&t) {
            CorrelationOutcome::Coefficient(r) => assert!((r + 1.0).abs() < 1e-12),
            other => panic!("expected coefficient, got {other:?}"),
        }
    }

    #[test]
    fn zero_variance_is_undefined_not_a_panic() {
        let t = pair_table(vec![f(1.0), f(2.0)], vec![f(105.0), f(105.0)]);
        assert_eq!(correlation(&t), CorrelationOutcome::Undefined);
    }

    #[test]
    fn incomplete_pairs_are_skipped() {
        let t = pair_table(
            vec![f(1.0), f(2.0), CellValue::Null, f(3.0)],
            vec![f(2.0), f(4.0), f(100.0), f(6.0)],
        );
        let CorrelationOutcome::Coefficient(r) = correlation(&t) else {
            panic!("expected coefficient");
        };
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_matches_hand_computation() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [2.0, 4.0, 5.0, 4.0, 5.0];
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 0.7745966692414834).abs() < 1e-12);
        assert_eq!(CorrelationOutcome::Coefficient(r).to_string(), "0.77");
    }

    #[test]
    fn ols_recovers_a_line() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let fit = ols_fit(&xs, &ys).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.at(10.0) - 21.0).abs() < 1e-12);
        assert_eq!(ols_fit(&[1.0, 1.0], &[2.0, 3.0]), None);
    }
}
