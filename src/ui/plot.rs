use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoints, Points};

use crate::data::model::RawTable;
use crate::data::stats::{ols_fit, CorrelationOutcome};
use crate::data::{AVERAGE_IQ, COUNTRY, GDP_PER_CAPITA, REGION};
use crate::state::AppState;

/// One country on the scatter plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub country: String,
    pub region: Option<String>,
    pub gdp: f64,
    pub iq: f64,
}

/// Rows of the working table with both GDP and IQ present.
pub fn scatter_points(table: &RawTable) -> Vec<ScatterPoint> {
    let (Some(gdp), Some(iq)) = (
        table.numeric_column(GDP_PER_CAPITA),
        table.numeric_column(AVERAGE_IQ),
    ) else {
        return Vec::new();
    };
    (0..table.num_rows())
        .filter_map(|row| {
            Some(ScatterPoint {
                country: table.cell(COUNTRY, row).map(|c| c.to_string()).unwrap_or_default(),
                region: table.cell(REGION, row).and_then(|c| c.as_key()),
                gdp: gdp[row]?,
                iq: iq[row]?,
            })
        })
        .collect()
}

/// Marker radius grows with GDP, between 3 and 12 px.
fn marker_radius(gdp: f64, max_gdp: f64) -> f32 {
    if max_gdp <= 0.0 || gdp <= 0.0 {
        return 3.0;
    }
    3.0 + 9.0 * (gdp / max_gdp).sqrt() as f32
}

// ---------------------------------------------------------------------------
// Scatter plot (central panel)
// ---------------------------------------------------------------------------

/// Render GDP per capita vs. average IQ with an OLS trendline.
pub fn scatter_plot(ui: &mut Ui, state: &AppState) {
    let output = match &state.output {
        Some(out) => out,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Load data to view the plot  (File → Open…)");
            });
            return;
        }
    };

    ui.heading("GDP per Capita vs. Average IQ");
    let text = match output.correlation {
        CorrelationOutcome::InsufficientData => RichText::new(output.correlation.to_string()),
        other => RichText::new(format!(
            "Correlation between GDP per Capita and Average IQ: {other}"
        ))
        .strong(),
    };
    ui.label(text);

    let points = scatter_points(&output.working);
    let max_gdp = points.iter().map(|p| p.gdp).fold(0.0, f64::max);
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().map(|p| (p.gdp, p.iq)).unzip();
    let trend = ols_fit(&xs, &ys);
    let x_extent = xs.iter().copied().fold(None, |acc: Option<(f64, f64)>, x| match acc {
        None => Some((x, x)),
        Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
    });

    let hover_points = points.clone();
    Plot::new("scatter_plot")
        .legend(Legend::default())
        .x_axis_label("GDP per Capita (USD)")
        .y_axis_label("Average IQ")
        .label_formatter(move |_name, value| {
            let distance = |p: &ScatterPoint| {
                (p.gdp - value.x).abs() / max_gdp.max(1.0) + (p.iq - value.y).abs() / 100.0
            };
            let nearest = hover_points
                .iter()
                .min_by(|a, b| distance(a).total_cmp(&distance(b)));
            match nearest {
                Some(p) => format!("{}\nGDP: {:.0}\nIQ: {:.1}", p.country, p.gdp, p.iq),
                None => String::new(),
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for p in &points {
                let color = state.color_map.color_for(p.region.as_deref());
                let name = p.region.clone().unwrap_or_else(|| "Countries".to_string());
                plot_ui.points(
                    Points::new(PlotPoints::from(vec![[p.gdp, p.iq]]))
                        .name(name)
                        .color(color)
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(marker_radius(p.gdp, max_gdp)),
                );
            }

            if let (Some(fit), Some((lo, hi))) = (trend, x_extent) {
                let line: PlotPoints = [lo, hi].iter().map(|&x| [x, fit.at(x)]).collect();
                plot_ui.line(
                    Line::new(line)
                        .name("OLS trendline")
                        .color(Color32::DARK_GRAY)
                        .width(2.0),
                );
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{f, s, table, CellValue};

    #[test]
    fn incomplete_rows_are_not_plotted() {
        let t = table(&[
            ("Country", vec![s("US"), s("JP"), s("XX")]),
            ("GDP_per_Capita", vec![f(60000.0), f(40000.0), CellValue::Null]),
            ("Average_IQ", vec![f(98.0), f(105.0), f(90.0)]),
        ]);
        let points = scatter_points(&t);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].country, "JP");
        assert_eq!(points[1].region, None);
    }

    #[test]
    fn marker_radius_is_bounded() {
        assert_eq!(marker_radius(0.0, 100.0), 3.0);
        assert_eq!(marker_radius(100.0, 100.0), 12.0);
        assert!(marker_radius(25.0, 100.0) > 3.0);
    }
}
