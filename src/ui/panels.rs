use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::derive::GdpMetric;
use crate::data::filter::{NumericRange, SliderBounds};
use crate::state::{AppState, TableRole};

// ---------------------------------------------------------------------------
// Left side panel – year choice and filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(output) = &state.output else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the panel.
    let years = output.year_columns.clone();
    let metric = output.metric.clone();
    let gdp_bounds = output.gdp_bounds;
    let iq_bounds = output.iq_bounds;
    let regions = output.regions.clone();
    let has_regions = output.has_regions();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Year or aggregate ----
            ui.strong("Select Year or Aggregate");
            if years.is_empty() {
                ui.label("No year columns: using GDP_per_Capita as loaded.");
            } else {
                year_selector(ui, state, &years, metric.as_ref());
            }
            ui.separator();

            // ---- Numeric ranges ----
            match gdp_bounds {
                Some(bounds) => {
                    let current = state
                        .selections
                        .filters
                        .gdp_range
                        .unwrap_or(bounds.as_range());
                    let label = "GDP per Capita Range";
                    if let Some(range) = range_sliders(ui, label, "gdp", bounds, current) {
                        state.set_gdp_range(range);
                    }
                }
                None => {
                    ui.label("No numeric GDP values to filter.");
                }
            }
            ui.add_space(6.0);
            match iq_bounds {
                Some(bounds) => {
                    let current = state
                        .selections
                        .filters
                        .iq_range
                        .unwrap_or(bounds.as_range());
                    let label = "Average IQ Range";
                    if let Some(range) = range_sliders(ui, label, "iq", bounds, current) {
                        state.set_iq_range(range);
                    }
                }
                None => {
                    ui.label("No numeric IQ values to filter.");
                }
            }
            ui.separator();

            // ---- Regions ----
            if !has_regions {
                ui.label("No Region column: region filter disabled.");
                return;
            }
            let selected = state.selected_regions();
            let header_text = format!("Select Regions  ({}/{})", selected.len(), regions.len());
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("regions")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_regions();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_regions();
                        }
                    });

                    for region in &regions {
                        let mut checked = selected.contains(region);
                        let color = state.color_map.color_for(Some(region.as_str()));
                        if ui
                            .checkbox(&mut checked, RichText::new(region).color(color))
                            .changed()
                        {
                            state.toggle_region(region);
                        }
                    }
                });
        });
}

fn year_selector(ui: &mut Ui, state: &mut AppState, years: &[String], metric: Option<&GdpMetric>) {
    let mut average = matches!(metric, Some(GdpMetric::Average));
    let current_year = match metric {
        Some(GdpMetric::SelectYear(y)) => y.clone(),
        _ => years.first().cloned().unwrap_or_default(),
    };

    ui.add_enabled_ui(!average, |ui: &mut Ui| {
        egui::ComboBox::from_id_salt("year")
            .selected_text(&current_year)
            .show_ui(ui, |ui: &mut Ui| {
                for year in years {
                    if ui.selectable_label(current_year == *year, year).clicked() {
                        state.set_metric(GdpMetric::SelectYear(year.clone()));
                    }
                }
            });
    });

    if ui
        .checkbox(&mut average, "Use average GDP over all years")
        .changed()
    {
        if average {
            state.set_metric(GdpMetric::Average);
        } else {
            state.set_metric(GdpMetric::SelectYear(current_year));
        }
    }
}

/// Whole-number min / max sliders. Returns the new range when either moved.
fn range_sliders(
    ui: &mut Ui,
    label: &str,
    id: &str,
    bounds: SliderBounds,
    current: NumericRange,
) -> Option<NumericRange> {
    let mut lo = (current.min as i64).clamp(bounds.min, bounds.max);
    let mut hi = (current.max as i64).clamp(bounds.min, bounds.max);

    ui.strong(label);
    let lo_changed = ui
        .push_id((id, "min"), |ui: &mut Ui| {
            ui.add(egui::Slider::new(&mut lo, bounds.min..=bounds.max).text("min"))
        })
        .inner
        .changed();
    let hi_changed = ui
        .push_id((id, "max"), |ui: &mut Ui| {
            ui.add(egui::Slider::new(&mut hi, bounds.min..=bounds.max).text("max"))
        })
        .inner
        .changed();

    if !(lo_changed || hi_changed) {
        return None;
    }
    // Keep min <= max by dragging the other handle along.
    if lo_changed {
        hi = hi.max(lo);
    } else {
        lo = lo.min(hi);
    }
    Some(NumericRange::new(lo as f64, hi as f64))
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open GDP table…").clicked() {
                open_file_dialog(state, TableRole::Gdp);
                ui.close_menu();
            }
            if ui.button("Open IQ table…").clicked() {
                open_file_dialog(state, TableRole::Iq);
                ui.close_menu();
            }
            if ui.button("Load sample data").clicked() {
                state.load_sample();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Clear").clicked() {
                state.clear();
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label("GDP API:");
        let mut url = state.api_url.clone();
        let edit = ui.add(egui::TextEdit::singleline(&mut url).desired_width(260.0));
        if edit.changed() {
            state.api_url = url.clone();
        }
        let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Fetch").clicked() || submitted {
            state.fetch_gdp(&url);
        }

        ui.separator();

        if let Some(gdp) = &state.gdp {
            ui.label(format!("GDP: {} ({} rows)", gdp.label, gdp.table.num_rows()));
        }
        if let Some(iq) = &state.iq {
            ui.label(format!("IQ: {} ({} rows)", iq.label, iq.table.num_rows()));
        }
        if let Some(out) = &state.output {
            ui.label(format!(
                "{} countries, {} visible",
                out.prepared.num_rows(),
                out.working.num_rows()
            ));
        }
    });

    if let Some(msg) = &state.status_message {
        ui.label(RichText::new(msg).color(Color32::RED));
    } else if let Some(msg) = &state.info_message {
        ui.label(RichText::new(msg).color(Color32::from_rgb(0x2e, 0x8b, 0x57)));
    } else if state.gdp.is_none() {
        ui.label("Please upload a CSV, spreadsheet or Parquet file to begin (File → Open…).");
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState, role: TableRole) {
    let title = match role {
        TableRole::Gdp => "Open GDP per capita data",
        TableRole::Iq => "Open average IQ data",
    };
    let file = rfd::FileDialog::new()
        .set_title(title)
        .add_filter(
            "Supported files",
            &["csv", "tsv", "txt", "xlsx", "xlsm", "xls", "ods", "parquet", "pq", "json"],
        )
        .add_filter("CSV", &["csv", "tsv", "txt"])
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(role, &path);
    }
}
