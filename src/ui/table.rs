use eframe::egui::{self, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::model::RawTable;
use crate::state::AppState;

const PREVIEW_ROWS: usize = 5;

/// Filtered working table, plus a preview of the loaded input.
pub fn data_tables(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Filtered Data");
        if let Some(out) = &state.output {
            ui.label(format!("({} rows)", out.working.num_rows()));
        }
    });

    let Some(output) = &state.output else {
        ui.label("Nothing to show yet.");
        return;
    };

    if let Some(gdp) = &state.gdp {
        egui::CollapsingHeader::new("Preview of the loaded data")
            .id_salt("preview")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                table_view(ui, "preview_table", &gdp.table.head(PREVIEW_ROWS));
            });
    }

    table_view(ui, "working_table", &output.working);
}

fn table_view(ui: &mut Ui, id: &str, table: &RawTable) {
    let columns = table.columns();
    if columns.is_empty() {
        ui.label("(no columns)");
        return;
    }

    ui.push_id(id, |ui: &mut Ui| {
        egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .columns(TableColumn::auto().at_least(60.0), columns.len())
                .header(20.0, |mut header| {
                    for col in columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(&col.name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, table.num_rows(), |mut row| {
                        let i = row.index();
                        for col in columns {
                            row.col(|ui: &mut Ui| {
                                ui.label(col.values[i].to_string());
                            });
                        }
                    });
                });
        });
    });
}
