use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use spectral_fit::fit::schedule::Axis;

use crate::state::{AppState, Role};

// ---------------------------------------------------------------------------
// Left side panel – range, results and pass trace
// ---------------------------------------------------------------------------

/// Render the left fit panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Fit");
    ui.separator();

    ui.checkbox(&mut state.use_range, "Restrict range");
    ui.add_enabled_ui(state.use_range, |ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            ui.label("from");
            ui.add(egui::TextEdit::singleline(&mut state.range_lower).desired_width(60.0));
            ui.label("to");
            ui.add(egui::TextEdit::singleline(&mut state.range_upper).desired_width(60.0));
        });
    });
    ui.separator();

    schedule_summary(ui, state);
    ui.separator();

    let Some(outcome) = &state.outcome else {
        ui.label("No fit yet.");
        return;
    };

    ui.strong("Result");
    egui::Grid::new("fit_result")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            ui.label("Shift");
            ui.label(format!("{:.4}", outcome.shift));
            ui.end_row();
            ui.label("Scale");
            ui.label(format!("{:.4}", outcome.scale));
            ui.end_row();
            ui.label("Rf");
            ui.label(format!("{:.4} %", outcome.residual));
            ui.end_row();
            ui.label("Evaluations");
            ui.label(outcome.evaluations.to_string());
            ui.end_row();
        });
    ui.separator();

    ui.strong("Passes");
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(true)
        .columns(Column::auto().at_least(36.0), 5)
        .header(20.0, |mut header| {
            for title in ["Round", "Pass", "Shift", "Scale", "Rf %"] {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for record in &outcome.trace {
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        ui.label(record.round.to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{} {}", record.axis, record.step));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.3}", record.shift));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.3}", record.scale));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.4}", record.residual));
                    });
                });
            }
        });
}

fn schedule_summary(ui: &mut Ui, state: &AppState) {
    let schedule = &state.config.schedule;
    egui::CollapsingHeader::new(RichText::new(format!(
        "Schedule  ({} × {} passes)",
        schedule.rounds,
        schedule.passes.len()
    )))
    .id_salt("schedule")
    .default_open(false)
    .show(ui, |ui: &mut Ui| {
        for pass in &schedule.passes {
            ui.label(format!("{} step {}", pass.axis, pass.step));
        }
        let finest = |axis| match schedule.finest_step(axis) {
            Some(step) => step.to_string(),
            None => "-".to_string(),
        };
        ui.label(format!(
            "resolution: shift {}, scale {}",
            finest(Axis::Shift),
            finest(Axis::Scale)
        ));
        ui.label(format!("step cap: {}", state.config.max_steps));
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open expected…").clicked() {
                open_spectrum_dialog(state, Role::Expected);
                ui.close_menu();
            }
            if ui.button("Open observed…").clicked() {
                open_spectrum_dialog(state, Role::Observed);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Load schedule…").clicked() {
                open_config_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.outcome.is_some(), egui::Button::new("Export fitted…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if ui
            .add_enabled(state.can_fit(), egui::Button::new("Fit"))
            .clicked()
        {
            if let Err(e) = state.run_fit() {
                state.report_error(&e);
            }
        }

        ui.separator();

        for (label, loaded) in [("expected", &state.expected), ("observed", &state.observed)] {
            let text = match loaded {
                Some(l) => format!("{label}: {}", l.file_name()),
                None => format!("{label}: –"),
            };
            ui.label(text);
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_spectrum_dialog(state: &mut AppState, role: Role) {
    let title = match role {
        Role::Expected => "Open expected spectrum",
        Role::Observed => "Open observed spectrum",
    };
    let file = rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["csv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.load(role, &path) {
            state.report_error(&e);
        }
    }
}

fn open_config_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Load fit schedule")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match spectral_fit::FitConfig::load(&path) {
            Ok(config) => {
                log::info!("Loaded fit config from {}", path.display());
                state.set_config(config);
            }
            Err(e) => state.report_error(&e),
        }
    }
}

fn export_dialog(state: &mut AppState) {
    let Some(outcome) = &state.outcome else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Export fitted spectrum")
        .add_filter("CSV", &["csv"])
        .set_file_name("fitted.csv")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = spectral_fit::data::export::write_csv(&path, &outcome.spectrum) {
            state.report_error(&e);
        }
    }
}
