use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, VLine};
use spectral_fit::Table;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Alignment plot (central panel)
// ---------------------------------------------------------------------------

/// Points of the first intensity column.
fn curve(table: &Table) -> PlotPoints<'_> {
    table.rows().iter().map(|r| [r[0], r[1]]).collect()
}

/// Render observed, expected and fitted curves on one plot.
pub fn alignment_plot(ui: &mut Ui, state: &AppState) {
    if state.expected.is_none() && state.observed.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open an expected and an observed spectrum  (File → Open…)");
        });
        return;
    }

    let colors = state.colors;
    // An unusable range just isn't drawn; the error surfaces when fitting.
    let range = state.range().ok().flatten();

    Plot::new("alignment_plot")
        .legend(Legend::default())
        .x_axis_label("Energy")
        .y_axis_label("Intensity")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            if let Some(observed) = &state.observed {
                plot_ui.line(
                    Line::new(curve(observed.spectrum.current_table()))
                        .name(format!("observed ({})", observed.file_name()))
                        .color(colors.observed)
                        .width(1.5),
                );
            }

            if let Some(expected) = &state.expected {
                plot_ui.line(
                    Line::new(curve(expected.spectrum.baseline_table()))
                        .name(format!("expected ({})", expected.file_name()))
                        .color(colors.expected)
                        .width(1.0),
                );
            }

            if let Some(outcome) = &state.outcome {
                plot_ui.line(
                    Line::new(curve(outcome.spectrum.current_table()))
                        .name(format!(
                            "fitted (shift {:.2}, ×{:.2}, Rf {:.2}%)",
                            outcome.shift, outcome.scale, outcome.residual
                        ))
                        .color(colors.fitted)
                        .width(2.0),
                );
            }

            if let Some(range) = range {
                for x in [range.lower(), range.upper()] {
                    plot_ui.vline(VLine::new(x).color(Color32::GRAY).name("range"));
                }
            }
        });
}
