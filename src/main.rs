mod app;
mod color;
mod state;
mod ui;

use std::path::Path;

use app::SpectralFitApp;
use eframe::egui;
use state::Role;

fn main() -> eframe::Result {
    env_logger::init();

    // `spectral-fit [expected observed]` preloads both spectra.
    let mut app = SpectralFitApp::default();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [expected, observed] = args.as_slice() {
        for (role, path) in [(Role::Expected, expected), (Role::Observed, observed)] {
            if let Err(e) = app.state.load(role, Path::new(path)) {
                app.state.report_error(&e);
            }
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Spectral Fit – Spectrum Alignment",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
