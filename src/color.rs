use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` colours with evenly spaced hues at the given lightness.
pub fn generate_palette(n: usize, lightness: f32) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0 + 210.0;
            let hsl = Hsl::new(hue, 0.75, lightness);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Plot series colours
// ---------------------------------------------------------------------------

/// One colour per plotted curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesColors {
    pub observed: Color32,
    pub expected: Color32,
    pub fitted: Color32,
}

impl Default for SeriesColors {
    fn default() -> Self {
        let bright = generate_palette(3, 0.55);
        let dim = generate_palette(3, 0.35);
        SeriesColors {
            observed: bright[0],
            // Same hue as the fit, darker: the unfitted curve sits behind it.
            expected: dim[1],
            fitted: bright[1],
        }
    }
}
