use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
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
// Color mapping: region → Color32
// ---------------------------------------------------------------------------

/// Maps every region label to a distinct colour.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Colours are assigned in sorted label order, so the same set of regions
    /// always gets the same colours.
    pub fn new(regions: &BTreeSet<String>) -> Self {
        let palette = generate_palette(regions.len());
        ColorMap {
            mapping: regions.iter().cloned().zip(palette).collect(),
        }
    }

    /// Colour for a region; points without one are light blue.
    pub fn color_for(&self, region: Option<&str>) -> Color32 {
        region
            .and_then(|r| self.mapping.get(r))
            .copied()
            .unwrap_or(Color32::LIGHT_BLUE)
    }
}
