use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Shades of one hue from light to dark, used for the hourly bars.
pub fn blues(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.5 };
            let hsl = Hsl::new(210.0, 0.7, 0.8 - 0.45 * t);
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
// Segment label → Color32
// ---------------------------------------------------------------------------

/// Stable colour per segment so charts and the filter list agree.
#[derive(Debug, Clone, Default)]
pub struct SegmentPalette {
    mapping: BTreeMap<String, Color32>,
}

impl SegmentPalette {
    pub fn new<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let labels: Vec<&str> = segments.into_iter().collect();
        let mapping = labels
            .iter()
            .zip(generate_palette(labels.len()))
            .map(|(label, c)| (label.to_string(), c))
            .collect();
        SegmentPalette { mapping }
    }

    pub fn color_for(&self, segment: &str) -> Color32 {
        self.mapping.get(segment).copied().unwrap_or(Color32::GRAY)
    }
}
