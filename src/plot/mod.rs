//! PNG figures rendered with Plotters' bitmap backend.
//!
//! - `timeseries`: the three-panel analysis figure
//! - `waterfall`: the two side-by-side waterfall scenarios
//!
//! Layout math (bar extents, connector levels, label positions) is computed
//! outside the drawing code so it can be tested without a font stack.

pub mod timeseries;
pub mod waterfall;

pub use timeseries::*;
pub use waterfall::*;

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::AppError;

/// Named colours used by the figures.
pub mod palette {
    use plotters::style::RGBColor;

    pub const LIGHT_GRAY: RGBColor = RGBColor(211, 211, 211);
    pub const GRAY: RGBColor = RGBColor(128, 128, 128);
    pub const BLUE: RGBColor = RGBColor(0, 0, 255);
    pub const DARK_BLUE: RGBColor = RGBColor(0, 0, 139);
    pub const NAVY: RGBColor = RGBColor(0, 0, 128);
    pub const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
    pub const CORNFLOWER_BLUE: RGBColor = RGBColor(100, 149, 237);
    pub const ROYAL_BLUE: RGBColor = RGBColor(65, 105, 225);
    pub const LIGHT_SKY_BLUE: RGBColor = RGBColor(135, 206, 250);
    pub const ORANGE: RGBColor = RGBColor(255, 165, 0);
    pub const PEACH_PUFF: RGBColor = RGBColor(255, 218, 185);
    pub const GREEN: RGBColor = RGBColor(0, 128, 0);
    pub const DARK_GREEN: RGBColor = RGBColor(0, 100, 0);
    pub const FOREST_GREEN: RGBColor = RGBColor(34, 139, 34);
    pub const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
    pub const RED: RGBColor = RGBColor(255, 0, 0);
    pub const DARK_RED: RGBColor = RGBColor(139, 0, 0);
    pub const MAROON: RGBColor = RGBColor(128, 0, 0);
    pub const LIGHT_CORAL: RGBColor = RGBColor(240, 128, 128);
    pub const SALMON: RGBColor = RGBColor(250, 128, 114);
    pub const INDIAN_RED: RGBColor = RGBColor(205, 92, 92);
    pub const PURPLE: RGBColor = RGBColor(128, 0, 128);
    pub const LIGHT_YELLOW: RGBColor = RGBColor(255, 255, 224);
}

/// Pixel size of a figure given in inches.
pub fn figure_size(width_in: f64, height_in: f64, dpi: u32) -> (u32, u32) {
    (
        (width_in * dpi as f64).round() as u32,
        (height_in * dpi as f64).round() as u32,
    )
}

/// Points to pixels at `dpi`.
pub fn pt(size: f64, dpi: u32) -> f64 {
    size * dpi as f64 / 72.0
}

/// Split the segment `from -> to` into dashes of `dash` length separated by `gap`,
/// both in data units along the segment.
pub fn dash_segments(from: (f64, f64), to: (f64, f64), dash: f64, gap: f64) -> Vec<[(f64, f64); 2]> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = (dx * dx + dy * dy).sqrt();
    if !(len > 0.0) || !(dash > 0.0) {
        return Vec::new();
    }
    let (ux, uy) = (dx / len, dy / len);
    let mut out = Vec::new();
    let mut s = 0.0;
    while s < len {
        let e = (s + dash).min(len);
        out.push([(from.0 + ux * s, from.1 + uy * s), (from.0 + ux * e, from.1 + uy * e)]);
        s = e + gap;
    }
    out
}

/// Open a white bitmap canvas at `path`.
pub(crate) fn canvas(path: &Path, size: (u32, u32)) -> Result<DrawingArea<BitMapBackend<'_>, Shift>, Box<dyn Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    Ok(root)
}

/// Map a drawing failure to an output error naming the file.
pub(crate) fn render_error(path: &Path, err: Box<dyn Error>) -> AppError {
    AppError::io(format!("Failed to render {}: {err}", path.display()))
}
