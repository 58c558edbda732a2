//! Font-metric-free text layout: width estimates, line wrapping and vertical placement.

mod extract;
mod wrap;

pub use extract::extract_text_lines;
pub use wrap::wrap_text;

use serde::{Deserialize, Serialize};

/// Average glyph advance as a fraction of the font size for common proportional fonts
/// (Trebuchet MS, Verdana, Arial).
pub const AVERAGE_CHAR_WIDTH_FACTOR: f64 = 0.6;

/// Approximate ascent-to-baseline offset as a fraction of the line pitch.
pub const BASELINE_FACTOR: f64 = 0.8;

/// Extra pixels added to the font size to get the line pitch.
pub const LINE_GAP_PX: f64 = 2.0;

/// Styling for text generated in place of `<foreignObject>` labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextOptions {
    pub font_size: f64,
    pub font_family: String,
    pub fill: String,
    /// Share of the label box width available to text; the rest is padding.
    pub wrap_ratio: f64,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            font_family: "trebuchet ms, verdana, arial, sans-serif".to_string(),
            fill: "#333".to_string(),
            wrap_ratio: 0.95,
        }
    }
}

impl TextOptions {
    pub fn line_height(&self) -> f64 {
        self.font_size + LINE_GAP_PX
    }
}

/// Estimated rendered width of `text` in pixels.
pub fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * AVERAGE_CHAR_WIDTH_FACTOR
}

/// Where the lines of a text block go vertically inside a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalPlacement {
    /// One line anchored with `dominant-baseline="middle"` at `y`.
    Middle { y: f64 },
    /// Several lines; line `i` sits on the baseline `first_baseline + i * pitch`.
    Stacked { first_baseline: f64, pitch: f64 },
}

impl VerticalPlacement {
    /// Centers `line_count` lines inside the box spanning `top..top + height`.
    pub fn centered(line_count: usize, top: f64, height: f64, line_height: f64) -> Self {
        if line_count == 1 {
            return Self::Middle {
                y: top + height / 2.0,
            };
        }
        let total = line_height * line_count as f64;
        Self::Stacked {
            first_baseline: top + (height - total) / 2.0 + line_height * BASELINE_FACTOR,
            pitch: line_height,
        }
    }

    pub fn baseline(&self, index: usize) -> f64 {
        match *self {
            Self::Middle { y } => y,
            Self::Stacked {
                first_baseline,
                pitch,
            } => first_baseline + index as f64 * pitch,
        }
    }
}
