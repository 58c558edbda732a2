//! SVG length and `viewBox` resolution to whole pixels.
//!
//! Conversions assume 96 DPI and a 16px base font, which is what browsers use for Mermaid
//! output in practice. Anything that cannot be resolved comes back as `None`, never as zero.

use crate::dom::{self, Element};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    None,
    Px,
    Pt,
    Em,
    Ex,
    In,
    Cm,
    Mm,
    Pc,
    Percent,
}

impl LengthUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix.to_ascii_lowercase().as_str() {
            "" => Self::None,
            "px" => Self::Px,
            "pt" => Self::Pt,
            "em" => Self::Em,
            "ex" => Self::Ex,
            "in" => Self::In,
            "cm" => Self::Cm,
            "mm" => Self::Mm,
            "pc" => Self::Pc,
            "%" => Self::Percent,
            _ => return None,
        })
    }

    /// Pixels per unit, or `None` for percentages (they need a container to resolve).
    pub fn px_per_unit(self) -> Option<f64> {
        match self {
            Self::None | Self::Px => Some(1.0),
            Self::Pt => Some(96.0 / 72.0),
            Self::In => Some(96.0),
            Self::Cm => Some(96.0 / 2.54),
            Self::Mm => Some(96.0 / 25.4),
            Self::Pc => Some(96.0 / 6.0),
            Self::Em => Some(16.0),
            Self::Ex => Some(8.0),
            Self::Percent => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub number: f64,
    pub unit: LengthUnit,
}

fn re_length() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| {
        Regex::new(r"(?i)^([+-]?(?:\d+\.?\d*|\.\d+))(%|px|pt|em|ex|in|cm|mm|pc)?$")
            .expect("valid length regex")
    })
}

fn re_viewbox_separator() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"[\s,]+").expect("valid viewBox separator regex"))
}

impl Length {
    /// Parses `<number><unit>?`, e.g. `12`, `-1.5em`, `.5IN`, `100%`. No exponents.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = re_length().captures(raw.trim())?;
        let number = caps.get(1)?.as_str().parse::<f64>().ok()?;
        let unit = LengthUnit::from_suffix(caps.get(2).map_or("", |m| m.as_str()))?;
        Some(Self { number, unit })
    }

    pub fn to_px(self) -> Option<i64> {
        Some(round_px(self.number * self.unit.px_per_unit()?))
    }
}

/// Parses an SVG length and converts it to whole pixels.
pub fn parse_svg_length(raw: &str) -> Option<i64> {
    Length::parse(raw)?.to_px()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Parses `min-x min-y width height`, separated by whitespace and/or commas.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = re_viewbox_separator().split(raw.trim()).collect();
        let [min_x, min_y, width, height] = parts.as_slice() else {
            return None;
        };
        let num = |s: &str| s.parse::<f64>().ok().filter(|v| v.is_finite());
        Some(Self {
            min_x: num(*min_x)?,
            min_y: num(*min_y)?,
            width: num(*width)?,
            height: num(*height)?,
        })
    }

    pub fn size_px(&self) -> (i64, i64) {
        (round_px(self.width), round_px(self.height))
    }
}

/// Width and height of a `viewBox` value in whole pixels; `(None, None)` if it does not parse.
pub fn parse_viewbox(raw: &str) -> (Option<i64>, Option<i64>) {
    match ViewBox::parse(raw) {
        Some(vb) => {
            let (w, h) = vb.size_px();
            (Some(w), Some(h))
        }
        None => (None, None),
    }
}

/// Resolves the pixel size of an `<svg>` root from `width`/`height`, falling back to the
/// `viewBox` for whichever side is missing or unresolvable.
pub fn resolve_dimensions(root: &Element) -> (Option<i64>, Option<i64>) {
    if root.local_name() != "svg" {
        return (None, None);
    }

    let length_attr = |name: &str| {
        root.attribute(name)
            .filter(|v| !v.is_empty())
            .and_then(parse_svg_length)
    };
    let mut width = length_attr("width");
    let mut height = length_attr("height");

    if width.is_none() || height.is_none() {
        if let Some(viewbox) = root.attribute("viewBox").filter(|v| !v.is_empty()) {
            let (vb_width, vb_height) = parse_viewbox(viewbox);
            width = width.or(vb_width);
            height = height.or(vb_height);
        }
    }

    (width, height)
}

/// Pixel size of in-memory SVG data. Parse failures are logged and yield `(None, None)`.
pub fn svg_dimensions_from_bytes(data: &[u8]) -> (Option<i64>, Option<i64>) {
    let root = match std::str::from_utf8(data)
        .map_err(crate::Error::from)
        .and_then(dom::parse)
    {
        Ok(root) => root,
        Err(err) => {
            tracing::warn!(error = %err, "failed to parse SVG data");
            return (None, None);
        }
    };
    resolve_dimensions(&root)
}

/// Pixel size of an SVG file. I/O and parse failures are logged and yield `(None, None)`.
pub fn svg_dimensions(path: &Path) -> (Option<i64>, Option<i64>) {
    let root = match std::fs::read_to_string(path)
        .map_err(crate::Error::from)
        .and_then(|text| dom::parse(&text))
    {
        Ok(root) => root,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to parse SVG file");
            return (None, None);
        }
    };

    let dims = resolve_dimensions(&root);
    if dims == (None, None) && root.local_name() != "svg" {
        tracing::warn!(path = %path.display(), "SVG file does not have an <svg> root element");
    }
    dims
}

/// Rounds half to even, matching the rounding the dimension values were tuned against.
fn round_px(v: f64) -> i64 {
    v.round_ties_even() as i64
}
