//! Converts `<foreignObject>` HTML labels into native SVG `<text>`.
//!
//! Mermaid renders labels of ER, class and some flowchart diagrams as XHTML inside
//! `<foreignObject>`. Confluence does not render that content, so each island is replaced by a
//! `<text>` element centered in the island's box, with the label wrapped into `<tspan>` lines by
//! estimated width.

use crate::dom::{self, Element, QName};
use crate::text::{TextOptions, VerticalPlacement, extract_text_lines, wrap_text};
use crate::{Error, Result};
use std::borrow::Cow;

/// The text content and box of one `<foreignObject>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignIsland {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub lines: Vec<String>,
}

impl ForeignIsland {
    /// Reads an island, or `None` when it holds no text.
    ///
    /// Missing geometry attributes default to 0; present ones must be numbers.
    pub fn from_element(el: &Element) -> Result<Option<Self>> {
        let lines = extract_text_lines(el);
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            x: number_attribute(el, "x")?,
            y: number_attribute(el, "y")?,
            width: number_attribute(el, "width")?,
            height: number_attribute(el, "height")?,
            lines,
        }))
    }

    /// Lines as rendered: every extracted line wrapped to the island width.
    pub fn wrapped_lines(&self, options: &TextOptions) -> Vec<String> {
        let max_width = if self.width > 0.0 {
            self.width * options.wrap_ratio
        } else {
            0.0
        };
        self.lines
            .iter()
            .flat_map(|line| wrap_text(line, max_width, options.font_size))
            .collect()
    }

    /// Builds the `<text>` element that replaces this island.
    pub fn to_text_element(&self, options: &TextOptions) -> Element {
        let lines = self.wrapped_lines(options);
        let center_x = fmt_number(self.x + self.width / 2.0);

        let mut text = Element::new(QName::svg("text"));
        text.set_attribute("x", center_x.clone());
        text.set_attribute("text-anchor", "middle");
        text.set_attribute(
            "style",
            format!(
                "font-family: {}; font-size: {}px; fill: {};",
                options.font_family,
                fmt_number(options.font_size),
                options.fill
            ),
        );

        let placement =
            VerticalPlacement::centered(lines.len(), self.y, self.height, options.line_height());
        match placement {
            VerticalPlacement::Middle { y } => {
                text.set_attribute("y", fmt_number(y));
                text.set_attribute("dominant-baseline", "middle");
                text.text = lines.into_iter().next();
            }
            VerticalPlacement::Stacked { .. } => {
                for (i, line) in lines.into_iter().enumerate() {
                    let mut tspan = Element::new(QName::svg("tspan"));
                    tspan.set_attribute("x", center_x.clone());
                    tspan.set_attribute("y", fmt_number(placement.baseline(i)));
                    tspan.text = Some(line);
                    text.children.push(tspan);
                }
            }
        }
        text
    }
}

/// Replaces every text-bearing `<foreignObject>` with native SVG text, using default styling.
///
/// Documents without islands come back untouched (borrowed). Any failure is logged and also
/// yields the input unchanged.
pub fn convert_foreign_object_to_text(data: &[u8]) -> Cow<'_, [u8]> {
    convert_foreign_object_to_text_with(data, &TextOptions::default())
}

pub fn convert_foreign_object_to_text_with<'a>(
    data: &'a [u8],
    options: &TextOptions,
) -> Cow<'a, [u8]> {
    match try_convert(data, options) {
        Ok(Some(converted)) => Cow::Owned(converted.into_bytes()),
        Ok(None) => Cow::Borrowed(data),
        Err(err) => {
            tracing::warn!(error = %err, "error converting foreignObject to text");
            Cow::Borrowed(data)
        }
    }
}

fn try_convert(data: &[u8], options: &TextOptions) -> Result<Option<String>> {
    let text = std::str::from_utf8(data)?;
    let mut root = dom::parse(text)?;

    if !root.any_descendant(&is_foreign_object) {
        return Ok(None);
    }

    let converted = replace_islands(&mut root, options)?;
    tracing::debug!(converted, "replaced foreignObject islands");
    if converted == 0 {
        return Ok(None);
    }
    Ok(Some(root.to_xml_string()))
}

/// Swaps islands for text in document order; returns how many were replaced.
fn replace_islands(parent: &mut Element, options: &TextOptions) -> Result<usize> {
    let mut converted = 0;
    for child in &mut parent.children {
        if is_foreign_object(child) {
            if let Some(island) = ForeignIsland::from_element(child)? {
                let mut text = island.to_text_element(options);
                text.tail = child.tail.take();
                *child = text;
                converted += 1;
                continue;
            }
            tracing::debug!("foreignObject has no text; leaving it in place");
        }
        converted += replace_islands(child, options)?;
    }
    Ok(converted)
}

fn is_foreign_object(el: &Element) -> bool {
    el.name == QName::svg("foreignObject")
}

fn number_attribute(el: &Element, name: &str) -> Result<f64> {
    let Some(raw) = el.attribute(name) else {
        return Ok(0.0);
    };
    raw.trim().parse().map_err(|_| Error::InvalidNumber {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

/// Formats a number the way JavaScript prints it (`60`, not `60.0`).
pub(crate) fn fmt_number(mut v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    if v == -0.0 {
        v = 0.0;
    }
    ryu_js::Buffer::new().format_finite(v).to_string()
}
