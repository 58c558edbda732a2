#![forbid(unsafe_code)]

//! Post-processing for SVG diagrams rendered by Mermaid, so they display in Confluence.
//!
//! Two independent repairs:
//! - [`fix_svg_dimensions`] replaces Mermaid's `width="100%"` with pixel sizes from the
//!   `viewBox`, rewriting only the root opening tag.
//! - [`convert_foreign_object_to_text`] replaces `<foreignObject>` HTML labels with native
//!   `<text>`/`<tspan>` elements, wrapped and centered by estimated text width.
//!
//! Every transform is total: when a repair does not apply or fails, the input bytes come back
//! unchanged and the reason is logged through `tracing`.

pub mod dimensions;
pub mod dom;
pub mod error;
pub mod foreign_object;
pub mod geometry;
pub mod mermaid;
pub mod text;

pub use dimensions::fix_svg_dimensions;
pub use error::{Error, Result};
pub use foreign_object::{
    ForeignIsland, convert_foreign_object_to_text, convert_foreign_object_to_text_with,
};
pub use geometry::{
    Length, LengthUnit, ViewBox, parse_svg_length, parse_viewbox, resolve_dimensions,
    svg_dimensions, svg_dimensions_from_bytes,
};
pub use mermaid::{MermaidConfigProperties, OutputFormat, render_diagram, render_diagram_fixed};
pub use text::TextOptions;

/// Runs both repairs with default text styling: dimensions first, then labels.
pub fn fix_svg(data: &[u8]) -> Vec<u8> {
    fix_svg_with(data, &TextOptions::default())
}

pub fn fix_svg_with(data: &[u8], options: &TextOptions) -> Vec<u8> {
    let sized = fix_svg_dimensions(data);
    convert_foreign_object_to_text_with(&sized, options).into_owned()
}
