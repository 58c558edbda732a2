//! Replaces Mermaid's `width="100%"` sizing with explicit pixel dimensions.
//!
//! Only the root opening tag is rewritten. The document is parsed to compute the replacement
//! tag, but the output is the original text with that one tag spliced in, so everything else
//! stays byte-for-byte identical.

use crate::dom;
use crate::geometry::{ViewBox, parse_svg_length};
use crate::Result;
use std::borrow::Cow;

/// The relative size Mermaid puts on the root `<svg>`.
pub const PERCENT_SIZING: &str = "100%";

/// Sets explicit `width`/`height` on the root `<svg>` from its `viewBox`.
///
/// Returns the input unchanged when the width is already numeric, when there is no usable
/// `viewBox`, or when anything goes wrong (logged as a warning).
pub fn fix_svg_dimensions(data: &[u8]) -> Cow<'_, [u8]> {
    match try_fix_svg_dimensions(data) {
        Ok(Some(fixed)) => Cow::Owned(fixed.into_bytes()),
        Ok(None) => Cow::Borrowed(data),
        Err(err) => {
            tracing::warn!(error = %err, "unexpected error fixing SVG dimensions");
            Cow::Borrowed(data)
        }
    }
}

fn try_fix_svg_dimensions(data: &[u8]) -> Result<Option<String>> {
    let text = std::str::from_utf8(data)?;
    let dom::Document {
        mut root,
        root_start_tag,
    } = dom::parse_document(text)?;

    if !root.is_svg_root() {
        tracing::debug!(tag = %root.local_name(), "root element is not <svg>; leaving dimensions");
        return Ok(None);
    }

    if let Some(width) = root.attribute("width") {
        if width != PERCENT_SIZING && parse_svg_length(width).is_some() {
            tracing::debug!(width, "SVG already has a numeric width");
            return Ok(None);
        }
    }

    let Some(viewbox) = root.attribute("viewBox").filter(|v| !v.is_empty()) else {
        tracing::debug!("SVG has no viewBox; cannot derive dimensions");
        return Ok(None);
    };
    let Some(viewbox) = ViewBox::parse(viewbox) else {
        tracing::debug!(viewbox, "SVG viewBox does not parse; cannot derive dimensions");
        return Ok(None);
    };
    let (width, height) = viewbox.size_px();

    root.set_attribute("width", width.to_string());
    if matches!(root.attribute("height"), None | Some(PERCENT_SIZING)) {
        root.set_attribute("height", height.to_string());
    }
    strip_max_width(&mut root);

    let mut new_tag = root.opening_tag();
    if text[root_start_tag.clone()].ends_with("/>") {
        new_tag.insert(new_tag.len() - 1, '/');
    }
    let mut out = String::with_capacity(text.len() + new_tag.len());
    out.push_str(&text[..root_start_tag.start]);
    out.push_str(&new_tag);
    out.push_str(&text[root_start_tag.end..]);
    Ok(Some(out))
}

/// Drops `max-width` from the root `style`; it fights the explicit width in Confluence.
fn strip_max_width(root: &mut dom::Element) {
    let Some(style) = root.attribute("style").filter(|s| !s.is_empty()) else {
        return;
    };
    let cleaned = style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty() && !decl.starts_with("max-width"))
        .collect::<Vec<_>>()
        .join("; ");
    if cleaned.is_empty() {
        root.remove_attribute("style");
    } else {
        root.set_attribute("style", cleaned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MERMAID_ROOT: &str = r#"<svg id="mermaid-1a2b3c4d" width="100%" xmlns="http://www.w3.org/2000/svg" class="flowchart" style="max-width: 316.5px; background-color: transparent;" viewBox="-8 -8 316.5 150" role="graphics-document document" aria-roledescription="flowchart-v2" xmlns:xlink="http://www.w3.org/1999/xlink">"#;
    const MERMAID_BODY: &str = r#"<style>#mermaid-1a2b3c4d{font-size:16px;}</style><g><svg width="100%" viewBox="0 0 1 1"/><text x="4">a &amp; b</text></g></svg>"#;

    fn fix(input: &str) -> String {
        String::from_utf8(fix_svg_dimensions(input.as_bytes()).into_owned()).unwrap()
    }

    #[test]
    fn replaces_percent_width_from_viewbox() {
        let out = fix(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" viewBox="0 0 300 150"><g/></svg>"#,
        );
        assert_eq!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="300" viewBox="0 0 300 150" height="150"><g/></svg>"#
        );
    }

    #[test]
    fn rewrites_mermaid_root_tag_and_scrubs_max_width() {
        let input = format!("{MERMAID_ROOT}{MERMAID_BODY}");
        let out = fix(&input);
        assert_eq!(
            out,
            format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" id="mermaid-1a2b3c4d" width="316" class="flowchart" style="background-color: transparent" viewBox="-8 -8 316.5 150" role="graphics-document document" aria-roledescription="flowchart-v2" height="150">{MERMAID_BODY}"#
            )
        );
    }

    #[test]
    fn only_the_first_svg_tag_is_replaced() {
        let input = format!("{MERMAID_ROOT}{MERMAID_BODY}");
        let out = fix(&input);
        assert!(out.ends_with(MERMAID_BODY));
        assert_eq!(out.matches(r#"<svg width="100%" viewBox="0 0 1 1"/>"#).count(), 1);
    }

    #[test]
    fn fixing_twice_is_the_same_as_once() {
        let input = format!("{MERMAID_ROOT}{MERMAID_BODY}");
        let once = fix(&input);
        let twice = fix_svg_dimensions(once.as_bytes());
        assert!(matches!(twice, Cow::Borrowed(_)));
        assert_eq!(twice.as_ref(), once.as_bytes());
    }

    #[test]
    fn keeps_numeric_height() {
        let out = fix(r#"<svg width="100%" height="80" viewBox="0 0 300 150"></svg>"#);
        assert_eq!(out, r#"<svg width="300" height="80" viewBox="0 0 300 150"></svg>"#);
    }

    #[test]
    fn replaces_percent_height_too() {
        let out = fix(r#"<svg width="100%" height="100%" viewBox="0 0 300 150"></svg>"#);
        assert_eq!(out, r#"<svg width="300" height="150" viewBox="0 0 300 150"></svg>"#);
    }

    #[test]
    fn fixes_non_numeric_and_missing_width() {
        let out = fix(r#"<svg width="auto" viewBox="0 0 20 10"></svg>"#);
        assert_eq!(out, r#"<svg width="20" viewBox="0 0 20 10" height="10"></svg>"#);

        let out = fix(r#"<svg viewBox="0 0 20 10"></svg>"#);
        assert_eq!(out, r#"<svg viewBox="0 0 20 10" width="20" height="10"></svg>"#);
    }

    #[test]
    fn keeps_self_closing_root_self_closed() {
        let out = fix(r#"<svg width="100%" viewBox="0 0 20 10"/>"#);
        assert_eq!(out, r#"<svg width="20" viewBox="0 0 20 10" height="10"/>"#);
    }

    #[test]
    fn removes_style_left_empty() {
        let out = fix(r#"<svg width="100%" style="max-width: 20px;" viewBox="0 0 20 10"></svg>"#);
        assert_eq!(out, r#"<svg width="20" viewBox="0 0 20 10" height="10"></svg>"#);
    }

    #[test]
    fn preserves_xml_declaration_and_trailing_bytes() {
        let input = "<?xml version=\"1.0\"?>\n<!-- made by mermaid -->\n<svg width=\"100%\" viewBox=\"0 0 4 2\">\n  <g/>\n</svg>\n";
        let out = fix(input);
        assert_eq!(
            out,
            "<?xml version=\"1.0\"?>\n<!-- made by mermaid -->\n<svg width=\"4\" viewBox=\"0 0 4 2\" height=\"2\">\n  <g/>\n</svg>\n"
        );
    }

    #[test]
    fn svg_mentioned_in_a_prolog_comment_is_not_rewritten() {
        let out = fix(
            r#"<!-- <svg --><svg xmlns="http://www.w3.org/2000/svg" width="100%" viewBox="0 0 10 10"><g/></svg>"#,
        );
        assert_eq!(
            out,
            r#"<!-- <svg --><svg xmlns="http://www.w3.org/2000/svg" width="10" viewBox="0 0 10 10" height="10"><g/></svg>"#
        );
        assert!(dom::parse(&out).is_ok());
    }

    #[test]
    fn greater_than_inside_a_root_attribute_stays_in_the_tag() {
        let out = fix(r#"<svg aria-label="a>b" width="100%" viewBox="0 0 10 10"><g/></svg>"#);
        assert_eq!(
            out,
            r#"<svg aria-label="a&gt;b" width="10" viewBox="0 0 10 10" height="10"><g/></svg>"#
        );
        let root = dom::parse(&out).unwrap();
        assert_eq!(root.attribute("aria-label"), Some("a>b"));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.text, None);
    }

    #[test]
    fn leaves_input_alone_when_nothing_to_do() {
        for input in [
            r#"<svg width="120" viewBox="0 0 300 150"/>"#,
            r#"<svg width="2in"/>"#,
            r#"<svg width="100%"/>"#,
            r#"<svg width="100%" viewBox="0 0 300"/>"#,
            r#"<html width="100%" viewBox="0 0 300 150"/>"#,
            r#"<svg width="100%" viewBox="0 0 300 150"><g>"#,
            "",
        ] {
            let out = fix_svg_dimensions(input.as_bytes());
            assert!(matches!(out, Cow::Borrowed(_)), "changed: {input}");
        }
    }

    #[test]
    fn leaves_invalid_utf8_alone() {
        let input = b"<svg width=\"100%\" viewBox=\"0 0 1 1\">\xff</svg>";
        assert_eq!(fix_svg_dimensions(input).as_ref(), input.as_slice());
    }
}
