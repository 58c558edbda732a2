//! Greedy word wrapping against estimated text widths.

use super::estimate_text_width;

/// Wraps `text` into lines no wider than `max_width_px` (by estimate).
///
/// Words are split on whitespace and never broken; a word wider than the limit gets a line of
/// its own. A non-positive limit, or text that already fits, yields the text unchanged.
pub fn wrap_text(text: &str, max_width_px: f64, font_size: f64) -> Vec<String> {
    if max_width_px <= 0.0 || estimate_text_width(text, font_size) <= max_width_px {
        return vec![text.to_string()];
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![text.to_string()];
    }

    let space_width = estimate_text_width(" ", font_size);
    let mut lines: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_width = 0.0;

    for word in words {
        let word_width = estimate_text_width(word, font_size);
        let gap = if current.is_empty() { 0.0 } else { space_width };
        let candidate_width = current_width + gap + word_width;

        if candidate_width <= max_width_px || current.is_empty() {
            current.push(word);
            current_width = candidate_width;
        } else {
            lines.push(current.join(" "));
            current = vec![word];
            current_width = word_width;
        }
    }

    if !current.is_empty() {
        lines.push(current.join(" "));
    }
    lines
}
