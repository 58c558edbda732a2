//! Plain-text line extraction from `<foreignObject>` HTML content.

use crate::dom::Element;

/// Collects the text lines of an HTML-ish subtree in document order.
///
/// Lines break at `<br>` elements (any namespace, any case), at newline characters, and at the
/// two-character sequence `\n` that Mermaid leaves in some labels. Lines are trimmed and empty
/// lines are dropped.
pub fn extract_text_lines(element: &Element) -> Vec<String> {
    let mut collector = LineCollector::default();
    collector.visit(element);
    collector.flush();
    collector.lines
}

#[derive(Debug, Default)]
struct LineCollector {
    lines: Vec<String>,
    current: String,
}

impl LineCollector {
    fn flush(&mut self) {
        let line = self.current.trim();
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
    }

    fn push_text(&mut self, text: &str) {
        let mut segments = text.split('\n').flat_map(|part| part.split("\\n"));
        if let Some(first) = segments.next() {
            self.current.push_str(first);
        }
        for segment in segments {
            self.flush();
            self.current.push_str(segment);
        }
    }

    fn visit(&mut self, el: &Element) {
        if !el.is_element() {
            return;
        }
        if el.local_name().eq_ignore_ascii_case("br") {
            self.flush();
            return;
        }

        if let Some(text) = el.text.as_deref() {
            self.push_text(text);
        }
        for child in &el.children {
            self.visit(child);
            if let Some(tail) = child.tail.as_deref() {
                self.push_text(tail);
            }
        }
    }
}
