//! Append-only tagged transcript buffer.
//!
//! egui has no rich-text document with addressable ranges, so the buffer owns
//! the transcript text plus its tag spans and the GUI paints from `blocks()`.
//! Targeted removal works the way a rich-text widget would: literal substring
//! search producing byte ranges, then range deletes. Any delete invalidates
//! ranges from an earlier `find_all`, so callers delete in reverse order.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    User,
    Assistant,
    Thinking,
    Error,
    System,
    SearchResults,
    Time,
}

#[derive(Debug, Clone)]
struct Span {
    range: Range<usize>,
    tag: Tag,
}

#[derive(Debug, Default)]
pub struct Transcript {
    text: String,
    spans: Vec<Span>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block of text under `tag`. Never mutates earlier content.
    pub fn render(&mut self, tag: Tag, text: &str) {
        if text.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(text);
        self.spans.push(Span {
            range: start..self.text.len(),
            tag,
        });
    }

    /// Ordered byte ranges of every case-insensitive occurrence of a literal
    /// ASCII pattern.
    pub fn find_all(&self, pattern: &str) -> Vec<Range<usize>> {
        let mut out = Vec::new();
        let n = self.text.len();
        let m = pattern.len();
        if m == 0 || m > n {
            return out;
        }
        let hay = self.text.as_bytes();
        let needle = pattern.as_bytes();
        let mut i = 0;
        while i + m <= n {
            if self.text.is_char_boundary(i)
                && self.text.is_char_boundary(i + m)
                && hay[i..i + m].eq_ignore_ascii_case(needle)
            {
                out.push(i..i + m);
                i += m;
            } else {
                i += 1;
            }
        }
        out
    }

    /// Remove exactly `range`, shifting later spans left and clamping any
    /// span that overlaps the removed region.
    pub fn delete(&mut self, range: Range<usize>) {
        let removed = range.len();
        if removed == 0 {
            return;
        }
        self.text.replace_range(range.clone(), "");
        let adjust = |p: usize| {
            if p <= range.start {
                p
            } else if p >= range.end {
                p - removed
            } else {
                range.start
            }
        };
        for span in &mut self.spans {
            span.range = adjust(span.range.start)..adjust(span.range.end);
        }
        self.spans.retain(|s| !s.range.is_empty());
    }

    /// Ordered tagged blocks for painting.
    pub fn blocks(&self) -> impl Iterator<Item = (Tag, &str)> {
        self.spans.iter().map(|s| (s.tag, &self.text[s.range.clone()]))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.spans.clear();
    }
}
