// Character spans and edit bookkeeping over a code-point text buffer.
//
// All offsets are code-point (char) indices into a `&[char]` buffer. Nothing
// here panics on malformed input: invalid spans produce `false` or `None` and
// the caller decides what to drop.

use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` range of char offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span of `len` chars beginning at `start`.
    pub fn at(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start.saturating_add(len),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Half-open overlap test: `a.start < b.end && b.start < a.end`.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the span is non-empty and lies within a buffer of `text_len` chars.
    pub fn fits(&self, text_len: usize) -> bool {
        self.start < self.end && self.end <= text_len
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// TextEdit
// ---------------------------------------------------------------------------

/// One contiguous edit: `[start, end)` of the old text was replaced by
/// `inserted_len` chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub inserted_len: usize,
}

impl TextEdit {
    pub fn new(start: usize, end: usize, inserted_len: usize) -> Self {
        Self {
            start,
            end,
            inserted_len,
        }
    }

    /// The edit produced by replacing `span` with `replacement`.
    pub fn replacing(span: Span, replacement: &str) -> Self {
        Self {
            start: span.start,
            end: span.end,
            inserted_len: replacement.chars().count(),
        }
    }

    /// Describe the change from `old` to `new` as a single edit using the
    /// common-prefix / common-suffix heuristic.
    ///
    /// Returns `None` when the texts are identical. The suffix never overlaps
    /// the prefix, so for `"aa" -> "aaa"` the edit is an insertion at 2.
    pub fn between(old: &[char], new: &[char]) -> Option<Self> {
        if old == new {
            return None;
        }

        let prefix = old
            .iter()
            .zip(new.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let max_suffix = old.len().min(new.len()) - prefix;
        let suffix = old[prefix..]
            .iter()
            .rev()
            .zip(new[prefix..].iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        Some(Self {
            start: prefix,
            end: old.len() - suffix,
            inserted_len: new.len() - prefix - suffix,
        })
    }

    /// Number of chars removed from the old text.
    pub fn removed_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

// ---------------------------------------------------------------------------
// Offset index functions
// ---------------------------------------------------------------------------

/// `true` iff `span` lies inside `text` and slices exactly to `expected`.
pub fn is_valid(text: &[char], span: Span, expected: &str) -> bool {
    if !span.fits(text.len()) {
        return false;
    }
    let mut expected_chars = expected.chars();
    for &ch in &text[span.start..span.end] {
        if expected_chars.next() != Some(ch) {
            return false;
        }
    }
    expected_chars.next().is_none()
}

/// Re-anchor `span` after `edit` was applied to the text it points into.
///
/// - entirely before the edit: unchanged
/// - entirely at or after the edited range: shifted by the length delta
/// - any overlap with the edited range (including an insertion strictly
///   inside the span): `None`
pub fn shift(span: Span, edit: &TextEdit) -> Option<Span> {
    if span.end <= edit.start {
        return Some(span);
    }
    if span.start >= edit.end {
        // start >= edit.end, so none of these subtractions can underflow.
        let start = span.start - edit.end + edit.start + edit.inserted_len;
        let end = span.end - edit.end + edit.start + edit.inserted_len;
        return Some(Span { start, end });
    }
    None
}

/// Collect the chars covered by `span` into a `String`, or `None` if the
/// span does not fit the buffer.
pub fn slice(text: &[char], span: Span) -> Option<String> {
    if !span.fits(text.len()) {
        return None;
    }
    Some(text[span.start..span.end].iter().collect())
}

/// Replace `span` in `text` with `replacement`. Returns the applied edit, or
/// `None` (leaving `text` untouched) when the span does not fit.
pub fn splice(text: &mut Vec<char>, span: Span, replacement: &str) -> Option<TextEdit> {
    if span.start > span.end || span.end > text.len() {
        return None;
    }
    let edit = TextEdit::replacing(span, replacement);
    text.splice(span.start..span.end, replacement.chars());
    Some(edit)
}

/// Convert a byte offset into `s` to a char offset. Offsets inside a
/// multi-byte char round down to that char.
pub fn byte_to_char_offset(s: &str, byte_offset: usize) -> usize {
    s.char_indices()
        .take_while(|(i, _)| *i < byte_offset)
        .count()
}
