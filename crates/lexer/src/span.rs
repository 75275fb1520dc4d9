//! Source positions.

/// A region of the source text. Lines and columns are 1-based, offsets are bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    /// Line on which the region ends (differs from `line` for multi-line tokens).
    pub last_line: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize, last_line: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
            last_line,
        }
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
            last_line: other.last_line.max(self.last_line),
        }
    }

    /// The span covering `[first.start, last.end]` of a non-empty, ordered run of spans.
    pub fn covering<I: IntoIterator<Item = Span>>(spans: I) -> Option<Span> {
        let mut iter = spans.into_iter();
        let first = iter.next()?;
        Some(iter.fold(first, |acc, next| acc.to(&next)))
    }

    /// True when `next` starts exactly where `self` ends.
    pub fn is_adjacent_to(&self, next: &Span) -> bool {
        self.end == next.start
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or("")
    }
}
