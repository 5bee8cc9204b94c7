//! The token definition for the run query language.

/// A token is a single unit of a query, with its text and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The token text, with surrounding quotes stripped
    pub text: &'a str,
    /// Location of the literal source text, quotes included
    pub span: Span,
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of characters other than whitespace and `"`
    Bare,
    /// A `"quoted phrase"`
    Quoted,
}

impl<'a> Token<'a> {
    /// The literal source text of this token, as it appears in `source`.
    pub fn literal<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.start..self.span.end]
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
