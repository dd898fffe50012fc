//! Positional character cursor
//!
//! [`Scanner`] walks a template one `char` at a time and keeps the 1-based
//! line/column of the next character. Both lexer layers share it so every
//! token and error points back into the original template text.

use super::ast::SourceLocation;

/// Character cursor with line/column bookkeeping. Never fails.
#[derive(Debug, Clone)]
pub struct Scanner {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Scanner {
    /// Returned by [`Scanner::next`] once the input is exhausted
    pub const END: char = '\0';

    pub fn new(input: &str) -> Self {
        Self::with_origin(input, SourceLocation::new(1, 1))
    }

    /// Scan `input` as if it started at `origin` in some enclosing text.
    /// Used for tag contents so inner tokens report template coordinates.
    pub fn with_origin(input: &str, origin: SourceLocation) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: origin.line,
            column: origin.column,
        }
    }

    /// Consume one character and return it with the location it occupied.
    /// Past the end this keeps returning [`Scanner::END`] at the final location.
    pub fn next(&mut self) -> (char, SourceLocation) {
        let loc = self.location();
        match self.advance() {
            Some(ch) => (ch, loc),
            None => (Self::END, loc),
        }
    }

    /// Advance to next character
    pub fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Advance over `n` characters
    pub fn skip(&mut self, n: usize) {
        for _ in 0..n {
            if self.advance().is_none() {
                break;
            }
        }
    }

    /// Peek at current character without consuming
    pub fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    pub fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Whether the unconsumed input begins with `pattern`
    pub fn starts_with(&self, pattern: &str) -> bool {
        let mut offset = 0;
        for expected in pattern.chars() {
            if self.peek_ahead(offset) != Some(expected) {
                return false;
            }
            offset += 1;
        }
        true
    }

    /// Check if at end of input
    pub fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Location of the next character to be consumed
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_lines_and_columns() {
        let mut scanner = Scanner::new("ab\nc");
        assert_eq!(scanner.next(), ('a', SourceLocation::new(1, 1)));
        assert_eq!(scanner.next(), ('b', SourceLocation::new(1, 2)));
        assert_eq!(scanner.next(), ('\n', SourceLocation::new(1, 3)));
        assert_eq!(scanner.next(), ('c', SourceLocation::new(2, 1)));
        assert_eq!(scanner.next(), (Scanner::END, SourceLocation::new(2, 2)));
        assert_eq!(scanner.next(), (Scanner::END, SourceLocation::new(2, 2)));
        assert!(scanner.is_at_end());
    }

    #[test]
    fn test_origin_offsets_positions() {
        let mut scanner = Scanner::with_origin("x", SourceLocation::new(4, 10));
        assert_eq!(scanner.next(), ('x', SourceLocation::new(4, 10)));
    }

    #[test]
    fn test_starts_with() {
        let scanner = Scanner::new("{% if %}");
        assert!(scanner.starts_with("{%"));
        assert!(!scanner.starts_with("{{"));
        assert!(!Scanner::new("{").starts_with("{%"));
    }
}
