//! Token definitions for OML highlighting
#![allow(dead_code)]

use serde::Serialize;

use crate::utils::Span;

/// A classified span produced by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    /// The source text covered by this token, given the text it was scanned
    /// from and the offset that text started at.
    pub fn text<'a>(&self, source: &'a str, base: usize) -> &'a str {
        &source[self.span.start - base..self.span.end - base]
    }
}

/// Token kinds
///
/// `Null` doubles as the resting scanner state: no token open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TokenKind {
    #[default]
    Null,
    Whitespace,
    Identifier,
    /// funk, vrat, pro, ...
    ReservedWord,
    /// celocislo, pole, ...
    DataType,
    /// vytiskni, vytisknird
    Function,
    /// "..." (no escapes)
    StringLiteral,
    IntegerLiteral,
    /// # to end of line
    LineComment,
}

impl TokenKind {
    /// Kinds the scanner can be left in between calls.
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            TokenKind::Null
                | TokenKind::Whitespace
                | TokenKind::Identifier
                | TokenKind::IntegerLiteral
                | TokenKind::LineComment
                | TokenKind::StringLiteral
        )
    }

    /// Kinds that only come out of a keyword table lookup
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::ReservedWord | TokenKind::DataType | TokenKind::Function
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Null => "null",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Identifier => "identifier",
            TokenKind::ReservedWord => "reserved-word",
            TokenKind::DataType => "data-type",
            TokenKind::Function => "function",
            TokenKind::StringLiteral => "string",
            TokenKind::IntegerLiteral => "integer",
            TokenKind::LineComment => "comment",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resumable_kinds() {
        assert!(TokenKind::StringLiteral.is_resumable());
        assert!(TokenKind::Null.is_resumable());
        assert!(!TokenKind::ReservedWord.is_resumable());
        assert!(!TokenKind::Function.is_resumable());
    }

    #[test]
    fn test_token_text() {
        let token = Token::new(TokenKind::Identifier, Span::new(12, 15));
        assert_eq!(token.text("ab abc", 9), "abc");
    }
}
