//! Incremental scanner for OML highlighting
//!
//! Classifies one line (or any segment) of editor text into token spans.
//! The scanner keeps no state between calls: whatever token was still open
//! at the end of the previous segment is passed back in as `start_state`.

use crate::syntax::keywords::KeywordTable;
use crate::syntax::token::{Token, TokenKind};
use crate::utils::Span;

/// Tokens for one scanned segment plus the state to resume from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub tokens: Vec<Token>,
    /// `Null` when the segment ended on a clean boundary
    pub end_state: TokenKind,
}

/// The scanner
pub struct Scanner<'k> {
    keywords: &'k KeywordTable,
}

impl<'k> Scanner<'k> {
    pub fn new(keywords: &'k KeywordTable) -> Self {
        Self { keywords }
    }

    /// Scan `text`, resuming from `start_state`. Emitted offsets are byte
    /// offsets shifted by `start_offset`.
    ///
    /// Total over all input: unknown characters become one-character
    /// identifiers.
    pub fn scan(&self, text: &str, start_state: TokenKind, start_offset: usize) -> Scan {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut out = Emitter {
            tokens: Vec::new(),
            base: start_offset,
        };

        let mut state = if start_state.is_resumable() {
            start_state
        } else {
            log::debug!("cannot resume from {}, scanning from null", start_state);
            TokenKind::Null
        };
        let mut token_start = 0;
        let mut i = 0;

        while i < chars.len() {
            let (pos, c) = chars[i];

            match state {
                TokenKind::Null => {
                    token_start = pos;
                    match opening_kind(c) {
                        Some(kind) => state = kind,
                        None => out.push(TokenKind::Identifier, pos, pos + c.len_utf8()),
                    }
                }

                TokenKind::Whitespace => {
                    if !is_blank(c) {
                        out.push(TokenKind::Whitespace, token_start, pos);
                        state = TokenKind::Null;
                        continue;
                    }
                }

                TokenKind::Identifier => {
                    if !is_word_char(c) {
                        let kind = self.keywords.classify(&text[token_start..pos]);
                        out.push(kind, token_start, pos);
                        state = TokenKind::Null;
                        continue;
                    }
                }

                TokenKind::IntegerLiteral => {
                    if !c.is_ascii_digit() {
                        out.push(TokenKind::IntegerLiteral, token_start, pos);
                        state = TokenKind::Null;
                        continue;
                    }
                }

                TokenKind::LineComment => {
                    out.push(TokenKind::LineComment, token_start, text.len());
                    state = TokenKind::Null;
                    break;
                }

                TokenKind::StringLiteral => {
                    if c == '"' {
                        out.push(TokenKind::StringLiteral, token_start, pos + 1);
                        state = TokenKind::Null;
                    }
                }

                // Keyword kinds are never scanner states
                _ => unreachable!("scanner entered {}", state),
            }

            i += 1;
        }

        // Flush whatever is still open
        let end_state = match state {
            TokenKind::Null => TokenKind::Null,
            TokenKind::StringLiteral => {
                out.push(TokenKind::StringLiteral, token_start, text.len());
                TokenKind::StringLiteral
            }
            TokenKind::Identifier => {
                let kind = self.keywords.classify(&text[token_start..]);
                out.push(kind, token_start, text.len());
                TokenKind::Null
            }
            kind => {
                out.push(kind, token_start, text.len());
                TokenKind::Null
            }
        };

        Scan {
            tokens: out.tokens,
            end_state,
        }
    }
}

struct Emitter {
    tokens: Vec<Token>,
    base: usize,
}

impl Emitter {
    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        if start == end {
            return;
        }
        let span = Span::new(start, end).shifted(self.base);
        self.tokens.push(Token::new(kind, span));
    }
}

/// State entered on `c` from a clean boundary, `None` for the
/// single-character fallback
fn opening_kind(c: char) -> Option<TokenKind> {
    match c {
        ' ' | '\t' => Some(TokenKind::Whitespace),
        '"' => Some(TokenKind::StringLiteral),
        '#' => Some(TokenKind::LineComment),
        c if c.is_ascii_digit() => Some(TokenKind::IntegerLiteral),
        c if is_word_char(c) => Some(TokenKind::Identifier),
        _ => None,
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Letters, ASCII digits, underscore and slash. Numeric symbols such as
/// `²` or `½` are not word characters.
pub fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || c.is_ascii_digit() || c == '_' || c == '/'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;

    fn scan(text: &str, state: TokenKind) -> Scan {
        let table = KeywordTable::oml();
        Scanner::new(&table).scan(text, state, 0)
    }

    fn kinds(scan: &Scan) -> Vec<TokenKind> {
        scan.tokens.iter().map(|t| t.kind).collect()
    }

    fn assert_partition(text: &str, scan: &Scan, base: usize) {
        let mut expected_start = base;
        for token in &scan.tokens {
            assert_eq!(token.start(), expected_start, "gap or overlap at {:?}", token);
            assert!(token.end() > token.start(), "empty token {:?}", token);
            expected_start = token.end();
        }
        assert_eq!(expected_start, base + text.len());
    }

    #[test]
    fn test_keyword_precedence() {
        let result = scan("funk", TokenKind::Null);
        assert_eq!(
            result.tokens,
            vec![Token::new(TokenKind::ReservedWord, Span::new(0, 4))]
        );
        assert_eq!(result.end_state, TokenKind::Null);
    }

    #[test]
    fn test_punctuation_fallback() {
        let result = scan("+", TokenKind::Null);
        assert_eq!(
            result.tokens,
            vec![Token::new(TokenKind::Identifier, Span::new(0, 1))]
        );
        assert_eq!(result.end_state, TokenKind::Null);
    }

    #[test]
    fn test_comment_consumes_line() {
        let text = "# not a keyword funk";
        let result = scan(text, TokenKind::Null);
        assert_eq!(
            result.tokens,
            vec![Token::new(TokenKind::LineComment, Span::new(0, text.len()))]
        );
        assert_eq!(result.end_state, TokenKind::Null);
    }

    #[test]
    fn test_string_literal() {
        let result = scan("\"hi\"", TokenKind::Null);
        assert_eq!(
            result.tokens,
            vec![Token::new(TokenKind::StringLiteral, Span::new(0, 4))]
        );
        assert_eq!(result.end_state, TokenKind::Null);
    }

    #[test]
    fn test_unterminated_string_carries_state() {
        let result = scan("x = \"abc", TokenKind::Null);
        assert_eq!(result.tokens.last().map(|t| t.kind), Some(TokenKind::StringLiteral));
        assert_eq!(result.end_state, TokenKind::StringLiteral);

        let resumed = scan("def\" pole", TokenKind::StringLiteral);
        assert_eq!(
            kinds(&resumed),
            vec![TokenKind::StringLiteral, TokenKind::Whitespace, TokenKind::DataType]
        );
        assert_eq!(resumed.tokens[0].span, Span::new(0, 4));
        assert_eq!(resumed.end_state, TokenKind::Null);
    }

    #[test]
    fn test_statement() {
        let text = "funk main(celocislo a) vytiskni(a+12) # done";
        let result = scan(text, TokenKind::Null);
        assert_eq!(
            kinds(&result),
            vec![
                TokenKind::ReservedWord,   // funk
                TokenKind::Whitespace,
                TokenKind::Identifier,     // main
                TokenKind::Identifier,     // (
                TokenKind::DataType,       // celocislo
                TokenKind::Whitespace,
                TokenKind::Identifier,     // a
                TokenKind::Identifier,     // )
                TokenKind::Whitespace,
                TokenKind::Function,       // vytiskni
                TokenKind::Identifier,     // (
                TokenKind::Identifier,     // a
                TokenKind::Identifier,     // +
                TokenKind::IntegerLiteral, // 12
                TokenKind::Identifier,     // )
                TokenKind::Whitespace,
                TokenKind::LineComment,
            ]
        );
        assert_partition(text, &result, 0);
    }

    #[test]
    fn test_digits_inside_identifier() {
        let result = scan("x12 12x", TokenKind::Null);
        assert_eq!(
            kinds(&result),
            vec![
                TokenKind::Identifier,
                TokenKind::Whitespace,
                TokenKind::IntegerLiteral,
                TokenKind::Identifier,
            ]
        );
        assert_eq!(result.tokens[2].span, Span::new(4, 6));
    }

    #[test]
    fn test_slash_is_word_char() {
        let result = scan("a/b", TokenKind::Null);
        assert_eq!(
            result.tokens,
            vec![Token::new(TokenKind::Identifier, Span::new(0, 3))]
        );
    }

    #[test]
    fn test_whitespace_boundaries() {
        let text = " \t\"s\"\t#c";
        let result = scan(text, TokenKind::Null);
        assert_eq!(
            kinds(&result),
            vec![
                TokenKind::Whitespace,
                TokenKind::StringLiteral,
                TokenKind::Whitespace,
                TokenKind::LineComment,
            ]
        );
        assert_partition(text, &result, 0);
    }

    #[test]
    fn test_comment_marker_at_end() {
        let result = scan("pro #", TokenKind::Null);
        assert_eq!(
            result.tokens.last(),
            Some(&Token::new(TokenKind::LineComment, Span::new(4, 5)))
        );
        assert_eq!(result.end_state, TokenKind::Null);
    }

    #[test]
    fn test_start_offset() {
        let table = KeywordTable::oml();
        let result = Scanner::new(&table).scan("men 7", TokenKind::Null, 100);
        assert_eq!(result.tokens[0].span, Span::new(100, 103));
        assert_eq!(result.tokens[2].span, Span::new(104, 105));
        assert_partition("men 7", &result, 100);
    }

    #[test]
    fn test_non_resumable_start_state() {
        let result = scan("funk", TokenKind::Function);
        assert_eq!(result, scan("funk", TokenKind::Null));
    }

    #[test]
    fn test_resume_identifier() {
        // "vytis" + "kni" split across two segments
        let result = scan("kni(", TokenKind::Identifier);
        assert_eq!(result.tokens[0], Token::new(TokenKind::Identifier, Span::new(0, 3)));
    }

    #[test]
    fn test_empty_input() {
        let result = scan("", TokenKind::Null);
        assert!(result.tokens.is_empty());
        assert_eq!(result.end_state, TokenKind::Null);

        let result = scan("", TokenKind::StringLiteral);
        assert!(result.tokens.is_empty());
        assert_eq!(result.end_state, TokenKind::StringLiteral);
    }

    #[test]
    fn test_multibyte_characters() {
        let text = "žena → 5";
        let result = scan(text, TokenKind::Null);
        assert_eq!(
            kinds(&result),
            vec![
                TokenKind::Identifier,
                TokenKind::Whitespace,
                TokenKind::Identifier, // →
                TokenKind::Whitespace,
                TokenKind::IntegerLiteral,
            ]
        );
        assert_partition(text, &result, 0);
    }

    #[test]
    fn test_numeric_symbols_break_identifiers() {
        let result = scan("x² ½", TokenKind::Null);
        assert_eq!(
            result.tokens,
            vec![
                Token::new(TokenKind::Identifier, Span::new(0, 1)),
                Token::new(TokenKind::Identifier, Span::new(1, 3)),
                Token::new(TokenKind::Whitespace, Span::new(3, 4)),
                Token::new(TokenKind::Identifier, Span::new(4, 6)),
            ]
        );

        let result = scan("čísla12", TokenKind::Null);
        assert_eq!(kinds(&result), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_partition_and_idempotence() {
        let samples = [
            "",
            "   ",
            "funk f(pole p) { vrat p }",
            "\"open string with # inside",
            "#",
            "12345",
            "a\"b\"c",
            "!@$%^&*()",
            "pokud x == 1 { vytisknird(\"ano\") } jinak { men }",
        ];
        for text in samples {
            for start in RESUMABLE {
                let first = scan(text, start);
                assert_partition(text, &first, 0);
                assert_eq!(first, scan(text, start), "rescan differs for {:?}", text);
            }
        }
    }

    const RESUMABLE: [TokenKind; 6] = [
        TokenKind::Null,
        TokenKind::Whitespace,
        TokenKind::Identifier,
        TokenKind::IntegerLiteral,
        TokenKind::LineComment,
        TokenKind::StringLiteral,
    ];

    fn check_scan(text: &str, start: TokenKind, offset: usize) -> Result<(), TestCaseError> {
        let table = KeywordTable::oml();
        let scanner = Scanner::new(&table);
        let first = scanner.scan(text, start, offset);

        let mut expected_start = offset;
        for token in &first.tokens {
            prop_assert_eq!(token.start(), expected_start);
            prop_assert!(token.end() > token.start());
            prop_assert!(text.is_char_boundary(token.start() - offset));
            expected_start = token.end();
        }
        prop_assert_eq!(expected_start, offset + text.len());
        prop_assert!(matches!(
            first.end_state,
            TokenKind::Null | TokenKind::StringLiteral
        ));

        prop_assert_eq!(&first, &scanner.scan(text, start, offset));
        Ok(())
    }

    proptest! {
        #[test]
        fn test_any_text_is_partitioned(
            text in any::<String>(),
            start in proptest::sample::select(RESUMABLE.to_vec()),
            offset in 0usize..10_000,
        ) {
            check_scan(&text, start, offset)?;
        }

        #[test]
        fn test_oml_like_text_is_partitioned(
            text in "[a-z0-9_/#\" \t+(){}=žř→²]{0,40}",
            start in proptest::sample::select(RESUMABLE.to_vec()),
            offset in 0usize..10_000,
        ) {
            check_scan(&text, start, offset)?;
        }
    }
}
