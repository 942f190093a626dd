//! Keyword table used to reclassify identifiers
#![allow(dead_code)]

use std::collections::HashMap;

use crate::syntax::token::TokenKind;

const RESERVED_WORDS: &[&str] = &["funk", "vrat", "pro", "men", "pokud", "jinak"];
const DATA_TYPES: &[&str] = &["celocislo", "pole", "txtret", "bool", "znak", "descislo"];
const FUNCTIONS: &[&str] = &["vytiskni", "vytisknird"];

/// Literal lexeme to kind mapping. Case-sensitive.
///
/// Built once and only read while scanning; extra words can be added with
/// [`KeywordTable::insert`] before the table is handed to a scanner.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    words: HashMap<String, TokenKind>,
}

impl KeywordTable {
    /// An empty table: every word scans as an identifier
    pub fn empty() -> Self {
        Self { words: HashMap::new() }
    }

    /// The built-in OML vocabulary
    pub fn oml() -> Self {
        let mut table = Self::empty();
        table.extend(RESERVED_WORDS, TokenKind::ReservedWord);
        table.extend(DATA_TYPES, TokenKind::DataType);
        table.extend(FUNCTIONS, TokenKind::Function);
        table
    }

    /// Add a word. Only keyword kinds are accepted; anything else is ignored
    /// so that a lookup can never produce a scanner state.
    pub fn insert(&mut self, word: &str, kind: TokenKind) -> bool {
        if !kind.is_keyword() || word.is_empty() {
            log::warn!("ignoring keyword table entry {:?} as {}", word, kind);
            return false;
        }
        self.words.insert(word.to_string(), kind);
        true
    }

    pub fn extend<S: AsRef<str>>(&mut self, words: &[S], kind: TokenKind) {
        for word in words {
            self.insert(word.as_ref(), kind);
        }
    }

    pub fn get(&self, word: &str) -> Option<TokenKind> {
        self.words.get(word).copied()
    }

    /// Kind for a finished identifier lexeme
    pub fn classify(&self, word: &str) -> TokenKind {
        self.get(word).unwrap_or(TokenKind::Identifier)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::oml()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oml_vocabulary() {
        let table = KeywordTable::oml();
        assert_eq!(table.len(), 14);
        assert_eq!(table.classify("pokud"), TokenKind::ReservedWord);
        assert_eq!(table.classify("descislo"), TokenKind::DataType);
        assert_eq!(table.classify("vytisknird"), TokenKind::Function);
        assert_eq!(table.classify("x"), TokenKind::Identifier);
    }

    #[test]
    fn test_case_sensitive() {
        let table = KeywordTable::oml();
        assert_eq!(table.classify("Funk"), TokenKind::Identifier);
        assert_eq!(table.classify("FUNK"), TokenKind::Identifier);
    }

    #[test]
    fn test_rejects_non_keyword_kinds() {
        let mut table = KeywordTable::empty();
        assert!(!table.insert("x", TokenKind::StringLiteral));
        assert!(!table.insert("", TokenKind::ReservedWord));
        assert!(table.insert("dokud", TokenKind::ReservedWord));
        assert_eq!(table.classify("dokud"), TokenKind::ReservedWord);
    }
}
