//! Per-line highlighting cache
//!
//! Keeps one [`Scan`] per document line together with the state the line
//! was scanned from. After an edit only the replaced lines are scanned, plus
//! following lines until a line's start state matches what it was scanned
//! with last time.

use std::ops::Range;

use crate::syntax::keywords::KeywordTable;
use crate::syntax::scanner::{Scan, Scanner};
use crate::syntax::token::{Token, TokenKind};

/// How a line's end state carries into the next line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightOptions {
    /// Let an unterminated string continue on the next line
    pub multiline_strings: bool,
}

impl HighlightOptions {
    pub fn carry(&self, end_state: TokenKind) -> TokenKind {
        match end_state {
            TokenKind::StringLiteral if self.multiline_strings => TokenKind::StringLiteral,
            _ => TokenKind::Null,
        }
    }
}

#[derive(Debug, Clone)]
struct Line {
    /// Line text without the `\n`
    raw: String,
    start_state: TokenKind,
    scan: Option<Scan>,
}

impl Line {
    fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            start_state: TokenKind::Null,
            scan: None,
        }
    }

    /// Text handed to the scanner: a trailing `\r` is not part of the line
    fn content(&self) -> &str {
        self.raw.strip_suffix('\r').unwrap_or(&self.raw)
    }

    fn end_state(&self) -> TokenKind {
        self.scan
            .as_ref()
            .map(|scan| scan.end_state)
            .unwrap_or_default()
    }
}

/// Highlighting state for one document
pub struct Highlighter {
    keywords: KeywordTable,
    options: HighlightOptions,
    lines: Vec<Line>,
    line_starts: Vec<usize>,
}

impl Highlighter {
    pub fn new(keywords: KeywordTable, options: HighlightOptions) -> Self {
        let mut highlighter = Self {
            keywords,
            options,
            lines: Vec::new(),
            line_starts: Vec::new(),
        };
        highlighter.set_text("");
        highlighter
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Replace the whole document. Returns the lines that were scanned.
    pub fn set_text(&mut self, text: &str) -> Range<usize> {
        self.lines = text.split('\n').map(Line::new).collect();
        self.rescan_from(0, self.lines.len())
    }

    /// Bring the cache in line with `text`, scanning only what changed.
    pub fn update(&mut self, text: &str) -> Range<usize> {
        let new_lines: Vec<&str> = text.split('\n').collect();

        let prefix = self
            .lines
            .iter()
            .zip(&new_lines)
            .take_while(|(old, new)| old.raw == **new)
            .count();
        let max_suffix = self.lines.len().min(new_lines.len()) - prefix;
        let suffix = self
            .lines
            .iter()
            .rev()
            .zip(new_lines.iter().rev())
            .take(max_suffix)
            .take_while(|(old, new)| old.raw == **new)
            .count();

        let old_range = prefix..self.lines.len() - suffix;
        let replacement = &new_lines[prefix..new_lines.len() - suffix];
        self.replace_lines(old_range, replacement)
    }

    /// Replace the lines in `range` with `new_lines` and rescan. Returns the
    /// lines whose tokens were recomputed.
    pub fn replace_lines(&mut self, range: Range<usize>, new_lines: &[&str]) -> Range<usize> {
        let start = range.start.min(self.lines.len());
        let end = range.end.clamp(start, self.lines.len());
        self.lines
            .splice(start..end, new_lines.iter().map(|raw| Line::new(raw)));
        if self.lines.is_empty() {
            self.lines.push(Line::new(""));
        }
        self.rescan_from(start, start + new_lines.len())
    }

    /// Scan lines from `start`. Every line before `edited_end` is scanned;
    /// after that scanning stops at the first line whose start state is
    /// unchanged.
    fn rescan_from(&mut self, start: usize, edited_end: usize) -> Range<usize> {
        let mut index = start;
        while index < self.lines.len() {
            let state = self.start_state_of(index);
            let line = &self.lines[index];
            if index >= edited_end && line.scan.is_some() && line.start_state == state {
                break;
            }
            let scan = Scanner::new(&self.keywords).scan(line.content(), state, 0);
            let line = &mut self.lines[index];
            line.start_state = state;
            line.scan = Some(scan);
            index += 1;
        }

        self.recompute_line_starts();
        log::debug!("rescanned lines {}..{}", start, index);
        start..index
    }

    fn start_state_of(&self, index: usize) -> TokenKind {
        match index.checked_sub(1) {
            Some(prev) => self.options.carry(self.lines[prev].end_state()),
            None => TokenKind::Null,
        }
    }

    fn recompute_line_starts(&mut self) {
        self.line_starts.clear();
        let mut offset = 0;
        for line in &self.lines {
            self.line_starts.push(offset);
            offset += line.raw.len() + 1;
        }
    }

    /// Absolute document offset of the first byte of a line
    pub fn line_start(&self, index: usize) -> Option<usize> {
        self.line_starts.get(index).copied()
    }

    /// Tokens of one line with absolute offsets
    pub fn line_tokens(&self, index: usize) -> Vec<Token> {
        let (Some(line), Some(base)) = (self.lines.get(index), self.line_start(index)) else {
            return Vec::new();
        };
        line.scan
            .as_ref()
            .map(|scan| {
                scan.tokens
                    .iter()
                    .map(|t| Token::new(t.kind, t.span.shifted(base)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// State a line ended in, before the continuation policy is applied
    pub fn line_end_state(&self, index: usize) -> TokenKind {
        self.lines
            .get(index)
            .map(Line::end_state)
            .unwrap_or_default()
    }

    /// Tokens for the whole document with absolute offsets
    pub fn tokens(&self) -> Vec<Token> {
        (0..self.lines.len())
            .flat_map(|index| self.line_tokens(index))
            .collect()
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(KeywordTable::oml(), HighlightOptions::default())
    }
}
