//! Syntax highlighting for OML
//!
//! A restartable scanner that splits editor text into classified spans,
//! and a per-line cache that rescans only what an edit touched.

pub mod highlight;
pub mod keywords;
pub mod scanner;
pub mod token;

pub use highlight::{HighlightOptions, Highlighter};
pub use keywords::KeywordTable;
pub use scanner::{Scan, Scanner};
pub use token::{Token, TokenKind};
