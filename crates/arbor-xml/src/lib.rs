#![forbid(unsafe_code)]

//! Error-tolerant XML parsing into a lossless concrete syntax tree.
//!
//! [`parse`] never fails. Malformed markup ends up in `Error` nodes and in
//! [`XmlParse::errors`], and the tree still covers every byte of the input,
//! so `parse(s).root.text() == s` for any `s`.
//!
//! ```
//! let parse = arbor_xml::parse("<a><b></a>");
//! assert_eq!(parse.errors.len(), 1);
//! assert_eq!(parse.root.text(), "<a><b></a>");
//! ```

mod builder;
pub mod lexer;
mod parser;
pub mod syntax;
pub mod token;

pub use lexer::{XmlLexer, tokenize};
pub use syntax::{Descendants, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
pub use token::{Span, XmlToken, XmlTokenKind};

use thiserror::Error;

/// Default nesting limit for [`ParserConfig`].
pub const DEFAULT_MAX_TAG_DEPTH: usize = 1000;

/// A structural problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {range}")]
pub struct XmlError {
    pub message: String,
    /// Byte range of the offending construct. Empty for "expected" errors.
    pub range: Span,
}

impl XmlError {
    #[must_use]
    pub fn new(message: impl Into<String>, range: Span) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Parser limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Open elements deeper than this are reported and not descended into.
    pub max_tag_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_tag_depth: DEFAULT_MAX_TAG_DEPTH,
        }
    }
}

impl ParserConfig {
    #[must_use]
    pub fn with_max_tag_depth(mut self, depth: usize) -> Self {
        self.max_tag_depth = depth;
        self
    }
}

/// Result of parsing a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlParse {
    /// `Document` node covering the whole input.
    pub root: SyntaxNode,
    /// Diagnostics in document order.
    pub errors: Vec<XmlError>,
}

impl XmlParse {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse with the default [`ParserConfig`].
#[must_use]
pub fn parse(input: &str) -> XmlParse {
    parse_with_config(input, &ParserConfig::default())
}

#[must_use]
pub fn parse_with_config(input: &str, config: &ParserConfig) -> XmlParse {
    #[cfg(feature = "tracing")]
    let span = tracing::debug_span!(
        "xml.parse",
        input_len = input.len(),
        tokens = tracing::field::Empty,
        errors = tracing::field::Empty,
    )
    .entered();

    let tokens = tokenize(input);
    #[cfg(feature = "tracing")]
    span.record("tokens", tokens.len());

    let (root, errors) = parser::Parser::new(input, tokens, config).parse();

    #[cfg(feature = "tracing")]
    {
        span.record("errors", errors.len());
        tracing::debug!(message = "xml.parse.done", errors = errors.len());
    }

    XmlParse { root, errors }
}

/// Parse and fail on the first diagnostic.
pub fn parse_strict(input: &str) -> Result<SyntaxNode, XmlError> {
    let parse = parse(input);
    match parse.errors.into_iter().next() {
        Some(error) => Err(error),
        None => Ok(parse.root),
    }
}
