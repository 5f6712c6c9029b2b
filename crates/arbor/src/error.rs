#![forbid(unsafe_code)]

//! Unified error type for the arbor crates.
//!
//! Each crate keeps its own typed error so callers can match on what matters.
//! [`Error`] wraps them for code that drives both the layout cache and the
//! parser and just wants `?` to work.

use thiserror::Error;

pub use arbor_layout::LayoutError;
pub use arbor_xml::XmlError;

// ── Unified Error ───────────────────────────────────────────────────────

/// Top-level error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The layout cache rejected a path or an event.
    #[error("layout: {0}")]
    Layout(#[from] LayoutError),
    /// A document did not parse cleanly (strict parsing only).
    #[error("xml: {0}")]
    Xml(#[from] XmlError),
}

/// Standard result type for arbor APIs.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Error type label for logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Layout(_) => "layout",
            Self::Xml(_) => "xml",
        }
    }

    /// Whether the failed call left state intact, so a corrected call can
    /// succeed. Parse errors describe the input itself.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Layout(_))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;

    use super::*;
    use arbor_xml::Span;

    fn strict(input: &str) -> Result<usize> {
        let root = arbor_xml::parse_strict(input)?;
        Ok(root.subtags().count())
    }

    #[test]
    fn layout_error_converts() {
        let err: Error = LayoutError::NoModel.into();
        assert_eq!(err.error_type(), "layout");
        assert!(err.is_recoverable());
        assert!(format!("{err}").contains("no tree model root"));
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn xml_error_converts_through_question_mark() {
        assert_eq!(strict("<a/>"), Ok(1));
        let err = strict("<a>").expect_err("unclosed");
        assert_eq!(err.error_type(), "xml");
        assert!(!err.is_recoverable());
        assert_eq!(
            err,
            Error::Xml(XmlError::new("element <a> is not closed", Span::at(3)))
        );
        assert_eq!(err.to_string(), "xml: element <a> is not closed at 3..3");
    }
}
