#![forbid(unsafe_code)]

//! Arbor public facade crate.
//!
//! Re-exports the layout cache from `arbor-layout`, the XML parser from
//! `arbor-xml` and the shared geometry from `arbor-core`, plus a prelude and
//! the unified [`Error`].

pub mod error;

pub use error::{Error, Result};

// --- Core re-exports ------------------------------------------------------

pub use arbor_core::geometry::Rect;

// --- Layout re-exports ----------------------------------------------------

pub use arbor_layout::{
    FenwickTree, InvariantViolation, LayoutCacheConfig, LayoutError, ModelNodeId, MutableTreeModel,
    NodeDimensions, TreeLayoutCache, TreeModel, TreeModelEvent, TreePath, VisiblePaths,
};

// --- XML re-exports -------------------------------------------------------

pub use arbor_xml::{
    ParserConfig, Span, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, XmlError, XmlParse,
    XmlToken, XmlTokenKind, parse as parse_xml, parse_strict as parse_xml_strict,
    parse_with_config as parse_xml_with_config, tokenize as tokenize_xml,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, LayoutCacheConfig, MutableTreeModel, Rect, Result, SyntaxKind, SyntaxNode,
        TreeLayoutCache, TreeModel, TreeModelEvent, TreePath, parse_xml,
    };

    pub use crate::{core, layout, xml};
}

pub use arbor_core as core;
pub use arbor_layout as layout;
pub use arbor_xml as xml;
