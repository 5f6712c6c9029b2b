//! Concrete syntax tree.
//!
//! Nodes own their tokens' text, so a tree outlives the input it was parsed
//! from. Every input byte belongs to exactly one token in the tree, which
//! makes [`SyntaxNode::text`] on the root reproduce the input.

use std::fmt::{self, Write as _};

use crate::token::{Span, XmlTokenKind};

/// Node kinds produced by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Document,
    Prolog,
    Tag,
    Attribute,
    AttributeValue,
    Text,
    Comment,
    Cdata,
    ProcessingInstruction,
    Doctype,
    CharRef,
    EntityRef,
    /// Malformed span; carries a message.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxToken {
    kind: XmlTokenKind,
    span: Span,
    text: String,
}

impl SyntaxToken {
    pub(crate) fn new(kind: XmlTokenKind, span: Span, text: &str) -> Self {
        Self {
            kind,
            span,
            text: text.to_owned(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> XmlTokenKind {
        self.kind
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxElement {
    Node(SyntaxNode),
    Token(SyntaxToken),
}

impl SyntaxElement {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Node(node) => node.span,
            Self::Token(token) => token.span,
        }
    }

    #[must_use]
    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    #[must_use]
    pub fn as_token(&self) -> Option<&SyntaxToken> {
        match self {
            Self::Node(_) => None,
            Self::Token(token) => Some(token),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: SyntaxKind,
    span: Span,
    error: Option<String>,
    children: Vec<SyntaxElement>,
}

impl SyntaxNode {
    pub(crate) fn new(
        kind: SyntaxKind,
        span: Span,
        error: Option<String>,
        children: Vec<SyntaxElement>,
    ) -> Self {
        Self {
            kind,
            span,
            error,
            children,
        }
    }

    #[must_use]
    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Message of an [`SyntaxKind::Error`] node.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn children(&self) -> &[SyntaxElement] {
        &self.children
    }

    /// Direct child nodes.
    pub fn child_nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter_map(SyntaxElement::as_node)
    }

    /// Direct child tokens.
    pub fn child_tokens(&self) -> impl Iterator<Item = &SyntaxToken> {
        self.children.iter().filter_map(SyntaxElement::as_token)
    }

    /// Source text covered by this node.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.span.len());
        for token in self.tokens() {
            out.push_str(&token.text);
        }
        out
    }

    /// This node and every node below it, in pre-order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Every token below this node, in source order.
    pub fn tokens(&self) -> impl Iterator<Item = &SyntaxToken> {
        let mut stack: Vec<std::slice::Iter<'_, SyntaxElement>> = vec![self.children.iter()];
        std::iter::from_fn(move || {
            loop {
                let top = stack.last_mut()?;
                match top.next() {
                    Some(SyntaxElement::Token(token)) => return Some(token),
                    Some(SyntaxElement::Node(node)) => stack.push(node.children.iter()),
                    None => {
                        stack.pop();
                    }
                }
            }
        })
    }

    /// Name of a `Tag` node (its first `Name` token).
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        if self.kind != SyntaxKind::Tag {
            return None;
        }
        self.child_tokens()
            .find(|t| t.kind == XmlTokenKind::Name)
            .map(SyntaxToken::text)
    }

    /// Child `Tag` nodes.
    pub fn subtags(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.child_nodes().filter(|n| n.kind == SyntaxKind::Tag)
    }

    /// Value text of the attribute named `name` on a `Tag` node, without
    /// quotes and with references left unexpanded.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.child_nodes()
            .filter(|n| n.kind == SyntaxKind::Attribute)
            .find(|attr| {
                attr.child_tokens()
                    .next()
                    .is_some_and(|t| t.kind == XmlTokenKind::Name && t.text == name)
            })
            .map(|attr| {
                attr.child_nodes()
                    .filter(|n| n.kind == SyntaxKind::AttributeValue)
                    .flat_map(SyntaxNode::tokens)
                    .filter(|t| {
                        !matches!(t.kind, XmlTokenKind::AttrValueStart | XmlTokenKind::AttrValueEnd)
                    })
                    .map(SyntaxToken::text)
                    .collect()
            })
    }

    /// Indented outline, one line per node or token.
    ///
    /// ```text
    /// Document@0..8
    ///   Prolog@0..0
    ///   Tag@0..8
    ///     StartTagStart@0..1 "<"
    /// ```
    #[must_use]
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        let _ = write!(out, "{:indent$}{:?}@{}", "", self.kind, self.span, indent = depth * 2);
        if let Some(message) = &self.error {
            let _ = write!(out, " {message:?}");
        }
        out.push('\n');
        for child in &self.children {
            match child {
                SyntaxElement::Node(node) => node.dump_into(out, depth + 1),
                SyntaxElement::Token(token) => {
                    let _ = writeln!(
                        out,
                        "{:indent$}{:?}@{} {:?}",
                        "",
                        token.kind,
                        token.span,
                        token.text,
                        indent = (depth + 1) * 2
                    );
                }
            }
        }
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in self.tokens() {
            f.write_str(&token.text)?;
        }
        Ok(())
    }
}

/// Pre-order node walk returned by [`SyntaxNode::descendants`].
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.child_nodes().collect::<Vec<_>>().into_iter().rev());
        Some(node)
    }
}
