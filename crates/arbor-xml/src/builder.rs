//! Marker-based tree builder.
//!
//! The parser walks the token stream and records a flat list of events:
//! node starts, node finishes, and consumed tokens. A [`Marker`] is an open
//! start event. It is either completed with a kind ([`Marker::done`]),
//! closed as an error node ([`Marker::error`]), discarded
//! ([`Marker::abandon`]), or rewound together with every token consumed
//! since ([`Marker::rollback`]). A completed marker can later be wrapped in
//! a new parent with [`CompletedMarker::precede`].
//!
//! [`SyntaxBuilder::finish`] replays the events into a [`SyntaxNode`] tree.

use crate::XmlError;
use crate::syntax::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
use crate::token::{Span, XmlToken, XmlTokenKind};

#[derive(Debug, Clone)]
enum Event {
    Start {
        kind: SyntaxKind,
        error: Option<String>,
        /// Absolute index of a start event that must open before this one.
        forward_parent: Option<usize>,
    },
    Finish,
    Token,
    Tombstone,
}

/// Token cursor plus event recorder.
#[derive(Debug)]
pub(crate) struct SyntaxBuilder<'a> {
    input: &'a str,
    tokens: Vec<XmlToken>,
    pos: usize,
    events: Vec<Event>,
}

/// Open node.
#[derive(Debug)]
#[must_use = "a marker must be completed, abandoned or rolled back"]
pub(crate) struct Marker {
    event: usize,
    token_pos: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CompletedMarker {
    event: usize,
}

impl<'a> SyntaxBuilder<'a> {
    pub(crate) fn new(input: &'a str, tokens: Vec<XmlToken>) -> Self {
        Self {
            input,
            tokens,
            pos: 0,
            events: Vec::new(),
        }
    }

    /// Kind of the current token, `None` at end of input.
    pub(crate) fn current(&self) -> Option<XmlTokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    pub(crate) fn at(&self, kind: XmlTokenKind) -> bool {
        self.current() == Some(kind)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Text of the current token, empty at end of input.
    pub(crate) fn current_text(&self) -> &'a str {
        self.tokens
            .get(self.pos)
            .map_or("", |t| t.text(self.input))
    }

    /// Kind of the token just before the current one, whitespace included.
    pub(crate) fn raw_lookbehind(&self) -> Option<XmlTokenKind> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.kind)
    }

    /// Consume the current token into the open node.
    pub(crate) fn bump(&mut self) {
        if self.at_eof() {
            return;
        }
        self.pos += 1;
        self.events.push(Event::Token);
    }

    /// Consume the current token if it has `kind`.
    pub(crate) fn eat(&mut self, kind: XmlTokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_whitespace(&mut self) {
        while self.eat(XmlTokenKind::WhiteSpace) {}
    }

    pub(crate) fn mark(&mut self) -> Marker {
        let event = self.events.len();
        self.events.push(Event::Tombstone);
        Marker {
            event,
            token_pos: self.pos,
        }
    }

    /// Zero-width error node at the current position.
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let m = self.mark();
        m.error(self, message);
    }

    /// Consume the current token wrapped in an error node.
    pub(crate) fn bump_error(&mut self, message: impl Into<String>) {
        let m = self.mark();
        self.bump();
        m.error(self, message);
    }

    /// Replay events into a tree. Errors are collected in document order.
    pub(crate) fn finish(mut self) -> (SyntaxNode, Vec<XmlError>) {
        let mut stack: Vec<(SyntaxKind, Option<String>, usize, Vec<SyntaxElement>)> = Vec::new();
        let mut errors = Vec::new();
        let mut finished: Option<SyntaxNode> = None;
        let mut token_idx = 0;
        let mut offset = 0;
        let mut forward = Vec::new();

        for i in 0..self.events.len() {
            match std::mem::replace(&mut self.events[i], Event::Tombstone) {
                Event::Start {
                    kind,
                    error,
                    forward_parent,
                } => {
                    forward.push((kind, error));
                    let mut next = forward_parent;
                    while let Some(idx) = next {
                        match std::mem::replace(&mut self.events[idx], Event::Tombstone) {
                            Event::Start {
                                kind,
                                error,
                                forward_parent,
                            } => {
                                forward.push((kind, error));
                                next = forward_parent;
                            }
                            _ => next = None,
                        }
                    }
                    for (kind, error) in forward.drain(..).rev() {
                        stack.push((kind, error, offset, Vec::new()));
                    }
                }
                Event::Finish => {
                    let Some((kind, error, start, children)) = stack.pop() else {
                        continue;
                    };
                    let span = Span::new(start, offset);
                    if let Some(message) = &error {
                        errors.push(XmlError::new(message.clone(), span));
                    }
                    let node = SyntaxNode::new(kind, span, error, children);
                    match stack.last_mut() {
                        Some(parent) => parent.3.push(SyntaxElement::Node(node)),
                        None => finished = Some(node),
                    }
                }
                Event::Token => {
                    let Some(token) = self.tokens.get(token_idx) else {
                        continue;
                    };
                    token_idx += 1;
                    offset = token.span.end;
                    let element = SyntaxElement::Token(SyntaxToken::new(
                        token.kind,
                        token.span,
                        token.text(self.input),
                    ));
                    if let Some(parent) = stack.last_mut() {
                        parent.3.push(element);
                    }
                }
                Event::Tombstone => {}
            }
        }

        errors.sort_by_key(|e| (e.range.start, e.range.end));
        let root = finished.unwrap_or_else(|| {
            SyntaxNode::new(SyntaxKind::Document, Span::at(0), None, Vec::new())
        });
        (root, errors)
    }
}

impl Marker {
    pub(crate) fn done(self, b: &mut SyntaxBuilder<'_>, kind: SyntaxKind) -> CompletedMarker {
        self.close(b, kind, None)
    }

    /// Close as an error node carrying `message`.
    pub(crate) fn error(
        self,
        b: &mut SyntaxBuilder<'_>,
        message: impl Into<String>,
    ) -> CompletedMarker {
        self.close(b, SyntaxKind::Error, Some(message.into()))
    }

    /// Discard the node; its contents join the enclosing node.
    pub(crate) fn abandon(self, b: &mut SyntaxBuilder<'_>) {
        if self.event + 1 == b.events.len() {
            b.events.pop();
        }
    }

    /// Forget everything recorded since this marker and rewind the cursor.
    pub(crate) fn rollback(self, b: &mut SyntaxBuilder<'_>) {
        b.events.truncate(self.event);
        b.pos = self.token_pos;
    }

    fn close(
        self,
        b: &mut SyntaxBuilder<'_>,
        kind: SyntaxKind,
        error: Option<String>,
    ) -> CompletedMarker {
        b.events[self.event] = Event::Start {
            kind,
            error,
            forward_parent: None,
        };
        b.events.push(Event::Finish);
        CompletedMarker { event: self.event }
    }
}

impl CompletedMarker {
    /// Open a new node that will enclose this completed one.
    pub(crate) fn precede(self, b: &mut SyntaxBuilder<'_>) -> Marker {
        let m = b.mark();
        if let Event::Start { forward_parent, .. } = &mut b.events[self.event] {
            *forward_parent = Some(m.event);
        }
        m
    }
}
