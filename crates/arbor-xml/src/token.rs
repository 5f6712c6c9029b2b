//! Token kinds and byte spans.

use std::fmt;

/// Half-open byte range into the parsed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty span at `offset`.
    #[inline]
    #[must_use]
    pub const fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Lexical class of an XML token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XmlTokenKind {
    /// `<`
    StartTagStart,
    /// `</`
    EndTagStart,
    /// `>`
    TagEnd,
    /// `/>`
    EmptyElementEnd,
    /// Tag or attribute name.
    Name,
    /// `=`
    Eq,
    /// Opening quote of an attribute value.
    AttrValueStart,
    /// Literal text inside an attribute value.
    AttrValueToken,
    /// Closing quote of an attribute value.
    AttrValueEnd,
    WhiteSpace,
    /// Character data in element content.
    DataCharacters,
    /// `&#123;` or `&#x7B;`
    CharEntityRef,
    /// `&name;`
    EntityRef,
    /// `<!--`
    CommentStart,
    CommentCharacters,
    /// `-->`
    CommentEnd,
    /// `<![CDATA[`
    CdataStart,
    CdataCharacters,
    /// `]]>`
    CdataEnd,
    /// `<?`
    PiStart,
    PiTarget,
    /// Free-form processing instruction body.
    PiCharacters,
    /// `?>`
    PiEnd,
    /// `<!DOCTYPE`
    DoctypeStart,
    DoctypeText,
    /// `>` closing a doctype.
    DoctypeEnd,
    /// A character that cannot start any token in the current context.
    BadCharacter,
}

impl XmlTokenKind {
    /// Tokens that carry no structure of their own.
    #[must_use]
    pub const fn is_trivia(self) -> bool {
        matches!(self, Self::WhiteSpace)
    }

    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::CharEntityRef | Self::EntityRef)
    }
}

/// One lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlToken {
    pub kind: XmlTokenKind,
    pub span: Span,
}

impl XmlToken {
    /// The token's text within `input`.
    #[must_use]
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.span.start..self.span.end]
    }
}
