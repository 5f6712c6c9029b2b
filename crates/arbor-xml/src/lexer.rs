//! Lossless, context-sensitive XML lexer.
//!
//! Every byte of the input lands in exactly one token, so concatenating the
//! token texts reproduces the input. Malformed input never fails: bytes that
//! fit nowhere become [`XmlTokenKind::BadCharacter`] and unterminated
//! constructs simply run to the end of input or to the next `<` that can
//! start markup.

use memchr::{memchr2, memchr3, memmem};

use crate::token::{Span, XmlToken, XmlTokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Content,
    Tag,
    AttrValue { quote: u8, in_pi: bool },
    Comment,
    Cdata,
    PiTarget,
    /// Pseudo-attributes of an `<?xml ...?>` declaration.
    PiAttrs,
    PiBody,
    Doctype,
}

pub struct XmlLexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    idx: usize,
    state: State,
    bracket_depth: u32,
}

impl<'a> XmlLexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            idx: 0,
            state: State::Content,
            bracket_depth: 0,
        }
    }

    pub fn tokenize(mut self) -> Vec<XmlToken> {
        let mut out = Vec::new();
        while let Some(token) = self.next_token() {
            out.push(token);
        }
        out
    }

    fn next_token(&mut self) -> Option<XmlToken> {
        if self.idx >= self.bytes.len() {
            return None;
        }
        let start = self.idx;
        let kind = match self.state {
            State::Content => self.lex_content(),
            State::Tag => match self.lex_tag_like(false) {
                Some(kind) => kind,
                None => return self.next_token(),
            },
            State::PiAttrs => match self.lex_tag_like(true) {
                Some(kind) => kind,
                None => return self.next_token(),
            },
            State::AttrValue { quote, in_pi } => match self.lex_attr_value(quote, in_pi) {
                Some(kind) => kind,
                None => return self.next_token(),
            },
            State::Comment => self.lex_delimited(
                "-->",
                XmlTokenKind::CommentCharacters,
                XmlTokenKind::CommentEnd,
            ),
            State::Cdata => {
                self.lex_delimited("]]>", XmlTokenKind::CdataCharacters, XmlTokenKind::CdataEnd)
            }
            State::PiTarget => {
                if self.at_name_start() {
                    self.eat_name();
                    let target = &self.input[start..self.idx];
                    self.state = if target.eq_ignore_ascii_case("xml") {
                        State::PiAttrs
                    } else {
                        State::PiBody
                    };
                    XmlTokenKind::PiTarget
                } else {
                    self.state = State::PiBody;
                    return self.next_token();
                }
            }
            State::PiBody => {
                self.lex_delimited("?>", XmlTokenKind::PiCharacters, XmlTokenKind::PiEnd)
            }
            State::Doctype => match self.lex_doctype() {
                Some(kind) => kind,
                None => return self.next_token(),
            },
        };
        debug_assert!(self.idx > start, "lexer made no progress in {:?}", self.state);
        Some(XmlToken {
            kind,
            span: Span::new(start, self.idx),
        })
    }

    fn lex_content(&mut self) -> XmlTokenKind {
        let b = self.bytes[self.idx];
        if b == b'<' {
            for (prefix, kind, next) in [
                ("<!--", XmlTokenKind::CommentStart, State::Comment),
                ("<![CDATA[", XmlTokenKind::CdataStart, State::Cdata),
                ("<!DOCTYPE", XmlTokenKind::DoctypeStart, State::Doctype),
                ("<?", XmlTokenKind::PiStart, State::PiTarget),
                ("</", XmlTokenKind::EndTagStart, State::Tag),
            ] {
                if self.rest().starts_with(prefix) {
                    self.idx += prefix.len();
                    self.state = next;
                    if next == State::Doctype {
                        self.bracket_depth = 0;
                    }
                    return kind;
                }
            }
            self.idx += 1;
            self.state = State::Tag;
            return XmlTokenKind::StartTagStart;
        }
        if b == b'&' {
            return self.lex_reference();
        }
        if is_space(b) {
            self.eat_spaces();
            return XmlTokenKind::WhiteSpace;
        }
        // Character data keeps inner whitespace; only a leading run is split off.
        self.idx = self.scan_to(memchr2(b'<', b'&', self.rest_bytes()));
        XmlTokenKind::DataCharacters
    }

    /// Tag interior, or the pseudo-attributes of an XML declaration. `None`
    /// means the construct ended without a closing delimiter and the lexer
    /// fell back to content.
    fn lex_tag_like(&mut self, in_pi: bool) -> Option<XmlTokenKind> {
        let b = self.bytes[self.idx];
        let rest = self.rest();
        let kind = match b {
            _ if is_space(b) => {
                self.eat_spaces();
                XmlTokenKind::WhiteSpace
            }
            b'=' => {
                self.idx += 1;
                XmlTokenKind::Eq
            }
            b'"' | b'\'' => {
                self.idx += 1;
                self.state = State::AttrValue { quote: b, in_pi };
                XmlTokenKind::AttrValueStart
            }
            b'<' => {
                self.state = State::Content;
                return None;
            }
            b'?' if in_pi && rest.starts_with("?>") => {
                self.idx += 2;
                self.state = State::Content;
                XmlTokenKind::PiEnd
            }
            b'>' if !in_pi => {
                self.idx += 1;
                self.state = State::Content;
                XmlTokenKind::TagEnd
            }
            b'/' if !in_pi && rest.starts_with("/>") => {
                self.idx += 2;
                self.state = State::Content;
                XmlTokenKind::EmptyElementEnd
            }
            _ if self.at_name_start() => {
                self.eat_name();
                XmlTokenKind::Name
            }
            _ => {
                self.eat_char();
                XmlTokenKind::BadCharacter
            }
        };
        Some(kind)
    }

    fn lex_attr_value(&mut self, quote: u8, in_pi: bool) -> Option<XmlTokenKind> {
        let b = self.bytes[self.idx];
        if b == quote {
            self.idx += 1;
            self.state = if in_pi { State::PiAttrs } else { State::Tag };
            return Some(XmlTokenKind::AttrValueEnd);
        }
        if b == b'<' {
            // Unterminated value; let the next tag start.
            self.state = State::Content;
            return None;
        }
        if b == b'&' {
            return Some(self.lex_reference());
        }
        self.idx = self.scan_to(memchr3(quote, b'&', b'<', self.rest_bytes()));
        Some(XmlTokenKind::AttrValueToken)
    }

    fn lex_delimited(
        &mut self,
        end: &str,
        body: XmlTokenKind,
        close: XmlTokenKind,
    ) -> XmlTokenKind {
        if self.rest().starts_with(end) {
            self.idx += end.len();
            self.state = State::Content;
            return close;
        }
        self.idx = self.scan_to(memmem::find(self.rest_bytes(), end.as_bytes()));
        body
    }

    fn lex_doctype(&mut self) -> Option<XmlTokenKind> {
        let b = self.bytes[self.idx];
        if self.bracket_depth == 0 {
            if b == b'>' {
                self.idx += 1;
                self.state = State::Content;
                return Some(XmlTokenKind::DoctypeEnd);
            }
            if b == b'<' {
                self.state = State::Content;
                return None;
            }
        }
        if is_space(b) {
            self.eat_spaces();
            return Some(XmlTokenKind::WhiteSpace);
        }
        while self.idx < self.bytes.len() {
            let b = self.bytes[self.idx];
            if is_space(b) || (self.bracket_depth == 0 && (b == b'>' || b == b'<')) {
                break;
            }
            match b {
                b'[' => self.bracket_depth += 1,
                b']' => self.bracket_depth = self.bracket_depth.saturating_sub(1),
                _ => {}
            }
            self.idx += 1;
        }
        Some(XmlTokenKind::DoctypeText)
    }

    /// `&#NN;`, `&#xHH;` or `&name;`. Anything else leaves a lone `&` as a
    /// bad character.
    fn lex_reference(&mut self) -> XmlTokenKind {
        let rest = &self.bytes[self.idx..];
        if rest.get(1) == Some(&b'#') {
            let (digits_from, hex) = match rest.get(2) {
                Some(b'x') => (3, true),
                _ => (2, false),
            };
            let digits = rest[digits_from.min(rest.len())..]
                .iter()
                .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
                .count();
            let semi = digits_from + digits;
            if digits > 0 && rest.get(semi) == Some(&b';') {
                self.idx += semi + 1;
                return XmlTokenKind::CharEntityRef;
            }
        } else {
            let save = self.idx;
            self.idx += 1;
            if self.at_name_start() {
                self.eat_name();
                if self.bytes.get(self.idx) == Some(&b';') {
                    self.idx += 1;
                    return XmlTokenKind::EntityRef;
                }
            }
            self.idx = save;
        }
        self.idx += 1;
        XmlTokenKind::BadCharacter
    }

    fn rest(&self) -> &'a str {
        &self.input[self.idx..]
    }

    fn at_name_start(&self) -> bool {
        self.rest().chars().next().is_some_and(is_name_start)
    }

    fn eat_name(&mut self) {
        let len: usize = self
            .rest()
            .chars()
            .take_while(|&c| is_name_char(c))
            .map(char::len_utf8)
            .sum();
        self.idx += len;
    }

    fn eat_char(&mut self) {
        self.idx += self.rest().chars().next().map_or(1, char::len_utf8);
    }

    fn eat_spaces(&mut self) {
        while self.idx < self.bytes.len() && is_space(self.bytes[self.idx]) {
            self.idx += 1;
        }
    }

    fn rest_bytes(&self) -> &'a [u8] {
        &self.bytes[self.idx..]
    }

    /// Absolute offset for a hit relative to the cursor, or end of input.
    /// Every needle is ASCII, so the result stays on a char boundary.
    fn scan_to(&self, hit: Option<usize>) -> usize {
        hit.map_or(self.bytes.len(), |offset| self.idx + offset)
    }
}

pub fn tokenize(input: &str) -> Vec<XmlToken> {
    XmlLexer::new(input).tokenize()
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.'
}
