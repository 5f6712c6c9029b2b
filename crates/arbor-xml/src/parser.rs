//! Recursive-descent XML grammar over [`SyntaxBuilder`].
//!
//! The parser looks at one token at a time and never gives up: each
//! malformed construct is wrapped in (or marked by) an `Error` node and
//! parsing resumes at the next token that can start something meaningful.
//!
//! A closing tag whose name belongs to an enclosing element is not consumed
//! by the inner element. The footer is rolled back, the inner element is
//! reported as unclosed, and the enclosing element gets to match it.

use crate::ParserConfig;
use crate::XmlError;
use crate::builder::{CompletedMarker, SyntaxBuilder};
use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::token::{XmlToken, XmlTokenKind, XmlTokenKind as T};

const BAD_AMPERSAND: &str = "'&' must start a character or entity reference";

pub(crate) struct Parser<'a> {
    b: SyntaxBuilder<'a>,
    open_tags: Vec<&'a str>,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &'a str, tokens: Vec<XmlToken>, config: &ParserConfig) -> Self {
        Self {
            b: SyntaxBuilder::new(input, tokens),
            open_tags: Vec::new(),
            max_depth: config.max_tag_depth,
        }
    }

    pub(crate) fn parse(mut self) -> (SyntaxNode, Vec<XmlError>) {
        self.document();
        self.b.finish()
    }

    fn document(&mut self) {
        let doc = self.b.mark();
        self.prolog();
        let mut has_root = false;
        while let Some(kind) = self.b.current() {
            match kind {
                T::StartTagStart => {
                    let tag = self.tag();
                    if has_root {
                        tag.precede(&mut self.b)
                            .error(&mut self.b, "only one root element is allowed");
                    }
                    has_root = true;
                }
                T::CommentStart => {
                    self.comment();
                }
                T::PiStart => {
                    self.processing_instruction();
                }
                T::WhiteSpace => self.b.bump(),
                T::DoctypeStart => {
                    let doctype = self.doctype();
                    doctype
                        .precede(&mut self.b)
                        .error(&mut self.b, "doctype must precede the root element");
                }
                T::CdataStart => {
                    let cdata = self.cdata();
                    cdata
                        .precede(&mut self.b)
                        .error(&mut self.b, "CDATA is not allowed outside the root element");
                }
                T::EndTagStart => self.stray_footer(),
                _ => self
                    .b
                    .bump_error("text is not allowed outside the root element"),
            }
        }
        if !has_root {
            let root = self.b.mark();
            self.b.error("root element is missing");
            root.done(&mut self.b, SyntaxKind::Tag);
        }
        doc.done(&mut self.b, SyntaxKind::Document);
    }

    fn prolog(&mut self) {
        let m = self.b.mark();
        loop {
            match self.b.current() {
                Some(T::PiStart) => {
                    self.processing_instruction();
                }
                Some(T::DoctypeStart) => {
                    self.doctype();
                }
                Some(T::CommentStart) => {
                    self.comment();
                }
                Some(T::WhiteSpace) => self.b.bump(),
                _ => break,
            }
        }
        m.done(&mut self.b, SyntaxKind::Prolog);
    }

    fn tag(&mut self) -> CompletedMarker {
        let m = self.b.mark();
        self.b.bump();

        if self.open_tags.len() >= self.max_depth {
            while !matches!(
                self.b.current(),
                None | Some(T::TagEnd | T::EmptyElementEnd | T::StartTagStart | T::EndTagStart)
            ) {
                self.b.bump();
            }
            if !self.b.eat(T::TagEnd) {
                self.b.eat(T::EmptyElementEnd);
            }
            return m.error(&mut self.b, "elements are nested too deeply");
        }

        let name = if self.b.at(T::Name) {
            let name = self.b.current_text();
            self.b.bump();
            name
        } else {
            self.b.error("tag name expected");
            ""
        };

        loop {
            match self.b.current() {
                Some(T::WhiteSpace) => self.b.bump(),
                Some(T::Name) => self.attribute(),
                Some(T::AttrValueStart) => {
                    let value = self.attribute_value();
                    value
                        .precede(&mut self.b)
                        .error(&mut self.b, "attribute name expected");
                }
                Some(T::TagEnd | T::EmptyElementEnd) | None => break,
                Some(
                    T::StartTagStart
                    | T::EndTagStart
                    | T::CommentStart
                    | T::CdataStart
                    | T::PiStart
                    | T::DoctypeStart,
                ) => break,
                Some(_) => self.b.bump_error("unexpected character in tag"),
            }
        }

        match self.b.current() {
            Some(T::EmptyElementEnd) => {
                self.b.bump();
                return m.done(&mut self.b, SyntaxKind::Tag);
            }
            Some(T::TagEnd) => self.b.bump(),
            _ => {
                self.b.error("'>' expected");
                return m.done(&mut self.b, SyntaxKind::Tag);
            }
        }

        self.open_tags.push(name);
        self.tag_content();
        self.tag_footer();
        m.done(&mut self.b, SyntaxKind::Tag)
    }

    fn tag_content(&mut self) {
        loop {
            match self.b.current() {
                None | Some(T::EndTagStart) => break,
                Some(T::StartTagStart) => {
                    self.tag();
                }
                Some(T::PiStart) => {
                    self.processing_instruction();
                }
                Some(T::CharEntityRef | T::EntityRef) => self.reference(),
                Some(T::CdataStart) => {
                    self.cdata();
                }
                Some(T::CommentStart) => {
                    self.comment();
                }
                Some(T::DataCharacters | T::WhiteSpace) => self.text(),
                Some(T::BadCharacter) => self.b.bump_error(BAD_AMPERSAND),
                Some(T::DoctypeStart) => {
                    let doctype = self.doctype();
                    doctype
                        .precede(&mut self.b)
                        .error(&mut self.b, "doctype is not allowed in element content");
                }
                Some(_) => self.b.bump_error("unexpected token in element content"),
            }
        }
    }

    /// `</name>` of the innermost open element, which is popped here.
    fn tag_footer(&mut self) {
        let open = self.open_tags.pop().unwrap_or_default();
        if !self.b.at(T::EndTagStart) {
            self.b.error(format!("element <{open}> is not closed"));
            return;
        }

        let footer = self.b.mark();
        self.b.bump();
        if self.b.at(T::Name) {
            let closing = self.b.current_text();
            if closing != open {
                if self.open_tags.contains(&closing) {
                    footer.rollback(&mut self.b);
                    self.b.error(format!("element <{open}> is not closed"));
                    return;
                }
                self.b
                    .bump_error(format!("closing tag </{closing}> does not match <{open}>"));
            } else {
                self.b.bump();
            }
        } else {
            self.b.error("closing tag name missing");
        }
        self.b.eat_whitespace();
        if !self.b.eat(T::TagEnd) {
            self.b.error("'>' expected");
        }
        footer.abandon(&mut self.b);
    }

    fn stray_footer(&mut self) {
        let m = self.b.mark();
        self.b.bump();
        self.b.eat(T::Name);
        self.b.eat_whitespace();
        self.b.eat(T::TagEnd);
        m.error(&mut self.b, "closing tag has no matching opening tag");
    }

    fn attribute(&mut self) {
        let m = self.b.mark();
        if self.b.raw_lookbehind() != Some(T::WhiteSpace) {
            self.b.error("attributes should be separated by whitespace");
        }
        self.b.bump();
        self.b.eat_whitespace();
        if !self.b.eat(T::Eq) {
            self.b.error("'=' expected");
            if !self.b.at(T::AttrValueStart) {
                m.done(&mut self.b, SyntaxKind::Attribute);
                return;
            }
        }
        self.b.eat_whitespace();
        if self.b.at(T::AttrValueStart) {
            self.attribute_value();
        } else {
            self.b.error("attribute value expected");
        }
        m.done(&mut self.b, SyntaxKind::Attribute);
    }

    fn attribute_value(&mut self) -> CompletedMarker {
        let m = self.b.mark();
        self.b.bump();
        loop {
            match self.b.current() {
                Some(T::AttrValueEnd) => {
                    self.b.bump();
                    break;
                }
                Some(T::AttrValueToken) => self.b.bump(),
                Some(T::CharEntityRef | T::EntityRef) => self.reference(),
                Some(T::BadCharacter) => self.b.bump_error(BAD_AMPERSAND),
                _ => {
                    self.b.error("unterminated attribute value");
                    break;
                }
            }
        }
        m.done(&mut self.b, SyntaxKind::AttributeValue)
    }

    fn reference(&mut self) {
        let current = self.b.current();
        debug_assert!(
            current.is_some_and(XmlTokenKind::is_reference),
            "unexpected token in reference: {current:?}"
        );
        let kind = if current == Some(T::CharEntityRef) {
            SyntaxKind::CharRef
        } else {
            SyntaxKind::EntityRef
        };
        let m = self.b.mark();
        self.b.bump();
        m.done(&mut self.b, kind);
    }

    fn text(&mut self) {
        let m = self.b.mark();
        while matches!(self.b.current(), Some(T::DataCharacters | T::WhiteSpace)) {
            self.b.bump();
        }
        m.done(&mut self.b, SyntaxKind::Text);
    }

    fn comment(&mut self) -> CompletedMarker {
        self.delimited(
            T::CommentCharacters,
            T::CommentEnd,
            SyntaxKind::Comment,
            "unterminated comment",
        )
    }

    fn cdata(&mut self) -> CompletedMarker {
        self.delimited(
            T::CdataCharacters,
            T::CdataEnd,
            SyntaxKind::Cdata,
            "unterminated CDATA section",
        )
    }

    fn delimited(
        &mut self,
        body: XmlTokenKind,
        end: XmlTokenKind,
        kind: SyntaxKind,
        unterminated: &str,
    ) -> CompletedMarker {
        let m = self.b.mark();
        self.b.bump();
        while self.b.eat(body) {}
        if !self.b.eat(end) {
            self.b.error(unterminated);
        }
        m.done(&mut self.b, kind)
    }

    /// `<?target ...?>`. The XML declaration carries pseudo-attributes,
    /// everything else a free-form body.
    fn processing_instruction(&mut self) -> CompletedMarker {
        let m = self.b.mark();
        self.b.bump();
        if !self.b.eat(T::PiTarget) {
            self.b.error("processing instruction target expected");
        }
        loop {
            match self.b.current() {
                Some(T::PiEnd) => {
                    self.b.bump();
                    break;
                }
                Some(T::PiCharacters | T::WhiteSpace) => self.b.bump(),
                Some(T::Name) => self.attribute(),
                Some(T::AttrValueStart) => {
                    let value = self.attribute_value();
                    value
                        .precede(&mut self.b)
                        .error(&mut self.b, "attribute name expected");
                }
                Some(T::Eq | T::BadCharacter) => {
                    self.b.bump_error("unexpected character in declaration");
                }
                _ => {
                    self.b.error("unterminated processing instruction");
                    break;
                }
            }
        }
        m.done(&mut self.b, SyntaxKind::ProcessingInstruction)
    }

    fn doctype(&mut self) -> CompletedMarker {
        let m = self.b.mark();
        self.b.bump();
        loop {
            match self.b.current() {
                Some(T::DoctypeText | T::WhiteSpace) => self.b.bump(),
                Some(T::DoctypeEnd) => {
                    self.b.bump();
                    break;
                }
                _ => {
                    self.b.error("unterminated doctype");
                    break;
                }
            }
        }
        m.done(&mut self.b, SyntaxKind::Doctype)
    }
}

#[cfg(test)]
mod tests {
    use crate::syntax::{SyntaxKind, SyntaxNode};
    use crate::token::Span;
    use crate::{ParserConfig, XmlParse, parse, parse_with_config};

    fn messages(doc: &XmlParse) -> Vec<&str> {
        doc.errors.iter().map(|e| e.message.as_str()).collect()
    }

    fn root_tag(doc: &XmlParse) -> &SyntaxNode {
        doc.root.subtags().next().expect("document has a root tag")
    }

    #[test]
    fn well_formed_document_has_no_errors() {
        let input = r#"<?xml version="1.0"?>
<!DOCTYPE note>
<!-- header -->
<note lang="en">
  <to>Tove &amp; Jani</to>
  <body><![CDATA[<raw>]]>&#65;</body>
  <?render fast?>
</note>
"#;
        let doc = parse(input);
        assert!(doc.is_ok(), "{:?}", doc.errors);
        assert_eq!(doc.root.text(), input);

        let prolog = doc.root.child_nodes().next().expect("prolog");
        assert_eq!(prolog.kind(), SyntaxKind::Prolog);
        let kinds: Vec<_> = prolog.child_nodes().map(SyntaxNode::kind).collect();
        assert_eq!(
            kinds,
            [SyntaxKind::ProcessingInstruction, SyntaxKind::Doctype, SyntaxKind::Comment]
        );

        let note = root_tag(&doc);
        assert_eq!(note.tag_name(), Some("note"));
        assert_eq!(note.attribute("lang").as_deref(), Some("en"));
        let children: Vec<_> = note.subtags().filter_map(SyntaxNode::tag_name).collect();
        assert_eq!(children, ["to", "body"]);
        assert!(note.descendants().any(|n| n.kind() == SyntaxKind::EntityRef));
        assert!(note.descendants().any(|n| n.kind() == SyntaxKind::CharRef));
        assert!(note.descendants().any(|n| n.kind() == SyntaxKind::Cdata));
    }

    #[test]
    fn xml_declaration_attributes_are_nodes() {
        let doc = parse(r#"<?xml version="1.0" encoding="UTF-8"?><r/>"#);
        assert!(doc.is_ok());
        let decl = doc
            .root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::ProcessingInstruction)
            .expect("declaration");
        assert_eq!(
            decl.child_nodes()
                .filter(|n| n.kind() == SyntaxKind::Attribute)
                .count(),
            2
        );
    }

    #[test]
    fn mismatched_close_rolls_back_to_enclosing_element() {
        let doc = parse("<a><b></a>");
        assert_eq!(messages(&doc), ["element <b> is not closed"]);
        assert_eq!(doc.errors[0].range, Span::at(6));

        let a = root_tag(&doc);
        assert_eq!(a.tag_name(), Some("a"));
        assert_eq!(a.text(), "<a><b></a>");
        let b = a.subtags().next().expect("b");
        assert_eq!(b.tag_name(), Some("b"));
        assert_eq!(b.text(), "<b>");
    }

    #[test]
    fn unknown_close_name_is_consumed_with_error() {
        let doc = parse("<a></x>");
        assert_eq!(messages(&doc), ["closing tag </x> does not match <a>"]);
        assert_eq!(root_tag(&doc).text(), "<a></x>");
    }

    #[test]
    fn missing_close_name_and_missing_close() {
        let doc = parse("<a></>");
        assert_eq!(messages(&doc), ["closing tag name missing"]);

        let doc = parse("<a><b>");
        assert_eq!(
            messages(&doc),
            ["element <b> is not closed", "element <a> is not closed"]
        );
    }

    #[test]
    fn attribute_recovery() {
        let doc = parse(r#"<a b c="1"d='2' e=>"#);
        assert_eq!(
            messages(&doc),
            [
                "'=' expected",
                "attributes should be separated by whitespace",
                "attribute value expected",
                "element <a> is not closed",
            ]
        );
        assert_eq!(root_tag(&doc).attribute("c").as_deref(), Some("1"));
        assert_eq!(root_tag(&doc).attribute("d").as_deref(), Some("2"));
    }

    #[test]
    fn unterminated_value_yields_to_next_tag() {
        let doc = parse(r#"<a b="x<c/></a>"#);
        let msgs = messages(&doc);
        assert!(msgs.contains(&"unterminated attribute value"), "{msgs:?}");
        assert!(msgs.contains(&"'>' expected"), "{msgs:?}");
        assert_eq!(doc.root.text(), r#"<a b="x<c/></a>"#);
    }

    #[test]
    fn unterminated_constructs_are_reported() {
        for (input, message) in [
            ("<r><!-- open", "unterminated comment"),
            ("<r><![CDATA[ open", "unterminated CDATA section"),
            ("<r><?pi open", "unterminated processing instruction"),
            ("<!DOCTYPE r", "unterminated doctype"),
        ] {
            let doc = parse(input);
            assert!(messages(&doc).contains(&message), "{input}: {:?}", doc.errors);
            assert_eq!(doc.root.text(), input);
        }
    }

    #[test]
    fn missing_root_synthesizes_empty_tag() {
        let doc = parse("<!-- only a comment -->");
        assert_eq!(messages(&doc), ["root element is missing"]);
        let root = root_tag(&doc);
        assert!(root.span().is_empty());
        assert_eq!(
            root.child_nodes().next().and_then(SyntaxNode::error),
            Some("root element is missing")
        );

        let doc = parse("");
        assert_eq!(doc.root.kind(), SyntaxKind::Document);
        assert_eq!(messages(&doc), ["root element is missing"]);
    }

    #[test]
    fn content_outside_root_is_wrapped() {
        let doc = parse("x<a/><b/></c>");
        assert_eq!(
            messages(&doc),
            [
                "text is not allowed outside the root element",
                "only one root element is allowed",
                "closing tag has no matching opening tag",
            ]
        );
        assert_eq!(doc.root.subtags().count(), 1);
    }

    #[test]
    fn lone_ampersand_in_content() {
        let doc = parse("<a>fish & chips</a>");
        assert_eq!(messages(&doc), ["'&' must start a character or entity reference"]);
    }

    #[test]
    fn depth_guard_stops_descent() {
        let config = ParserConfig::default().with_max_tag_depth(2);
        let doc = parse_with_config("<a><b><c><d/></c></b></a>", &config);
        let msgs = messages(&doc);
        assert!(msgs.contains(&"elements are nested too deeply"), "{msgs:?}");
        assert_eq!(doc.root.text(), "<a><b><c><d/></c></b></a>");
    }

    #[test]
    fn deep_nesting_within_default_limit() {
        let depth = 500;
        let input = format!("{}{}", "<x>".repeat(depth), "</x>".repeat(depth));
        let doc = parse(&input);
        assert!(doc.is_ok());
        assert_eq!(doc.root.descendants().filter(|n| n.kind() == SyntaxKind::Tag).count(), depth);
    }

    #[test]
    fn dump_shows_error_messages() {
        let dump = parse("<a").root.debug_dump();
        assert!(dump.starts_with("Document@0..2\n  Prolog@0..0\n  Tag@0..2\n"), "{dump}");
        assert!(dump.contains("Error@2..2 \"'>' expected\""), "{dump}");
    }
}
