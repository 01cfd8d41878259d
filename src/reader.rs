//! The tokenizer: the central pull engine.
//!
//! [`Parser::next`] advances a logical cursor over the input, dispatches on
//! the first non-whitespace byte, and produces exactly one [`Event`] per
//! call. It owns the namespace stack, tag stack, attribute scratch pool, and
//! (indirectly, through [`crate::cursor::Cursor`]) the virtual stream stack
//! used for entity expansion.

use xmltok_dtd::{pi, quoted};

use crate::cursor::{Cursor, Source};
use crate::doctype::DocType;
use crate::entities;
use crate::error::{Error, Position, PositionedError, Result};
use crate::events::{
    Attribute, Declaration, DocTypeEvent, EndElement, Event, ProcessingInstruction, StartElement,
};
use crate::grammar;
use crate::intern::{self, Symbol};
use crate::namespace::NamespaceStack;
use crate::pool::Pool;

type StepResult = std::result::Result<Event, PositionedError>;

struct TagFrame {
    uri: Option<Symbol>,
    prefix: Option<Symbol>,
    name: Symbol,
    ns_count: usize,
}

/// A namespace-aware, pull-style XML 1.0 tokenizer.
///
/// Construct with [`Parser::new`] (or [`Parser::with_doctype`] to seed a
/// pre-built `DocType` instead of waiting for a `<!DOCTYPE>` in the
/// document), then call [`Parser::next`] until it returns
/// [`Event::EndDocument`] or [`Event::Error`].
pub struct Parser {
    cursor: Cursor,
    tag_stack: Pool<TagFrame>,
    ns_stack: NamespaceStack,
    attr_pool: Pool<Attribute>,
    doctype: Option<DocType>,
    doctype_seen: bool,
    pending_end_tag: Option<EndElement>,
}

impl Parser {
    /// Creates a parser over `source` with no pre-existing `DocType`; one is
    /// built automatically if the document contains a `<!DOCTYPE ...>`.
    pub fn new(source: Source) -> Result<Self> {
        Self::with_doctype(source, None)
    }

    /// Creates a parser, seeding it with `doctype` as if it had already been
    /// read from a `<!DOCTYPE ...>` declaration. A `<!DOCTYPE>` actually
    /// present in the document is then a duplicate-DOCTYPE error, matching
    /// the "second DOCTYPE in the same document is fatal" rule.
    pub fn with_doctype(source: Source, doctype: Option<DocType>) -> Result<Self> {
        Ok(Parser {
            cursor: Cursor::new(source)?,
            tag_stack: Pool::new(),
            ns_stack: NamespaceStack::new(),
            attr_pool: Pool::new(),
            doctype_seen: doctype.is_some(),
            doctype,
            pending_end_tag: None,
        })
    }

    /// Registers a namespace prefix binding at the bottom of the namespace
    /// stack. Must be called before the first [`Parser::next`] call.
    pub fn add_namespace(&mut self, prefix: &str, uri: &str) {
        let prefix = if prefix.is_empty() {
            None
        } else {
            Some(intern::intern(prefix.as_bytes()))
        };
        self.ns_stack.push(prefix, uri.to_string());
    }

    /// The `DocType` built from (or passed in for) this document, if any.
    pub fn doctype(&self) -> Option<&DocType> {
        self.doctype.as_ref()
    }

    /// Produces the next event. After an [`Event::Error`] or
    /// [`Event::EndDocument`], further calls have no defined behavior beyond
    /// not panicking.
    pub fn next(&mut self) -> Event {
        if let Some(end) = self.pending_end_tag.take() {
            return Event::EndElement(end);
        }
        match self.step() {
            Ok(event) => event,
            Err(error) => Event::Error(error),
        }
    }

    #[inline]
    fn fail(&self, error: Error) -> PositionedError {
        PositionedError {
            error,
            position: self.cursor.position(),
        }
    }

    fn step(&mut self) -> StepResult {
        match self.cursor.current() {
            0 => {
                self.cursor.take_error().map_err(|e| self.fail(e))?;
                if self.tag_stack.is_empty() {
                    Ok(Event::EndDocument)
                } else {
                    let open = self.tag_stack.top().expect("checked non-empty above");
                    let name = self.qualified_display(open.prefix, open.name);
                    Err(self.fail(Error::MissingEndTag(name)))
                }
            }
            b'<' => {
                self.cursor.advance();
                self.dispatch_markup()
            }
            _ => self.read_text(),
        }
    }

    fn qualified_display(&self, prefix: Option<Symbol>, name: Symbol) -> String {
        match prefix {
            Some(p) => format!(
                "{}:{}",
                String::from_utf8_lossy(p.as_bytes()),
                String::from_utf8_lossy(name.as_bytes())
            ),
            None => String::from_utf8_lossy(name.as_bytes()).into_owned(),
        }
    }

    fn dispatch_markup(&mut self) -> StepResult {
        match self.cursor.current() {
            b'?' => {
                self.cursor.advance();
                self.read_pi_or_decl()
            }
            b'!' => {
                self.cursor.advance();
                self.read_bang()
            }
            b'/' => {
                self.cursor.advance();
                self.read_end_tag()
            }
            b if grammar::is_name_start(b) => self.read_start_tag(),
            _ => Err(self.fail(Error::InvalidToken(
                "expected '<!', '<?', '</' or an element name after '<'".to_string(),
            ))),
        }
    }

    // ---- processing instructions & XML declaration (spec 4.7) ----

    fn read_pi_or_decl(&mut self) -> StepResult {
        let target = grammar::read_name(&mut self.cursor).map_err(|e| self.fail(e))?;
        if target == b"xml" && grammar::is_space(self.cursor.current()) {
            self.read_xml_decl()
        } else {
            self.read_pi(target)
        }
    }

    fn read_xml_decl(&mut self) -> StepResult {
        grammar::expect_s(&mut self.cursor).map_err(|e| self.fail(e))?;

        self.expect_pseudo_attr_name(b"version")?;
        let version = self.read_pseudo_attr_value()?;
        grammar::skip_s(&mut self.cursor);

        let mut encoding = None;
        if grammar::is_name_start(self.cursor.current()) {
            self.expect_pseudo_attr_name(b"encoding")?;
            encoding = Some(self.read_pseudo_attr_value()?);
            grammar::skip_s(&mut self.cursor);
        }

        let mut standalone = None;
        if grammar::is_name_start(self.cursor.current()) {
            self.expect_pseudo_attr_name(b"standalone")?;
            let value = self.read_pseudo_attr_value()?;
            standalone = Some(match value.as_str() {
                "yes" => true,
                "no" => false,
                _ => return Err(self.fail(Error::BadXmlDecl("standalone must be 'yes' or 'no'".to_string()))),
            });
            grammar::skip_s(&mut self.cursor);
        }

        if self.cursor.current() != b'?' {
            return Err(self.fail(Error::BadXmlDecl("expected '?>'".to_string())));
        }
        self.cursor.advance();
        if self.cursor.current() != b'>' {
            return Err(self.fail(Error::BadXmlDecl("expected '?>'".to_string())));
        }
        self.cursor.advance();

        Ok(Event::Decl(Declaration {
            version,
            encoding: Some(encoding.unwrap_or_else(|| "utf-8".to_string())),
            standalone,
        }))
    }

    fn expect_pseudo_attr_name(&mut self, expected: &[u8]) -> std::result::Result<(), PositionedError> {
        let name = grammar::read_name(&mut self.cursor).map_err(|e| self.fail(e))?;
        if name != expected {
            return Err(self.fail(Error::BadXmlDecl(format!(
                "expected '{}'",
                String::from_utf8_lossy(expected)
            ))));
        }
        Ok(())
    }

    fn read_pseudo_attr_value(&mut self) -> std::result::Result<String, PositionedError> {
        grammar::skip_eq(&mut self.cursor).map_err(|e| self.fail(e))?;
        let quote = self.cursor.current();
        if quote != b'\'' && quote != b'"' {
            return Err(self.fail(Error::BadXmlDecl("expected a quoted value".to_string())));
        }
        let mut value = Vec::new();
        quoted::read_quoted(&mut self.cursor, |b| value.push(b))
            .map_err(|_| self.fail(Error::BadXmlDecl("unterminated value".to_string())))?;
        String::from_utf8(value).map_err(|e| self.fail(Error::Utf8(e.utf8_error())))
    }

    fn read_pi(&mut self, target: Vec<u8>) -> StepResult {
        let target = String::from_utf8(target).map_err(|e| self.fail(Error::Utf8(e.utf8_error())))?;
        let mut content = Vec::new();
        pi::skip_to_pi_end(&mut self.cursor, |b| content.push(b))
            .map_err(|_| self.fail(Error::InvalidToken("unterminated processing instruction".to_string())))?;
        let mut content = String::from_utf8(content).map_err(|e| self.fail(Error::Utf8(e.utf8_error())))?;
        if content.starts_with(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n')) {
            content.remove(0);
        }
        Ok(Event::Pi(ProcessingInstruction { target, content }))
    }

    // ---- comment / CDATA / DOCTYPE dispatch (spec 4.8, 4.9) ----

    fn read_bang(&mut self) -> StepResult {
        match self.cursor.current() {
            b'-' => {
                self.cursor.advance();
                grammar::expect_byte(&mut self.cursor, b'-').map_err(|e| self.fail(e))?;
                self.read_comment()
            }
            b'[' => {
                self.cursor.advance();
                self.read_cdata()
            }
            b'D' => self.read_doctype(),
            _ => Err(self.fail(Error::InvalidToken("expected comment, CDATA, or DOCTYPE".to_string()))),
        }
    }

    fn read_comment(&mut self) -> StepResult {
        let mut text = Vec::new();
        let mut dashes = 0u8;
        loop {
            match self.cursor.current() {
                0 => return Err(self.fail(Error::InvalidToken("unterminated comment".to_string()))),
                b'-' => {
                    dashes = (dashes + 1).min(2);
                    self.cursor.advance();
                }
                b'>' if dashes >= 2 => {
                    self.cursor.advance();
                    break;
                }
                b => {
                    if dashes > 0 {
                        text.extend(std::iter::repeat(b'-').take(dashes as usize));
                        dashes = 0;
                    }
                    text.push(b);
                    self.cursor.advance();
                }
            }
        }
        let text = String::from_utf8(text).map_err(|e| self.fail(Error::Utf8(e.utf8_error())))?;
        Ok(Event::Comment(text))
    }

    fn read_cdata(&mut self) -> StepResult {
        for expected in b"CDATA[" {
            grammar::expect_byte(&mut self.cursor, *expected).map_err(|e| self.fail(e))?;
        }
        let mut text = Vec::new();
        let mut close_run = 0usize;
        loop {
            match self.cursor.current() {
                0 => return Err(self.fail(Error::InvalidToken("unterminated CDATA section".to_string()))),
                b']' => {
                    close_run += 1;
                    text.push(b']');
                    self.cursor.advance();
                }
                b'>' if close_run >= 2 => {
                    self.cursor.advance();
                    text.truncate(text.len() - 2);
                    break;
                }
                b => {
                    close_run = 0;
                    text.push(b);
                    self.cursor.advance();
                }
            }
        }
        let text = String::from_utf8(text).map_err(|e| self.fail(Error::Utf8(e.utf8_error())))?;
        Ok(Event::Cdata(text))
    }

    fn read_doctype(&mut self) -> StepResult {
        for expected in b"DOCTYPE" {
            grammar::expect_byte(&mut self.cursor, *expected).map_err(|e| self.fail(e))?;
        }
        if self.doctype_seen {
            return Err(self.fail(Error::DuplicateDoctype));
        }
        grammar::expect_s(&mut self.cursor).map_err(|e| self.fail(e))?;
        let name = grammar::read_name(&mut self.cursor).map_err(|e| self.fail(e))?;
        let name = String::from_utf8(name).map_err(|e| self.fail(Error::Utf8(e.utf8_error())))?;
        grammar::expect_s(&mut self.cursor).map_err(|e| self.fail(e))?;

        let mut public_id = None;
        let mut system_id = None;
        match self.cursor.current() {
            b'S' => {
                for expected in b"SYSTEM" {
                    grammar::expect_byte(&mut self.cursor, *expected).map_err(|e| self.fail(e))?;
                }
                grammar::expect_s(&mut self.cursor).map_err(|e| self.fail(e))?;
                system_id = Some(self.read_literal()?);
            }
            b'P' => {
                for expected in b"PUBLIC" {
                    grammar::expect_byte(&mut self.cursor, *expected).map_err(|e| self.fail(e))?;
                }
                grammar::expect_s(&mut self.cursor).map_err(|e| self.fail(e))?;
                public_id = Some(self.read_literal()?);
                grammar::expect_s(&mut self.cursor).map_err(|e| self.fail(e))?;
                system_id = Some(self.read_literal()?);
            }
            _ => {}
        }

        grammar::skip_s(&mut self.cursor);

        let mut has_internal_subset = false;
        let mut int_subset = None;
        if self.cursor.current() == b'[' {
            has_internal_subset = true;
            self.cursor.advance();
            int_subset = Some(self.read_internal_subset_text()?);
            grammar::skip_s(&mut self.cursor);
        }

        grammar::expect_byte(&mut self.cursor, b'>').map_err(|e| self.fail(e))?;

        let doctype = DocType::new(
            public_id.as_deref(),
            system_id.as_deref(),
            int_subset.as_deref(),
        )
        .map_err(|e| self.fail(e))?;
        self.doctype = Some(doctype);
        self.doctype_seen = true;

        Ok(Event::DocType(DocTypeEvent {
            name,
            public_id,
            system_id,
            has_internal_subset,
        }))
    }

    fn read_literal(&mut self) -> std::result::Result<String, PositionedError> {
        let quote = self.cursor.current();
        if quote != b'\'' && quote != b'"' {
            return Err(self.fail(Error::InvalidToken("expected a quoted literal".to_string())));
        }
        let mut value = Vec::new();
        quoted::read_quoted(&mut self.cursor, |b| value.push(b))
            .map_err(|_| self.fail(Error::InvalidToken("unterminated literal".to_string())))?;
        String::from_utf8(value).map_err(|e| self.fail(Error::Utf8(e.utf8_error())))
    }

    /// Captures the literal text of an internal subset, given a cursor just
    /// past its opening `[`. Tracks quote state so a `]` inside an
    /// attribute-default-value literal does not end the subset early.
    fn read_internal_subset_text(&mut self) -> std::result::Result<String, PositionedError> {
        let mut text = Vec::new();
        let mut quote: u8 = 0;
        loop {
            match self.cursor.current() {
                0 => return Err(self.fail(Error::InvalidToken("unterminated internal subset".to_string()))),
                b']' if quote == 0 => {
                    self.cursor.advance();
                    break;
                }
                q @ (b'\'' | b'"') if quote == 0 => {
                    quote = q;
                    text.push(q);
                    self.cursor.advance();
                }
                q if q == quote => {
                    quote = 0;
                    text.push(q);
                    self.cursor.advance();
                }
                b => {
                    text.push(b);
                    self.cursor.advance();
                }
            }
        }
        String::from_utf8(text).map_err(|e| self.fail(Error::Utf8(e.utf8_error())))
    }

    // ---- start / end tags (spec 4.5, 4.6) ----

    fn read_start_tag(&mut self) -> StepResult {
        let (prefix, local) = grammar::read_qname(&mut self.cursor).map_err(|e| self.fail(e))?;
        let prefix_sym = prefix.as_deref().map(intern::intern);
        let local_sym = intern::intern(&local);

        self.attr_pool.truncate(0);
        let ns_mark = self.ns_stack.len();
        let mut self_closing = false;

        loop {
            grammar::skip_s(&mut self.cursor);
            match self.cursor.current() {
                b'/' => {
                    self.cursor.advance();
                    grammar::expect_byte(&mut self.cursor, b'>').map_err(|e| self.fail(e))?;
                    self_closing = true;
                    break;
                }
                b'>' => {
                    self.cursor.advance();
                    break;
                }
                0 => return Err(self.fail(Error::InvalidToken("unterminated start tag".to_string()))),
                _ => self.read_attribute()?,
            }
        }

        // Classify every attribute: an `xmlns`/`xmlns:*` declaration pushes a
        // namespace binding and is otherwise left alone (its own `uri` stays
        // `None` — it is not itself resolved against the stack it is
        // populating); every other ("non-default") attribute has its URI
        // resolved against the now-complete stack below.
        let mut is_ns_decl = vec![false; self.attr_pool.len()];
        for i in 0..self.attr_pool.len() {
            let (attr_prefix, attr_name, value) = {
                let attr = self.attr_pool.get(i);
                (attr.prefix, attr.name, attr.value.clone())
            };
            if attr_prefix.is_none() && attr_name.as_bytes() == b"xmlns" {
                self.ns_stack.push(None, value);
                is_ns_decl[i] = true;
            } else if attr_prefix == Some(*intern::XMLNS) {
                self.ns_stack.push(Some(attr_name), value);
                is_ns_decl[i] = true;
            }
        }

        let uri = self.resolve_element_uri(prefix_sym)?;

        for i in 0..self.attr_pool.len() {
            if is_ns_decl[i] {
                continue;
            }
            let attr_prefix = self.attr_pool.get(i).prefix;
            let resolved_uri = match attr_prefix {
                None => None,
                Some(p) => Some(self.resolve_prefix(p)?),
            };
            self.attr_pool.get_mut(i).uri = resolved_uri;
        }

        let ns_count = self.ns_stack.len() - ns_mark;
        self.tag_stack.push(TagFrame {
            uri,
            prefix: prefix_sym,
            name: local_sym,
            ns_count,
        });

        let attributes = self.attr_pool.as_slice().to_vec();

        if self_closing {
            let frame = self.tag_stack.pop().expect("just pushed");
            self.ns_stack.truncate(self.ns_stack.len() - frame.ns_count);
            self.pending_end_tag = Some(EndElement {
                uri: frame.uri,
                prefix: frame.prefix,
                name: frame.name,
            });
        }

        Ok(Event::StartElement(StartElement {
            uri,
            name: local_sym,
            prefix: prefix_sym,
            attributes,
            self_closing,
        }))
    }

    fn read_attribute(&mut self) -> std::result::Result<(), PositionedError> {
        let (prefix, local) = grammar::read_qname(&mut self.cursor).map_err(|e| self.fail(e))?;
        grammar::skip_eq(&mut self.cursor).map_err(|e| self.fail(e))?;
        let value = self.read_att_value()?;
        self.attr_pool.push(Attribute {
            uri: None,
            prefix: prefix.as_deref().map(intern::intern),
            name: intern::intern(&local),
            value,
        });
        Ok(())
    }

    fn read_att_value(&mut self) -> std::result::Result<String, PositionedError> {
        let quote = self.cursor.current();
        if quote != b'\'' && quote != b'"' {
            return Err(self.fail(Error::InvalidToken("expected a quoted attribute value".to_string())));
        }
        self.cursor.advance();
        let mut buf = Vec::new();
        loop {
            match self.cursor.current() {
                0 => return Err(self.fail(Error::InvalidToken("unterminated attribute value".to_string()))),
                b'<' => return Err(self.fail(Error::InvalidToken("'<' is not allowed in an attribute value".to_string()))),
                b'&' => self.handle_entity_ref(&mut buf)?,
                b if b == quote && !self.cursor.in_virtual_stream() => {
                    self.cursor.advance();
                    break;
                }
                b => {
                    buf.push(b);
                    self.cursor.advance();
                }
            }
        }
        String::from_utf8(buf).map_err(|e| self.fail(Error::Utf8(e.utf8_error())))
    }

    fn resolve_element_uri(&self, prefix: Option<Symbol>) -> std::result::Result<Option<Symbol>, PositionedError> {
        match prefix {
            None => Ok(self.ns_stack.default_uri().map(intern::intern)),
            Some(p) => Ok(Some(self.resolve_prefix(p)?)),
        }
    }

    fn resolve_prefix(&self, prefix: Symbol) -> std::result::Result<Symbol, PositionedError> {
        self.ns_stack
            .resolve(Some(prefix))
            .map(intern::intern)
            .ok_or_else(|| {
                self.fail(Error::InvalidNamespace(
                    String::from_utf8_lossy(prefix.as_bytes()).into_owned(),
                ))
            })
    }

    fn read_end_tag(&mut self) -> StepResult {
        let name_start = self.cursor.position();
        let (prefix, local) = grammar::read_qname(&mut self.cursor).map_err(|e| self.fail(e))?;
        grammar::skip_s(&mut self.cursor);
        grammar::expect_byte(&mut self.cursor, b'>').map_err(|e| self.fail(e))?;

        let prefix_sym = prefix.as_deref().map(intern::intern);
        let local_sym = intern::intern(&local);
        let uri = self.resolve_element_uri(prefix_sym)?;

        let frame = self.tag_stack.pop().ok_or_else(|| {
            PositionedError {
                error: Error::MismatchedTag {
                    expected: "(none open)".to_string(),
                    found: self.qualified_display(prefix_sym, local_sym),
                },
                position: name_start,
            }
        })?;

        if frame.name != local_sym || frame.prefix != prefix_sym {
            // Restore the frame: the document is fatally malformed either
            // way, but leaving the stack as it was keeps a caller's partial
            // traversal (if they inspect it after the error) coherent.
            let expected = self.qualified_display(frame.prefix, frame.name);
            let found = self.qualified_display(prefix_sym, local_sym);
            self.tag_stack.push(frame);
            return Err(PositionedError {
                error: Error::MismatchedTag { expected, found },
                position: name_start,
            });
        }

        self.ns_stack.truncate(self.ns_stack.len() - frame.ns_count);

        Ok(Event::EndElement(EndElement {
            uri,
            prefix: prefix_sym,
            name: local_sym,
        }))
    }

    // ---- content / text mode (spec 4.11) ----

    fn read_text(&mut self) -> StepResult {
        let start = self.cursor.position();
        let mut buf: Vec<u8> = Vec::new();
        loop {
            match self.cursor.current() {
                0 => {
                    self.cursor
                        .take_error()
                        .map_err(|e| PositionedError { error: e, position: start })?;
                    break;
                }
                b'<' => break,
                b'&' => self.handle_entity_ref(&mut buf)?,
                b => {
                    buf.push(b);
                    self.cursor.advance();
                }
            }
        }
        let text = String::from_utf8(buf)
            .map_err(|e| PositionedError { error: Error::Utf8(e.utf8_error()), position: start })?;
        Ok(Event::Text(text))
    }

    /// Resolves `&...;`, given the cursor positioned on the leading `&`.
    /// Character references are decoded and appended to `buf` directly;
    /// named entities (built-in or DocType-declared) are pushed as a
    /// virtual stream so their own replacement text is re-scanned by
    /// whichever loop called this (spec 4.11: "pushing a virtual stream for
    /// named entities, appending for character references").
    fn handle_entity_ref(&mut self, buf: &mut Vec<u8>) -> std::result::Result<(), PositionedError> {
        self.cursor.advance(); // past '&'
        if self.cursor.current() == b'#' {
            self.cursor.advance();
            let hex = self.cursor.current() == b'x';
            if hex {
                self.cursor.advance();
            }
            let mut digits = String::new();
            loop {
                match self.cursor.current() {
                    b';' => break,
                    0 => return Err(self.fail(Error::BadEntity("unterminated character reference".to_string()))),
                    b => {
                        digits.push(b as char);
                        self.cursor.advance();
                    }
                }
            }
            self.cursor.advance(); // past ';'
            let c = entities::char_ref_value(&digits, hex).map_err(|e| self.fail(e))?;
            let mut encoded = [0u8; 4];
            buf.extend_from_slice(c.encode_utf8(&mut encoded).as_bytes());
            Ok(())
        } else {
            let name = grammar::read_name(&mut self.cursor).map_err(|e| self.fail(e))?;
            grammar::expect_byte(&mut self.cursor, b';').map_err(|e| self.fail(e))?;
            let name_str = String::from_utf8_lossy(&name);
            let replacement = entities::builtin_entity(&name).map(str::to_string).or_else(|| {
                self.doctype
                    .as_ref()
                    .and_then(|d| d.get_entity_value(&name_str))
                    .map(str::to_string)
            });
            match replacement {
                Some(text) => {
                    self.cursor.push_stream(text.into_bytes());
                    Ok(())
                }
                None => Err(self.fail(Error::BadEntity(format!("entity '&{name_str};' is not declared")))),
            }
        }
    }
}
