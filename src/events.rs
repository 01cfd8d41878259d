//! The event model: everything `Parser::next` can hand back.
//!
//! Events borrow as little as possible — text and attribute values are
//! owned `String`s because they are frequently the product of entity
//! expansion and virtual-stream substitution, which have no single
//! contiguous span in the source to borrow from. Names, prefixes, and
//! namespace URIs are [`Symbol`]s: interned once per distinct string and
//! compared by pointer for the rest of the document's lifetime.

use crate::error::PositionedError;
use crate::intern::Symbol;

/// One attribute on a start tag, already namespace-classified.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// The namespace URI this attribute's name resolved to, or `None` if it
    /// has no prefix (unprefixed attributes never inherit the default
    /// namespace — only element names do).
    pub uri: Option<Symbol>,
    /// The attribute's local name (with any prefix stripped).
    pub name: Symbol,
    /// The attribute's raw prefix, if any, exactly as written.
    pub prefix: Option<Symbol>,
    /// The attribute's value, after entity and character reference
    /// expansion and attribute-value normalization.
    pub value: String,
}

/// The `<?xml version="1.0" ...?>` declaration, if present.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    /// The `version` pseudo-attribute, verbatim.
    pub version: String,
    /// The `encoding` pseudo-attribute, if given.
    pub encoding: Option<String>,
    /// The `standalone` pseudo-attribute, if given.
    pub standalone: Option<bool>,
}

/// A `<!DOCTYPE ...>` declaration.
#[derive(Debug, Clone)]
pub struct DocTypeEvent {
    /// The document (root) element name the DOCTYPE names.
    pub name: String,
    /// The `PUBLIC` identifier, if any.
    pub public_id: Option<String>,
    /// The `SYSTEM` identifier, if any.
    pub system_id: Option<String>,
    /// Whether an internal subset (`[...]`) was present.
    pub has_internal_subset: bool,
}

/// A start-tag event: `<prefix:local attr="value" ...>` (or the synthetic
/// start half of a self-closing `<x/>`).
#[derive(Debug, Clone)]
pub struct StartElement {
    /// The namespace URI the element name resolved to, if any.
    pub uri: Option<Symbol>,
    /// The element's local name (prefix stripped).
    pub name: Symbol,
    /// The element's raw prefix, if any, exactly as written.
    pub prefix: Option<Symbol>,
    /// Attributes in document order.
    pub attributes: Vec<Attribute>,
    /// True for `<x/>`: the matching `EndElement` follows immediately,
    /// synthesized by the parser rather than read from the source.
    pub self_closing: bool,
}

/// An end-tag event: `</prefix:local>`, explicit or synthesized for a
/// self-closing start tag.
#[derive(Debug, Clone)]
pub struct EndElement {
    /// The namespace URI the element name resolved to, if any.
    pub uri: Option<Symbol>,
    /// The element's local name (prefix stripped).
    pub name: Symbol,
    /// The element's raw prefix, if any, exactly as written.
    pub prefix: Option<Symbol>,
}

/// A processing instruction: `<?target content?>`.
#[derive(Debug, Clone)]
pub struct ProcessingInstruction {
    /// The PI target name.
    pub target: String,
    /// Everything between the target and the closing `?>`, with exactly one
    /// leading whitespace byte (if any) stripped.
    pub content: String,
}

/// Every event a [`crate::Parser`] can produce from a single `next()` call.
///
/// Not `Clone`: `Event::Error` carries a [`PositionedError`], and
/// [`crate::error::Error::Io`] holds a `std::io::Error`, which isn't `Clone`.
#[derive(Debug)]
pub enum Event {
    /// The XML declaration, if the document opens with one.
    Decl(Declaration),
    /// A `<!DOCTYPE ...>` declaration.
    DocType(DocTypeEvent),
    /// A start tag.
    StartElement(StartElement),
    /// An end tag (explicit or synthesized).
    EndElement(EndElement),
    /// Character data, after entity and character reference expansion.
    Text(String),
    /// A comment's content, excluding the `<!--`/`-->` delimiters.
    Comment(String),
    /// A CDATA section's raw content, excluding the `<![CDATA[`/`]]>`
    /// delimiters.
    Cdata(String),
    /// A processing instruction.
    Pi(ProcessingInstruction),
    /// The document ended with a well-formed, fully closed element tree.
    EndDocument,
    /// A fatal, unrecoverable error. No further `next()` call after this one
    /// produces anything but another `Error` (or is simply not made; the
    /// caller is expected to stop).
    Error(PositionedError),
}
