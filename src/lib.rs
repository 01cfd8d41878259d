//! A namespace-aware, pull-style XML 1.0 tokenizer with DTD-backed entity
//! resolution.
//!
//! ```
//! use xmltok::{Event, Parser, Source};
//!
//! let mut parser = Parser::new(Source::Memory(b"<a>hi</a>".to_vec())).unwrap();
//! loop {
//!     match parser.next() {
//!         Event::StartElement(s) => println!("start {}", String::from_utf8_lossy(s.name.as_bytes())),
//!         Event::Text(t) => println!("text {t}"),
//!         Event::EndElement(_) => println!("end"),
//!         Event::EndDocument => break,
//!         Event::Error(e) => { eprintln!("{e}"); break; }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! Construction of the first [`Parser`] initializes the process-wide string
//! interner and DTD catalog; both are shared across every parser instance
//! for the life of the process (see [`doctype_register_dtd`] and
//! [`doctype_global_reset`]).

mod catalog;
mod cursor;
mod doctype;
mod entities;
mod error;
mod events;
mod grammar;
mod intern;
mod namespace;
mod pool;
mod reader;

pub use cursor::Source;
pub use doctype::{normalize_public_id, DocType};
pub use error::{Error, Position, PositionedError, Result};
pub use events::{
    Attribute, Declaration, DocTypeEvent, EndElement, Event, ProcessingInstruction, StartElement,
};
pub use intern::Symbol;
pub use reader::Parser;

/// Registers a file as the external DTD for a normalized `PUBLIC` URN (see
/// [`normalize_public_id`]), a `SYSTEM` URI, or both. At least one of
/// `urn`/`uri` must be given. Duplicate registrations replace the previous
/// entry.
pub fn doctype_register_dtd(filename: impl AsRef<std::path::Path>, urn: Option<&str>, uri: Option<&str>) {
    catalog::register_dtd(filename, urn, uri);
}

/// Clears every catalog entry registered via [`doctype_register_dtd`].
/// Safe to call at any point, even with live parsers.
pub fn doctype_global_reset() {
    catalog::global_reset();
}
