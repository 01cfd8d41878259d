//! Low-level, allocation-free scanners for the markup declarations that make
//! up a DTD internal or external subset.
//!
//! This crate knows nothing about files, catalogs, parameter-entity tables or
//! replacement text — it only knows how to recognize where a comment, a
//! processing instruction, a quoted literal, or a generic `<!...>`
//! declaration ends. The higher-level DTD loader (in the `xmltok` crate)
//! drives these scanners over its own cursor, which may transparently be
//! reading from a pushed virtual stream instead of the real source.
#![no_std]
#![forbid(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod comment;
pub mod markup;
pub mod pi;
pub mod quoted;

/// A single-byte pull cursor.
///
/// Every scanner in this crate is generic over `Cursor` so that callers can
/// plug in a cursor that transparently resumes reading from the real source
/// after a virtual (entity-replacement) stream is exhausted.
///
/// `current()` returns the byte the cursor is positioned on; `advance()`
/// consumes it and returns the *next* byte. End of input is signalled by a
/// NUL (`\0`) byte, matching the convention used by the tokenizer this crate
/// was extracted from.
pub trait Cursor {
    /// The byte the cursor currently sits on.
    fn current(&self) -> u8;

    /// Consumes the current byte and returns the next one.
    fn advance(&mut self) -> u8;
}

/// A scan failed because the input ended before the expected terminator was
/// found.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Unterminated;
