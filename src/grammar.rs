//! Low-level lexical productions shared between the main tokenizer
//! ([`crate::reader`]) and the DTD loader ([`crate::doctype`]).
//!
//! Every function here is generic over `C: xmltok_dtd::Cursor` rather than
//! over [`crate::cursor::Cursor`] directly — both the main cursor and the
//! DTD subset's own cursor satisfy that trait, and neither side of the
//! crate needs to know the other exists for these productions to be shared.

use crate::error::Error;
use xmltok_dtd::Cursor;

/// Whitespace per XML's `S` production: space, tab, CR, or LF.
#[inline]
pub fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Consumes `S` (zero or more whitespace bytes).
pub fn skip_s<C: Cursor>(cursor: &mut C) {
    while is_space(cursor.current()) {
        cursor.advance();
    }
}

/// Consumes `S` and fails if no whitespace byte was present.
pub fn expect_s<C: Cursor>(cursor: &mut C) -> Result<(), Error> {
    if !is_space(cursor.current()) {
        return Err(Error::InvalidToken("expected whitespace".to_string()));
    }
    skip_s(cursor);
    Ok(())
}

/// Consumes `Eq`: optional `S`, `=`, optional `S`.
pub fn skip_eq<C: Cursor>(cursor: &mut C) -> Result<(), Error> {
    skip_s(cursor);
    expect_byte(cursor, b'=')?;
    skip_s(cursor);
    Ok(())
}

/// Consumes `expected`, failing if the current byte differs.
pub fn expect_byte<C: Cursor>(cursor: &mut C, expected: u8) -> Result<(), Error> {
    if cursor.current() != expected {
        return Err(Error::InvalidToken(format!(
            "expected '{}', found '{}'",
            expected as char, cursor.current() as char
        )));
    }
    cursor.advance();
    Ok(())
}

/// Whether `b` can start a `Name` or `QName` (a letter).
#[inline]
pub fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

#[inline]
fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-' | b':')
}

#[inline]
fn is_name_char_no_colon(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-')
}

/// Reads `Name`: a letter, then any run of `[A-Za-z0-9._\-:]`.
///
/// Used wherever the spec calls for a bare `Name` (DOCTYPE root name, entity
/// names, PI targets, NOTATION names) — unlike `QName`, the colon here is
/// just another name character, not a prefix separator.
pub fn read_name<C: Cursor>(cursor: &mut C) -> Result<Vec<u8>, Error> {
    if !is_name_start(cursor.current()) {
        return Err(Error::InvalidToken("expected name".to_string()));
    }
    let mut name = vec![cursor.current()];
    cursor.advance();
    while is_name_char(cursor.current()) {
        name.push(cursor.current());
        cursor.advance();
    }
    Ok(name)
}

/// Reads one `QName`: a name-chars run (colon excluded from the run), then,
/// if the cursor now sits on `:`, a second run as the local name. Returns
/// `(prefix, local)`; `prefix` is `None` when no colon was found.
pub fn read_qname<C: Cursor>(cursor: &mut C) -> Result<(Option<Vec<u8>>, Vec<u8>), Error> {
    let first = read_name_part(cursor)?;
    if cursor.current() == b':' {
        cursor.advance();
        let local = read_name_part(cursor)?;
        Ok((Some(first), local))
    } else {
        Ok((None, first))
    }
}

fn read_name_part<C: Cursor>(cursor: &mut C) -> Result<Vec<u8>, Error> {
    if !is_name_start(cursor.current()) {
        return Err(Error::InvalidToken("expected name".to_string()));
    }
    let mut part = vec![cursor.current()];
    cursor.advance();
    while is_name_char_no_colon(cursor.current()) {
        part.push(cursor.current());
        cursor.advance();
    }
    Ok(part)
}
