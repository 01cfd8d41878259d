//! Built-in entities and character reference decoding.
//!
//! General entity references (`&name;`) beyond the five built-ins require a
//! `<!DOCTYPE>` with a matching `<!ENTITY>` declaration and are resolved
//! against [`crate::doctype::DocType::general_entities`]; this module only
//! covers what every XML document gets for free.

use crate::error::Error;

/// Resolves one of the five entities every XML document defines without a
/// DOCTYPE, returning its replacement text exactly as it would be pushed as
/// a virtual stream.
///
/// `lt` and `amp` are defined as `&#60;` and `&#38;` rather than as the bare
/// characters `<` and `&` — pushing either of those two bare would re-enter
/// the very markup/entity dispatch their own expansion must not trigger.
/// Routing them through the character-reference machinery instead means the
/// reader's ordinary "a `&` pushes a stream, a `&#...;` appends a decoded
/// char" rule applies uniformly with no special case for the built-ins.
pub fn builtin_entity(name: &[u8]) -> Option<&'static str> {
    match name {
        b"lt" => Some("&#60;"),
        b"amp" => Some("&#38;"),
        b"gt" => Some(">"),
        b"apos" => Some("'"),
        b"quot" => Some("\""),
        _ => None,
    }
}

/// Decodes the digits of a character reference (`&#1234;` or `&#x1F600;`)
/// into the character it names.
///
/// `digits` must not include the `&#`/`&#x` prefix or the trailing `;`.
/// Returns [`Error::BadEntity`] if the digits don't parse in the given
/// radix, or if the resulting code point is not a valid, legal XML
/// character (control characters other than tab/CR/LF, and surrogates, are
/// rejected).
pub fn char_ref_value(digits: &str, hex: bool) -> Result<char, Error> {
    if digits.is_empty() {
        return Err(Error::BadEntity("empty character reference".to_string()));
    }
    let radix = if hex { 16 } else { 10 };
    let code = u32::from_str_radix(digits, radix)
        .map_err(|_| Error::BadEntity(format!("invalid character reference digits '{digits}'")))?;
    char::from_u32(code)
        .filter(|&c| is_legal_xml_char(c))
        .ok_or_else(|| Error::BadEntity(format!("character reference '{digits}' names an illegal codepoint")))
}

/// Whether `c` is legal anywhere in an XML 1.0 document, per the `Char`
/// production: tab, CR, LF, and anything else are only legal outside the
/// C0/C1 control ranges (with the same two exceptions) and outside the
/// surrogate range.
fn is_legal_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}'
    )
}
