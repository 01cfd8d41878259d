//! `DocType`: the result of parsing a `<!DOCTYPE ...>` declaration, including
//! loading and parsing its external DTD (if any) and layering an internal
//! subset over it.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use xmltok_dtd::{comment, markup, pi, quoted, Keyword};

use crate::catalog;
use crate::cursor::{Cursor, Source};
use crate::error::{Error, Result};
use crate::grammar::{expect_byte, expect_s, read_name, skip_s};

/// The parsed form of a `<!DOCTYPE ...>` declaration: its external/internal
/// identifiers, and the general-entity table built from whichever DTD
/// subsets were given.
#[derive(Debug, Clone, Default)]
pub struct DocType {
    /// The `PUBLIC` identifier, if any, exactly as written in the source.
    pub public_id: Option<String>,
    /// The `SYSTEM` identifier, if any, exactly as written in the source.
    pub system_id: Option<String>,
    /// The literal text of the internal subset (`[...]`), if any.
    pub int_subset: Option<String>,
    /// General entities declared by the external and/or internal subset,
    /// keyed by entity name. An internal-subset declaration silently
    /// replaces an external one with the same name.
    pub general_entities: HashMap<String, String>,
}

impl DocType {
    /// Builds a `DocType`, resolving and parsing the external DTD (if a
    /// public or system id is given) and then layering the internal subset
    /// (if given) over it.
    pub fn new(
        public_id: Option<&str>,
        system_id: Option<&str>,
        int_subset: Option<&str>,
    ) -> Result<Self> {
        let mut general_entities = HashMap::new();

        if public_id.is_some() || system_id.is_some() {
            let path = resolve_external_dtd(public_id, system_id)?;
            let text = fs::read(&path)?;
            parse_dtd_subset(text, &mut general_entities)?;
        }

        if let Some(subset) = int_subset {
            parse_dtd_subset(subset.as_bytes().to_vec(), &mut general_entities)?;
        }

        Ok(DocType {
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
            int_subset: int_subset.map(str::to_string),
            general_entities,
        })
    }

    /// Looks up a general entity's replacement text by name.
    pub fn get_entity_value(&self, name: &str) -> Option<&str> {
        self.general_entities.get(name).map(String::as_str)
    }

    /// Renders the canonical `PUBLIC "p" "s"` / `SYSTEM "s"` / bare `name`
    /// form, followed by `[subset]` when an internal subset is present.
    ///
    /// `name` is the document (root) element name the DOCTYPE declares —
    /// `DocType` itself does not retain it (see `DESIGN.md`), so callers
    /// that round-trip a DOCTYPE pass back the name they read alongside it.
    pub fn to_str(&self, name: &str) -> String {
        let mut out = String::from(name);
        match (&self.public_id, &self.system_id) {
            (Some(p), Some(s)) => {
                out.push_str(&format!(" PUBLIC \"{p}\" \"{s}\""));
            }
            (None, Some(s)) => {
                out.push_str(&format!(" SYSTEM \"{s}\""));
            }
            _ => {}
        }
        if let Some(subset) = &self.int_subset {
            out.push_str(" [");
            out.push_str(subset);
            out.push(']');
        }
        out
    }
}

/// Resolves a `PUBLIC`/`SYSTEM` identifier pair to the filesystem path of
/// its external DTD via the catalog, preferring a normalized-URN hit over a
/// raw system-URI hit (spec order: URN first, URI fallback).
fn resolve_external_dtd(public_id: Option<&str>, system_id: Option<&str>) -> Result<PathBuf> {
    if let Some(pub_id) = public_id {
        let urn = normalize_public_id(pub_id);
        if let Some(path) = catalog::lookup_urn(&urn) {
            return Ok(path);
        }
    }
    if let Some(sys_id) = system_id {
        if let Some(path) = catalog::lookup_uri(sys_id) {
            return Ok(path);
        }
    }
    Err(Error::Dtd(format!(
        "'{}'|'{}' not found in catalog",
        public_id.map(normalize_public_id).unwrap_or_default(),
        system_id.unwrap_or_default()
    )))
}

/// Normalizes a `PUBLIC` identifier into its `urn:publicid:` form, per ISO
/// 9070 (as summarized in spec): runs of whitespace collapse to `+`, `//`
/// becomes `:`, `::` becomes `;`, and `;`, `'`, `?`, `#`, `%` are
/// percent-encoded. Every other byte passes through unchanged.
pub fn normalize_public_id(pubid: &str) -> String {
    let bytes = pubid.as_bytes();
    let mut out = String::from("urn:publicid:");
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' {
            while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\r' | b'\n') {
                i += 1;
            }
            out.push('+');
            continue;
        }
        if b == b':' && bytes.get(i + 1) == Some(&b':') {
            out.push(';');
            i += 2;
            continue;
        }
        if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            out.push(':');
            i += 2;
            continue;
        }
        if matches!(b, b';' | b'\'' | b'?' | b'#' | b'%') {
            out.push_str(&format!("%{:02X}", b));
            i += 1;
            continue;
        }
        out.push(b as char);
        i += 1;
    }
    out
}

/// Parses one DTD subset's text (either the external DTD's full contents,
/// or the literal internal-subset text), inserting every `<!ENTITY>` it
/// declares into `general`. Parameter entities are local to this call: the
/// external and internal subsets never share a parameter-entity table,
/// matching the "local to this DTD parse" wording of the spec.
fn parse_dtd_subset(text: Vec<u8>, general: &mut HashMap<String, String>) -> Result<()> {
    let mut cursor = Cursor::new(Source::Memory(text))?;
    let mut params: HashMap<String, String> = HashMap::new();

    loop {
        match cursor.current() {
            0 => {
                cursor.take_error()?;
                break;
            }
            b if crate::grammar::is_space(b) => {
                cursor.advance();
            }
            b'%' => {
                cursor.advance();
                let name = read_name(&mut cursor)?;
                expect_byte(&mut cursor, b';')?;
                let name = String::from_utf8_lossy(&name).into_owned();
                let value = params
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| Error::Dtd(format!("parameter entity %{name}; not declared")))?;
                cursor.push_stream(value.into_bytes());
            }
            b'<' => {
                cursor.advance();
                match cursor.current() {
                    b'?' => {
                        cursor.advance();
                        pi::read_pi(&mut cursor, |_| {}, |_| {})
                            .map_err(|_| Error::Dtd("unterminated processing instruction".to_string()))?;
                    }
                    b'!' => {
                        cursor.advance();
                        if cursor.current() == b'-' {
                            cursor.advance();
                            expect_byte(&mut cursor, b'-')?;
                            comment::skip_comment(&mut cursor)
                                .map_err(|_| Error::Dtd("unterminated comment".to_string()))?;
                        } else {
                            match markup::match_keyword(&mut cursor) {
                                Keyword::Entity => parse_entity_decl(&mut cursor, &mut params, general)?,
                                _ => markup::skip_declaration(&mut cursor)
                                    .map_err(|_| Error::Dtd("unterminated markup declaration".to_string()))?,
                            }
                        }
                    }
                    _ => return Err(Error::Dtd("expected markup declaration".to_string())),
                }
            }
            other => {
                return Err(Error::Dtd(format!(
                    "unexpected byte '{}' in DTD subset",
                    other as char
                )))
            }
        }
    }
    Ok(())
}

/// Parses one `<!ENTITY ...>` declaration, given a cursor positioned right
/// after the `ENTITY` keyword.
fn parse_entity_decl(
    cursor: &mut Cursor,
    params: &mut HashMap<String, String>,
    general: &mut HashMap<String, String>,
) -> Result<()> {
    expect_s(cursor)?;

    let mut is_param = false;
    if cursor.current() == b'%' {
        cursor.advance();
        expect_s(cursor)?;
        is_param = true;
    }

    let name = String::from_utf8_lossy(&read_name(cursor)?).into_owned();
    expect_s(cursor)?;

    match cursor.current() {
        b'\'' | b'"' => {
            let value = read_entity_value(cursor, params, &name)?;
            if is_param {
                params.insert(name, value);
            } else {
                general.insert(name, value);
            }
        }
        _ => {
            let keyword = read_name(cursor)?;
            match keyword.as_slice() {
                b"SYSTEM" => {
                    expect_s(cursor)?;
                    let mut literal = Vec::new();
                    quoted::read_quoted(cursor, |b| literal.push(b))
                        .map_err(|_| Error::Dtd(format!("unterminated SYSTEM literal for entity '{name}'")))?;
                    // Unresolvable without a base URI: dropped for both
                    // general and parameter entities.
                }
                b"PUBLIC" => {
                    expect_s(cursor)?;
                    let mut pubid = Vec::new();
                    quoted::read_quoted(cursor, |b| pubid.push(b))
                        .map_err(|_| Error::Dtd(format!("unterminated PUBLIC literal for entity '{name}'")))?;
                    expect_s(cursor)?;
                    let mut sysid = Vec::new();
                    quoted::read_quoted(cursor, |b| sysid.push(b))
                        .map_err(|_| Error::Dtd(format!("unterminated SYSTEM literal for entity '{name}'")))?;

                    skip_s(cursor);
                    let mut has_ndata = false;
                    if cursor.current().is_ascii_alphabetic() {
                        let marker = read_name(cursor)?;
                        if marker == b"NDATA" {
                            has_ndata = true;
                            expect_s(cursor)?;
                            let _notation = read_name(cursor)?;
                        } else {
                            return Err(Error::Dtd(format!(
                                "unexpected token after PUBLIC/SYSTEM literals for entity '{name}'"
                            )));
                        }
                    }

                    if !has_ndata && !is_param {
                        let pubid = String::from_utf8_lossy(&pubid).into_owned();
                        let urn = normalize_public_id(&pubid);
                        if let Some(path) = catalog::lookup_urn(&urn) {
                            let contents = fs::read(&path)?;
                            let contents =
                                String::from_utf8(contents).map_err(|e| Error::Utf8(e.utf8_error()))?;
                            general.insert(name, contents);
                        }
                        // Not found in the catalog: dropped, matching the
                        // SYSTEM-entity "unresolvable" handling rather than
                        // failing the whole document over one entity.
                    }
                    // NDATA, or a parameter entity expressed via PUBLIC:
                    // dropped (see DESIGN.md).
                }
                other => {
                    return Err(Error::Dtd(format!(
                        "expected SYSTEM or PUBLIC, found '{}'",
                        String::from_utf8_lossy(other)
                    )))
                }
            }
        }
    }

    skip_s(cursor);
    expect_byte(cursor, b'>')?;
    Ok(())
}

/// Reads an `EntityValue` literal, expanding any `%name;` parameter-entity
/// references found inside it as a virtual stream (mirroring how general
/// entities expand in element content) rather than copying them verbatim.
/// `params` must already hold every parameter entity declared earlier in
/// this subset — forward references are not supported, matching the
/// single left-to-right pass `parse_dtd_subset` makes.
fn read_entity_value(cursor: &mut Cursor, params: &HashMap<String, String>, entity_name: &str) -> Result<String> {
    let quote = cursor.current();
    if quote != b'\'' && quote != b'"' {
        return Err(Error::Dtd(format!("expected a quoted value for entity '{entity_name}'")));
    }
    cursor.advance();

    let mut value = Vec::new();
    loop {
        match cursor.current() {
            0 => return Err(Error::Dtd(format!("unterminated value for entity '{entity_name}'"))),
            b'%' => {
                cursor.advance();
                let pe_name = String::from_utf8_lossy(&read_name(cursor)?).into_owned();
                expect_byte(cursor, b';')?;
                let replacement = params
                    .get(&pe_name)
                    .cloned()
                    .ok_or_else(|| Error::Dtd(format!("parameter entity %{pe_name}; not declared")))?;
                cursor.push_stream(replacement.into_bytes());
            }
            b if b == quote && !cursor.in_virtual_stream() => {
                cursor.advance();
                break;
            }
            b => {
                value.push(b);
                cursor.advance();
            }
        }
    }
    String::from_utf8(value).map_err(|e| Error::Utf8(e.utf8_error()))
}
