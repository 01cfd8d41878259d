//! Shared helpers for the integration test suite.

use std::io::Write;
use tempfile::NamedTempFile;

/// Writes `contents` to a fresh temp file and registers it in the process-wide
/// DTD catalog under `uri` (a `SYSTEM` identifier) and/or `urn` (a normalized
/// `PUBLIC` identifier). The returned file must be kept alive for as long as
/// any parser might still need to read it.
pub fn register_dtd_file(contents: &str, urn: Option<&str>, uri: Option<&str>) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp dtd file");
    file.write_all(contents.as_bytes()).expect("write temp dtd file");
    file.flush().expect("flush temp dtd file");
    xmltok::doctype_register_dtd(file.path(), urn, uri);
    file
}

/// Drives `parser` to completion, collecting every event up to and including
/// `EndDocument` (or the first `Error`).
pub fn collect_events(mut parser: xmltok::Parser) -> Vec<xmltok::Event> {
    let mut events = Vec::new();
    loop {
        let event = parser.next();
        let done = matches!(event, xmltok::Event::EndDocument | xmltok::Event::Error(_));
        events.push(event);
        if done {
            break;
        }
    }
    events
}

pub fn parser_over(xml: &str) -> xmltok::Parser {
    xmltok::Parser::new(xmltok::Source::Memory(xml.as_bytes().to_vec())).expect("construct parser")
}
