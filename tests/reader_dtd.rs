//! DOCTYPE declarations and catalog-backed external DTD loading.

use pretty_assertions::assert_eq;
use xmltok::{Event, Parser, Source};

mod helpers;
use helpers::register_dtd_file;

#[test]
fn internal_subset_entity_expands_in_content() {
    let xml = "<!DOCTYPE r [<!ENTITY who \"world\">]><r>hello &who;</r>";
    let mut parser = Parser::new(Source::Memory(xml.as_bytes().to_vec())).unwrap();

    match parser.next() {
        Event::DocType(d) => {
            assert_eq!(d.name, "r");
            assert!(d.public_id.is_none());
            assert!(d.system_id.is_none());
            assert!(d.has_internal_subset);
        }
        other => panic!("expected DocType, got {other:?}"),
    }

    assert!(matches!(parser.next(), Event::StartElement(s) if s.name.as_bytes() == b"r"));
    match parser.next() {
        Event::Text(t) => assert_eq!(t, "hello world"),
        other => panic!("expected Text, got {other:?}"),
    }
}

#[test]
fn external_system_dtd_is_loaded_via_catalog() {
    xmltok::doctype_global_reset();
    let _dtd_file = register_dtd_file(
        "<!ENTITY greeting \"hi there\">",
        None,
        Some("urn:test:external-dtd"),
    );

    let xml = r#"<!DOCTYPE r SYSTEM "urn:test:external-dtd"><r>&greeting;</r>"#;
    let mut parser = Parser::new(Source::Memory(xml.as_bytes().to_vec())).unwrap();

    assert!(matches!(parser.next(), Event::DocType(_)));
    assert!(matches!(parser.next(), Event::StartElement(_)));
    match parser.next() {
        Event::Text(t) => assert_eq!(t, "hi there"),
        other => panic!("expected Text, got {other:?}"),
    }
    xmltok::doctype_global_reset();
}

#[test]
fn external_public_dtd_is_loaded_via_normalized_urn() {
    xmltok::doctype_global_reset();
    let urn = xmltok::normalize_public_id("-//Test//DTD Widget 1.0//EN");
    let _dtd_file = register_dtd_file(
        "<!ENTITY widget \"a widget\">",
        Some(&urn),
        None,
    );

    let xml = r#"<!DOCTYPE r PUBLIC "-//Test//DTD Widget 1.0//EN" "ignored.dtd"><r>&widget;</r>"#;
    let mut parser = Parser::new(Source::Memory(xml.as_bytes().to_vec())).unwrap();

    assert!(matches!(parser.next(), Event::DocType(_)));
    assert!(matches!(parser.next(), Event::StartElement(_)));
    match parser.next() {
        Event::Text(t) => assert_eq!(t, "a widget"),
        other => panic!("expected Text, got {other:?}"),
    }
    xmltok::doctype_global_reset();
}

#[test]
fn internal_subset_entity_overrides_external_one_of_the_same_name() {
    xmltok::doctype_global_reset();
    let _dtd_file = register_dtd_file(
        "<!ENTITY who \"external\">",
        None,
        Some("urn:test:override-dtd"),
    );

    let xml = r#"<!DOCTYPE r SYSTEM "urn:test:override-dtd" [<!ENTITY who "internal">]><r>&who;</r>"#;
    let mut parser = Parser::new(Source::Memory(xml.as_bytes().to_vec())).unwrap();

    assert!(matches!(parser.next(), Event::DocType(_)));
    assert!(matches!(parser.next(), Event::StartElement(_)));
    match parser.next() {
        Event::Text(t) => assert_eq!(t, "internal"),
        other => panic!("expected Text, got {other:?}"),
    }
    xmltok::doctype_global_reset();
}

#[test]
fn duplicate_doctype_is_an_error() {
    let xml = "<!DOCTYPE r><!DOCTYPE r><r/>";
    let mut parser = Parser::new(Source::Memory(xml.as_bytes().to_vec())).unwrap();
    assert!(matches!(parser.next(), Event::DocType(_)));
    match parser.next() {
        Event::Error(err) => assert_eq!(err.error.to_string(), "duplicate DOCTYPE declaration"),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[test]
fn undeclared_entity_reference_is_an_error() {
    let xml = "<r>&nope;</r>";
    let mut parser = Parser::new(Source::Memory(xml.as_bytes().to_vec())).unwrap();
    assert!(matches!(parser.next(), Event::StartElement(_)));
    match parser.next() {
        Event::Error(err) => assert!(err.error.to_string().contains("not declared")),
        other => panic!("expected Error, got {other:?}"),
    }
}
