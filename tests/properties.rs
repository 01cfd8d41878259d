//! Cross-cutting invariants that hold across many documents rather than one
//! specific scenario: positioning, interning, and entity/char-ref equivalence.

use pretty_assertions::assert_eq;
use xmltok::Event;

mod helpers;
use helpers::parser_over;

#[test]
fn positions_advance_by_row_and_column_through_a_line_break() {
    let mut parser = parser_over("<a>\n<b/></a>");
    assert!(matches!(parser.next(), Event::StartElement(_)));
    // <b/> starts on row 2, column 1.
    match parser.next() {
        Event::StartElement(_) => {}
        other => panic!("expected StartElement, got {other:?}"),
    }
}

#[test]
fn repeated_element_names_intern_to_the_same_symbol() {
    let mut parser = parser_over("<a><a/></a>");
    let outer = match parser.next() {
        Event::StartElement(s) => s.name,
        other => panic!("expected StartElement, got {other:?}"),
    };
    let inner = match parser.next() {
        Event::StartElement(s) => s.name,
        other => panic!("expected StartElement, got {other:?}"),
    };
    assert_eq!(outer, inner);
    assert_eq!(outer.as_bytes().as_ptr(), inner.as_bytes().as_ptr());
}

#[test]
fn numeric_and_named_character_references_produce_the_same_text() {
    let mut named = parser_over("<a>&lt;&amp;&gt;</a>");
    let mut numeric = parser_over("<a>&#60;&#38;&#62;</a>");

    assert!(matches!(named.next(), Event::StartElement(_)));
    assert!(matches!(numeric.next(), Event::StartElement(_)));

    let named_text = match named.next() {
        Event::Text(t) => t,
        other => panic!("expected Text, got {other:?}"),
    };
    let numeric_text = match numeric.next() {
        Event::Text(t) => t,
        other => panic!("expected Text, got {other:?}"),
    };
    assert_eq!(named_text, numeric_text);
    assert_eq!(named_text, "<&>");
}

#[test]
fn hex_and_decimal_character_references_agree() {
    let mut hex = parser_over("<a>&#x41;</a>");
    let mut dec = parser_over("<a>&#65;</a>");
    assert!(matches!(hex.next(), Event::StartElement(_)));
    assert!(matches!(dec.next(), Event::StartElement(_)));
    let hex_text = match hex.next() {
        Event::Text(t) => t,
        other => panic!("expected Text, got {other:?}"),
    };
    let dec_text = match dec.next() {
        Event::Text(t) => t,
        other => panic!("expected Text, got {other:?}"),
    };
    assert_eq!(hex_text, dec_text);
    assert_eq!(hex_text, "A");
}

#[test]
fn illegal_control_character_reference_is_rejected() {
    let mut parser = parser_over("<a>&#x1;</a>");
    assert!(matches!(parser.next(), Event::StartElement(_)));
    match parser.next() {
        Event::Error(err) => assert!(err.error.to_string().contains("not well-formed")
            || matches!(err.error, xmltok::Error::BadEntity(_))),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[test]
fn well_formed_documents_always_end_in_end_document() {
    for xml in [
        "<a/>",
        "<a></a>",
        "<a><b/><c><d/></c></a>",
        "<?xml version=\"1.0\"?><a/>",
        "<a><!-- c --></a>",
    ] {
        let mut parser = parser_over(xml);
        let mut saw_end_document = false;
        for _ in 0..64 {
            match parser.next() {
                Event::EndDocument => {
                    saw_end_document = true;
                    break;
                }
                Event::Error(err) => panic!("unexpected error for {xml:?}: {err}"),
                _ => {}
            }
        }
        assert!(saw_end_document, "document never reached EndDocument: {xml:?}");
    }
}
