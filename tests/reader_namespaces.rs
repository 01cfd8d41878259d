//! Namespace resolution: default namespace scoping, prefix binding, and the
//! rule that `xmlns`/`xmlns:*` declaration attributes are not themselves
//! resolved against the bindings they introduce.

use pretty_assertions::assert_eq;
use xmltok::Event;

mod helpers;
use helpers::parser_over;

#[test]
fn default_namespace_applies_to_element_names_and_propagates_to_children() {
    let mut parser = parser_over(r#"<a xmlns="urn:x"><b/></a>"#);

    match parser.next() {
        Event::StartElement(s) => {
            assert_eq!(s.name.as_bytes(), b"a");
            assert_eq!(s.uri.unwrap().as_bytes(), b"urn:x");
            assert_eq!(s.attributes.len(), 1);
            let xmlns_attr = &s.attributes[0];
            assert_eq!(xmlns_attr.name.as_bytes(), b"xmlns");
            // the declaration attribute itself is not resolved
            assert!(xmlns_attr.uri.is_none());
        }
        other => panic!("expected StartElement, got {other:?}"),
    }

    match parser.next() {
        Event::StartElement(s) => {
            assert_eq!(s.name.as_bytes(), b"b");
            assert_eq!(s.uri.unwrap().as_bytes(), b"urn:x");
        }
        other => panic!("expected StartElement, got {other:?}"),
    }

    assert!(matches!(parser.next(), Event::EndElement(e) if e.name.as_bytes() == b"b"));
    assert!(matches!(parser.next(), Event::EndElement(e) if e.name.as_bytes() == b"a"));
}

#[test]
fn prefixed_attribute_resolves_but_element_name_stays_unprefixed() {
    let mut parser = parser_over(r#"<a xmlns:p="urn:x" p:k="v"/>"#);

    match parser.next() {
        Event::StartElement(s) => {
            assert_eq!(s.name.as_bytes(), b"a");
            assert!(s.prefix.is_none());
            assert!(s.uri.is_none());

            assert_eq!(s.attributes.len(), 2);

            let decl = s.attributes.iter().find(|a| a.name.as_bytes() == b"p").unwrap();
            assert_eq!(decl.prefix.unwrap().as_bytes(), b"xmlns");
            assert!(decl.uri.is_none());

            let k = s.attributes.iter().find(|a| a.name.as_bytes() == b"k").unwrap();
            assert_eq!(k.prefix.unwrap().as_bytes(), b"p");
            assert_eq!(k.uri.unwrap().as_bytes(), b"urn:x");
            assert_eq!(k.value, "v");
        }
        other => panic!("expected StartElement, got {other:?}"),
    }
}

#[test]
fn unprefixed_attribute_never_inherits_default_namespace() {
    let mut parser = parser_over(r#"<a xmlns="urn:x" k="v"/>"#);

    match parser.next() {
        Event::StartElement(s) => {
            let k = s.attributes.iter().find(|a| a.name.as_bytes() == b"k").unwrap();
            assert!(k.prefix.is_none());
            assert!(k.uri.is_none());
        }
        other => panic!("expected StartElement, got {other:?}"),
    }
}

#[test]
fn namespace_binding_goes_out_of_scope_with_its_element() {
    let mut parser = parser_over(r#"<a><b xmlns:p="urn:x" p:k="v"/><c p:k="v"/></a>"#);

    assert!(matches!(parser.next(), Event::StartElement(s) if s.name.as_bytes() == b"a"));
    assert!(matches!(parser.next(), Event::StartElement(_))); // b
    assert!(matches!(parser.next(), Event::EndElement(_))); // b (self-closing)

    match parser.next() {
        Event::Error(err) => {
            assert!(err.error.to_string().contains("unbound namespace prefix"));
        }
        other => panic!("expected Error for out-of-scope prefix, got {other:?}"),
    }
}

#[test]
fn add_namespace_seeds_a_binding_before_parsing_starts() {
    let mut parser = parser_over(r#"<p:a p:k="v"/>"#);
    parser.add_namespace("p", "urn:pre-bound");

    match parser.next() {
        Event::StartElement(s) => {
            assert_eq!(s.prefix.unwrap().as_bytes(), b"p");
            assert_eq!(s.uri.unwrap().as_bytes(), b"urn:pre-bound");
            let k = &s.attributes[0];
            assert_eq!(k.uri.unwrap().as_bytes(), b"urn:pre-bound");
        }
        other => panic!("expected StartElement, got {other:?}"),
    }
}

#[test]
fn unbound_prefix_on_element_is_an_error() {
    let mut parser = parser_over("<p:a/>");
    match parser.next() {
        Event::Error(err) => assert!(err.error.to_string().contains("unbound namespace prefix")),
        other => panic!("expected Error, got {other:?}"),
    }
}
