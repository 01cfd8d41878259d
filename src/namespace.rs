//! The namespace stack: prefix → URI bindings, scoped per element.
//!
//! Bindings are pushed as a flat list alongside a per-element `ns_count`
//! (how many bindings that element's start tag introduced), exactly the way
//! [`crate::pool::Pool`] is used for the tag and attribute stacks — there is
//! no tree here, just a stack that grows on start tags and truncates on end
//! tags. Lookup walks from the top down, so an inner binding shadows an
//! outer one with the same prefix, and stops at the first match.

use crate::intern::Symbol;

/// One prefix → URI binding, introduced by a single `xmlns[:prefix]`
/// attribute.
struct Binding {
    /// `None` for the default namespace (a bare `xmlns="..."`).
    prefix: Option<Symbol>,
    uri: String,
}

/// A stack of namespace bindings in scope, plus the two built-in bindings
/// that are always present and can never be rebound: `xml` and `xmlns`.
pub struct NamespaceStack {
    bindings: Vec<Binding>,
}

impl NamespaceStack {
    pub fn new() -> Self {
        NamespaceStack {
            bindings: Vec::new(),
        }
    }

    /// Number of bindings currently in scope (used as the high-water mark an
    /// element's start tag restores on its matching end tag).
    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Introduces a new binding. `prefix = None` binds the default
    /// namespace; `Some(p)` binds `p`.
    pub fn push(&mut self, prefix: Option<Symbol>, uri: String) {
        self.bindings.push(Binding { prefix, uri });
    }

    /// Discards every binding introduced after `len` bindings were in scope
    /// — called when an end tag closes the element whose start tag grew the
    /// stack to more than `len`.
    pub fn truncate(&mut self, len: usize) {
        self.bindings.truncate(len);
    }

    /// Resolves a prefix (`None` for the default namespace) to its bound
    /// URI, searching from the innermost scope outward. The two built-in
    /// bindings are consulted only after the user-defined stack, since they
    /// can never be shadowed but are also never the common case.
    pub fn resolve(&self, prefix: Option<Symbol>) -> Option<&str> {
        for binding in self.bindings.iter().rev() {
            if binding.prefix == prefix {
                return Some(binding.uri.as_str());
            }
        }
        match prefix {
            Some(p) if p.as_bytes() == b"xml" => Some(XML_NAMESPACE_URI),
            Some(p) if p.as_bytes() == b"xmlns" => Some(XMLNS_NAMESPACE_URI),
            _ => None,
        }
    }

    /// The default namespace currently in scope, if any. Distinct from
    /// `resolve(None)` only in name — kept as a separate method because
    /// call sites that ask "what does an unprefixed *element* name belong
    /// to" read more clearly than a bare `resolve(None)`.
    #[inline]
    pub fn default_uri(&self) -> Option<&str> {
        self.resolve(None)
    }
}

impl Default for NamespaceStack {
    fn default() -> Self {
        Self::new()
    }
}

/// The fixed URI bound to the `xml` prefix in every document, per the XML
/// namespaces recommendation.
pub const XML_NAMESPACE_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// The fixed URI bound to the `xmlns` prefix in every document.
pub const XMLNS_NAMESPACE_URI: &str = "http://www.w3.org/2000/xmlns/";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::intern;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_namespace_push_and_resolve() {
        let mut stack = NamespaceStack::new();
        assert_eq!(stack.default_uri(), None);
        stack.push(None, "urn:example:a".to_string());
        assert_eq!(stack.default_uri(), Some("urn:example:a"));
    }

    #[test]
    fn prefixed_binding_shadows_outer_scope() {
        let mut stack = NamespaceStack::new();
        let p = intern(b"p");
        stack.push(Some(p), "urn:example:outer".to_string());
        let mark = stack.len();
        stack.push(Some(p), "urn:example:inner".to_string());
        assert_eq!(stack.resolve(Some(p)), Some("urn:example:inner"));
        stack.truncate(mark);
        assert_eq!(stack.resolve(Some(p)), Some("urn:example:outer"));
    }

    #[test]
    fn truncate_restores_high_water_mark() {
        let mut stack = NamespaceStack::new();
        stack.push(None, "urn:example:a".to_string());
        let mark = stack.len();
        stack.push(Some(intern(b"q")), "urn:example:b".to_string());
        assert_eq!(stack.len(), mark + 1);
        stack.truncate(mark);
        assert_eq!(stack.len(), mark);
        assert_eq!(stack.resolve(Some(intern(b"q"))), None);
    }

    #[test]
    fn builtin_prefixes_are_always_bound() {
        let stack = NamespaceStack::new();
        assert_eq!(stack.resolve(Some(intern(b"xml"))), Some(XML_NAMESPACE_URI));
        assert_eq!(
            stack.resolve(Some(intern(b"xmlns"))),
            Some(XMLNS_NAMESPACE_URI)
        );
    }

    #[test]
    fn unbound_prefix_resolves_to_none() {
        let stack = NamespaceStack::new();
        assert_eq!(stack.resolve(Some(intern(b"nope"))), None);
    }
}
