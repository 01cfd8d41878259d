//! Process-wide string interning.
//!
//! Every element name, attribute name, prefix, and namespace URI that needs
//! to be compared for equality more than once flows through here first, so
//! that end-tag matching, `xmlns`/`xmlns:*` recognition, and namespace-prefix
//! lookup all reduce to a pointer comparison instead of a byte-by-byte scan.
//!
//! The trie is a byte-indexed tree: each node has up to 256 children (one per
//! possible next byte) plus an optional handle to the string that terminates
//! at that node. Traversal is O(length) and, because every parser instance
//! shares the same process-wide tree, newly inserted strings become visible
//! to every other live parser immediately.

use once_cell::sync::Lazy;
use std::sync::Mutex;

/// A handle to an interned, process-lifetime byte string.
///
/// Two symbols are equal if and only if they were produced by interning byte
/// slices with the same content — and because interning always returns the
/// same handle for equal content, that equality check is a pointer (address)
/// comparison, not a content comparison.
#[derive(Clone, Copy)]
pub struct Symbol {
    ptr: *const u8,
    len: usize,
}

// SAFETY: a `Symbol` only ever points at memory leaked for the lifetime of
// the process by `Interner`, which is itself guarded by a `Mutex`. The bytes
// behind a `Symbol` are never mutated after interning, so sharing a `Symbol`
// across threads is sound even though the raw pointer by itself is not
// `Send`/`Sync`.
unsafe impl Send for Symbol {}
unsafe impl Sync for Symbol {}

impl Symbol {
    /// Borrows the interned bytes.
    ///
    /// This is safe because interned allocations are never freed or mutated
    /// for the life of the process (see [`reset`]'s safety contract).
    #[inline]
    pub fn as_bytes(&self) -> &'static [u8] {
        // SAFETY: `ptr` was produced by `Box::leak` on a `Box<[u8]>` of
        // length `len`, and is never freed while any `Symbol` referencing it
        // could still be alive (see `reset`).
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    #[inline]
    fn identity(&self) -> (*const u8, usize) {
        (self.ptr, self.len)
    }
}

impl PartialEq for Symbol {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identity().hash(state)
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match std::str::from_utf8(self.as_bytes()) {
            Ok(s) => write!(f, "Symbol({:?})", s),
            Err(_) => write!(f, "Symbol({:?})", self.as_bytes()),
        }
    }
}

/// A single node of the interning trie.
///
/// `children` is boxed and lazily allocated (as a 256-slot array) the first
/// time a node gets a child, so that the (common) case of a trie with many
/// leaf nodes doesn't pay for 256 pointers at every level.
#[derive(Default)]
struct TrieNode {
    children: Option<Box<[Option<Box<TrieNode>>; 256]>>,
    handle: Option<Symbol>,
}

impl TrieNode {
    fn child_mut(&mut self, byte: u8) -> &mut Box<TrieNode> {
        let children = self
            .children
            .get_or_insert_with(|| Box::new(std::array::from_fn(|_| None)));
        children[byte as usize].get_or_insert_with(|| Box::new(TrieNode::default()))
    }
}

/// The process-wide interning trie, guarded by a single lock.
///
/// Serializing every lookup and insertion behind one mutex is a deliberate
/// simplification: the tree is shared across every parser instance that
/// might exist on different threads, and contention on it is expected to be
/// rare relative to the per-byte work of tokenizing a document.
struct Interner {
    root: TrieNode,
}

impl Interner {
    const fn new() -> Self {
        Interner {
            root: TrieNode {
                children: None,
                handle: None,
            },
        }
    }

    fn intern(&mut self, bytes: &[u8]) -> Symbol {
        let mut node = &mut self.root;
        for &b in bytes {
            node = node.child_mut(b);
        }
        if let Some(sym) = node.handle {
            return sym;
        }
        let leaked: &'static [u8] = Box::leak(bytes.to_vec().into_boxed_slice());
        let sym = Symbol {
            ptr: leaked.as_ptr(),
            len: leaked.len(),
        };
        node.handle = Some(sym);
        sym
    }
}

static INTERNER: Lazy<Mutex<Interner>> = Lazy::new(|| Mutex::new(Interner::new()));

/// The pre-created sentinel for "no prefix" / the empty string.
pub static EMPTY: Lazy<Symbol> = Lazy::new(|| intern(b""));

/// The pre-created sentinel for the literal `xmlns`.
pub static XMLNS: Lazy<Symbol> = Lazy::new(|| intern(b"xmlns"));

/// Interns `bytes`, returning the canonical process-lifetime handle for it.
///
/// Construction of the first [`crate::Parser`] is what actually triggers the
/// global interner (and the sentinel symbols above) to initialize; this
/// matches the "process-wide tables are initialized lazily on first parser
/// construction" resource model.
pub fn intern(bytes: &[u8]) -> Symbol {
    INTERNER
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .intern(bytes)
}

/// Resets the global interner, freeing every interned string.
///
/// # Safety
///
/// The caller must guarantee that no [`Symbol`] produced before this call is
/// read afterwards, and that no [`crate::Parser`] is live. There is no way to
/// check either condition at runtime, which is why this is `unsafe` — unlike
/// [`crate::doctype::global_reset`], which only clears a lookup table, this
/// call invalidates pointers that other in-memory data may still hold.
pub unsafe fn reset() {
    let mut interner = INTERNER
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    *interner = Interner::new();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn equal_bytes_intern_to_the_same_symbol() {
        let a = intern(b"hello");
        let b = intern(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn different_bytes_intern_to_different_symbols() {
        let a = intern(b"hello");
        let b = intern(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn round_trips_content() {
        let s = intern(b"namespace-uri");
        assert_eq!(s.as_bytes(), b"namespace-uri");
    }

    #[test]
    fn sentinels_are_stable() {
        assert_eq!(EMPTY.as_bytes(), b"");
        assert_eq!(*EMPTY, intern(b""));
        assert_eq!(*XMLNS, intern(b"xmlns"));
    }
}
