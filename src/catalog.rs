//! The process-wide DTD catalog: a mapping from a normalized `PUBLIC`
//! identifier (in URN form) or a `SYSTEM` identifier (a URI) to the
//! filesystem path of the external DTD file that should be read for it.
//!
//! Like the [string interner](crate::intern), the catalog is shared across
//! every parser instance in the process and guarded by a single lock.
//! Registration is expected to happen a handful of times at startup (e.g.
//! once per known public identifier an application cares about), so a plain
//! `Mutex<HashMap<..>>` is the right tool — there is no hot-path contention
//! to optimize for here, unlike the interner.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
struct Catalog {
    by_urn: HashMap<String, PathBuf>,
    by_uri: HashMap<String, PathBuf>,
}

static CATALOG: Lazy<Mutex<Catalog>> = Lazy::new(|| Mutex::new(Catalog::default()));

/// Registers a file as the external DTD for a `PUBLIC` id (given in
/// normalized URN form, see [`crate::doctype::normalize_public_id`]), a
/// `SYSTEM` id (a URI), or both. At least one of `urn` / `uri` must be
/// `Some`; passing neither is a programmer error.
///
/// A duplicate registration under the same key replaces the previous one,
/// mirroring the original catalog's insert-replaces semantics (see
/// `DESIGN.md`) rather than erroring on redefinition.
pub fn register_dtd(filename: impl AsRef<Path>, urn: Option<&str>, uri: Option<&str>) {
    assert!(
        urn.is_some() || uri.is_some(),
        "doctype_register_dtd requires at least one of urn/uri"
    );
    let path = filename.as_ref().to_path_buf();
    let mut catalog = CATALOG.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(urn) = urn {
        #[cfg(feature = "log")]
        if catalog.by_urn.contains_key(urn) {
            log::debug!("replacing catalog entry for urn {urn}");
        }
        catalog.by_urn.insert(urn.to_string(), path.clone());
    }
    if let Some(uri) = uri {
        #[cfg(feature = "log")]
        if catalog.by_uri.contains_key(uri) {
            log::debug!("replacing catalog entry for uri {uri}");
        }
        catalog.by_uri.insert(uri.to_string(), path);
    }
}

/// Looks up the file registered for a normalized `PUBLIC` URN.
pub fn lookup_urn(urn: &str) -> Option<PathBuf> {
    CATALOG
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .by_urn
        .get(urn)
        .cloned()
}

/// Looks up the file registered for a `SYSTEM` URI.
pub fn lookup_uri(uri: &str) -> Option<PathBuf> {
    CATALOG
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .by_uri
        .get(uri)
        .cloned()
}

/// Clears every catalog entry.
///
/// Safe to call at any point — unlike [`crate::intern::reset`], clearing the
/// catalog cannot invalidate memory a live parser is holding onto, since
/// parsers only ever read through it (at `DOCTYPE` declaration time) and
/// never retain a path after resolving it into a read file.
pub fn global_reset() {
    #[cfg(feature = "log")]
    log::debug!("resetting DTD catalog");
    let mut catalog = CATALOG.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    catalog.by_urn.clear();
    catalog.by_uri.clear();
}
