//! String literal intern pool.
//!
//! Java string literals have identity semantics: two literals with equal content
//! must be the same object. The compiler routes every literal through
//! [`InternPool::intern`] at load time, and JNI callers use the same entry point
//! for `NewString`-style canonicalization.
//!
//! The pool is content-addressed: the first successful publication of a given
//! content wins and is never replaced, so any two calls with equal content -
//! regardless of ordering or concurrency - observe the same final handle.

use std::sync::Arc;

use dashmap::DashMap;

/// A canonical interned string.
///
/// Equal content always yields pointer-identical handles; compare identities with
/// [`Arc::ptr_eq`]. Interned strings live for the process lifetime.
pub type InternedString = Arc<str>;

/// Content-addressed canonical string store.
///
/// A single concurrent table with atomic insert-if-absent semantics; no
/// partial-content entries are ever visible to readers.
pub struct InternPool {
    strings: DashMap<String, InternedString>,
}

impl InternPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        InternPool {
            strings: DashMap::new(),
        }
    }

    /// Return the canonical handle for `content`, creating it if this content has
    /// never been interned.
    ///
    /// The common case is a hit, served from a shared read lock on one shard.
    /// On a miss the entry API makes the insert atomic: concurrent first interns
    /// of the same content race to one winner and the losers observe the winner's
    /// handle.
    pub fn intern(&self, content: &str) -> InternedString {
        if let Some(existing) = self.strings.get(content) {
            return existing.clone();
        }

        self.strings
            .entry(content.to_string())
            .or_insert_with(|| Arc::from(content))
            .clone()
    }

    /// The canonical handle for `content` if it has been interned, without
    /// creating one.
    #[must_use]
    pub fn get(&self, content: &str) -> Option<InternedString> {
        self.strings.get(content).map(|entry| entry.clone())
    }

    /// Number of distinct interned contents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// True if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Drop all entries. Test isolation only; interned strings are permanent in
    /// production.
    pub(crate) fn clear(&self) {
        self.strings.clear();
    }
}

impl Default for InternPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_intern_returns_identical_handle() {
        let pool = InternPool::new();
        let a = pool.intern("foo");
        let b = pool.intern("foo");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_intern_distinct_contents() {
        let pool = InternPool::new();
        let a = pool.intern("foo");
        let b = pool.intern("bar");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 2);
        assert_eq!(&*a, "foo");
        assert_eq!(&*b, "bar");
    }

    #[test]
    fn test_get_does_not_create() {
        let pool = InternPool::new();
        assert!(pool.get("foo").is_none());
        let a = pool.intern("foo");
        assert!(Arc::ptr_eq(&a, &pool.get("foo").unwrap()));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_empty_string_is_internable() {
        let pool = InternPool::new();
        let a = pool.intern("");
        let b = pool.intern("");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(&*a, "");
    }

    #[test]
    fn test_concurrent_intern_idempotence() {
        let pool = InternPool::new();

        let handles: Vec<InternedString> = (0..256)
            .into_par_iter()
            .map(|_| pool.intern("foo"))
            .collect();

        // All concurrent calls observed the same canonical instance, and exactly
        // one entry exists afterwards.
        assert_eq!(pool.len(), 1);
        let first = &handles[0];
        for handle in &handles {
            assert!(Arc::ptr_eq(first, handle));
        }
    }

    #[test]
    fn test_concurrent_intern_many_contents() {
        let pool = InternPool::new();

        (0..64).into_par_iter().for_each(|i| {
            for _ in 0..8 {
                pool.intern(&format!("literal-{}", i % 16));
            }
        });

        assert_eq!(pool.len(), 16);
    }
}
