//! Canonical names for source metrics.
//!
//! Source feeds use `snake_case` names; the engine's convention is hyphens.
//! Translations are cached for the life of the process. The cache is never
//! evicted, so it is bounded by the number of distinct source names.

use dashmap::DashMap;
use std::sync::Arc;

/// Translate a raw source name into the engine's naming convention.
///
/// Idempotent: a canonical name maps to itself.
pub fn canonicalize(raw: &str) -> String {
    raw.replace('_', "-")
}

/// Lazily populated raw name -> canonical name map.
#[derive(Debug, Default)]
pub struct RenameCache {
    names: DashMap<Box<str>, Arc<str>>,
}

impl RenameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical form of `raw`, computed once and then served from the cache.
    pub fn resolve(&self, raw: &str) -> Arc<str> {
        if let Some(name) = self.names.get(raw) {
            return Arc::clone(name.value());
        }

        let name: Arc<str> = Arc::from(canonicalize(raw));
        Arc::clone(
            self.names
                .entry(Box::from(raw))
                .or_insert(name)
                .value(),
        )
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscores_become_hyphens() {
        assert_eq!(canonicalize("cpu_used"), "cpu-used");
        assert_eq!(canonicalize("a_b_c"), "a-b-c");
        assert_eq!(canonicalize("app.cpu"), "app.cpu");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let once = canonicalize("mem_free_bytes");
        assert_eq!(canonicalize(&once), once);
    }

    #[test]
    fn test_cache_grows_once_per_name() {
        let cache = RenameCache::new();
        assert!(cache.is_empty());

        let a = cache.resolve("cpu_used");
        let b = cache.resolve("cpu_used");
        assert_eq!(&*a, "cpu-used");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        cache.resolve("mem_used");
        assert_eq!(cache.len(), 2);
    }
}
