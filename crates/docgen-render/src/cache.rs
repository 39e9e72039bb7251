//! Compiled-template cache using moka
//!
//! Owned by the renderer rather than held in a global, so each renderer
//! (and each test) gets an isolated cache. Concurrent population of the
//! same key may compile twice; both results are identical and the last
//! insert wins.

use docgen_model::DocumentType;
use handlebars::Handlebars;
use moka::sync::Cache;
use std::sync::Arc;

/// Compiled registry for one document type
pub type CompiledTemplate = Arc<Handlebars<'static>>;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Cache of compiled templates keyed by document type
#[derive(Clone)]
pub struct TemplateCache {
    inner: Cache<DocumentType, CompiledTemplate>,
}

impl TemplateCache {
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Get compiled template
    #[inline]
    #[must_use]
    pub fn get(&self, document_type: DocumentType) -> Option<CompiledTemplate> {
        self.inner.get(&document_type)
    }

    /// Insert compiled template
    #[inline]
    pub fn insert(&self, document_type: DocumentType, template: CompiledTemplate) {
        self.inner.insert(document_type, template);
    }

    /// Get or compile a template
    ///
    /// # Errors
    /// Whatever `compile` returns; nothing is cached on error.
    pub fn try_get_or_insert_with<E, F>(
        &self,
        document_type: DocumentType,
        compile: F,
    ) -> Result<CompiledTemplate, E>
    where
        F: FnOnce() -> Result<CompiledTemplate, E>,
    {
        if let Some(cached) = self.get(document_type) {
            return Ok(cached);
        }

        let compiled = compile()?;
        self.insert(document_type, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Check if a template is cached
    #[inline]
    #[must_use]
    pub fn contains(&self, document_type: DocumentType) -> bool {
        self.inner.contains_key(&document_type)
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(16)
    }
}

impl std::fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCache")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn compiles_once() {
        let cache = TemplateCache::new(4);
        let compiles = AtomicU32::new(0);

        for _ in 0..3 {
            let result: Result<_, ()> =
                cache.try_get_or_insert_with(DocumentType::LetterOfDemand, || {
                    compiles.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(Handlebars::new()))
                });
            assert!(result.is_ok());
        }

        assert_eq!(compiles.load(Ordering::SeqCst), 1);
        assert!(cache.contains(DocumentType::LetterOfDemand));
        assert_eq!(cache.stats().entry_count, 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = TemplateCache::new(4);
        let result = cache.try_get_or_insert_with(DocumentType::InsuranceClaim, || Err("broken"));
        assert_eq!(result.err(), Some("broken"));
        assert!(!cache.contains(DocumentType::InsuranceClaim));
    }

    #[test]
    fn invalidate_all_clears() {
        let cache = TemplateCache::new(4);
        cache.insert(DocumentType::VcatApplication, Arc::new(Handlebars::new()));
        cache.invalidate_all();
        assert!(cache.get(DocumentType::VcatApplication).is_none());
    }
}
