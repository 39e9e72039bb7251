//! Persistence and regeneration
//!
//! Each generated document is stored as two objects sharing a filename:
//! - `<filename>.html`: rendered text (failure is fatal)
//! - `<filename>.input.json`: the raw input snapshot, always stored as
//!   `application/json` (failure is logged; regeneration becomes
//!   unavailable for that document)
//!
//! Regeneration replays a snapshot through the facade and stores the result
//! under a fresh filename. The original objects are never overwritten.

use crate::error::DocgenError;
use crate::facade::{DocumentGenerator, GenerationResult};
use crate::storage::{DocumentStore, ObjectMeta, PutOptions};
use docgen_model::RawInput;
use std::sync::Arc;

/// Suffix of the rendered document key
pub const DOCUMENT_SUFFIX: &str = ".html";
/// Suffix of the raw input snapshot key
pub const SNAPSHOT_SUFFIX: &str = ".input.json";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Storage key of a rendered document
#[must_use]
pub fn document_key(filename: &str) -> String {
    format!("{}{DOCUMENT_SUFFIX}", base_filename(filename))
}

/// Storage key of an input snapshot
#[must_use]
pub fn snapshot_key(filename: &str) -> String {
    format!("{}{SNAPSHOT_SUFFIX}", base_filename(filename))
}

/// Strip a storage suffix if the caller passed a full key
fn base_filename(filename: &str) -> &str {
    let trimmed = filename.trim();
    trimmed
        .strip_suffix(DOCUMENT_SUFFIX)
        .or_else(|| trimmed.strip_suffix(SNAPSHOT_SUFFIX))
        .unwrap_or(trimmed)
}

/// Generates, persists and regenerates documents
#[derive(Clone)]
pub struct DocumentService {
    generator: DocumentGenerator,
    store: Arc<dyn DocumentStore>,
}

impl DocumentService {
    /// Create a service
    #[must_use]
    pub fn new(generator: DocumentGenerator, store: Arc<dyn DocumentStore>) -> Self {
        Self { generator, store }
    }

    /// Underlying generator
    #[must_use]
    pub fn generator(&self) -> &DocumentGenerator {
        &self.generator
    }

    /// Generate and persist a document
    ///
    /// # Errors
    /// As [`DocumentGenerator::generate`], plus `Storage` if the rendered
    /// document cannot be stored.
    pub async fn generate_and_store(
        &self,
        raw: &RawInput,
    ) -> Result<GenerationResult, DocgenError> {
        self.generate_and_store_with(raw, PutOptions::default()).await
    }

    /// Generate and persist with caller-supplied storage hints
    ///
    /// The content type hint applies to the rendered document only; the
    /// snapshot is always stored as `application/json`.
    ///
    /// # Errors
    /// As [`DocumentService::generate_and_store`].
    pub async fn generate_and_store_with(
        &self,
        raw: &RawInput,
        options: PutOptions,
    ) -> Result<GenerationResult, DocgenError> {
        let mut result = self.generator.generate(raw).await?;
        self.persist(&mut result, raw, options).await?;
        Ok(result)
    }

    async fn persist(
        &self,
        result: &mut GenerationResult,
        raw: &RawInput,
        options: PutOptions,
    ) -> Result<(), DocgenError> {
        let mut metadata = options.metadata;
        metadata.insert("documentType".into(), result.document_type.clone());
        metadata.insert("isFallback".into(), result.is_fallback.to_string());
        if let Some(id) = result.generation_id() {
            metadata.insert("generationId".into(), id.to_string());
        }

        let document_options = PutOptions {
            content_type: Some(
                options
                    .content_type
                    .unwrap_or_else(|| HTML_CONTENT_TYPE.to_string()),
            ),
            metadata: metadata.clone(),
        };
        let key = document_key(&result.filename);
        self.store
            .put(&key, result.document_text.clone().into_bytes(), document_options)
            .await
            .map_err(|e| {
                tracing::error!(key = %key, error = %e, "failed to store document");
                DocgenError::from(e)
            })?;

        let snapshot_options = PutOptions {
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            metadata,
        };
        let stored = self
            .store_snapshot(&result.filename, raw, snapshot_options)
            .await;
        result.regeneration_available = Some(stored);
        Ok(())
    }

    async fn store_snapshot(&self, filename: &str, raw: &RawInput, options: PutOptions) -> bool {
        let key = snapshot_key(filename);
        let json = match raw.to_json_pretty() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "could not serialize input snapshot");
                return false;
            }
        };
        match self.store.put(&key, json.into_bytes(), options).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    error = %e,
                    "failed to store input snapshot; regeneration unavailable"
                );
                false
            }
        }
    }

    /// Regenerate a stored document from its input snapshot
    ///
    /// Accepts a bare filename or either storage key. Fallback documents
    /// can be regenerated too.
    ///
    /// # Errors
    /// `SnapshotMissing` if no snapshot exists, `InvalidSnapshot` if it does
    /// not parse, otherwise as [`DocumentService::generate_and_store`].
    pub async fn regenerate(&self, filename: &str) -> Result<GenerationResult, DocgenError> {
        let base = base_filename(filename);
        let raw = self.load_snapshot(base).await?;
        tracing::info!(source = %base, "regenerating document");
        let options = PutOptions::default().with_metadata("regeneratedFrom", base);
        let result = self.generate_and_store_with(&raw, options).await?;
        tracing::info!(source = %base, filename = %result.filename, "document regenerated");
        Ok(result)
    }

    /// Load and parse a stored input snapshot
    ///
    /// # Errors
    /// `SnapshotMissing`, `InvalidSnapshot` or `Storage`.
    pub async fn load_snapshot(&self, filename: &str) -> Result<RawInput, DocgenError> {
        let base = base_filename(filename);
        let bytes = self
            .store
            .get(&snapshot_key(base))
            .await?
            .ok_or_else(|| DocgenError::SnapshotMissing(base.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| DocgenError::InvalidSnapshot {
            filename: base.to_string(),
            message: e.to_string(),
        })?;
        RawInput::from_json_str(&text).map_err(|e| DocgenError::InvalidSnapshot {
            filename: base.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetch a stored document's text
    ///
    /// # Errors
    /// `Storage` on backend failure or non-UTF-8 content.
    pub async fn fetch_document(&self, filename: &str) -> Result<Option<String>, DocgenError> {
        let key = document_key(filename);
        match self.store.get(&key).await? {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                DocgenError::from(crate::error::StorageError::Metadata {
                    key,
                    message: format!("document is not UTF-8: {e}"),
                })
            }),
            None => Ok(None),
        }
    }

    /// Metadata of a stored document
    ///
    /// # Errors
    /// `Storage` on backend failure.
    pub async fn document_meta(&self, filename: &str) -> Result<Option<ObjectMeta>, DocgenError> {
        Ok(self.store.head(&document_key(filename)).await?)
    }
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService")
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_from_filename_or_key() {
        assert_eq!(
            document_key("au_letter_of_demand_1a2b3c4d"),
            "au_letter_of_demand_1a2b3c4d.html"
        );
        assert_eq!(
            snapshot_key("au_letter_of_demand_1a2b3c4d.html"),
            "au_letter_of_demand_1a2b3c4d.input.json"
        );
        assert_eq!(
            document_key("au_insurance_claim_0000ffff_fallback.input.json"),
            "au_insurance_claim_0000ffff_fallback.html"
        );
    }
}
