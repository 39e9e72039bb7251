//! Template renderer
//!
//! Compiles one Handlebars registry per document type on first use and
//! keeps it in the renderer's [`TemplateCache`]. Rendering is read-only
//! over the document data. Strict mode stays off, so a missing optional
//! field renders as empty text instead of failing.

use crate::cache::{CacheStats, CompiledTemplate, TemplateCache};
use crate::error::RenderError;
use crate::helpers;
use crate::source::{TemplateSource, FALLBACK_NOTICE_PARTIAL};
use docgen_model::{DocumentData, DocumentType};
use handlebars::Handlebars;
use std::sync::Arc;

/// Renders document data into final document text
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    source: TemplateSource,
    cache: TemplateCache,
}

impl TemplateRenderer {
    /// Create a renderer over a template source with its own cache
    #[must_use]
    pub fn new(source: TemplateSource) -> Self {
        Self {
            source,
            cache: TemplateCache::default(),
        }
    }

    /// Renderer over the bundled templates
    #[must_use]
    pub fn embedded() -> Self {
        Self::new(TemplateSource::Embedded)
    }

    /// With an explicit cache
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: TemplateCache) -> Self {
        self.cache = cache;
        self
    }

    /// Template source in use
    #[must_use]
    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Cache statistics
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Render document data with the template for `document_type`
    ///
    /// # Errors
    /// `TemplateNotFound`, `TemplateCompile` or `Io` if the template cannot
    /// be loaded; `Render` if rendering itself fails.
    pub fn render(
        &self,
        document_type: DocumentType,
        data: &DocumentData,
    ) -> Result<String, RenderError> {
        let compiled = self.compiled(document_type)?;
        compiled
            .render(document_type.as_str(), data)
            .map_err(|e| RenderError::Render {
                document_type,
                message: e.to_string(),
            })
    }

    /// Compile (or fetch the cached) template for a document type
    ///
    /// # Errors
    /// As for [`TemplateRenderer::render`], minus `Render`.
    pub fn compiled(&self, document_type: DocumentType) -> Result<CompiledTemplate, RenderError> {
        self.cache
            .try_get_or_insert_with(document_type, || self.compile(document_type))
    }

    fn compile(&self, document_type: DocumentType) -> Result<CompiledTemplate, RenderError> {
        tracing::debug!(document_type = %document_type, "compiling template");
        let text = self.source.load(document_type)?;
        let notice = self.source.load_fallback_notice()?;

        let compile_err = |e: handlebars::TemplateError| RenderError::TemplateCompile {
            document_type,
            message: e.to_string(),
        };

        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        helpers::register(&mut registry);
        registry
            .register_partial(FALLBACK_NOTICE_PARTIAL, notice)
            .map_err(compile_err)?;
        registry
            .register_template_string(document_type.as_str(), text)
            .map_err(compile_err)?;
        Ok(Arc::new(registry))
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgen_model::{BaseDataBuilder, GeneratedSection, RawInput};
    use serde_json::json;

    fn data(document_type: DocumentType) -> DocumentData {
        let raw = RawInput::from_value(json!({
            "document_type": document_type.as_str(),
            "customer_name": "Jane Doe",
            "mechanic_name": "Acme Motors",
            "vehicle_details": "2020 Mazda 3, Rego: XYZ999",
            "service_date": "2024-01-10",
            "remedyDetails": { "demandAmount": "800" }
        }))
        .unwrap();
        let mut data = BaseDataBuilder::default().build(&raw, document_type, "abcd1234");
        for key in document_type.section_plan() {
            data.merge_section(GeneratedSection::uniform(*key, &format!("{} text", key.label())));
        }
        data
    }

    #[test]
    fn renders_every_document_type() {
        let renderer = TemplateRenderer::embedded();
        for doc_type in DocumentType::ALL {
            let text = renderer.render(doc_type, &data(doc_type)).unwrap();
            assert!(text.contains("Jane Doe"), "{doc_type}");
            assert!(text.contains("Acme Motors"), "{doc_type}");
            assert!(text.contains("$800.00"), "{doc_type}");
            for key in doc_type.section_plan() {
                assert!(text.contains(&format!("{} text", key.label())), "{doc_type}: {key}");
            }
            assert!(!text.contains("generation failed"), "{doc_type}");
        }
    }

    #[test]
    fn fallback_notice_shown_when_flagged() {
        let renderer = TemplateRenderer::embedded();
        let mut data = data(DocumentType::LetterOfDemand);
        data.metadata.is_fallback = true;
        data.metadata.fallback_reason = Some("service unavailable".into());
        let text = renderer.render(DocumentType::LetterOfDemand, &data).unwrap();
        assert!(text.contains("fallback-notice"));
    }

    #[test]
    fn missing_sections_do_not_fail() {
        let renderer = TemplateRenderer::embedded();
        let data = BaseDataBuilder::default().build(
            &RawInput::default(),
            DocumentType::ConsumerComplaint,
            "abcd1234",
        );
        let text = renderer.render(DocumentType::ConsumerComplaint, &data).unwrap();
        assert!(text.contains("Name Missing"));
        assert!(text.contains("Business Name Missing"));
    }

    #[test]
    fn compiles_once_per_type() {
        let renderer = TemplateRenderer::embedded();
        let data = data(DocumentType::InsuranceClaim);
        renderer.render(DocumentType::InsuranceClaim, &data).unwrap();
        renderer.render(DocumentType::InsuranceClaim, &data).unwrap();
        assert_eq!(renderer.cache_stats().entry_count, 1);
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = TemplateRenderer::embedded();
        let data = data(DocumentType::VcatApplication);
        assert_eq!(
            renderer.render(DocumentType::VcatApplication, &data).unwrap(),
            renderer.render(DocumentType::VcatApplication, &data).unwrap()
        );
    }

    #[test]
    fn names_are_escaped() {
        let renderer = TemplateRenderer::embedded();
        let mut data = data(DocumentType::LetterOfDemand);
        data.sender_info.name = "<script>".into();
        let text = renderer.render(DocumentType::LetterOfDemand, &data).unwrap();
        assert!(!text.contains("<script>"));
    }

    #[test]
    fn broken_template_is_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("letter_of_demand.hbs"), "{{#if}}").unwrap();
        let renderer = TemplateRenderer::new(TemplateSource::Directory(dir.path().into()));
        let err = renderer
            .render(DocumentType::LetterOfDemand, &data(DocumentType::LetterOfDemand))
            .unwrap_err();
        assert!(matches!(err, RenderError::TemplateCompile { .. }));
    }

    #[test]
    fn section_keys_match_template_fields() {
        let value = serde_json::to_value(data(DocumentType::LetterOfDemand)).unwrap();
        for key in DocumentType::LetterOfDemand.section_plan() {
            let section = value.get(key.as_str()).unwrap();
            for field in key.fields() {
                assert!(section.get(*field).is_some(), "{key}.{field}");
            }
        }
    }
}
