//! Fallback composer
//!
//! Rebuilds document data straight from raw input with the same defaulting
//! rules as the primary path, then fills every planned section with a
//! labelled placeholder so the templates render unmodified. Never touches
//! the text-generation service.

use docgen_model::{
    BaseDataBuilder, DocumentData, DocumentType, GeneratedSection, RawInput, SectionKey,
};

/// Placeholder text for a section that could not be generated
#[must_use]
pub fn placeholder(key: SectionKey) -> String {
    format!("[{} not available - generation failed]", key.label())
}

/// Builds degraded document data
#[derive(Debug, Clone, Default)]
pub struct FallbackComposer {
    builder: BaseDataBuilder,
}

impl FallbackComposer {
    /// Create a composer using the primary path's builder settings
    #[must_use]
    pub fn new(builder: BaseDataBuilder) -> Self {
        Self { builder }
    }

    /// Compose fallback data; `reason` is recorded in the metadata
    #[must_use]
    pub fn compose(
        &self,
        raw: &RawInput,
        document_type: DocumentType,
        generation_id: &str,
        reason: &str,
    ) -> DocumentData {
        let mut data = self.builder.build(raw, document_type, generation_id);
        for &key in document_type.section_plan() {
            data.merge_section(GeneratedSection::uniform(key, &placeholder(key)));
        }
        data.metadata.is_fallback = true;
        data.metadata.fallback_reason = Some(reason.to_string());
        tracing::debug!(
            document_type = %document_type,
            generation_id,
            "composed fallback data"
        );
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_planned_section() {
        let composer = FallbackComposer::default();
        for doc_type in DocumentType::ALL {
            let data = composer.compose(&RawInput::default(), doc_type, "id", "service down");
            assert_eq!(data.generated_sections().len(), doc_type.section_plan().len());
            for key in doc_type.section_plan() {
                assert!(data.has_section(*key));
            }
            assert!(data.metadata.is_fallback);
            assert_eq!(data.metadata.fallback_reason.as_deref(), Some("service down"));
        }
    }

    #[test]
    fn placeholder_names_the_section() {
        assert_eq!(
            placeholder(SectionKey::IncidentNarrative),
            "[Incident narrative not available - generation failed]"
        );
    }

    #[test]
    fn keeps_primary_defaults() {
        let data = FallbackComposer::default().compose(
            &RawInput::default(),
            DocumentType::LetterOfDemand,
            "id",
            "x",
        );
        assert_eq!(data.sender_info.name, "Name Missing");
        assert_eq!(data.remedy_details.demand_amount, 0.0);
    }
}
