//! Generation orchestrator
//!
//! Builds base data, then runs every section in the document type's plan
//! concurrently and waits for all of them to settle. One failed section
//! never cancels the others; completed sections are logged for diagnostics
//! even when the orchestration as a whole fails. Results are merged by key,
//! so completion order is irrelevant.

use crate::error::OrchestrationError;
use docgen_ai::{SectionError, SectionGenerator};
use docgen_model::{BaseDataBuilder, DocumentData, DocumentType, GeneratedSection, RawInput};
use futures::future::join_all;

/// Runs the primary generation path
#[derive(Debug, Clone)]
pub struct Orchestrator {
    builder: BaseDataBuilder,
    sections: SectionGenerator,
}

impl Orchestrator {
    /// Create an orchestrator
    #[must_use]
    pub fn new(builder: BaseDataBuilder, sections: SectionGenerator) -> Self {
        Self { builder, sections }
    }

    /// Base data builder in use
    #[must_use]
    pub fn builder(&self) -> &BaseDataBuilder {
        &self.builder
    }

    /// Build base data for a request
    #[must_use]
    pub fn build_base(
        &self,
        raw: &RawInput,
        document_type: DocumentType,
        generation_id: &str,
    ) -> DocumentData {
        self.builder.build(raw, document_type, generation_id)
    }

    /// Generate every planned section and merge them into `data`
    ///
    /// `data` is only modified when every section succeeds.
    ///
    /// # Errors
    /// `OrchestrationError` naming each failed section and each section
    /// that completed.
    pub async fn enrich(&self, data: &mut DocumentData) -> Result<(), OrchestrationError> {
        let document_type = data.document_type;
        let plan = document_type.section_plan();
        let base: &DocumentData = data;

        let outcomes = join_all(plan.iter().map(|&key| async move {
            (key, self.sections.generate(key, base).await)
        }))
        .await;

        let mut generated: Vec<GeneratedSection> = Vec::with_capacity(plan.len());
        let mut failures: Vec<SectionError> = Vec::new();
        for (key, outcome) in outcomes {
            match outcome {
                Ok(section) => {
                    tracing::debug!(
                        document_type = %document_type,
                        section = %key,
                        "section completed"
                    );
                    generated.push(section);
                }
                Err(err) => {
                    tracing::warn!(
                        document_type = %document_type,
                        section = %key,
                        class = %err.class,
                        attempts = err.attempts,
                        error = %err.message,
                        "section failed"
                    );
                    failures.push(err);
                }
            }
        }

        if !failures.is_empty() {
            let completed = generated.iter().map(GeneratedSection::key).collect::<Vec<_>>();
            tracing::info!(
                document_type = %document_type,
                failed = failures.len(),
                ?completed,
                "orchestration failed"
            );
            return Err(OrchestrationError {
                document_type,
                failures,
                completed,
            });
        }

        for section in generated {
            data.merge_section(section);
        }
        Ok(())
    }

    /// Build base data and generate every section
    ///
    /// # Errors
    /// `OrchestrationError` if any section fails.
    pub async fn generate_document_data(
        &self,
        raw: &RawInput,
        document_type: DocumentType,
        generation_id: &str,
    ) -> Result<DocumentData, OrchestrationError> {
        let mut data = self.build_base(raw, document_type, generation_id);
        self.enrich(&mut data).await?;
        Ok(data)
    }
}
