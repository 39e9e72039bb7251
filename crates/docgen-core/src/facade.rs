//! Document generation facade
//!
//! Entry point tying the pipeline together:
//! 1. Resolve the document type (input errors fail fast)
//! 2. Assign a fresh generation id
//! 3. Primary path: base data → concurrent sections → render
//! 4. On any primary failure: fallback data → render, flagged
//! 5. Return one result envelope either way
//!
//! Only an input error or a failure of both paths escapes as `Err`.

use crate::config::DocgenConfig;
use crate::error::{DocgenError, PipelineError};
use crate::fallback::FallbackComposer;
use crate::orchestrator::Orchestrator;
use crate::stage::{GenerationStage, StageTracker};
use docgen_ai::{SectionGenerator, TextGenerator};
use docgen_model::{DocumentData, DocumentType, RawInput};
use docgen_render::TemplateRenderer;
use serde::Serialize;
use std::sync::Arc;

/// Suffix appended to fallback filenames
pub const FALLBACK_SUFFIX: &str = "_fallback";

/// Short random identifier: the first 8 hex digits of a v4 UUID
#[must_use]
pub fn new_generation_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Result envelope returned to callers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    pub is_fallback: bool,
    pub document_text: String,
    pub document_data: Option<DocumentData>,
    pub filename: String,
    pub document_type: String,
    pub customer_name: String,
    pub mechanic_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set once persisted: whether the input snapshot was stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regeneration_available: Option<bool>,
    /// Stages this request passed through
    #[serde(skip)]
    pub stages: Vec<GenerationStage>,
}

impl GenerationResult {
    fn from_document(
        data: DocumentData,
        document_text: String,
        filename: String,
        warning: Option<String>,
        stages: Vec<GenerationStage>,
    ) -> Self {
        Self {
            success: true,
            is_fallback: data.metadata.is_fallback,
            document_text,
            filename,
            document_type: data.document_type.as_str().to_string(),
            customer_name: data.sender_info.name.clone(),
            mechanic_name: data.recipient_info.name.clone(),
            document_data: Some(data),
            warning,
            error: None,
            regeneration_available: None,
            stages,
        }
    }

    /// Failure envelope for an error that escaped the facade
    #[must_use]
    pub fn failure(raw: &RawInput, err: &DocgenError) -> Self {
        Self {
            success: false,
            is_fallback: false,
            document_text: String::new(),
            document_data: None,
            filename: String::new(),
            document_type: raw.document_type.clone().unwrap_or_default(),
            customer_name: raw.customer_name.clone().unwrap_or_default(),
            mechanic_name: raw.mechanic_name.clone().unwrap_or_default(),
            warning: None,
            error: Some(err.to_string()),
            regeneration_available: None,
            stages: Vec::new(),
        }
    }

    /// Generation id embedded in the document data
    #[must_use]
    pub fn generation_id(&self) -> Option<&str> {
        self.document_data
            .as_ref()
            .map(|d| d.metadata.generation_id.as_str())
    }
}

/// Generates documents with primary and fallback paths
#[derive(Debug, Clone)]
pub struct DocumentGenerator {
    orchestrator: Orchestrator,
    fallback: FallbackComposer,
    renderer: TemplateRenderer,
    filename_prefix: String,
}

impl DocumentGenerator {
    /// Assemble a generator from its parts
    #[must_use]
    pub fn new(
        orchestrator: Orchestrator,
        fallback: FallbackComposer,
        renderer: TemplateRenderer,
        filename_prefix: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            fallback,
            renderer,
            filename_prefix: filename_prefix.into(),
        }
    }

    /// Build a generator from configuration and a text-generation service
    #[must_use]
    pub fn from_config(config: &DocgenConfig, generator: Arc<dyn TextGenerator>) -> Self {
        let builder = config.base_builder();
        let sections = SectionGenerator::new(generator)
            .with_policy(config.retry_policy())
            .with_settings(config.prompt_settings());
        Self::new(
            Orchestrator::new(builder.clone(), sections),
            FallbackComposer::new(builder),
            config.renderer(),
            config.filename_prefix.clone(),
        )
    }

    /// Renderer in use
    #[must_use]
    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Generate a document
    ///
    /// # Errors
    /// `DocgenError::Input` for a missing or unsupported document type,
    /// `DocgenError::Unrecoverable` when the fallback path fails too.
    pub async fn generate(&self, raw: &RawInput) -> Result<GenerationResult, DocgenError> {
        let document_type = raw.document_type().map_err(|e| {
            tracing::warn!(error = %e, "rejecting request");
            DocgenError::from(e)
        })?;
        let generation_id = new_generation_id();
        let mut tracker = StageTracker::new(generation_id.clone());
        tracing::info!(
            document_type = %document_type,
            generation_id = %generation_id,
            "generating document"
        );

        let primary = self
            .primary(raw, document_type, &generation_id, &mut tracker)
            .await;
        match primary {
            Ok((data, text)) => {
                let filename = self.filename(document_type, &generation_id, false);
                tracing::info!(filename = %filename, "document generated");
                Ok(GenerationResult::from_document(
                    data,
                    text,
                    filename,
                    None,
                    tracker.into_history(),
                ))
            }
            Err(original) => {
                tracing::warn!(
                    document_type = %document_type,
                    generation_id = %generation_id,
                    error = %original,
                    "primary generation failed, using fallback"
                );
                match self.fallback(raw, document_type, &generation_id, &original, &mut tracker) {
                    Ok((data, text)) => {
                        let filename = self.filename(document_type, &generation_id, true);
                        tracing::info!(filename = %filename, "fallback document generated");
                        Ok(GenerationResult::from_document(
                            data,
                            text,
                            filename,
                            Some(format!(
                                "AI drafting was unavailable; \
                                 a template-only document was produced ({original})"
                            )),
                            tracker.into_history(),
                        ))
                    }
                    Err(fallback) => {
                        if let Err(refused) = tracker.advance(GenerationStage::Failed) {
                            tracing::warn!(
                                generation_id = %generation_id,
                                error = %refused,
                                "could not record failed stage"
                            );
                        }
                        tracing::error!(
                            document_type = %document_type,
                            generation_id = %generation_id,
                            original = %original,
                            fallback = %fallback,
                            "fallback generation failed"
                        );
                        Err(DocgenError::Unrecoverable {
                            original: original.to_string(),
                            fallback: fallback.to_string(),
                        })
                    }
                }
            }
        }
    }

    /// Generate a document, folding any error into a failure envelope
    pub async fn generate_envelope(&self, raw: &RawInput) -> GenerationResult {
        match self.generate(raw).await {
            Ok(result) => result,
            Err(err) => GenerationResult::failure(raw, &err),
        }
    }

    async fn primary(
        &self,
        raw: &RawInput,
        document_type: DocumentType,
        generation_id: &str,
        tracker: &mut StageTracker,
    ) -> Result<(DocumentData, String), PipelineError> {
        tracker.advance(GenerationStage::BuildingBase)?;
        let mut data = self
            .orchestrator
            .build_base(raw, document_type, generation_id);

        tracker.advance(GenerationStage::GeneratingSections)?;
        self.orchestrator.enrich(&mut data).await?;

        tracker.advance(GenerationStage::Assembled)?;
        tracker.advance(GenerationStage::Rendering)?;
        let text = self.renderer.render(document_type, &data)?;
        tracker.advance(GenerationStage::Done)?;
        Ok((data, text))
    }

    fn fallback(
        &self,
        raw: &RawInput,
        document_type: DocumentType,
        generation_id: &str,
        original: &PipelineError,
        tracker: &mut StageTracker,
    ) -> Result<(DocumentData, String), PipelineError> {
        tracker.advance(GenerationStage::FallbackBuilding)?;
        let data = self
            .fallback
            .compose(raw, document_type, generation_id, &original.to_string());

        tracker.advance(GenerationStage::FallbackRendering)?;
        let text = self.renderer.render(document_type, &data)?;
        tracker.advance(GenerationStage::FallbackDone)?;
        Ok((data, text))
    }

    fn filename(&self, document_type: DocumentType, generation_id: &str, fallback: bool) -> String {
        let mut name = format!(
            "{}_{}_{}",
            self.filename_prefix,
            document_type.as_str(),
            generation_id
        );
        if fallback {
            name.push_str(FALLBACK_SUFFIX);
        }
        name
    }
}
