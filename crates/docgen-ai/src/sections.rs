//! Section generators
//!
//! One call produces one section: build the prompt, send it through the
//! shared retry policy, then validate the answer into a typed
//! [`GeneratedSection`]. Malformed or empty answers count as a failed,
//! retryable attempt.

use crate::client::TextGenerator;
use crate::error::{GenerationError, SectionError};
use crate::prompts::{build_request, PromptSettings};
use crate::retry::{Exhausted, RetryPolicy};
use docgen_model::{DocumentData, GeneratedSection, SectionKey};
use serde_json::Value;
use std::sync::Arc;

/// Generates sections against a text-generation service
#[derive(Clone)]
pub struct SectionGenerator {
    generator: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
    settings: PromptSettings,
}

impl SectionGenerator {
    /// Create a generator with the default retry policy and settings
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            policy: RetryPolicy::default(),
            settings: PromptSettings::default(),
        }
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// With prompt settings
    #[inline]
    #[must_use]
    pub fn with_settings(mut self, settings: PromptSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Retry policy in use
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate one section from the base data
    ///
    /// # Errors
    /// `SectionError` once the retry policy gives up, carrying the last
    /// error's classification and message.
    pub async fn generate(
        &self,
        key: SectionKey,
        data: &DocumentData,
    ) -> Result<GeneratedSection, SectionError> {
        let request = build_request(key, data, &self.settings);
        let request = &request;
        let generator = &self.generator;

        let outcome = self
            .policy
            .run(
                move |attempt| async move {
                    tracing::debug!(section = %key, attempt, "requesting section");
                    let text = generator.generate(request).await?;
                    parse_section(key, &text)
                },
                GenerationError::is_retryable,
            )
            .await;

        match outcome {
            Ok(section) => {
                tracing::debug!(section = %key, "section generated");
                Ok(section)
            }
            Err(Exhausted { error, attempts }) => {
                let err = SectionError::new(key, attempts, &error);
                tracing::warn!(section = %key, attempts, class = %err.class, "section failed");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for SectionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionGenerator")
            .field("policy", &self.policy)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Validate the service's text answer for `key`
///
/// Tolerates a surrounding markdown code fence.
///
/// # Errors
/// `GenerationError::InvalidOutput` when the text is not JSON or lacks the
/// section's fields.
pub fn parse_section(key: SectionKey, text: &str) -> Result<GeneratedSection, GenerationError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GenerationError::InvalidOutput(format!("{key}: not JSON: {e}")))?;
    GeneratedSection::from_json(key, &value)
        .map_err(|e| GenerationError::InvalidOutput(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockTextGenerator;
    use crate::error::ErrorClass;
    use crate::retry::Backoff;
    use docgen_model::{BaseDataBuilder, DocumentType, RawInput};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn data() -> DocumentData {
        BaseDataBuilder::default().build(
            &RawInput::for_document(DocumentType::LetterOfDemand),
            DocumentType::LetterOfDemand,
            "abcd1234",
        )
    }

    fn fast_policy(retries: u32) -> RetryPolicy {
        RetryPolicy::new(retries, Backoff::fixed(Duration::from_millis(10)))
    }

    #[test]
    fn parse_accepts_fenced_json() {
        let text = "```json\n{\"escalationText\": {\"text\": \"We will go to VCAT.\"}}\n```";
        let section = parse_section(SectionKey::EscalationText, text).unwrap();
        assert_eq!(section.key(), SectionKey::EscalationText);
    }

    #[test]
    fn parse_rejects_prose() {
        let err =
            parse_section(SectionKey::LegalBasis, "Sure! Here is your paragraph").unwrap_err();
        assert_eq!(err.class(), ErrorClass::InvalidOutput);
    }

    #[tokio::test(start_paused = true)]
    async fn generates_section() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(|_| Ok(r#"{"legalBasis":{"summaryText":"Under the ACL..."}}"#.into()));

        let generator = SectionGenerator::new(Arc::new(mock)).with_policy(fast_policy(2));
        let section = generator.generate(SectionKey::LegalBasis, &data()).await.unwrap();
        assert_eq!(section, GeneratedSection::uniform(SectionKey::LegalBasis, "Under the ACL..."));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_invalid_output_then_succeeds() {
        let mut mock = MockTextGenerator::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(r#"{"incidentNarrative":{"text":""}}"#.into()));
        mock.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(r#"{"incidentNarrative":{"text":"On 10 January..."}}"#.into()));

        let generator = SectionGenerator::new(Arc::new(mock)).with_policy(fast_policy(2));
        let section = generator
            .generate(SectionKey::IncidentNarrative, &data())
            .await
            .unwrap();
        assert_eq!(section.key(), SectionKey::IncidentNarrative);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_error_is_not_retried() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(|_| Err(GenerationError::from_status(401, "invalid api key")));

        let generator = SectionGenerator::new(Arc::new(mock)).with_policy(fast_policy(3));
        let err = generator
            .generate(SectionKey::RemedyStatement, &data())
            .await
            .unwrap_err();
        assert_eq!(err.section, SectionKey::RemedyStatement);
        assert_eq!(err.class, ErrorClass::Auth);
        assert_eq!(err.attempts, 1);
        assert!(err.message.contains("invalid api key"));
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_exhaust_retries() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(3)
            .returning(|_| Err(GenerationError::from_status(503, "overloaded")));

        let generator = SectionGenerator::new(Arc::new(mock)).with_policy(fast_policy(2));
        let err = generator
            .generate(SectionKey::EscalationText, &data())
            .await
            .unwrap_err();
        assert_eq!(err.class, ErrorClass::Server);
        assert_eq!(err.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn request_uses_json_mode() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .withf(|req| {
                req.response_format == crate::client::ResponseFormat::JsonObject
                    && req.model == "local-model"
            })
            .times(1)
            .returning(|_| Ok(r#"{"tribunalAdvice":{"text":"Apply online."}}"#.into()));

        let generator = SectionGenerator::new(Arc::new(mock)).with_settings(PromptSettings {
            model: "local-model".into(),
            temperature: 0.0,
        });
        assert!(generator
            .generate(SectionKey::TribunalAdvice, &data())
            .await
            .is_ok());
    }
}
