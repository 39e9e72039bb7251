//! Generated sections
//!
//! Each section is one independently generated prose fragment. The
//! generation service answers with a JSON object keyed by the section
//! name; [`GeneratedSection::from_json`] turns that into a typed value and
//! [`DocumentData::merge_section`] writes it into the only field it may
//! touch. Keys the service adds beyond the documented shape are dropped.

use crate::error::ModelError;
use crate::types::DocumentData;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies one generated section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKey {
    LegalBasis,
    IncidentNarrative,
    RemedyStatement,
    EscalationText,
    TribunalAdvice,
    InsuranceAdvice,
}

impl SectionKey {
    /// All section keys in canonical order
    pub const ALL: [SectionKey; 6] = [
        SectionKey::LegalBasis,
        SectionKey::IncidentNarrative,
        SectionKey::RemedyStatement,
        SectionKey::EscalationText,
        SectionKey::TribunalAdvice,
        SectionKey::InsuranceAdvice,
    ];

    /// Top-level JSON key the service must answer with
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::LegalBasis => "legalBasis",
            SectionKey::IncidentNarrative => "incidentNarrative",
            SectionKey::RemedyStatement => "remedyStatement",
            SectionKey::EscalationText => "escalationText",
            SectionKey::TribunalAdvice => "tribunalAdvice",
            SectionKey::InsuranceAdvice => "insuranceAdvice",
        }
    }

    /// Human-readable label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SectionKey::LegalBasis => "Legal basis",
            SectionKey::IncidentNarrative => "Incident narrative",
            SectionKey::RemedyStatement => "Remedy statement",
            SectionKey::EscalationText => "Escalation notice",
            SectionKey::TribunalAdvice => "Tribunal advice",
            SectionKey::InsuranceAdvice => "Insurance advice",
        }
    }

    /// Fields expected inside the section object
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            SectionKey::LegalBasis => &["summaryText"],
            SectionKey::RemedyStatement => &["text", "summaryDemand"],
            _ => &["text"],
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal basis paragraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalBasis {
    pub summary_text: String,
}

/// Narrative of the incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentNarrative {
    pub text: String,
}

/// Statement of the remedy sought
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemedyStatement {
    pub text: String,
    /// One-sentence demand used in the closing summary
    pub summary_demand: String,
}

/// Escalation notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationText {
    pub text: String,
}

/// Tribunal-specific framing for applications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TribunalAdvice {
    pub text: String,
}

/// Insurer-facing framing for claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceAdvice {
    pub text: String,
}

/// A generated section tagged by its key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedSection {
    LegalBasis(LegalBasis),
    IncidentNarrative(IncidentNarrative),
    RemedyStatement(RemedyStatement),
    EscalationText(EscalationText),
    TribunalAdvice(TribunalAdvice),
    InsuranceAdvice(InsuranceAdvice),
}

impl GeneratedSection {
    /// Key this section belongs to
    #[must_use]
    pub fn key(&self) -> SectionKey {
        match self {
            GeneratedSection::LegalBasis(_) => SectionKey::LegalBasis,
            GeneratedSection::IncidentNarrative(_) => SectionKey::IncidentNarrative,
            GeneratedSection::RemedyStatement(_) => SectionKey::RemedyStatement,
            GeneratedSection::EscalationText(_) => SectionKey::EscalationText,
            GeneratedSection::TribunalAdvice(_) => SectionKey::TribunalAdvice,
            GeneratedSection::InsuranceAdvice(_) => SectionKey::InsuranceAdvice,
        }
    }

    /// Build a section with every field set to `text`
    #[must_use]
    pub fn uniform(key: SectionKey, text: &str) -> Self {
        let text = text.to_string();
        match key {
            SectionKey::LegalBasis => {
                GeneratedSection::LegalBasis(LegalBasis { summary_text: text })
            }
            SectionKey::IncidentNarrative => {
                GeneratedSection::IncidentNarrative(IncidentNarrative { text })
            }
            SectionKey::RemedyStatement => GeneratedSection::RemedyStatement(RemedyStatement {
                summary_demand: text.clone(),
                text,
            }),
            SectionKey::EscalationText => GeneratedSection::EscalationText(EscalationText { text }),
            SectionKey::TribunalAdvice => GeneratedSection::TribunalAdvice(TribunalAdvice { text }),
            SectionKey::InsuranceAdvice => {
                GeneratedSection::InsuranceAdvice(InsuranceAdvice { text })
            }
        }
    }

    /// Parse the service's JSON answer for `key`.
    ///
    /// The answer must be an object whose `key` member is an object holding
    /// every field in [`SectionKey::fields`] as a non-empty string.
    ///
    /// # Errors
    /// `ModelError::InvalidSectionOutput` when the key is missing, a field is
    /// missing or not a string, or a field is blank.
    pub fn from_json(key: SectionKey, value: &Value) -> Result<Self, ModelError> {
        let body = value
            .get(key.as_str())
            .ok_or_else(|| ModelError::invalid_section(key, format!("missing '{key}' key")))?;

        let field = |name: &str| -> Result<String, ModelError> {
            match body.get(name) {
                Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
                Some(Value::String(_)) => Err(ModelError::invalid_section(
                    key,
                    format!("'{name}' is empty"),
                )),
                Some(_) => Err(ModelError::invalid_section(
                    key,
                    format!("'{name}' is not a string"),
                )),
                None => Err(ModelError::invalid_section(
                    key,
                    format!("missing '{name}'"),
                )),
            }
        };

        Ok(match key {
            SectionKey::LegalBasis => GeneratedSection::LegalBasis(LegalBasis {
                summary_text: field("summaryText")?,
            }),
            SectionKey::IncidentNarrative => {
                GeneratedSection::IncidentNarrative(IncidentNarrative { text: field("text")? })
            }
            SectionKey::RemedyStatement => GeneratedSection::RemedyStatement(RemedyStatement {
                text: field("text")?,
                summary_demand: field("summaryDemand")?,
            }),
            SectionKey::EscalationText => {
                GeneratedSection::EscalationText(EscalationText { text: field("text")? })
            }
            SectionKey::TribunalAdvice => {
                GeneratedSection::TribunalAdvice(TribunalAdvice { text: field("text")? })
            }
            SectionKey::InsuranceAdvice => {
                GeneratedSection::InsuranceAdvice(InsuranceAdvice { text: field("text")? })
            }
        })
    }
}

impl DocumentData {
    /// Write a generated section into its field.
    ///
    /// Merging is keyed, so the order sections arrive in does not matter.
    pub fn merge_section(&mut self, section: GeneratedSection) {
        match section {
            GeneratedSection::LegalBasis(s) => self.legal_basis = Some(s),
            GeneratedSection::IncidentNarrative(s) => self.incident_narrative = Some(s),
            GeneratedSection::RemedyStatement(s) => self.remedy_statement = Some(s),
            GeneratedSection::EscalationText(s) => self.escalation_text = Some(s),
            GeneratedSection::TribunalAdvice(s) => self.tribunal_advice = Some(s),
            GeneratedSection::InsuranceAdvice(s) => self.insurance_advice = Some(s),
        }
    }
}
