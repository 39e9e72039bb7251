//! Core types for dispute documents
//!
//! Defines the canonical document data threaded through generation:
//! - Document type and its section plan
//! - Parties, vehicle, incident, remedy and escalation details
//! - Generation metadata
//! - Generated prose sections (present only once generation succeeds)

use crate::error::ModelError;
use crate::section::{
    EscalationText, IncidentNarrative, InsuranceAdvice, LegalBasis, RemedyStatement, SectionKey,
    TribunalAdvice,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of dispute document being produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Formal letter of demand to the business
    LetterOfDemand,
    /// Complaint to the state consumer affairs regulator
    ConsumerComplaint,
    /// Guidance for a tribunal application
    VcatApplication,
    /// Letter supporting an insurance claim
    InsuranceClaim,
}

impl DocumentType {
    /// Every supported document type
    pub const ALL: [DocumentType; 4] = [
        DocumentType::LetterOfDemand,
        DocumentType::ConsumerComplaint,
        DocumentType::VcatApplication,
        DocumentType::InsuranceClaim,
    ];

    /// Wire name, also used in filenames and template names
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::LetterOfDemand => "letter_of_demand",
            DocumentType::ConsumerComplaint => "consumer_complaint",
            DocumentType::VcatApplication => "vcat_application",
            DocumentType::InsuranceClaim => "insurance_claim",
        }
    }

    /// Human-readable title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            DocumentType::LetterOfDemand => "Letter of Demand",
            DocumentType::ConsumerComplaint => "Consumer Complaint",
            DocumentType::VcatApplication => "Tribunal Application Guidance",
            DocumentType::InsuranceClaim => "Insurance Claim Letter",
        }
    }

    /// Sections generated for this document type, in prompt order.
    ///
    /// A tribunal application swaps the general legal basis for
    /// tribunal-specific advice; an insurance claim swaps it for
    /// insurer-facing advice.
    #[must_use]
    pub fn section_plan(&self) -> &'static [SectionKey] {
        match self {
            DocumentType::LetterOfDemand | DocumentType::ConsumerComplaint => &[
                SectionKey::LegalBasis,
                SectionKey::IncidentNarrative,
                SectionKey::RemedyStatement,
                SectionKey::EscalationText,
            ],
            DocumentType::VcatApplication => &[
                SectionKey::TribunalAdvice,
                SectionKey::IncidentNarrative,
                SectionKey::RemedyStatement,
                SectionKey::EscalationText,
            ],
            DocumentType::InsuranceClaim => &[
                SectionKey::InsuranceAdvice,
                SectionKey::IncidentNarrative,
                SectionKey::RemedyStatement,
                SectionKey::EscalationText,
            ],
        }
    }
}

impl FromStr for DocumentType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == trimmed)
            .ok_or_else(|| ModelError::UnsupportedDocumentType(trimmed.to_string()))
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The claimant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderInfo {
    /// Always non-empty; placeholder substituted when missing
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

/// The counterparty business
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientInfo {
    /// Always non-empty; placeholder substituted when missing
    pub name: String,
    pub address: String,
    pub abn: String,
}

/// Vehicle parsed from the free-text details field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetails {
    pub year: String,
    pub make: String,
    pub model: String,
    pub registration: String,
}

impl VehicleDetails {
    /// One-line description, e.g. "2018 Toyota Corolla (ABC123)"
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts: Vec<&str> = [self.year.as_str(), self.make.as_str(), self.model.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            parts.push("the vehicle");
        }
        let mut out = parts.join(" ");
        if !self.registration.is_empty() {
            out.push_str(&format!(" ({})", self.registration));
        }
        out
    }
}

/// One entry in the incident timeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub description: String,
}

/// What happened and when
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDetails {
    pub service_date: String,
    /// Defaults to the service date
    pub incident_date: String,
    pub disputed_damage_description: String,
    pub acknowledged_damage_description: String,
    pub pre_service_evidence_available: bool,
    pub timeline_events: Vec<TimelineEvent>,
    pub previous_communication_summary: String,
}

/// Remedy the claimant is demanding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DemandType {
    /// Full cost of repairing the damage
    #[default]
    FullRepairCost,
    /// Reimbursement of an insurance excess already paid
    ExcessReimbursement,
    /// Free-form remedy described in `demand_other_details`
    Other,
}

impl DemandType {
    /// Parse the form value; unknown values map to `Other`
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "fullRepairCost" => DemandType::FullRepairCost,
            "excessReimbursement" => DemandType::ExcessReimbursement,
            _ => DemandType::Other,
        }
    }
}

/// Insurance context for excess reimbursement demands
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceDetails {
    pub insurer: String,
    pub claim_number: String,
    pub excess_amount: f64,
}

/// Demand details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemedyDetails {
    pub demand_type: DemandType,
    /// Always finite and non-negative
    pub demand_amount: f64,
    pub alternative_remedy_offered: String,
    pub insurance_details: InsuranceDetails,
    /// Present iff `demand_type` is `Other`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_other_details: Option<String>,
}

/// Deadline and escalation path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationDetails {
    /// Clamped to 5..=30
    pub response_deadline_days: u32,
    /// Jurisdiction-specific tribunal name
    pub escalation_body: String,
    pub payment_made_under_protest: bool,
    /// ISO date the response is due
    pub calculated_response_date: String,
}

/// Generation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub generated_date: DateTime<Utc>,
    pub schema_version: String,
    pub generation_id: String,
    /// Set when the document came from the deterministic fallback path
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Soft validation findings; never block generation
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_warnings: Vec<String>,
}

/// Canonical document data
///
/// Created once per request by the base data builder or the fallback
/// composer, enriched with generated sections, then rendered read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentData {
    pub document_type: DocumentType,
    pub state: String,
    pub sender_info: SenderInfo,
    pub recipient_info: RecipientInfo,
    pub vehicle_details: VehicleDetails,
    pub incident_details: IncidentDetails,
    pub remedy_details: RemedyDetails,
    pub escalation_details: EscalationDetails,
    pub metadata: Metadata,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_basis: Option<LegalBasis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_narrative: Option<IncidentNarrative>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remedy_statement: Option<RemedyStatement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_text: Option<EscalationText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tribunal_advice: Option<TribunalAdvice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_advice: Option<InsuranceAdvice>,
}

impl DocumentData {
    /// Sections currently populated, in canonical order
    #[must_use]
    pub fn generated_sections(&self) -> Vec<SectionKey> {
        SectionKey::ALL
            .into_iter()
            .filter(|key| self.has_section(*key))
            .collect()
    }

    /// Whether a section is populated
    #[must_use]
    pub fn has_section(&self, key: SectionKey) -> bool {
        match key {
            SectionKey::LegalBasis => self.legal_basis.is_some(),
            SectionKey::IncidentNarrative => self.incident_narrative.is_some(),
            SectionKey::RemedyStatement => self.remedy_statement.is_some(),
            SectionKey::EscalationText => self.escalation_text.is_some(),
            SectionKey::TribunalAdvice => self.tribunal_advice.is_some(),
            SectionKey::InsuranceAdvice => self.insurance_advice.is_some(),
        }
    }
}
