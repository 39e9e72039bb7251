//! Base data builder
//!
//! Converts raw form input into canonical [`DocumentData`] with every
//! field defaulted. Pure and synchronous: no I/O, never fails on missing
//! optional fields, and repeat calls with the same input and timestamp
//! produce identical output.

use crate::raw::{RawEscalationDetails, RawInput, RawRemedyDetails};
use crate::types::{
    DemandType, DocumentData, DocumentType, EscalationDetails, IncidentDetails, InsuranceDetails,
    Metadata, RecipientInfo, RemedyDetails, SenderInfo, TimelineEvent, VehicleDetails,
};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Substituted when the claimant's name is missing
pub const SENDER_NAME_PLACEHOLDER: &str = "Name Missing";
/// Substituted when the business name is missing
pub const RECIPIENT_NAME_PLACEHOLDER: &str = "Business Name Missing";
/// Substituted when a free-form remedy has no description
pub const OTHER_DETAILS_PLACEHOLDER: &str = "Details of the remedy sought were not provided";

/// Default response deadline in days
pub const DEFAULT_RESPONSE_DAYS: u32 = 14;
/// Shortest allowed response deadline
pub const MIN_RESPONSE_DAYS: u32 = 5;
/// Longest allowed response deadline
pub const MAX_RESPONSE_DAYS: u32 = 30;

static REGO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:rego|registration)\s*:\s*([A-Za-z0-9-]+)")
        .unwrap_or_else(|e| panic!("registration pattern must compile: {e}"))
});

/// Builds canonical document data from raw input
#[derive(Debug, Clone)]
pub struct BaseDataBuilder {
    default_state: String,
    schema_version: String,
    default_response_days: u32,
}

impl BaseDataBuilder {
    /// Create a builder
    #[inline]
    #[must_use]
    pub fn new(default_state: impl Into<String>, schema_version: impl Into<String>) -> Self {
        Self {
            default_state: default_state.into(),
            schema_version: schema_version.into(),
            default_response_days: DEFAULT_RESPONSE_DAYS,
        }
    }

    /// With default response deadline (clamped to the allowed range)
    #[inline]
    #[must_use]
    pub fn with_default_response_days(mut self, days: u32) -> Self {
        self.default_response_days = days.clamp(MIN_RESPONSE_DAYS, MAX_RESPONSE_DAYS);
        self
    }

    /// Build document data stamped with the current time
    #[must_use]
    pub fn build(
        &self,
        raw: &RawInput,
        document_type: DocumentType,
        generation_id: &str,
    ) -> DocumentData {
        self.build_at(raw, document_type, generation_id, Utc::now())
    }

    /// Build document data stamped with `generated_date`
    #[must_use]
    pub fn build_at(
        &self,
        raw: &RawInput,
        document_type: DocumentType,
        generation_id: &str,
        generated_date: DateTime<Utc>,
    ) -> DocumentData {
        let state = text(raw.state.as_ref())
            .map(|s| s.to_ascii_uppercase())
            .unwrap_or_else(|| self.default_state.clone());

        let sender_info = SenderInfo {
            name: text(raw.customer_name.as_ref())
                .unwrap_or_else(|| SENDER_NAME_PLACEHOLDER.to_string()),
            address: text_or_empty(raw.customer_address.as_ref()),
            email: text_or_empty(raw.customer_email.as_ref()),
            phone: text_or_empty(raw.customer_phone.as_ref()),
        };

        let recipient_info = RecipientInfo {
            name: text(raw.mechanic_name.as_ref())
                .unwrap_or_else(|| RECIPIENT_NAME_PLACEHOLDER.to_string()),
            address: text_or_empty(raw.mechanic_address.as_ref()),
            abn: text_or_empty(raw.mechanic_abn.as_ref()),
        };

        let vehicle_details = raw
            .vehicle_details
            .as_deref()
            .map(parse_vehicle_details)
            .unwrap_or_default();

        let service_date = text_or_empty(raw.service_date.as_ref());
        let incident_details = IncidentDetails {
            incident_date: text(raw.incident_date.as_ref()).unwrap_or_else(|| service_date.clone()),
            service_date,
            disputed_damage_description: text_or_empty(raw.damage_description.as_ref()),
            acknowledged_damage_description: text_or_empty(raw.acknowledged_damage.as_ref()),
            pre_service_evidence_available: coerce_bool(raw.pre_service_evidence.as_ref()),
            timeline_events: raw
                .timeline_events
                .iter()
                .filter_map(|event| {
                    text(event.description.as_ref()).map(|description| TimelineEvent {
                        timestamp: text(event.timestamp.as_ref()),
                        description,
                    })
                })
                .collect(),
            previous_communication_summary: text_or_empty(raw.previous_communication.as_ref()),
        };

        let mut validation_warnings = Vec::new();
        let remedy_details = build_remedy(raw.remedy_details.as_ref(), &mut validation_warnings);
        let escalation_details = self.build_escalation(
            raw.escalation_details.as_ref(),
            &state,
            generated_date,
        );

        for warning in &validation_warnings {
            tracing::warn!(document_type = %document_type, "{warning}");
        }

        DocumentData {
            document_type,
            state,
            sender_info,
            recipient_info,
            vehicle_details,
            incident_details,
            remedy_details,
            escalation_details,
            metadata: Metadata {
                generated_date,
                schema_version: self.schema_version.clone(),
                generation_id: generation_id.to_string(),
                is_fallback: false,
                fallback_reason: None,
                validation_warnings,
            },
            legal_basis: None,
            incident_narrative: None,
            remedy_statement: None,
            escalation_text: None,
            tribunal_advice: None,
            insurance_advice: None,
        }
    }

    fn build_escalation(
        &self,
        raw: Option<&RawEscalationDetails>,
        state: &str,
        generated_date: DateTime<Utc>,
    ) -> EscalationDetails {
        let response_deadline_days = coerce_days(
            raw.and_then(|r| r.response_deadline_days.as_ref()),
            self.default_response_days,
        );
        let escalation_body = raw
            .and_then(|r| text(r.escalation_body.as_ref()))
            .unwrap_or_else(|| tribunal_for_state(state).to_string());
        let due = generated_date.date_naive() + Duration::days(i64::from(response_deadline_days));

        EscalationDetails {
            response_deadline_days,
            escalation_body,
            payment_made_under_protest: coerce_bool(
                raw.and_then(|r| r.payment_made_under_protest.as_ref()),
            ),
            calculated_response_date: due.format("%Y-%m-%d").to_string(),
        }
    }
}

impl Default for BaseDataBuilder {
    fn default() -> Self {
        Self::new("VIC", "1.0")
    }
}

fn build_remedy(raw: Option<&RawRemedyDetails>, warnings: &mut Vec<String>) -> RemedyDetails {
    let demand_type = raw
        .and_then(|r| r.demand_type.as_deref())
        .map(DemandType::parse)
        .unwrap_or_default();
    let insurance = raw.and_then(|r| r.insurance_details.as_ref());
    let insurance_details = InsuranceDetails {
        insurer: text_or_empty(insurance.and_then(|i| i.insurer.as_ref())),
        claim_number: text_or_empty(insurance.and_then(|i| i.claim_number.as_ref())),
        excess_amount: coerce_amount(insurance.and_then(|i| i.excess_amount.as_ref())),
    };

    // Soft checks only: incomplete remedies still produce a document.
    if demand_type == DemandType::ExcessReimbursement
        && (insurance_details.insurer.is_empty() || insurance_details.excess_amount <= 0.0)
    {
        warnings.push(
            "excess reimbursement requested without insurer or excess amount".to_string(),
        );
    }

    let demand_other_details = if demand_type == DemandType::Other {
        Some(
            raw.and_then(|r| text(r.demand_other_details.as_ref()))
                .unwrap_or_else(|| {
                    warnings.push("'other' remedy requested without details".to_string());
                    OTHER_DETAILS_PLACEHOLDER.to_string()
                }),
        )
    } else {
        None
    };

    RemedyDetails {
        demand_type,
        demand_amount: coerce_amount(raw.and_then(|r| r.demand_amount.as_ref())),
        alternative_remedy_offered: text_or_empty(raw.and_then(|r| r.alternative_remedy.as_ref())),
        insurance_details,
        demand_other_details,
    }
}

/// Parse a free-text vehicle description.
///
/// 1. A `Rego: TOKEN` / `Registration: TOKEN` label is extracted and removed
/// 2. A leading token of exactly four digits is the year
/// 3. The next token is the make
/// 4. Whatever remains is the model
#[must_use]
pub fn parse_vehicle_details(input: &str) -> VehicleDetails {
    let mut registration = String::new();
    let remainder = match REGO_PATTERN.captures(input) {
        Some(caps) => {
            registration = caps[1].to_string();
            REGO_PATTERN.replace(input, " ").into_owned()
        }
        None => input.to_string(),
    };

    let mut tokens = remainder
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .peekable();

    let year = match tokens.peek() {
        Some(t) if t.len() == 4 && t.chars().all(|c| c.is_ascii_digit()) => {
            tokens.next().map(str::to_string).unwrap_or_default()
        }
        _ => String::new(),
    };
    let make = tokens.next().map(str::to_string).unwrap_or_default();
    let model = tokens.collect::<Vec<_>>().join(" ");

    VehicleDetails {
        year,
        make,
        model,
        registration,
    }
}

/// Coerce a loosely typed amount.
///
/// Numbers pass through; strings may carry `$`, commas and spaces.
/// Anything unparsable, negative or non-finite becomes 0.
#[must_use]
pub fn coerce_amount(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Coerce a response deadline, clamped to 5..=30.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coerce_days(value: Option<&Value>, default: u32) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => {
            v.round().clamp(f64::from(MIN_RESPONSE_DAYS), f64::from(MAX_RESPONSE_DAYS)) as u32
        }
        _ => default,
    }
}

/// Coerce a loosely typed flag
#[must_use]
pub fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "on" | "1"
        ),
        _ => false,
    }
}

/// Tribunal that hears consumer disputes in a state
#[must_use]
pub fn tribunal_for_state(state: &str) -> &'static str {
    match state.trim().to_ascii_uppercase().as_str() {
        "VIC" => "VCAT",
        "NSW" => "NCAT",
        "QLD" => "QCAT",
        "WA" => "State Administrative Tribunal",
        "SA" => "SACAT",
        "TAS" => "TASCAT",
        "ACT" => "ACAT",
        "NT" => "NTCAT",
        _ => "the relevant state tribunal",
    }
}

fn text(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn text_or_empty(value: Option<&String>) -> String {
    text(value).unwrap_or_default()
}
