//! Raw form input
//!
//! Mirrors what the multi-step web form submits. Loosely typed fields
//! (amounts, day counts, flags) are kept as JSON values and coerced by the
//! base data builder. Unknown keys are preserved so a stored snapshot
//! replays exactly.
//!
//! Parsing only fails when the submission is not a JSON object. Explicit
//! nulls read as absent, numbers and booleans in text fields read as their
//! text, and values of any other wrong shape are dropped with a warning.

use crate::error::ModelError;
use crate::types::DocumentType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Raw input as submitted by the form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInput {
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub customer_address: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,

    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub mechanic_name: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub mechanic_address: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub mechanic_abn: Option<String>,

    /// Free text such as "2018 Toyota Corolla, Rego: ABC123"
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub vehicle_details: Option<String>,

    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub service_date: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<String>,
    /// Damage the business disputes
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub damage_description: Option<String>,
    /// Damage the business has acknowledged
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub acknowledged_damage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_service_evidence: Option<Value>,
    #[serde(deserialize_with = "lenient::list", skip_serializing_if = "Vec::is_empty")]
    pub timeline_events: Vec<RawTimelineEvent>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub previous_communication: Option<String>,

    #[serde(
        rename = "remedyDetails",
        deserialize_with = "lenient::nested",
        skip_serializing_if = "Option::is_none"
    )]
    pub remedy_details: Option<RawRemedyDetails>,
    #[serde(
        rename = "escalationDetails",
        deserialize_with = "lenient::nested",
        skip_serializing_if = "Option::is_none"
    )]
    pub escalation_details: Option<RawEscalationDetails>,

    /// Fields the pipeline does not read, kept for snapshot fidelity
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Timeline entry as submitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTimelineEvent {
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Remedy step of the form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawRemedyDetails {
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub demand_type: Option<String>,
    /// Number or numeric string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_amount: Option<Value>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub alternative_remedy: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub demand_other_details: Option<String>,
    #[serde(deserialize_with = "lenient::nested", skip_serializing_if = "Option::is_none")]
    pub insurance_details: Option<RawInsuranceDetails>,
}

/// Insurance sub-step of the form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawInsuranceDetails {
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub insurer: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub claim_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excess_amount: Option<Value>,
}

/// Escalation step of the form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEscalationDetails {
    /// Number or numeric string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_deadline_days: Option<Value>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub escalation_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_made_under_protest: Option<Value>,
}

/// Deserializers that default odd form values instead of failing
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub(super) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => {
                tracing::warn!(value = %other, "ignoring non-text form value");
                None
            }
        })
    }

    pub(super) fn nested<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            value => Ok(parse_or_warn(value)),
        }
    }

    pub(super) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => Ok(items.into_iter().filter_map(parse_or_warn).collect()),
            other => {
                tracing::warn!(value = %other, "ignoring non-list form value");
                Ok(Vec::new())
            }
        }
    }

    fn parse_or_warn<T: DeserializeOwned>(value: Value) -> Option<T> {
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed form value");
                None
            }
        }
    }
}

impl RawInput {
    /// Parse raw input from a JSON value
    ///
    /// # Errors
    /// `ModelError::InvalidInput` if the value does not have the form's shape.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(|e| ModelError::InvalidInput(e.to_string()))
    }

    /// Parse raw input from JSON text
    ///
    /// # Errors
    /// `ModelError::InvalidInput` on malformed JSON or wrong shape.
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::InvalidInput(e.to_string()))
    }

    /// Serialize for the regeneration snapshot
    ///
    /// # Errors
    /// `ModelError::InvalidInput` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::InvalidInput(e.to_string()))
    }

    /// Resolve the requested document type
    ///
    /// # Errors
    /// `MissingDocumentType` when absent or blank, `UnsupportedDocumentType`
    /// when not in the supported set.
    pub fn document_type(&self) -> Result<DocumentType, ModelError> {
        match self.document_type.as_deref().map(str::trim) {
            None | Some("") => Err(ModelError::MissingDocumentType),
            Some(s) => DocumentType::from_str(s),
        }
    }

    /// Start building raw input for a document type
    #[must_use]
    pub fn for_document(document_type: DocumentType) -> Self {
        Self {
            document_type: Some(document_type.as_str().to_string()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_form_submission() {
        let raw = RawInput::from_value(json!({
            "document_type": "letter_of_demand",
            "customer_name": "Jane Doe",
            "vehicle_details": "2020 Mazda 3, Rego: XYZ999",
            "remedyDetails": { "demandType": "fullRepairCost", "demandAmount": "800" },
            "escalationDetails": { "responseDeadlineDays": "14", "escalationBody": "VCAT" }
        }))
        .unwrap();

        assert_eq!(raw.document_type().unwrap(), DocumentType::LetterOfDemand);
        assert_eq!(raw.customer_name.as_deref(), Some("Jane Doe"));
        let remedy = raw.remedy_details.as_ref().unwrap();
        assert_eq!(remedy.demand_amount, Some(json!("800")));
    }

    #[test]
    fn null_fields_become_none() {
        let raw = RawInput::from_value(json!({
            "document_type": "consumer_complaint",
            "customer_name": null,
            "remedyDetails": null
        }))
        .unwrap();
        assert!(raw.customer_name.is_none());
        assert!(raw.remedy_details.is_none());
    }

    #[test]
    fn missing_and_unsupported_document_type() {
        assert!(matches!(
            RawInput::default().document_type(),
            Err(ModelError::MissingDocumentType)
        ));
        let raw = RawInput {
            document_type: Some("small_claims".into()),
            ..RawInput::default()
        };
        assert!(matches!(
            raw.document_type(),
            Err(ModelError::UnsupportedDocumentType(_))
        ));
    }

    #[test]
    fn unknown_fields_survive_snapshot() {
        let original = json!({
            "document_type": "insurance_claim",
            "upload_ids": ["a1", "b2"],
            "utm_source": "newsletter"
        });
        let raw = RawInput::from_value(original.clone()).unwrap();
        let snapshot: Value = serde_json::from_str(&raw.to_json_pretty().unwrap()).unwrap();
        assert_eq!(snapshot, original);
    }

    #[test]
    fn explicit_nulls_read_as_defaults() {
        let raw = RawInput::from_value(json!({
            "document_type": "letter_of_demand",
            "timeline_events": null,
            "customer_phone": null,
            "remedyDetails": { "demandType": null, "insuranceDetails": null },
            "escalationDetails": { "escalationBody": null }
        }))
        .unwrap();
        assert!(raw.timeline_events.is_empty());
        assert!(raw.customer_phone.is_none());
        let remedy = raw.remedy_details.unwrap();
        assert!(remedy.demand_type.is_none());
        assert!(remedy.insurance_details.is_none());
        assert!(raw.escalation_details.unwrap().escalation_body.is_none());
    }

    #[test]
    fn scalar_values_in_text_fields_become_text() {
        let raw = RawInput::from_value(json!({
            "document_type": "letter_of_demand",
            "customer_phone": 412345678,
            "mechanic_abn": 51824753556_u64,
            "previous_communication": false,
            "timeline_events": [{ "timestamp": "2024-01-10", "description": 42 }],
            "remedyDetails": { "insuranceDetails": { "claimNumber": 998877 } }
        }))
        .unwrap();
        assert_eq!(raw.customer_phone.as_deref(), Some("412345678"));
        assert_eq!(raw.mechanic_abn.as_deref(), Some("51824753556"));
        assert_eq!(raw.previous_communication.as_deref(), Some("false"));
        assert_eq!(raw.timeline_events[0].description.as_deref(), Some("42"));
        let insurance = raw.remedy_details.unwrap().insurance_details.unwrap();
        assert_eq!(insurance.claim_number.as_deref(), Some("998877"));
    }

    #[test]
    fn wrongly_shaped_values_are_dropped() {
        let raw = RawInput::from_value(json!({
            "document_type": "consumer_complaint",
            "customer_name": { "first": "Jane" },
            "timeline_events": "yesterday",
            "remedyDetails": "refund please",
            "escalationDetails": ["VCAT"]
        }))
        .unwrap();
        assert!(raw.customer_name.is_none());
        assert!(raw.timeline_events.is_empty());
        assert!(raw.remedy_details.is_none());
        assert!(raw.escalation_details.is_none());
        assert_eq!(raw.document_type().unwrap(), DocumentType::ConsumerComplaint);
    }

    #[test]
    fn malformed_timeline_entries_are_skipped() {
        let raw = RawInput::from_value(json!({
            "timeline_events": [
                { "timestamp": "2024-01-10", "description": "dropped off" },
                "not an event",
                null,
                { "description": "picked up" }
            ]
        }))
        .unwrap();
        let descriptions: Vec<_> = raw
            .timeline_events
            .iter()
            .map(|e| e.description.as_deref())
            .collect();
        assert_eq!(descriptions, vec![Some("dropped off"), Some("picked up")]);
    }

    #[test]
    fn non_object_submission_is_input_error() {
        let err = RawInput::from_value(json!(["letter_of_demand"])).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn malformed_json_is_input_error() {
        let err = RawInput::from_json_str("{ not json").unwrap_err();
        assert!(err.is_input_error());
    }
}
