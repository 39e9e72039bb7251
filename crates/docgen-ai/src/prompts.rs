//! Prompt construction for section generation

use crate::client::{ChatMessage, GenerationRequest, ResponseFormat};
use docgen_model::{DemandType, DocumentData, SectionKey};
use serde_json::{json, Map, Value};
use std::fmt::Write as _;

const SYSTEM_PROMPT: &str = "\
You are an assistant drafting Australian consumer dispute documents about vehicle \
servicing and repairs. Write in plain, firm, professional English suitable for a \
self-represented consumer. Refer to the Australian Consumer Law where relevant. \
Never invent facts, amounts, dates or names that are not in the case details.

Respond ONLY with a JSON object. No markdown fences, no explanation, just raw JSON.";

/// Model parameters shared by every section request
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.3,
        }
    }
}

/// Build the request for one section
#[must_use]
pub fn build_request(
    key: SectionKey,
    data: &DocumentData,
    settings: &PromptSettings,
) -> GenerationRequest {
    GenerationRequest {
        model: settings.model.clone(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(user_prompt(key, data)),
        ],
        response_format: ResponseFormat::JsonObject,
        temperature: settings.temperature,
    }
}

fn user_prompt(key: SectionKey, data: &DocumentData) -> String {
    format!(
        "Document: {title}\n\
         Task: {task}\n\
         \n\
         Answer with exactly this JSON shape:\n\
         {shape}\n\
         \n\
         Case details:\n\
         {context}",
        title = data.document_type.title(),
        task = instruction(key, data),
        shape = response_shape(key),
        context = case_context(data),
    )
}

fn instruction(key: SectionKey, data: &DocumentData) -> String {
    let body = &data.escalation_details.escalation_body;
    match key {
        SectionKey::LegalBasis => format!(
            "Write one paragraph explaining the consumer guarantees under the Australian \
             Consumer Law that apply to this service (acceptable care and skill, fitness for \
             purpose) and why they were breached. Mention that {state} law applies.",
            state = data.state
        ),
        SectionKey::IncidentNarrative => "Write a factual, chronological narrative of what \
             happened, distinguishing damage the business acknowledged from damage it disputes."
            .to_string(),
        SectionKey::RemedyStatement => {
            let demand = match data.remedy_details.demand_type {
                DemandType::FullRepairCost => "the full cost of repairing the damage".to_string(),
                DemandType::ExcessReimbursement => {
                    "reimbursement of the insurance excess paid".to_string()
                }
                DemandType::Other => data
                    .remedy_details
                    .demand_other_details
                    .clone()
                    .unwrap_or_default(),
            };
            format!(
                "Write a paragraph stating the remedy sought ({demand}) and the amount. Put a \
                 single-sentence version of the demand in summaryDemand."
            )
        }
        SectionKey::EscalationText => format!(
            "Write a paragraph stating that if no satisfactory response is received within \
             {days} days (by {due}) the matter will be escalated to {body}.",
            days = data.escalation_details.response_deadline_days,
            due = data.escalation_details.calculated_response_date,
        ),
        SectionKey::TribunalAdvice => format!(
            "Write guidance for lodging a consumer claim with {body}: what the tribunal can \
             order, what evidence to bring, and how the facts fit a consumer guarantee claim."
        ),
        SectionKey::InsuranceAdvice => "Write a paragraph addressed to the insurer explaining \
             why the repairer is liable and supporting recovery of the excess and repair costs."
            .to_string(),
    }
}

/// The JSON shape the service must answer with, e.g.
/// `{"legalBasis": {"summaryText": "..."}}`
#[must_use]
pub fn response_shape(key: SectionKey) -> String {
    let fields: Map<String, Value> = key
        .fields()
        .iter()
        .map(|f| ((*f).to_string(), Value::String("...".to_string())))
        .collect();
    json!({ key.as_str(): fields }).to_string()
}

fn case_context(data: &DocumentData) -> String {
    let mut out = String::new();
    let incident = &data.incident_details;
    let remedy = &data.remedy_details;

    let _ = writeln!(out, "- Jurisdiction: {}", data.state);
    let _ = writeln!(out, "- Consumer: {}", data.sender_info.name);
    let _ = writeln!(out, "- Business: {}", data.recipient_info.name);
    let _ = writeln!(out, "- Vehicle: {}", data.vehicle_details.describe());
    optional_line(&mut out, "Service date", &incident.service_date);
    optional_line(&mut out, "Incident date", &incident.incident_date);
    optional_line(&mut out, "Disputed damage", &incident.disputed_damage_description);
    optional_line(
        &mut out,
        "Acknowledged damage",
        &incident.acknowledged_damage_description,
    );
    let _ = writeln!(
        out,
        "- Evidence of pre-service condition: {}",
        if incident.pre_service_evidence_available {
            "yes"
        } else {
            "no"
        }
    );
    for event in &incident.timeline_events {
        match &event.timestamp {
            Some(ts) => {
                let _ = writeln!(out, "- Timeline {ts}: {}", event.description);
            }
            None => {
                let _ = writeln!(out, "- Timeline: {}", event.description);
            }
        }
    }
    optional_line(
        &mut out,
        "Previous communication",
        &incident.previous_communication_summary,
    );
    let _ = writeln!(out, "- Amount demanded: ${:.2}", remedy.demand_amount);
    optional_line(
        &mut out,
        "Alternative remedy offered",
        &remedy.alternative_remedy_offered,
    );
    if remedy.demand_type == DemandType::ExcessReimbursement {
        optional_line(&mut out, "Insurer", &remedy.insurance_details.insurer);
        optional_line(&mut out, "Claim number", &remedy.insurance_details.claim_number);
        let _ = writeln!(
            out,
            "- Excess paid: ${:.2}",
            remedy.insurance_details.excess_amount
        );
    }
    if data.escalation_details.payment_made_under_protest {
        let _ = writeln!(out, "- Payment was made under protest");
    }
    out
}

fn optional_line(out: &mut String, label: &str, value: &str) {
    if !value.is_empty() {
        let _ = writeln!(out, "- {label}: {value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgen_model::{BaseDataBuilder, DocumentType, RawInput};

    fn sample() -> DocumentData {
        let mut raw = RawInput::for_document(DocumentType::LetterOfDemand);
        raw.customer_name = Some("Jane Doe".into());
        raw.mechanic_name = Some("Acme Motors".into());
        raw.damage_description = Some("scratched bumper".into());
        BaseDataBuilder::default().build(&raw, DocumentType::LetterOfDemand, "abcd1234")
    }

    #[test]
    fn shape_lists_every_field() {
        assert_eq!(
            response_shape(SectionKey::RemedyStatement),
            r#"{"remedyStatement":{"summaryDemand":"...","text":"..."}}"#
        );
    }

    #[test]
    fn request_carries_case_details() {
        let request = build_request(
            SectionKey::IncidentNarrative,
            &sample(),
            &PromptSettings::default(),
        );
        assert_eq!(request.response_format, ResponseFormat::JsonObject);
        assert_eq!(request.messages.len(), 2);
        let user = &request.messages[1].content;
        assert!(user.contains("Jane Doe"));
        assert!(user.contains("Acme Motors"));
        assert!(user.contains("scratched bumper"));
        assert!(user.contains("incidentNarrative"));
    }

    #[test]
    fn escalation_prompt_names_tribunal() {
        let request = build_request(
            SectionKey::EscalationText,
            &sample(),
            &PromptSettings::default(),
        );
        assert!(request.messages[1].content.contains("VCAT"));
    }
}
