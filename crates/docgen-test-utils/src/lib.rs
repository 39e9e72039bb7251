//! Testing utilities for the docgen workspace
//!
//! Scripted text generators and form fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use dashmap::DashMap;
use docgen_ai::{GenerationError, GenerationRequest, TextGenerator};
use docgen_model::{DocumentType, RawInput, SectionKey};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Section a request asks for, read from the JSON shape in its prompt
pub fn requested_section(request: &GenerationRequest) -> Option<SectionKey> {
    let prompt = request.messages.last()?.content.as_str();
    SectionKey::ALL
        .into_iter()
        .find(|key| prompt.contains(&format!("{{\"{}\":", key.as_str())))
}

/// Valid answer for a section, each field reading `"<key> <field>"`
pub fn canned_answer(key: SectionKey) -> String {
    let body: Map<String, Value> = key
        .fields()
        .iter()
        .map(|field| ((*field).to_string(), Value::from(format!("{key} {field}"))))
        .collect();
    json!({ key.as_str(): body }).to_string()
}

/// Generator answering per section from a script
///
/// Sections without a script get [`canned_answer`]. Scripted replies are
/// consumed in order; the last one repeats.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    scripts: DashMap<SectionKey, Mutex<VecDeque<Result<String, GenerationError>>>>,
    calls: DashMap<SectionKey, usize>,
    total: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies for one section
    pub fn with_replies(
        self,
        key: SectionKey,
        replies: impl IntoIterator<Item = Result<String, GenerationError>>,
    ) -> Self {
        self.scripts
            .insert(key, Mutex::new(replies.into_iter().collect()));
        self
    }

    /// Make one section fail on every attempt
    pub fn failing(self, key: SectionKey, error: GenerationError) -> Self {
        self.with_replies(key, [Err(error)])
    }

    /// Answer every section with the same text in each field
    pub fn with_text(self, document_type: DocumentType, text: &str) -> Self {
        let mut generator = self;
        for &key in document_type.section_plan() {
            let body: Map<String, Value> = key
                .fields()
                .iter()
                .map(|field| ((*field).to_string(), Value::from(text)))
                .collect();
            generator =
                generator.with_replies(key, [Ok(json!({ key.as_str(): body }).to_string())]);
        }
        generator
    }

    /// Calls made for one section
    pub fn calls_for(&self, key: SectionKey) -> usize {
        self.calls.get(&key).map_or(0, |count| *count)
    }

    /// Calls made in total
    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    fn next_reply(&self, key: SectionKey) -> Result<String, GenerationError> {
        let Some(script) = self.scripts.get(&key) else {
            return Ok(canned_answer(key));
        };
        let mut queue = script.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap_or_else(|| Ok(canned_answer(key)))
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        let key = requested_section(request)
            .ok_or_else(|| GenerationError::InvalidOutput("unrecognised prompt".into()))?;
        *self.calls.entry(key).or_insert(0) += 1;
        self.next_reply(key)
    }
}

/// Generator that fails every call with the same error
#[derive(Debug)]
pub struct FailingGenerator {
    error: GenerationError,
    calls: AtomicUsize,
}

impl FailingGenerator {
    pub fn new(error: GenerationError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails with HTTP 401
    pub fn unauthorized() -> Self {
        Self::new(GenerationError::from_status(401, "invalid api key"))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// Letter of demand form submission for Jane Doe against Acme Motors
pub fn jane_doe_json() -> Value {
    json!({
        "document_type": "letter_of_demand",
        "customer_name": "Jane Doe",
        "mechanic_name": "Acme Motors",
        "damage_description": "scratched bumper",
        "vehicle_details": "2020 Mazda 3, Rego: XYZ999",
        "service_date": "2024-01-10",
        "remedyDetails": { "demandType": "fullRepairCost", "demandAmount": "800" },
        "escalationDetails": { "responseDeadlineDays": "14", "escalationBody": "VCAT" }
    })
}

pub fn jane_doe_input() -> RawInput {
    RawInput::from_value(jane_doe_json()).unwrap()
}

/// Same submission for another document type
pub fn jane_doe_input_for(document_type: DocumentType) -> RawInput {
    let mut raw = jane_doe_input();
    raw.document_type = Some(document_type.as_str().to_string());
    raw
}
