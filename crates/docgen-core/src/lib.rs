//! Docgen Core - the document generation pipeline
//!
//! Wires the model, AI and render crates into one request flow:
//!
//! ```text
//! RawInput
//!   → BaseDataBuilder            (defaults, derived fields)
//!   → Orchestrator               (all planned sections, concurrently)
//!   → TemplateRenderer           (cached per document type)
//!   → GenerationResult
//!
//! any primary failure
//!   → FallbackComposer           (placeholders, no service calls)
//!   → TemplateRenderer
//!   → GenerationResult { is_fallback: true, warning }
//! ```
//!
//! [`DocumentService`] adds persistence of the rendered document and its
//! input snapshot, and regeneration from that snapshot.
//!
//! # Example
//!
//! ```rust,ignore
//! use docgen_core::{DocgenConfig, DocumentGenerator};
//! use docgen_ai::OpenAiClient;
//! use std::sync::Arc;
//!
//! let config = DocgenConfig::default();
//! let client =
//!     OpenAiClient::new(docgen_ai::DEFAULT_ENDPOINT, Some(key), config.request_timeout())?;
//! let generator = DocumentGenerator::from_config(&config, Arc::new(client));
//! let result = generator.generate(&raw).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod facade;
pub mod fallback;
pub mod orchestrator;
pub mod service;
pub mod stage;
pub mod storage;

pub use config::{DocgenConfig, GenerationConfig, TemplatesConfig};
pub use error::{
    ConfigError, DocgenError, OrchestrationError, PipelineError, StageError, StorageError,
};
pub use facade::{new_generation_id, DocumentGenerator, GenerationResult, FALLBACK_SUFFIX};
pub use fallback::{placeholder, FallbackComposer};
pub use orchestrator::Orchestrator;
pub use service::{document_key, snapshot_key, DocumentService, DOCUMENT_SUFFIX, SNAPSHOT_SUFFIX};
pub use stage::{allowed_transitions, validate_transition, GenerationStage, StageTracker};
pub use storage::{
    DocumentStore, FsStore, MemoryStore, ObjectMeta, PutOptions, DEFAULT_CONTENT_TYPE,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
