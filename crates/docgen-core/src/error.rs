//! Error types for the generation pipeline
//!
//! Layers, innermost first:
//! - [`OrchestrationError`]: one or more sections failed; fatal to the
//!   primary path, always triggers fallback
//! - [`PipelineError`]: anything that stops either path
//! - [`DocgenError`]: what crosses the facade and service boundary

use crate::stage::GenerationStage;
use docgen_ai::SectionError;
use docgen_model::{DocumentType, ModelError, SectionKey};
use docgen_render::RenderError;
use std::path::PathBuf;

/// Aggregated failure of a section fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationError {
    pub document_type: DocumentType,
    /// Every section that failed, in plan order
    pub failures: Vec<SectionError>,
    /// Sections that completed and were discarded
    pub completed: Vec<SectionKey>,
}

impl OrchestrationError {
    /// Keys of the failed sections
    #[must_use]
    pub fn failed_sections(&self) -> Vec<SectionKey> {
        self.failures.iter().map(|f| f.section).collect()
    }
}

impl std::fmt::Display for OrchestrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} of {} section(s) failed: ",
            self.document_type,
            self.failures.len(),
            self.failures.len() + self.completed.len()
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for OrchestrationError {}

/// Illegal request stage transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error("illegal stage transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: GenerationStage,
        to: GenerationStage,
    },

    #[error("stage {0:?} already visited")]
    Revisit(GenerationStage),
}

/// Failure on either generation path
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Stage(#[from] StageError),
}

/// Object storage failure
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage key: '{0}'")]
    InvalidKey(String),

    #[error("io error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt metadata for key '{key}': {message}")]
    Metadata { key: String, message: String },
}

impl StorageError {
    /// Create IO error for key
    pub fn io_error(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }
}

/// Configuration failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid value for {field}: {message}")]
    Validation { field: String, message: String },
}

/// Error surfaced to callers of the facade and document service
#[derive(Debug, thiserror::Error)]
pub enum DocgenError {
    /// Missing or unsupported document type, or unparsable input
    #[error(transparent)]
    Input(#[from] ModelError),

    /// Both the primary and the fallback path failed
    #[error("document generation failed: {original}; fallback also failed: {fallback}")]
    Unrecoverable { original: String, fallback: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("no input snapshot stored for '{0}'")]
    SnapshotMissing(String),

    #[error("input snapshot for '{filename}' is unreadable: {message}")]
    InvalidSnapshot { filename: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DocgenError {
    /// Whether the caller is at fault
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Input(e) => e.is_input_error(),
            Self::SnapshotMissing(_) => true,
            _ => false,
        }
    }
}
