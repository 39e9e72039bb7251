//! Error types for template rendering

use docgen_model::DocumentType;
use std::path::PathBuf;

/// Rendering error
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// No template exists for the document type
    #[error("no template for document type '{0}'")]
    TemplateNotFound(DocumentType),

    /// Template text failed to compile
    #[error("template '{document_type}' failed to compile: {message}")]
    TemplateCompile {
        document_type: DocumentType,
        message: String,
    },

    /// Rendering the compiled template failed
    #[error("rendering '{document_type}' failed: {message}")]
    Render {
        document_type: DocumentType,
        message: String,
    },

    /// Template file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
