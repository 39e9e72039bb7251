//! Error types for the document data model
//!
//! Covers the two ways model-level input can be rejected:
//! - Raw form input that cannot be parsed or names no supported document type
//! - Generated section output that does not match the expected shape

use crate::section::SectionKey;

/// Model-level error
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Document type is not one of the supported set
    #[error("unsupported document type: '{0}'")]
    UnsupportedDocumentType(String),

    /// Raw input carries no document type at all
    #[error("missing document type")]
    MissingDocumentType,

    /// Raw input is not valid JSON or has the wrong shape
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Generated section JSON is missing keys or has empty fields
    #[error("invalid {section} output: {reason}")]
    InvalidSectionOutput {
        /// Section being parsed
        section: SectionKey,
        /// What was wrong with it
        reason: String,
    },
}

impl ModelError {
    /// Create a section output error
    pub fn invalid_section(section: SectionKey, reason: impl Into<String>) -> Self {
        Self::InvalidSectionOutput {
            section,
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the caller's input
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedDocumentType(_) | Self::MissingDocumentType | Self::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_display() {
        let err = ModelError::UnsupportedDocumentType("will".to_string());
        assert_eq!(err.to_string(), "unsupported document type: 'will'");
        assert!(err.is_input_error());
    }

    #[test]
    fn section_error_is_not_input_error() {
        let err = ModelError::invalid_section(SectionKey::LegalBasis, "missing summaryText");
        assert!(err.to_string().contains("legalBasis"));
        assert!(!err.is_input_error());
    }
}
