//! Where template text comes from

use crate::error::RenderError;
use docgen_model::DocumentType;
use std::path::PathBuf;

/// Name of the shared partial rendered when a document is degraded
pub const FALLBACK_NOTICE_PARTIAL: &str = "fallback_notice";

const LETTER_OF_DEMAND: &str = include_str!("../templates/letter_of_demand.hbs");
const CONSUMER_COMPLAINT: &str = include_str!("../templates/consumer_complaint.hbs");
const VCAT_APPLICATION: &str = include_str!("../templates/vcat_application.hbs");
const INSURANCE_CLAIM: &str = include_str!("../templates/insurance_claim.hbs");
const FALLBACK_NOTICE: &str = include_str!("../templates/fallback_notice.hbs");

/// Template location
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    /// Templates bundled into the binary
    #[default]
    Embedded,
    /// `<dir>/<document_type>.hbs`, with an optional
    /// `<dir>/fallback_notice.hbs` overriding the bundled notice
    Directory(PathBuf),
}

impl TemplateSource {
    /// Load the template text for a document type
    ///
    /// # Errors
    /// `TemplateNotFound` if a directory has no file for the type, `Io` on
    /// any other read failure.
    pub fn load(&self, document_type: DocumentType) -> Result<String, RenderError> {
        match self {
            TemplateSource::Embedded => Ok(embedded(document_type).to_string()),
            TemplateSource::Directory(dir) => {
                let path = dir.join(format!("{}.hbs", document_type.as_str()));
                match std::fs::read_to_string(&path) {
                    Ok(text) => Ok(text),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Err(RenderError::TemplateNotFound(document_type))
                    }
                    Err(e) => Err(RenderError::io_error(path, e)),
                }
            }
        }
    }

    /// Load the fallback notice partial
    ///
    /// # Errors
    /// `Io` if an override file exists but cannot be read.
    pub fn load_fallback_notice(&self) -> Result<String, RenderError> {
        match self {
            TemplateSource::Embedded => Ok(FALLBACK_NOTICE.to_string()),
            TemplateSource::Directory(dir) => {
                let path = dir.join(format!("{FALLBACK_NOTICE_PARTIAL}.hbs"));
                match std::fs::read_to_string(&path) {
                    Ok(text) => Ok(text),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Ok(FALLBACK_NOTICE.to_string())
                    }
                    Err(e) => Err(RenderError::io_error(path, e)),
                }
            }
        }
    }
}

fn embedded(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::LetterOfDemand => LETTER_OF_DEMAND,
        DocumentType::ConsumerComplaint => CONSUMER_COMPLAINT,
        DocumentType::VcatApplication => VCAT_APPLICATION,
        DocumentType::InsuranceClaim => INSURANCE_CLAIM,
    }
}
