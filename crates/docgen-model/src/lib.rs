//! Docgen Model - dispute document data
//!
//! Everything the pipeline knows about one document request:
//! - Raw form input with loosely typed fields
//! - Canonical document data with every field defaulted
//! - Section plans per document type
//! - Generated section shapes and keyed merge
//!
//! # Example
//!
//! ```rust,ignore
//! use docgen_model::{BaseDataBuilder, DocumentType, RawInput};
//!
//! let raw = RawInput::for_document(DocumentType::LetterOfDemand);
//! let data = BaseDataBuilder::default().build(&raw, DocumentType::LetterOfDemand, "1a2b3c4d");
//! assert_eq!(data.sender_info.name, "Name Missing");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod builder;
pub mod error;
pub mod raw;
pub mod section;
pub mod types;

pub use builder::{
    coerce_amount, coerce_bool, coerce_days, parse_vehicle_details, tribunal_for_state,
    BaseDataBuilder, DEFAULT_RESPONSE_DAYS, MAX_RESPONSE_DAYS, MIN_RESPONSE_DAYS,
    RECIPIENT_NAME_PLACEHOLDER, SENDER_NAME_PLACEHOLDER,
};
pub use error::ModelError;
pub use raw::{
    RawEscalationDetails, RawInput, RawInsuranceDetails, RawRemedyDetails, RawTimelineEvent,
};
pub use section::{
    EscalationText, GeneratedSection, IncidentNarrative, InsuranceAdvice, LegalBasis,
    RemedyStatement, SectionKey, TribunalAdvice,
};
pub use types::{
    DemandType, DocumentData, DocumentType, EscalationDetails, IncidentDetails, InsuranceDetails,
    Metadata, RecipientInfo, RemedyDetails, SenderInfo, TimelineEvent, VehicleDetails,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
