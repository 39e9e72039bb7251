//! Docgen Render - document text from document data
//!
//! Provides:
//! - [`TemplateRenderer`]: one compiled template per document type
//! - [`TemplateCache`]: moka-backed cache owned by each renderer
//! - `formatDate` / `formatCurrency` template helpers (en-AU)
//! - Bundled HTML templates, overridable from a directory

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod error;
pub mod helpers;
pub mod renderer;
pub mod source;

pub use cache::{CacheStats, CompiledTemplate, TemplateCache};
pub use error::RenderError;
pub use helpers::{format_currency, format_date, MAX_FORMATTED_AMOUNT};
pub use renderer::TemplateRenderer;
pub use source::TemplateSource;
