//! Docgen AI - section generation against a text-generation service
//!
//! Provides:
//! - The [`TextGenerator`] service interface and an OpenAI-compatible client
//! - One shared [`RetryPolicy`] with exponential backoff and jitter
//! - Prompt construction per section
//! - [`SectionGenerator`], which turns one service call into one validated
//!   [`docgen_model::GeneratedSection`]

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod error;
pub mod openai;
pub mod prompts;
pub mod retry;
pub mod sections;

pub use client::{
    ChatMessage, GenerationRequest, ResponseFormat, Role, TextGenerator, UnavailableGenerator,
};
pub use error::{ErrorClass, GenerationError, SectionError};
pub use openai::{OpenAiClient, DEFAULT_ENDPOINT};
pub use prompts::{build_request, response_shape, PromptSettings};
pub use retry::{Backoff, Exhausted, RetryPolicy};
pub use sections::{parse_section, SectionGenerator};
