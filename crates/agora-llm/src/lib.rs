//! Completion gateway for Agora.
//!
//! Callers describe a completion with a [`CompletionRequest`] (a model tier
//! or explicit model id, output bound, temperature, optional system prompt)
//! and hand it to anything implementing [`Completion`]. The production
//! implementation is [`Gateway`], which resolves tiers through a
//! [`ModelTable`], retries failed upper-tier calls once at
//! [`ModelTier::Cheap`], and speaks the OpenAI-compatible chat protocol via
//! [`OpenRouterTransport`].

#![allow(async_fn_in_trait)]

mod completion;
mod config;
mod gateway;
mod openrouter;
mod request;
mod tier;

pub mod error;

pub use completion::{Completed, Completion, JSON_INSTRUCTION, parse_json, strip_code_fences};
pub use config::LlmConfig;
pub use error::{Error, Result};
pub use gateway::{ChatCall, ChatTransport, Gateway};
pub use openrouter::OpenRouterTransport;
pub use request::{CompletionRequest, ModelChoice};
pub use tier::{ModelTable, ModelTier};
