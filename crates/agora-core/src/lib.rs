//! Core types and trait definitions for Agora, the persona-driven forum.
//!
//! This crate is deliberately free of HTTP, LLM and database dependencies.
//! Every other crate depends on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod debate;
pub mod error;
pub mod forum;
pub mod persona;
pub mod rating;
pub mod slug;
pub mod store;
pub mod topic;
pub mod vote;

pub use error::{Error, Result};
