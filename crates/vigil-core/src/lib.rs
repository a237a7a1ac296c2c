//! Core types and trait definitions for the Vigil equipment-check engine.
//!
//! This crate is deliberately free of runtime and database dependencies.
//! Every other crate depends on it: the store backends implement
//! [`tree::DocumentTree`], the engine consumes the collaborator traits in
//! [`directory`] and the pure notification policy in [`selector`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod directory;
pub mod error;
pub mod history;
pub mod path;
pub mod record;
pub mod selector;
pub mod tree;

pub use error::{Error, Result};
