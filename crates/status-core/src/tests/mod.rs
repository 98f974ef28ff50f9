//! Test module for determinism and integration tests.
//!
//! - `determinism.rs`: same seed and inputs give the same event stream
//! - `integration.rs`: end-to-end behaviour of the simulation against an [`Arena`](crate::arena::Arena)
//! - `helpers.rs`: setup utilities shared by both

mod determinism;
mod helpers;

pub use helpers::*;
