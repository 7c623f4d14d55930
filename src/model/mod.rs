//! Outcome classifier
//!
//! The burn network and the persisted model that wraps it.

pub mod mlp;
pub mod quiniela;

pub use mlp::{OutcomeNet, OutcomeNetConfig};
pub use quiniela::QuinielaModel;
