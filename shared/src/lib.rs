//! Shared types and models for the café inventory
//!
//! This crate contains the domain models, validation rules and the
//! reconciliation engine shared between the backend and the browser (via WASM).

pub mod models;
pub mod reconciliation;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
