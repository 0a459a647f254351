//! Shared types and domain rules for the commerce back office
//!
//! This crate contains the pure ledger, pricing and lifecycle logic used by
//! the backend server and by the browser helpers compiled to WASM.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
