//! HTTP handlers

mod health;
mod inventory;
mod quotation;
mod sale;

pub use health::*;
pub use inventory::*;
pub use quotation::*;
pub use sale::*;
