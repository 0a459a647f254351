//! Domain models for the commerce back office

mod document;
mod inventory;
mod order;
mod sales;
mod status;

pub use document::*;
pub use inventory::*;
pub use order::*;
pub use sales::*;
pub use status::*;
