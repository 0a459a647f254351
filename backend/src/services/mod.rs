//! Business logic services for the commerce back office

pub mod documents;
pub mod export;
pub mod inventory;
pub mod line_items;
pub mod quotation;
pub mod sale;

pub use inventory::InventoryService;
pub use quotation::QuotationService;
pub use sale::SaleService;
