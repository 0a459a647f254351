//! Human-readable document numbers
//!
//! Numbers look like `QUO-2024-00042`. The sequence part comes from a
//! monotonic per-tenant counter, so a number is never handed out twice, even
//! after the document that carried it is soft-deleted.

use serde::{Deserialize, Serialize};

/// Minimum width of the zero-padded sequence part
pub const SEQUENCE_WIDTH: usize = 5;

/// Documents that receive generated numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Quotation,
    Sale,
    Payment,
}

impl DocumentKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "QUO",
            DocumentKind::Sale => "SALE",
            DocumentKind::Payment => "PAY",
        }
    }
}

/// Format `{PREFIX}-{YYYY}-{sequence padded to 5 digits}`
pub fn format_document_number(prefix: &str, year: i32, sequence: i64) -> String {
    format!("{}-{}-{:0width$}", prefix, year, sequence, width = SEQUENCE_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_sequence() {
        assert_eq!(format_document_number("QUO", 2024, 1), "QUO-2024-00001");
        assert_eq!(format_document_number("SALE", 2025, 12345), "SALE-2025-12345");
    }

    #[test]
    fn test_format_grows_past_width() {
        assert_eq!(format_document_number("PAY", 2024, 123456), "PAY-2024-123456");
    }

    #[test]
    fn test_prefixes_are_distinct() {
        let prefixes = [
            DocumentKind::Quotation.prefix(),
            DocumentKind::Sale.prefix(),
            DocumentKind::Payment.prefix(),
        ];
        assert_eq!(prefixes.len(), 3);
        assert!(prefixes.iter().all(|p| p.chars().all(|c| c.is_ascii_uppercase())));
        assert_ne!(prefixes[0], prefixes[1]);
        assert_ne!(prefixes[1], prefixes[2]);
    }
}
