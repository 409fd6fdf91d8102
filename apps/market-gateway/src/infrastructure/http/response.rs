//! HTTP response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::instrument::InstrumentSymbol;

/// Supported instruments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolsResponse {
    /// Codes in canonical order.
    pub symbols: Vec<InstrumentSymbol>,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status reason phrase.
    pub error: String,
    /// What went wrong.
    pub detail: String,
}
