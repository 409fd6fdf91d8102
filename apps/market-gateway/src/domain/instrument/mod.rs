//! Instrument Catalogue
//!
//! The fixed set of futures contracts the gateway knows about, with the
//! baseline prices the quote synthesizer drifts around.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Instrument Symbol
// =============================================================================

/// A supported futures instrument code.
///
/// Serialized as the exchange-style code (e.g. `"ES=F"`). Variant order is
/// the canonical listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstrumentSymbol {
    /// E-mini S&P 500.
    #[serde(rename = "ES=F")]
    Es,
    /// E-mini Nasdaq-100.
    #[serde(rename = "NQ=F")]
    Nq,
    /// E-mini Dow.
    #[serde(rename = "YM=F")]
    Ym,
    /// E-mini Russell 2000.
    #[serde(rename = "RTY=F")]
    Rty,
    /// WTI crude oil.
    #[serde(rename = "CL=F")]
    Cl,
    /// Gold.
    #[serde(rename = "GC=F")]
    Gc,
    /// 10-year Treasury note.
    #[serde(rename = "ZN=F")]
    Zn,
}

impl InstrumentSymbol {
    /// All supported instruments in canonical order.
    pub const ALL: [Self; 7] = [
        Self::Es,
        Self::Nq,
        Self::Ym,
        Self::Rty,
        Self::Cl,
        Self::Gc,
        Self::Zn,
    ];

    /// The instrument code, e.g. `"ES=F"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Es => "ES=F",
            Self::Nq => "NQ=F",
            Self::Ym => "YM=F",
            Self::Rty => "RTY=F",
            Self::Cl => "CL=F",
            Self::Gc => "GC=F",
            Self::Zn => "ZN=F",
        }
    }

    /// Reference price the synthesizer drifts around.
    #[must_use]
    pub const fn baseline(self) -> f64 {
        match self {
            Self::Es => 5200.0,
            Self::Nq => 18200.0,
            Self::Ym => 39000.0,
            Self::Rty => 2050.0,
            Self::Cl => 78.0,
            Self::Gc => 2425.0,
            Self::Zn => 111.0,
        }
    }

    /// Sum of the code's character codes. Used as a per-symbol phase seed.
    #[must_use]
    pub fn char_code_sum(self) -> u32 {
        self.as_str().chars().map(u32::from).sum()
    }
}

impl fmt::Display for InstrumentSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstrumentSymbol {
    type Err = UnsupportedSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|symbol| symbol.as_str() == s)
            .ok_or_else(|| UnsupportedSymbol(s.to_string()))
    }
}

/// A symbol outside the supported instrument set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported symbol: {0}")]
pub struct UnsupportedSymbol(pub String);

// =============================================================================
// Filtering
// =============================================================================

/// Keep only known instruments, preserving input order (duplicates kept).
///
/// This is the silent filter applied at the stream boundary.
#[must_use]
pub fn filter_known<S: AsRef<str>>(codes: &[S]) -> Vec<InstrumentSymbol> {
    codes
        .iter()
        .filter_map(|code| code.as_ref().parse().ok())
        .collect()
}

/// Keep only known instruments, dropping duplicates after their first
/// occurrence.
///
/// This is the silent filter applied at the snapshot boundary.
#[must_use]
pub fn filter_unique<S: AsRef<str>>(codes: &[S]) -> Vec<InstrumentSymbol> {
    let mut unique = Vec::with_capacity(InstrumentSymbol::ALL.len());
    for symbol in filter_known(codes) {
        if !unique.contains(&symbol) {
            unique.push(symbol);
        }
    }
    unique
}

// =============================================================================
// Tests
// =============================================================================
