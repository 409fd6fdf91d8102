//! Quote Synthesizer
//!
//! Deterministic synthetic quotes: a per-symbol baseline plus a sinusoidal
//! drift seeded by the symbol's character codes. Same `(symbol, tick)` in,
//! same quote out.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::instrument::{InstrumentSymbol, UnsupportedSymbol};

/// Maximum drift amplitude, in price points.
const DRIFT_AMPLITUDE: f64 = 0.6;

/// Milliseconds per radian of drift phase.
const DRIFT_PERIOD_MS: f64 = 180.0;

// =============================================================================
// Types
// =============================================================================

/// One market data point for an instrument at a moment in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Instrument.
    pub symbol: InstrumentSymbol,
    /// Last traded price.
    pub last: f64,
    /// Absolute change from the baseline.
    pub change: f64,
    /// Percentage change from the baseline.
    pub change_pct: f64,
    /// Session high.
    pub high: f64,
    /// Session low.
    pub low: f64,
    /// Contracts traded.
    pub volume: u64,
    /// Quote time.
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

/// Current quotes for a requested symbol set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Quotes keyed by instrument.
    pub quotes: BTreeMap<InstrumentSymbol, Quote>,
}

impl Snapshot {
    /// Number of quotes in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Whether the snapshot holds no quotes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

// =============================================================================
// Synthesis
// =============================================================================

/// Synthesize a quote for a known instrument at `tick`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn synthesize(symbol: InstrumentSymbol, tick: DateTime<Utc>) -> Quote {
    let baseline = symbol.baseline();
    let drift = seeded_drift(symbol, tick.timestamp_millis());
    let magnitude = drift.abs();

    Quote {
        symbol,
        last: baseline + drift,
        change: drift,
        change_pct: drift / baseline * 100.0,
        high: magnitude.mul_add(1.2, baseline),
        low: magnitude.mul_add(-1.1, baseline),
        volume: (10_000.0 + (magnitude * 8_000.0) % 9_000.0).floor() as u64,
        timestamp: tick,
    }
}

/// Synthesize a quote for an instrument code.
///
/// # Errors
///
/// Returns `UnsupportedSymbol` if `code` is not a known instrument.
pub fn quote(code: &str, tick: DateTime<Utc>) -> Result<Quote, UnsupportedSymbol> {
    Ok(synthesize(code.parse()?, tick))
}

/// Synthesize one snapshot for `symbols`, all stamped with the same tick.
#[must_use]
pub fn synthesize_snapshot(symbols: &[InstrumentSymbol], tick: DateTime<Utc>) -> Snapshot {
    Snapshot {
        quotes: symbols
            .iter()
            .map(|&symbol| (symbol, synthesize(symbol, tick)))
            .collect(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn seeded_drift(symbol: InstrumentSymbol, tick_ms: i64) -> f64 {
    let phase = tick_ms as f64 / DRIFT_PERIOD_MS + f64::from(symbol.char_code_sum());
    phase.sin() * DRIFT_AMPLITUDE
}

// =============================================================================
// Timestamp Format
// =============================================================================

/// RFC 3339 UTC with millisecond precision and a `Z` suffix.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Deserialize any RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Fails on strings that are not RFC 3339.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
