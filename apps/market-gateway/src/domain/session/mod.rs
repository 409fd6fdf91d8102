//! Session Store
//!
//! Per-user trading context kept in memory for the lifetime of the process.
//!
//! # Merge Semantics
//!
//! `upsert` is last-write-wins per top-level field. `riskProfile` is the one
//! nested value and it merges per field, so a patch carrying only
//! `dailyGoal` keeps the stored `maxDraw`. `userId`, `lastUpdated` and
//! `lastDecisions` are server-owned and ignored when present in a patch;
//! history only grows through `append_decision`.
//!
//! # Concurrency
//!
//! Each upsert/append runs its read-merge-write under a single write lock,
//! so concurrent requests for the same user never interleave.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::clock::{Clock, SystemClock};
use super::quote::iso_millis;

/// Maximum number of decisions retained per session.
pub const MAX_DECISIONS: usize = 21;

/// Default maximum drawdown for a new session.
pub const DEFAULT_MAX_DRAW: f64 = 1500.0;

/// Default daily profit goal for a new session.
pub const DEFAULT_DAILY_GOAL: f64 = 800.0;

/// Keys a patch may not overwrite.
const RESERVED_KEYS: [&str; 4] = ["userId", "riskProfile", "lastDecisions", "lastUpdated"];

// =============================================================================
// Types
// =============================================================================

/// Risk limits for a trader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    /// Maximum tolerated drawdown.
    pub max_draw: f64,
    /// Daily profit goal.
    pub daily_goal: f64,
}

impl Default for RiskProfile {
    fn default() -> Self {
        Self {
            max_draw: DEFAULT_MAX_DRAW,
            daily_goal: DEFAULT_DAILY_GOAL,
        }
    }
}

/// Partial risk profile update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfilePatch {
    /// New maximum drawdown.
    pub max_draw: Option<f64>,
    /// New daily goal.
    pub daily_goal: Option<f64>,
}

impl RiskProfile {
    fn apply(&mut self, patch: RiskProfilePatch) {
        if let Some(max_draw) = patch.max_draw {
            self.max_draw = max_draw;
        }
        if let Some(daily_goal) = patch.daily_goal {
            self.daily_goal = daily_goal;
        }
    }
}

/// A trading decision logged by the user, stamped by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Caller-supplied fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Server receive time.
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

/// Per-user trading context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Owner of the session.
    pub user_id: String,
    /// Risk limits.
    pub risk_profile: RiskProfile,
    /// Most recent decisions, oldest first.
    pub last_decisions: Vec<Decision>,
    /// Time of the last upsert.
    #[serde(with = "iso_millis")]
    pub last_updated: DateTime<Utc>,
    /// Any other fields supplied through upserts.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    fn seeded(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            risk_profile: RiskProfile::default(),
            last_decisions: Vec::new(),
            last_updated: now,
            extra: Map::new(),
        }
    }
}

/// Fields to merge into a session.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    /// Risk limit changes.
    pub risk_profile: Option<RiskProfilePatch>,
    /// Everything else, merged shallowly.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Session store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A decision was appended before any upsert for the user.
    #[error("Session not found: {0}")]
    NotFound(String),
}

// =============================================================================
// Store
// =============================================================================

/// In-memory table of sessions keyed by user id.
///
/// # Example
///
/// ```rust
/// use market_gateway::domain::session::{SessionPatch, SessionStore};
///
/// let store = SessionStore::new();
/// let session = store.upsert("u1", SessionPatch::default());
/// assert_eq!(session.risk_profile.max_draw, 1500.0);
/// assert!(store.get("u1").is_some());
/// ```
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    clock: Arc<dyn Clock>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create an empty store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store on the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Merge `patch` into the user's session, creating it if needed.
    pub fn upsert(&self, user_id: &str, patch: SessionPatch) -> Session {
        let now = self.clock.now();
        let mut sessions = self.sessions.write();
        let session = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Session::seeded(user_id, now));

        if let Some(risk) = patch.risk_profile {
            session.risk_profile.apply(risk);
        }
        for (key, value) in patch.extra {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                session.extra.insert(key, value);
            }
        }
        session.last_updated = now;

        session.clone()
    }

    /// Append a decision to an existing session.
    ///
    /// Keeps the most recent [`MAX_DECISIONS`] entries.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` if the user has no session yet.
    pub fn append_decision(
        &self,
        user_id: &str,
        mut fields: Map<String, Value>,
    ) -> Result<Session, SessionError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(user_id)
            .ok_or_else(|| SessionError::NotFound(user_id.to_string()))?;

        fields.remove("timestamp");
        let excess = (session.last_decisions.len() + 1).saturating_sub(MAX_DECISIONS);
        session.last_decisions.drain(..excess);
        session.last_decisions.push(Decision {
            fields,
            timestamp: now,
        });

        Ok(session.clone())
    }

    /// Look up a session.
    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.read().get(user_id).cloned()
    }

    /// Number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
