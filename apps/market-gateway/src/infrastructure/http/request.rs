//! HTTP request DTOs.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::session::SessionPatch;

/// User assumed when a request names none.
pub const DEFAULT_USER_ID: &str = "demo-user";

/// Request for a snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotRequest {
    /// Instrument codes. Omitted means all instruments.
    #[serde(default)]
    pub symbols: Option<Vec<String>>,
}

/// Request to create or update a session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRequest {
    /// Session owner.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Fields to merge into the session.
    #[serde(default)]
    pub profile: Option<SessionPatch>,
}

impl ContextRequest {
    /// Owner, defaulted.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(DEFAULT_USER_ID)
    }
}

/// Request to record a decision.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    /// Session owner.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Arbitrary decision payload.
    #[serde(default)]
    pub decision: Option<Map<String, Value>>,
}

impl DecisionRequest {
    /// Owner, defaulted.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(DEFAULT_USER_ID)
    }
}
