//! Proof-of-presence session models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Context a proof session was issued for. Sessions never cross purposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProofPurpose {
    Attendance,
    Task,
}

impl ProofPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofPurpose::Attendance => "ATTENDANCE",
            ProofPurpose::Task => "TASK",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProofSession {
    pub session_id: String,
    pub purpose: ProofPurpose,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Informational only; never consulted for gating.
    pub match_score: Option<f64>,
}

impl ProofSession {
    /// Valid iff the purpose matches and `now` is strictly before expiry.
    pub fn is_valid_for(&self, purpose: ProofPurpose, now: DateTime<Utc>) -> bool {
        self.purpose == purpose && now < self.expires_at
    }
}
