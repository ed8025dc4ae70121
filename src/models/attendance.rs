//! Attendance projection of the server's check-in/out records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    #[default]
    Unknown,
    CheckedIn,
    CheckedOut,
}

impl AttendanceStatus {
    /// Map a free-text server status. Anything unrecognised is `Unknown`.
    pub fn from_server(raw: &str) -> Self {
        match normalize_status(raw).as_str() {
            "CHECK_IN" | "CHECKED_IN" | "CHECKIN" | "CHECKEDIN" | "IN" | "PRESENT" | "ON_DUTY" => {
                AttendanceStatus::CheckedIn
            }
            "CHECK_OUT" | "CHECKED_OUT" | "CHECKOUT" | "CHECKEDOUT" | "OUT" | "OFF_DUTY" => {
                AttendanceStatus::CheckedOut
            }
            _ => AttendanceStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Unknown => "UNKNOWN",
            AttendanceStatus::CheckedIn => "CHECKED_IN",
            AttendanceStatus::CheckedOut => "CHECKED_OUT",
        }
    }
}

/// Upper-cases and folds spaces/dashes to underscores so "checked-in",
/// "Checked In" and "CHECKED_IN" compare equal.
pub(crate) fn normalize_status(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Option<String>,
    pub status: AttendanceStatus,
    pub check_in_at: Option<DateTime<Utc>>,
    pub check_out_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}
