//! Field task projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attendance::normalize_status;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Map a free-text server status. Unrecognised text falls back to
    /// `Pending`, never to a terminal state.
    pub fn from_server(raw: &str) -> Self {
        match normalize_status(raw).as_str() {
            "IN_PROGRESS" | "INPROGRESS" | "STARTED" | "ONGOING" | "RUNNING" | "ACTIVE" => {
                TaskStatus::InProgress
            }
            "COMPLETED" | "COMPLETE" | "FINISHED" | "DONE" => TaskStatus::Completed,
            "FAILED" | "FAILURE" | "REJECTED" | "CANCELLED" | "CANCELED" => TaskStatus::Failed,
            _ => TaskStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Visit,
    Delivery,
    Inspection,
    Maintenance,
    Other(String),
}

impl TaskType {
    pub fn from_server(raw: &str) -> Self {
        match normalize_status(raw).as_str() {
            "VISIT" | "CUSTOMER_VISIT" => TaskType::Visit,
            "DELIVERY" | "DROP_OFF" => TaskType::Delivery,
            "INSPECTION" | "AUDIT" => TaskType::Inspection,
            "MAINTENANCE" | "REPAIR" | "SERVICE" => TaskType::Maintenance,
            _ => TaskType::Other(raw.trim().to_string()),
        }
    }

    /// Wire value sent on task creation.
    pub fn as_wire(&self) -> String {
        match self {
            TaskType::Visit => "VISIT".into(),
            TaskType::Delivery => "DELIVERY".into(),
            TaskType::Inspection => "INSPECTION".into(),
            TaskType::Maintenance => "MAINTENANCE".into(),
            TaskType::Other(value) => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub media_count: u32,
}
