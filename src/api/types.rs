//! Wire types for the field backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CameraFacing, DeviceDescriptor, GpsReading, ProofPurpose, TrackingSample};

/// Envelope every endpoint answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Absent flag on a 2xx body counts as success; the payload check
    /// downstream still fails closed.
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

impl From<&GpsReading> for GeoPoint {
    fn from(reading: &GpsReading) -> Self {
        Self {
            latitude: reading.latitude,
            longitude: reading.longitude,
            accuracy_meters: reading.accuracy_meters,
            captured_at: reading.captured_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub company_code: String,
    pub username: String,
    pub password: String,
    pub device: DeviceDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub employee_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceVerificationRequest {
    pub purpose: ProofPurpose,
    /// JPEG bytes, base64 encoded.
    pub photo: String,
    pub location: Option<GeoPoint>,
    pub device: DeviceDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceSessionPayload {
    pub session_id: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub match_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    pub face_session_id: String,
    pub location: GeoPoint,
    pub device: DeviceDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub check_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_out_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub face_session_id: String,
    pub title: String,
    pub task_type: String,
    pub location: GeoPoint,
    pub device: DeviceDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMediaRequest {
    #[serde(skip)]
    pub task_id: String,
    pub face_session_id: String,
    pub facing: CameraFacing,
    pub file_name: String,
    pub content_type: String,
    /// Photo bytes, base64 encoded.
    pub data: String,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskRequest {
    #[serde(skip)]
    pub task_id: String,
    pub face_session_id: String,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub media_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingPingRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub battery_level: Option<i32>,
    pub is_charging: Option<bool>,
    pub captured_at: DateTime<Utc>,
    pub device: DeviceDescriptor,
}

impl TrackingPingRequest {
    pub fn new(sample: &TrackingSample, device: DeviceDescriptor) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            accuracy_meters: sample.accuracy_meters,
            battery_level: sample.battery_level,
            is_charging: sample.is_charging,
            captured_at: sample.captured_at,
            device,
        }
    }
}
