//! Seam between the workflow core and the field backend.

pub mod http;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpFieldApi;
pub use types::*;

/// Transport-level failure. Never leaves the gateway unclassified.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no message"))]
    Http { status: u16, message: Option<String> },
    #[error("connectivity failure: {0}")]
    Connectivity(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

pub type ApiResult<T> = std::result::Result<ApiResponse<T>, ApiError>;

#[async_trait]
pub trait FieldApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginPayload>;
    async fn verify_face(&self, request: &FaceVerificationRequest) -> ApiResult<FaceSessionPayload>;
    async fn check_in(&self, request: &AttendanceRequest) -> ApiResult<AttendancePayload>;
    async fn check_out(&self, request: &AttendanceRequest) -> ApiResult<AttendancePayload>;
    async fn attendance_status(&self) -> ApiResult<AttendancePayload>;
    async fn create_task(&self, request: &CreateTaskRequest) -> ApiResult<TaskPayload>;
    async fn upload_task_media(&self, request: &TaskMediaRequest) -> ApiResult<TaskPayload>;
    async fn complete_task(&self, request: &CompleteTaskRequest) -> ApiResult<TaskPayload>;
    async fn submit_tracking_ping(
        &self,
        request: &TrackingPingRequest,
    ) -> ApiResult<serde_json::Value>;
}
