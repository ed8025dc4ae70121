use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::credentials::CredentialStore;

use super::{
    ApiError, ApiResponse, ApiResult, AttendancePayload, AttendanceRequest, CompleteTaskRequest,
    CreateTaskRequest, FaceSessionPayload, FaceVerificationRequest, FieldApi, LoginPayload,
    LoginRequest, TaskMediaRequest, TaskPayload, TrackingPingRequest,
};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// reqwest-backed client for the field backend.
///
/// Adds the bearer token and company code from the credential store to every
/// call, plus a fresh `X-Request-Id`.
#[derive(Clone)]
pub struct HttpFieldApi {
    base_url: String,
    base: Url,
    client: Client,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpFieldApi {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("invalid backend URL {base_url}"))?;
        if base.cannot_be_a_base() {
            bail!("backend URL {base_url} cannot carry a path");
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            base,
            client,
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/api/v1/tasks/{task_id}/{action}` with the id escaped as one segment.
    fn task_url(&self, task_id: &str, action: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "v1", "tasks", task_id, action]);
        }
        url
    }

    fn decorate(&self, builder: RequestBuilder) -> RequestBuilder {
        let mut builder = builder.header("X-Request-Id", Uuid::new_v4().to_string());
        if let Some(credential) = self.credentials.credential() {
            builder = builder.bearer_auth(credential.access_token);
        }
        if let Some(code) = self.credentials.company_code() {
            builder = builder.header("X-Company-Code", code);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = self
            .decorate(builder)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport)?;

        if !status.is_success() {
            log_debug!("backend answered {status}: {body}");
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: extract_message(&body),
            });
        }

        if body.trim().is_empty() && status == StatusCode::NO_CONTENT {
            return Ok(ApiResponse {
                success: true,
                message: None,
                data: None,
            });
        }

        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl FieldApi for HttpFieldApi {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginPayload> {
        self.send(self.client.post(self.url("/api/v1/auth/login")).json(request))
            .await
    }

    async fn verify_face(&self, request: &FaceVerificationRequest) -> ApiResult<FaceSessionPayload> {
        self.send(self.client.post(self.url("/api/v1/face/verify")).json(request))
            .await
    }

    async fn check_in(&self, request: &AttendanceRequest) -> ApiResult<AttendancePayload> {
        self.send(
            self.client
                .post(self.url("/api/v1/attendance/check-in"))
                .json(request),
        )
        .await
    }

    async fn check_out(&self, request: &AttendanceRequest) -> ApiResult<AttendancePayload> {
        self.send(
            self.client
                .post(self.url("/api/v1/attendance/check-out"))
                .json(request),
        )
        .await
    }

    async fn attendance_status(&self) -> ApiResult<AttendancePayload> {
        self.send(self.client.get(self.url("/api/v1/attendance/status")))
            .await
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> ApiResult<TaskPayload> {
        self.send(self.client.post(self.url("/api/v1/tasks")).json(request))
            .await
    }

    async fn upload_task_media(&self, request: &TaskMediaRequest) -> ApiResult<TaskPayload> {
        let url = self.task_url(&request.task_id, "media");
        self.send(self.client.post(url).json(request)).await
    }

    async fn complete_task(&self, request: &CompleteTaskRequest) -> ApiResult<TaskPayload> {
        let url = self.task_url(&request.task_id, "complete");
        self.send(self.client.post(url).json(request)).await
    }

    async fn submit_tracking_ping(
        &self,
        request: &TrackingPingRequest,
    ) -> ApiResult<serde_json::Value> {
        self.send(self.client.post(self.url("/api/v1/tracking/pings")).json(request))
            .await
    }
}

fn classify_transport(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Connectivity(err.to_string())
    }
}

/// Pull a human message out of an error body: `message`, then `error`, then
/// a short plain-text body.
fn extract_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        return ["message", "error"]
            .iter()
            .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty());
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<') {
        Some(trimmed.to_string())
    } else {
        None
    }
}
