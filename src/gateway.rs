//! Gating and remote execution of sensitive actions.
//!
//! `authorize` is a pure read of the session slot against the clock. The
//! execute methods take the `ProofSession` handed out by `Authorization::Allowed`,
//! so a call without a live session cannot be expressed. Each execute makes
//! exactly one remote call and never retries.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};

use crate::{
    api::{
        ApiResult, AttendancePayload, AttendanceRequest, CompleteTaskRequest, CreateTaskRequest,
        FaceVerificationRequest, FieldApi, GeoPoint, LoginRequest, TaskMediaRequest, TaskPayload,
        TrackingPingRequest,
    },
    clock::Clock,
    credentials::{Credential, CredentialStore},
    device::DeviceInfo,
    error::{WorkflowError, WorkflowResult},
    models::{
        AttendanceRecord, AttendanceStatus, CameraFacing, GpsReading, MediaAttachment,
        ProofPurpose, ProofSession, TaskRecord, TaskStatus, TaskType, TrackingSample,
    },
    session_store::SessionStore,
};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Authorization {
    Allowed(ProofSession),
    NeedsProof,
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Authorization::Allowed(_))
    }
}

#[derive(Clone)]
pub struct ActionGateway {
    api: Arc<dyn FieldApi>,
    sessions: SessionStore,
    clock: Arc<dyn Clock>,
    credentials: Arc<dyn CredentialStore>,
    device: Arc<dyn DeviceInfo>,
    proof_ttl: chrono::Duration,
}

impl ActionGateway {
    pub fn new(
        api: Arc<dyn FieldApi>,
        sessions: SessionStore,
        clock: Arc<dyn Clock>,
        credentials: Arc<dyn CredentialStore>,
        device: Arc<dyn DeviceInfo>,
        proof_ttl: chrono::Duration,
    ) -> Self {
        Self {
            api,
            sessions,
            clock,
            credentials,
            device,
            proof_ttl,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn authorize(&self, purpose: ProofPurpose) -> Authorization {
        self.authorize_at(purpose, self.clock.now())
    }

    pub fn authorize_at(&self, purpose: ProofPurpose, now: DateTime<Utc>) -> Authorization {
        match self.sessions.get() {
            Some(session) if session.is_valid_for(purpose, now) => Authorization::Allowed(session),
            _ => Authorization::NeedsProof,
        }
    }

    /// Run the remote face check and, on success, make the result the live
    /// proof session. A failed check leaves the current slot untouched.
    pub async fn verify_proof(
        &self,
        purpose: ProofPurpose,
        photo: &[u8],
        gps: Option<&GpsReading>,
    ) -> WorkflowResult<ProofSession> {
        const FALLBACK: &str = "Face verification failed";

        if photo.is_empty() {
            return Err(WorkflowError::Validation("Face photo is empty".into()));
        }

        let request = FaceVerificationRequest {
            purpose,
            photo: BASE64.encode(photo),
            location: gps.map(GeoPoint::from),
            device: self.device.descriptor(),
        };

        let issued_at = self.clock.now();
        let payload = settle(self.api.verify_face(&request).await, FALLBACK, |payload, _| {
            payload
        })?;
        let Some(expires_at) = payload
            .expires_at
            .or_else(|| issued_at.checked_add_signed(self.proof_ttl))
        else {
            return Err(WorkflowError::Unexpected(format!(
                "proof lifetime {}s is out of range",
                self.proof_ttl.num_seconds()
            )));
        };
        let session = ProofSession {
            session_id: payload.session_id,
            purpose,
            issued_at,
            expires_at,
            match_score: payload.match_score,
        };

        if session.expires_at <= issued_at {
            log_warn!(
                "face session {} for {} arrived already expired",
                session.session_id,
                purpose.as_str()
            );
        }

        self.sessions.save(session.clone());
        log_info!(
            "proof session {} stored for {} until {}",
            session.session_id,
            purpose.as_str(),
            session.expires_at
        );
        Ok(session)
    }

    pub async fn check_in(
        &self,
        session: &ProofSession,
        gps: &GpsReading,
    ) -> WorkflowResult<AttendanceRecord> {
        let request = self.attendance_request(session, gps);
        let record = settle(
            self.api.check_in(&request).await,
            "Check-in failed",
            attendance_record,
        )?;
        log_info!("check-in accepted, status {}", record.status.as_str());
        Ok(record)
    }

    pub async fn check_out(
        &self,
        session: &ProofSession,
        gps: &GpsReading,
    ) -> WorkflowResult<AttendanceRecord> {
        let request = self.attendance_request(session, gps);
        let record = settle(
            self.api.check_out(&request).await,
            "Check-out failed",
            attendance_record,
        )?;
        log_info!("check-out accepted, status {}", record.status.as_str());
        Ok(record)
    }

    /// Plain read; not gated.
    pub async fn attendance_status(&self) -> WorkflowResult<AttendanceRecord> {
        settle(
            self.api.attendance_status().await,
            "Failed to load attendance status",
            attendance_record,
        )
    }

    pub async fn start_task(
        &self,
        session: &ProofSession,
        title: &str,
        task_type: &TaskType,
        gps: &GpsReading,
    ) -> WorkflowResult<TaskRecord> {
        let request = CreateTaskRequest {
            face_session_id: session.session_id.clone(),
            title: title.trim().to_string(),
            task_type: task_type.as_wire(),
            location: GeoPoint::from(gps),
            device: self.device.descriptor(),
        };
        let record = settle(
            self.api.create_task(&request).await,
            "Failed to start task",
            |payload, _| task_record(payload),
        )?;
        log_info!("task {} started", record.id);
        Ok(record)
    }

    pub async fn upload_task_media(
        &self,
        session: &ProofSession,
        task_id: &str,
        facing: CameraFacing,
        media: &MediaAttachment,
        gps: &GpsReading,
    ) -> WorkflowResult<TaskRecord> {
        let request = TaskMediaRequest {
            task_id: task_id.to_string(),
            face_session_id: session.session_id.clone(),
            facing,
            file_name: media.file_name.clone(),
            content_type: media.content_type.clone(),
            data: BASE64.encode(&media.bytes),
            location: GeoPoint::from(gps),
        };
        let record = settle(
            self.api.upload_task_media(&request).await,
            "Failed to upload task photo",
            |payload, _| task_record(payload),
        )?;
        log_info!("task {} photo uploaded ({} total)", record.id, record.media_count);
        Ok(record)
    }

    pub async fn complete_task(
        &self,
        session: &ProofSession,
        task_id: &str,
        gps: &GpsReading,
    ) -> WorkflowResult<TaskRecord> {
        let request = CompleteTaskRequest {
            task_id: task_id.to_string(),
            face_session_id: session.session_id.clone(),
            location: GeoPoint::from(gps),
        };
        let record = settle(
            self.api.complete_task(&request).await,
            "Failed to complete task",
            |payload, _| task_record(payload),
        )?;
        log_info!("task {} completed", record.id);
        Ok(record)
    }

    /// One ping, one call. Tracking pings are bound to the login credential,
    /// not to a proof session.
    pub async fn submit_tracking_ping(&self, sample: &TrackingSample) -> WorkflowResult<()> {
        const FALLBACK: &str = "Tracking ping rejected";

        let request = TrackingPingRequest::new(sample, self.device.descriptor());
        match self.api.submit_tracking_ping(&request).await {
            Ok(response) if response.success => Ok(()),
            Ok(response) => Err(WorkflowError::rejected(response.message, FALLBACK)),
            Err(err) => Err(WorkflowError::from_api(err, FALLBACK)),
        }
    }

    pub async fn login(
        &self,
        company_code: &str,
        username: &str,
        password: &str,
    ) -> WorkflowResult<Credential> {
        if company_code.trim().is_empty() || username.trim().is_empty() || password.is_empty() {
            return Err(WorkflowError::Validation(
                "Company code, username and password are required".into(),
            ));
        }

        let request = LoginRequest {
            company_code: company_code.trim().to_string(),
            username: username.trim().to_string(),
            password: password.to_string(),
            device: self.device.descriptor(),
        };
        let credential = settle(self.api.login(&request).await, "Login failed", |payload, _| {
            Credential {
                access_token: payload.access_token,
                expires_at: payload.expires_at,
                employee_id: payload.employee_id,
            }
        })?;

        // Tenant code is only replaced once the backend accepted it.
        self.credentials
            .set_company_code(company_code)
            .map_err(|err| WorkflowError::Unexpected(format!("{err:#}")))?;
        self.credentials
            .save_credential(credential.clone())
            .map_err(|err| WorkflowError::Unexpected(format!("{err:#}")))?;
        log_info!("logged in as employee {}", credential.employee_id);
        Ok(credential)
    }

    /// Drops the login credential and any live proof session.
    pub fn logout(&self) -> WorkflowResult<()> {
        self.sessions.clear();
        self.credentials
            .clear()
            .map_err(|err| WorkflowError::Unexpected(format!("{err:#}")))?;
        log_info!("logged out; credentials and proof session cleared");
        Ok(())
    }

    fn attendance_request(&self, session: &ProofSession, gps: &GpsReading) -> AttendanceRequest {
        AttendanceRequest {
            face_session_id: session.session_id.clone(),
            location: GeoPoint::from(gps),
            device: self.device.descriptor(),
        }
    }
}

/// Fold an envelope into the taxonomy: transport errors classified,
/// `success == false` rejected, missing payload unexpected.
fn settle<T, R>(
    result: ApiResult<T>,
    fallback: &str,
    map: impl FnOnce(T, Option<String>) -> R,
) -> WorkflowResult<R> {
    let response = result.map_err(|err| WorkflowError::from_api(err, fallback))?;
    if !response.success {
        return Err(WorkflowError::rejected(response.message, fallback));
    }
    match response.data {
        Some(data) => Ok(map(data, response.message)),
        None => Err(WorkflowError::Unexpected(format!(
            "{fallback}: response had no data"
        ))),
    }
}

fn attendance_record(payload: AttendancePayload, message: Option<String>) -> AttendanceRecord {
    AttendanceRecord {
        id: payload.id,
        status: AttendanceStatus::from_server(&payload.status),
        check_in_at: payload.check_in_at,
        check_out_at: payload.check_out_at,
        message,
    }
}

fn task_record(payload: TaskPayload) -> TaskRecord {
    TaskRecord {
        id: payload.id,
        title: payload.title,
        task_type: payload
            .task_type
            .as_deref()
            .map(TaskType::from_server)
            .unwrap_or(TaskType::Other(String::new())),
        status: TaskStatus::from_server(&payload.status),
        started_at: payload.started_at,
        completed_at: payload.completed_at,
        media_count: payload.media_count.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ApiResponse, FaceSessionPayload};
    use crate::test_support::{fix, Harness};
    use chrono::{Duration, TimeZone};

    fn live_session(purpose: ProofPurpose, expires_at: DateTime<Utc>) -> ProofSession {
        ProofSession {
            session_id: "fs-live".into(),
            purpose,
            issued_at: expires_at - Duration::minutes(5),
            expires_at,
            match_score: None,
        }
    }

    #[test]
    fn authorize_matrix() {
        let harness = Harness::new();
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap();
        let gateway = &harness.gateway;

        assert_eq!(gateway.authorize_at(ProofPurpose::Attendance, now), Authorization::NeedsProof);

        let expires = now + Duration::minutes(3);
        gateway.sessions().save(live_session(ProofPurpose::Attendance, expires));

        assert!(gateway.authorize_at(ProofPurpose::Attendance, now).is_allowed());
        assert!(!gateway.authorize_at(ProofPurpose::Task, now).is_allowed());
        assert!(!gateway.authorize_at(ProofPurpose::Attendance, expires).is_allowed());
        assert!(!gateway
            .authorize_at(ProofPurpose::Attendance, expires + Duration::seconds(1))
            .is_allowed());
    }

    #[tokio::test]
    async fn verify_proof_stores_session_with_fallback_ttl() {
        let harness = Harness::new();
        harness.api.set_verify_face(Ok(ApiResponse::ok(FaceSessionPayload {
            session_id: "fs-42".into(),
            expires_at: None,
            match_score: Some(0.97),
        })));

        let session = harness
            .gateway
            .verify_proof(ProofPurpose::Task, b"jpeg", Some(&fix()))
            .await
            .unwrap();

        assert_eq!(session.purpose, ProofPurpose::Task);
        assert_eq!(session.expires_at, harness.clock.now() + Duration::minutes(5));
        assert_eq!(harness.gateway.sessions().get(), Some(session));
    }

    #[tokio::test]
    async fn out_of_range_proof_lifetime_is_unexpected() {
        let harness = Harness::new();
        harness.api.set_verify_face(Ok(ApiResponse::ok(FaceSessionPayload {
            session_id: "fs-far".into(),
            expires_at: None,
            match_score: None,
        })));
        let gateway = ActionGateway::new(
            harness.api.clone(),
            SessionStore::new(),
            Arc::new(harness.clock.clone()),
            harness.credentials.clone(),
            Arc::new(harness.device.clone()),
            Duration::days(365 * 1_000_000),
        );

        let err = gateway
            .verify_proof(ProofPurpose::Attendance, b"jpeg", None)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Unexpected(_)));
        assert!(gateway.sessions().get().is_none());
    }

    #[tokio::test]
    async fn failed_verification_keeps_previous_session() {
        let harness = Harness::new();
        let existing = live_session(ProofPurpose::Attendance, harness.clock.now() + Duration::minutes(1));
        harness.gateway.sessions().save(existing.clone());
        harness
            .api
            .set_verify_face(Ok(ApiResponse::failed("Face does not match")));

        let err = harness
            .gateway
            .verify_proof(ProofPurpose::Attendance, b"jpeg", None)
            .await
            .unwrap_err();

        assert_eq!(err, WorkflowError::RemoteRejected("Face does not match".into()));
        assert_eq!(harness.gateway.sessions().get(), Some(existing));
    }

    #[tokio::test]
    async fn check_in_maps_status_and_sends_session_id() {
        let harness = Harness::new();
        harness.api.set_check_in(Ok(ApiResponse::ok(AttendancePayload {
            id: Some("att-1".into()),
            status: "check_in".into(),
            check_in_at: Some(harness.clock.now()),
            check_out_at: None,
        })));
        let session = live_session(ProofPurpose::Attendance, harness.clock.now() + Duration::minutes(2));

        let record = harness.gateway.check_in(&session, &fix()).await.unwrap();

        assert_eq!(record.status, AttendanceStatus::CheckedIn);
        assert_eq!(harness.api.calls("check_in"), 1);
        assert_eq!(harness.api.last_face_session_id().as_deref(), Some("fs-live"));
    }

    #[tokio::test]
    async fn empty_payload_is_unexpected() {
        let harness = Harness::new();
        harness.api.set_check_out(Ok(ApiResponse {
            success: true,
            message: None,
            data: None,
        }));
        let session = live_session(ProofPurpose::Attendance, harness.clock.now() + Duration::minutes(2));

        let err = harness.gateway.check_out(&session, &fix()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Unexpected(_)));
    }

    #[tokio::test]
    async fn transport_failure_classified() {
        let harness = Harness::new();
        harness
            .api
            .set_create_task(Err(ApiError::Connectivity("reset by peer".into())));
        let session = live_session(ProofPurpose::Task, harness.clock.now() + Duration::minutes(2));

        let err = harness
            .gateway
            .start_task(&session, "Visit", &TaskType::Visit, &fix())
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::Transport);
        assert_eq!(harness.api.calls("create_task"), 1);
    }

    #[tokio::test]
    async fn login_then_logout_clears_everything() {
        let harness = Harness::new();
        let expires = harness.clock.now() + Duration::hours(8);
        harness.api.set_login(Ok(ApiResponse::ok(crate::api::LoginPayload {
            access_token: "tok".into(),
            expires_at: expires,
            employee_id: "emp-9".into(),
        })));

        let credential = harness.gateway.login("ACME", "dina", "secret").await.unwrap();
        assert_eq!(credential.employee_id, "emp-9");
        assert!(harness.credentials.is_valid_at(harness.clock.now()));
        assert_eq!(harness.credentials.company_code().as_deref(), Some("ACME"));

        harness
            .gateway
            .sessions()
            .save(live_session(ProofPurpose::Task, expires));
        harness.gateway.logout().unwrap();

        assert!(harness.credentials.credential().is_none());
        assert!(harness.gateway.sessions().get().is_none());
    }

    #[tokio::test]
    async fn failed_login_keeps_stored_company_code() {
        let harness = Harness::new();
        harness.credentials.set_company_code("ACME").unwrap();
        harness.api.set_login(Err(ApiError::Http {
            status: 401,
            message: Some("Invalid credentials".into()),
        }));

        let err = harness.gateway.login("OTHER", "dina", "wrong").await.unwrap_err();

        assert_eq!(err, WorkflowError::RemoteRejected("Invalid credentials".into()));
        assert_eq!(harness.credentials.company_code().as_deref(), Some("ACME"));
        assert!(harness.credentials.credential().is_none());
    }

    #[tokio::test]
    async fn login_requires_all_fields() {
        let harness = Harness::new();
        let err = harness.gateway.login("", "dina", "secret").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(harness.api.calls("login"), 0);
    }

    #[test]
    fn unknown_fields_in_task_payload_default_safely() {
        let record = task_record(TaskPayload {
            id: "t-1".into(),
            title: "Audit".into(),
            task_type: None,
            status: "whatever".into(),
            started_at: None,
            completed_at: None,
            media_count: None,
        });
        assert_eq!(record.status, TaskStatus::Pending);
        assert_eq!(record.media_count, 0);
    }
}
