//! Scriptable collaborators shared by the unit tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use crate::{
    api::{
        ApiError, ApiResponse, ApiResult, AttendancePayload, AttendanceRequest,
        CompleteTaskRequest, CreateTaskRequest, FaceSessionPayload, FaceVerificationRequest,
        FieldApi, LoginPayload, LoginRequest, TaskMediaRequest, TaskPayload, TrackingPingRequest,
    },
    clock::ManualClock,
    credentials::MemoryCredentialStore,
    device::StaticDeviceInfo,
    gateway::ActionGateway,
    models::{BatteryStatus, DeviceDescriptor, GpsReading},
    session_store::SessionStore,
};

#[derive(Default)]
struct Script {
    login: Option<ApiResult<LoginPayload>>,
    verify_face: Option<ApiResult<FaceSessionPayload>>,
    check_in: Option<ApiResult<AttendancePayload>>,
    check_out: Option<ApiResult<AttendancePayload>>,
    attendance_status: Option<ApiResult<AttendancePayload>>,
    create_task: Option<ApiResult<TaskPayload>>,
    upload_task_media: Option<ApiResult<TaskPayload>>,
    complete_task: Option<ApiResult<TaskPayload>>,
    ping: Option<ApiResult<serde_json::Value>>,
    calls: HashMap<&'static str, usize>,
    last_face_session_id: Option<String>,
    pings: Vec<TrackingPingRequest>,
    ping_delay: Option<Duration>,
}

/// In-memory `FieldApi` with per-endpoint canned answers and call counting.
/// Unscripted endpoints answer HTTP 501; pings succeed by default.
#[derive(Default)]
pub struct FakeFieldApi {
    script: Mutex<Script>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeFieldApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Hold every non-ping call until the returned handle is notified.
    pub fn hold_calls(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        match self.gate.lock() {
            Ok(mut guard) => *guard = Some(notify.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(notify.clone()),
        }
        notify
    }

    /// Let held calls through and stop holding new ones.
    pub fn release_calls(&self) {
        let gate = match self.gate.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(gate) = gate {
            gate.notify_one();
        }
    }

    pub fn set_login(&self, result: ApiResult<LoginPayload>) {
        self.script().login = Some(result);
    }

    pub fn set_verify_face(&self, result: ApiResult<FaceSessionPayload>) {
        self.script().verify_face = Some(result);
    }

    pub fn set_check_in(&self, result: ApiResult<AttendancePayload>) {
        self.script().check_in = Some(result);
    }

    pub fn set_check_out(&self, result: ApiResult<AttendancePayload>) {
        self.script().check_out = Some(result);
    }

    pub fn set_attendance_status(&self, result: ApiResult<AttendancePayload>) {
        self.script().attendance_status = Some(result);
    }

    pub fn set_create_task(&self, result: ApiResult<TaskPayload>) {
        self.script().create_task = Some(result);
    }

    pub fn set_upload_task_media(&self, result: ApiResult<TaskPayload>) {
        self.script().upload_task_media = Some(result);
    }

    pub fn set_complete_task(&self, result: ApiResult<TaskPayload>) {
        self.script().complete_task = Some(result);
    }

    pub fn set_ping(&self, result: ApiResult<serde_json::Value>) {
        self.script().ping = Some(result);
    }

    pub fn set_ping_delay(&self, delay: Duration) {
        self.script().ping_delay = Some(delay);
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.script().calls.get(endpoint).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.script().calls.values().sum()
    }

    pub fn last_face_session_id(&self) -> Option<String> {
        self.script().last_face_session_id.clone()
    }

    pub fn pings(&self) -> Vec<TrackingPingRequest> {
        self.script().pings.clone()
    }

    async fn enter(&self, endpoint: &'static str, face_session_id: Option<&str>) {
        {
            let mut script = self.script();
            *script.calls.entry(endpoint).or_insert(0) += 1;
            if let Some(id) = face_session_id {
                script.last_face_session_id = Some(id.to_string());
            }
        }
        let gate = match self.gate.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

fn unscripted<T>(endpoint: &str) -> ApiResult<T> {
    Err(ApiError::Http {
        status: 501,
        message: Some(format!("{endpoint} not scripted")),
    })
}

#[async_trait]
impl FieldApi for FakeFieldApi {
    async fn login(&self, _request: &LoginRequest) -> ApiResult<LoginPayload> {
        self.enter("login", None).await;
        self.script().login.clone().unwrap_or_else(|| unscripted("login"))
    }

    async fn verify_face(&self, _request: &FaceVerificationRequest) -> ApiResult<FaceSessionPayload> {
        self.enter("verify_face", None).await;
        self.script()
            .verify_face
            .clone()
            .unwrap_or_else(|| unscripted("verify_face"))
    }

    async fn check_in(&self, request: &AttendanceRequest) -> ApiResult<AttendancePayload> {
        self.enter("check_in", Some(&request.face_session_id)).await;
        self.script().check_in.clone().unwrap_or_else(|| unscripted("check_in"))
    }

    async fn check_out(&self, request: &AttendanceRequest) -> ApiResult<AttendancePayload> {
        self.enter("check_out", Some(&request.face_session_id)).await;
        self.script().check_out.clone().unwrap_or_else(|| unscripted("check_out"))
    }

    async fn attendance_status(&self) -> ApiResult<AttendancePayload> {
        self.enter("attendance_status", None).await;
        self.script()
            .attendance_status
            .clone()
            .unwrap_or_else(|| unscripted("attendance_status"))
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> ApiResult<TaskPayload> {
        self.enter("create_task", Some(&request.face_session_id)).await;
        self.script()
            .create_task
            .clone()
            .unwrap_or_else(|| unscripted("create_task"))
    }

    async fn upload_task_media(&self, request: &TaskMediaRequest) -> ApiResult<TaskPayload> {
        self.enter("upload_task_media", Some(&request.face_session_id)).await;
        self.script()
            .upload_task_media
            .clone()
            .unwrap_or_else(|| unscripted("upload_task_media"))
    }

    async fn complete_task(&self, request: &CompleteTaskRequest) -> ApiResult<TaskPayload> {
        self.enter("complete_task", Some(&request.face_session_id)).await;
        self.script()
            .complete_task
            .clone()
            .unwrap_or_else(|| unscripted("complete_task"))
    }

    async fn submit_tracking_ping(
        &self,
        request: &TrackingPingRequest,
    ) -> ApiResult<serde_json::Value> {
        let delay = {
            let mut script = self.script();
            *script.calls.entry("ping").or_insert(0) += 1;
            script.pings.push(request.clone());
            script.ping_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.script()
            .ping
            .clone()
            .unwrap_or_else(|| Ok(ApiResponse::ok(serde_json::json!({ "accepted": true }))))
    }
}

/// A clean, high-accuracy fix.
pub fn fix() -> GpsReading {
    GpsReading {
        latitude: -6.175,
        longitude: 106.827,
        accuracy_meters: Some(6.0),
        is_mocked: false,
        provider: Some("gps".into()),
        captured_at: Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap(),
    }
}

/// Gateway wired to fakes, with every collaborator reachable for assertions.
pub struct Harness {
    pub api: Arc<FakeFieldApi>,
    pub clock: ManualClock,
    pub credentials: Arc<MemoryCredentialStore>,
    pub device: StaticDeviceInfo,
    pub gateway: ActionGateway,
}

impl Harness {
    pub fn new() -> Self {
        let api = Arc::new(FakeFieldApi::new());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap());
        let credentials = Arc::new(MemoryCredentialStore::new());
        let device = StaticDeviceInfo::new(
            DeviceDescriptor {
                model: "Pixel 7".into(),
                manufacturer: "Google".into(),
                os_version: Some("Android 14".into()),
            },
            BatteryStatus {
                level: Some(80),
                is_charging: Some(false),
            },
        );
        let gateway = ActionGateway::new(
            api.clone(),
            SessionStore::new(),
            Arc::new(clock.clone()),
            credentials.clone(),
            Arc::new(device.clone()),
            chrono::Duration::minutes(5),
        );

        Self {
            api,
            clock,
            credentials,
            device,
            gateway,
        }
    }
}
