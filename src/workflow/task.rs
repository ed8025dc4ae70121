use async_trait::async_trait;

use crate::{
    error::WorkflowResult,
    gateway::ActionGateway,
    models::{ProofPurpose, ProofSession, TaskAction, TaskRecord},
    validators::{
        validate_camera_facing, validate_gps, validate_media, validate_task_title, Verdict,
        TASK_PHOTO_FACING,
    },
};

use super::{
    controller::{captured_gps, Feature},
    WorkflowController,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFeature;

fn require_task_id(task_id: &str) -> Verdict {
    if task_id.trim().is_empty() {
        Verdict::Invalid("No task selected".into())
    } else {
        Verdict::Valid
    }
}

#[async_trait]
impl Feature for TaskFeature {
    type Action = TaskAction;
    type Record = TaskRecord;

    const NAME: &'static str = "task";

    fn purpose(&self) -> ProofPurpose {
        ProofPurpose::Task
    }

    fn kind(action: &TaskAction) -> &'static str {
        action.kind()
    }

    fn validate(&self, action: &TaskAction) -> Verdict {
        match action {
            TaskAction::Start { title, gps, .. } => {
                validate_task_title(title).and_then(|| validate_gps(gps.as_ref()))
            }
            TaskAction::UploadMedia {
                task_id,
                facing,
                media,
                gps,
            } => require_task_id(task_id)
                .and_then(|| validate_camera_facing(*facing, TASK_PHOTO_FACING))
                .and_then(|| validate_media(media))
                .and_then(|| validate_gps(gps.as_ref())),
            TaskAction::Complete { task_id, gps } => {
                require_task_id(task_id).and_then(|| validate_gps(gps.as_ref()))
            }
        }
    }

    async fn execute(
        &self,
        gateway: &ActionGateway,
        session: &ProofSession,
        action: &TaskAction,
    ) -> WorkflowResult<TaskRecord> {
        let gps = captured_gps(action.gps())?;
        match action {
            TaskAction::Start {
                title, task_type, ..
            } => gateway.start_task(session, title, task_type, gps).await,
            TaskAction::UploadMedia {
                task_id,
                facing,
                media,
                ..
            } => {
                gateway
                    .upload_task_media(session, task_id, *facing, media, gps)
                    .await
            }
            TaskAction::Complete { task_id, .. } => {
                gateway.complete_task(session, task_id, gps).await
            }
        }
    }
}

pub type TaskController = WorkflowController<TaskFeature>;

impl WorkflowController<TaskFeature> {
    pub fn tasks(gateway: ActionGateway) -> Self {
        Self::new(TaskFeature, gateway)
    }

    pub fn current_task(&self) -> Option<TaskRecord> {
        self.state().result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{ApiResponse, TaskPayload},
        clock::Clock,
        error::WorkflowError,
        models::{CameraFacing, MediaAttachment, TaskStatus, TaskType},
        test_support::{fix, Harness},
        workflow::{RequestOutcome, WorkflowEvent, WorkflowStep},
    };
    use chrono::Duration;

    fn task_session(harness: &Harness) -> ProofSession {
        ProofSession {
            session_id: "fs-task".into(),
            purpose: ProofPurpose::Task,
            issued_at: harness.clock.now(),
            expires_at: harness.clock.now() + Duration::minutes(5),
            match_score: None,
        }
    }

    fn payload(status: &str, media_count: u32) -> TaskPayload {
        TaskPayload {
            id: "t-100".into(),
            title: "Inspect pump".into(),
            task_type: Some("inspection".into()),
            status: status.into(),
            started_at: None,
            completed_at: None,
            media_count: Some(media_count),
        }
    }

    fn photo() -> MediaAttachment {
        MediaAttachment {
            file_name: "pump.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }
    }

    #[tokio::test]
    async fn start_task_flow() {
        let harness = Harness::new();
        harness.gateway.sessions().save(task_session(&harness));
        harness.api.set_create_task(Ok(ApiResponse::ok(payload("started", 0))));
        let controller = TaskController::tasks(harness.gateway.clone());

        let outcome = controller
            .request(TaskAction::Start {
                title: "Inspect pump".into(),
                task_type: TaskType::Inspection,
                gps: Some(fix()),
            })
            .await;

        let RequestOutcome::Completed(record) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(record.status, TaskStatus::InProgress);
        assert_eq!(record.task_type, TaskType::Inspection);
        assert_eq!(controller.current_task().unwrap().id, "t-100");
    }

    #[tokio::test]
    async fn attendance_session_does_not_unlock_tasks() {
        let harness = Harness::new();
        let mut session = task_session(&harness);
        session.purpose = ProofPurpose::Attendance;
        harness.gateway.sessions().save(session);
        let controller = TaskController::tasks(harness.gateway.clone());
        let mut events = controller.subscribe_events();

        let outcome = controller
            .request(TaskAction::Complete {
                task_id: "t-100".into(),
                gps: Some(fix()),
            })
            .await;

        assert_eq!(outcome, RequestOutcome::Gated(ProofPurpose::Task));
        assert_eq!(events.recv().await.unwrap(), WorkflowEvent::RequireProof(ProofPurpose::Task));
        assert_eq!(harness.api.total_calls(), 0);
    }

    #[tokio::test]
    async fn front_camera_photo_rejected() {
        let harness = Harness::new();
        harness.gateway.sessions().save(task_session(&harness));
        let controller = TaskController::tasks(harness.gateway.clone());

        let outcome = controller
            .request(TaskAction::UploadMedia {
                task_id: "t-100".into(),
                facing: CameraFacing::Front,
                media: photo(),
                gps: Some(fix()),
            })
            .await;

        let RequestOutcome::Failed(WorkflowError::Validation(reason)) = outcome else {
            panic!("expected validation failure, got {outcome:?}");
        };
        assert!(reason.contains("back camera"));
        assert_eq!(controller.state().step, WorkflowStep::Failed);
        assert_eq!(harness.api.total_calls(), 0);
    }

    #[tokio::test]
    async fn upload_replays_with_captured_photo() {
        let harness = Harness::new();
        harness
            .api
            .set_upload_task_media(Ok(ApiResponse::ok(payload("in_progress", 1))));
        let controller = TaskController::tasks(harness.gateway.clone());

        let gated = controller
            .request(TaskAction::UploadMedia {
                task_id: "t-100".into(),
                facing: CameraFacing::Back,
                media: photo(),
                gps: Some(fix()),
            })
            .await;
        assert_eq!(gated, RequestOutcome::Gated(ProofPurpose::Task));

        harness.gateway.sessions().save(task_session(&harness));
        let replay = controller.proof_supplied().await.unwrap();

        let RequestOutcome::Completed(record) = replay else {
            panic!("expected completion, got {replay:?}");
        };
        assert_eq!(record.media_count, 1);
        assert_eq!(harness.api.calls("upload_task_media"), 1);
        assert_eq!(harness.api.last_face_session_id().as_deref(), Some("fs-task"));
    }

    #[tokio::test]
    async fn server_rejection_surfaces_message() {
        let harness = Harness::new();
        harness.gateway.sessions().save(task_session(&harness));
        harness
            .api
            .set_complete_task(Ok(ApiResponse::failed("Upload at least one photo first")));
        let controller = TaskController::tasks(harness.gateway.clone());

        controller
            .request(TaskAction::Complete {
                task_id: "t-100".into(),
                gps: Some(fix()),
            })
            .await;

        let state = controller.state();
        assert_eq!(state.step, WorkflowStep::Failed);
        assert_eq!(state.error.as_deref(), Some("Upload at least one photo first"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn blank_title_rejected() {
        let harness = Harness::new();
        harness.gateway.sessions().save(task_session(&harness));
        let controller = TaskController::tasks(harness.gateway.clone());

        let outcome = controller
            .request(TaskAction::Start {
                title: "  ".into(),
                task_type: TaskType::Visit,
                gps: Some(fix()),
            })
            .await;
        assert!(matches!(outcome, RequestOutcome::Failed(WorkflowError::Validation(_))));
    }
}
