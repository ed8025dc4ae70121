//! Actions a workflow controller can run. Each variant carries the inputs
//! captured when the user asked for it, so a replay after proof does not
//! need to collect them again.

use super::{CameraFacing, GpsReading, TaskType};

#[derive(Debug, Clone, PartialEq)]
pub enum AttendanceAction {
    CheckIn { gps: Option<GpsReading> },
    CheckOut { gps: Option<GpsReading> },
}

impl AttendanceAction {
    pub fn kind(&self) -> &'static str {
        match self {
            AttendanceAction::CheckIn { .. } => "check-in",
            AttendanceAction::CheckOut { .. } => "check-out",
        }
    }

    pub fn gps(&self) -> Option<&GpsReading> {
        match self {
            AttendanceAction::CheckIn { gps } | AttendanceAction::CheckOut { gps } => gps.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    Start {
        title: String,
        task_type: TaskType,
        gps: Option<GpsReading>,
    },
    UploadMedia {
        task_id: String,
        facing: CameraFacing,
        media: MediaAttachment,
        gps: Option<GpsReading>,
    },
    Complete {
        task_id: String,
        gps: Option<GpsReading>,
    },
}

impl TaskAction {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskAction::Start { .. } => "task-start",
            TaskAction::UploadMedia { .. } => "task-upload",
            TaskAction::Complete { .. } => "task-complete",
        }
    }

    pub fn gps(&self) -> Option<&GpsReading> {
        match self {
            TaskAction::Start { gps, .. }
            | TaskAction::UploadMedia { gps, .. }
            | TaskAction::Complete { gps, .. } => gps.as_ref(),
        }
    }
}

/// A captured photo ready for upload.
#[derive(Clone, PartialEq)]
pub struct MediaAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for MediaAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaAttachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
