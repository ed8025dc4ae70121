pub mod action;
pub mod attendance;
pub mod location;
pub mod proof;
pub mod task;

pub use action::{AttendanceAction, MediaAttachment, TaskAction};
pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use location::{BatteryStatus, CameraFacing, DeviceDescriptor, GpsReading, TrackingSample};
pub use proof::{ProofPurpose, ProofSession};
pub use task::{TaskRecord, TaskStatus, TaskType};
