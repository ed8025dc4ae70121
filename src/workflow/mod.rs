pub mod attendance;
pub mod controller;
pub mod state;
pub mod task;

pub use attendance::{AttendanceController, AttendanceFeature};
pub use controller::{Feature, WorkflowController};
pub use state::{RequestOutcome, WorkflowEvent, WorkflowState, WorkflowStep};
pub use task::{TaskController, TaskFeature};
