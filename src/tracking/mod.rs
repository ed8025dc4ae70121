pub mod controller;
mod loop_worker;
pub mod source;

pub use controller::TrackingController;
pub use source::{ChannelLocationSource, LocationSource, LocationSubscription};
