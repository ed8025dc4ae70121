//! Device and location signals captured before an action or a tracking ping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GpsReading {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub is_mocked: bool,
    pub provider: Option<String>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraFacing {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BatteryStatus {
    /// Percent, expected within 0..=100. Kept signed so bad readings survive
    /// until validation rejects them.
    pub level: Option<i32>,
    pub is_charging: Option<bool>,
}

/// One location fix plus the device state at the time of the fix. Lives only
/// for the duration of a single ping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSample {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub is_mocked: bool,
    pub battery_level: Option<i32>,
    pub is_charging: Option<bool>,
    pub captured_at: DateTime<Utc>,
}

impl TrackingSample {
    pub fn from_fix(fix: &GpsReading, battery: BatteryStatus) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy_meters: fix.accuracy_meters,
            is_mocked: fix.is_mocked,
            battery_level: battery.level,
            is_charging: battery.is_charging,
            captured_at: fix.captured_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub model: String,
    pub manufacturer: String,
    pub os_version: Option<String>,
}
