use std::sync::{Arc, Mutex};

use sysinfo::System;

use crate::models::{BatteryStatus, DeviceDescriptor};

/// Device facts used to enrich outbound requests.
pub trait DeviceInfo: Send + Sync {
    fn descriptor(&self) -> DeviceDescriptor;
    fn battery(&self) -> BatteryStatus;
}

/// Describes the host from `sysinfo`. Battery readings come from an injected
/// provider because `sysinfo` has none; without one the status stays empty
/// and tracking samples are rejected.
pub struct HostDeviceInfo {
    descriptor: DeviceDescriptor,
    battery: Arc<dyn Fn() -> BatteryStatus + Send + Sync>,
}

impl HostDeviceInfo {
    pub fn new() -> Self {
        Self::with_battery(BatteryStatus::default)
    }

    pub fn with_battery<F>(battery: F) -> Self
    where
        F: Fn() -> BatteryStatus + Send + Sync + 'static,
    {
        let descriptor = DeviceDescriptor {
            model: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            manufacturer: System::name().unwrap_or_else(|| "unknown".to_string()),
            os_version: System::long_os_version(),
        };

        Self {
            descriptor,
            battery: Arc::new(battery),
        }
    }
}

impl Default for HostDeviceInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceInfo for HostDeviceInfo {
    fn descriptor(&self) -> DeviceDescriptor {
        self.descriptor.clone()
    }

    fn battery(&self) -> BatteryStatus {
        (self.battery)()
    }
}

/// Fixed descriptor with a settable battery reading. Used by simulations and
/// tests.
#[derive(Debug, Clone)]
pub struct StaticDeviceInfo {
    descriptor: DeviceDescriptor,
    battery: Arc<Mutex<BatteryStatus>>,
}

impl StaticDeviceInfo {
    pub fn new(descriptor: DeviceDescriptor, battery: BatteryStatus) -> Self {
        Self {
            descriptor,
            battery: Arc::new(Mutex::new(battery)),
        }
    }

    pub fn set_battery(&self, battery: BatteryStatus) {
        match self.battery.lock() {
            Ok(mut guard) => *guard = battery,
            Err(poisoned) => *poisoned.into_inner() = battery,
        }
    }
}

impl DeviceInfo for StaticDeviceInfo {
    fn descriptor(&self) -> DeviceDescriptor {
        self.descriptor.clone()
    }

    fn battery(&self) -> BatteryStatus {
        match self.battery.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
