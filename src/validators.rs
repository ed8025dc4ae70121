//! Pure signal checks run before any gated remote call.
//!
//! Every check fails closed: a missing signal is `Invalid`, never
//! "unknown but fine".

use crate::models::{CameraFacing, GpsReading, MediaAttachment, TrackingSample};

/// Task proof photos must show the scene, not the employee.
pub const TASK_PHOTO_FACING: CameraFacing = CameraFacing::Back;

const MAX_MEDIA_BYTES: usize = 10 * 1024 * 1024;
const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(String),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// First invalid verdict wins; later checks are not consulted.
    pub fn and_then(self, next: impl FnOnce() -> Verdict) -> Verdict {
        match self {
            Verdict::Valid => next(),
            invalid => invalid,
        }
    }

    fn invalid(reason: &str) -> Self {
        Verdict::Invalid(reason.to_string())
    }
}

pub fn validate_gps(reading: Option<&GpsReading>) -> Verdict {
    let Some(reading) = reading else {
        return Verdict::invalid("Location is unavailable. Enable GPS and try again");
    };

    validate_position(
        reading.latitude,
        reading.longitude,
        reading.accuracy_meters,
        reading.is_mocked,
    )
}

pub fn validate_camera_facing(captured: CameraFacing, required: CameraFacing) -> Verdict {
    if captured != required {
        let expected = match required {
            CameraFacing::Front => "front",
            CameraFacing::Back => "back",
        };
        return Verdict::Invalid(format!("Photo must be taken with the {expected} camera"));
    }
    Verdict::Valid
}

pub fn validate_tracking_sample(sample: &TrackingSample) -> Verdict {
    validate_position(
        sample.latitude,
        sample.longitude,
        sample.accuracy_meters,
        sample.is_mocked,
    )
    .and_then(|| match sample.battery_level {
        None => Verdict::invalid("Battery level unavailable"),
        Some(level) if !(0..=100).contains(&level) => {
            Verdict::Invalid(format!("Battery level {level} out of range"))
        }
        Some(_) => Verdict::Valid,
    })
    .and_then(|| match sample.is_charging {
        None => Verdict::invalid("Charging state unavailable"),
        Some(_) => Verdict::Valid,
    })
}

pub fn validate_task_title(title: &str) -> Verdict {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Verdict::invalid("Task title is required");
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Verdict::Invalid(format!("Task title too long (max {MAX_TITLE_CHARS} characters)"));
    }
    Verdict::Valid
}

pub fn validate_media(media: &MediaAttachment) -> Verdict {
    if media.bytes.is_empty() {
        return Verdict::invalid("Photo is empty. Capture it again");
    }
    if media.bytes.len() > MAX_MEDIA_BYTES {
        return Verdict::invalid("Photo too large (max 10 MB)");
    }
    Verdict::Valid
}

fn validate_position(
    latitude: f64,
    longitude: f64,
    accuracy_meters: Option<f64>,
    is_mocked: bool,
) -> Verdict {
    if is_mocked {
        return Verdict::invalid("Mock location detected. Disable mock location apps");
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Verdict::Invalid(format!("Invalid latitude {latitude}"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Verdict::Invalid(format!("Invalid longitude {longitude}"));
    }
    match accuracy_meters {
        Some(accuracy) if accuracy > 0.0 => Verdict::Valid,
        Some(_) => Verdict::invalid("Location accuracy is invalid"),
        None => Verdict::invalid("Location accuracy unavailable"),
    }
}
