//! Inertial sensor side of the gamepad report

use crate::report::AttitudeSample;

/// Decodes the 9-axis sensor into report fields.
///
/// Polled once per steering loop iteration; `None` means nothing new since the
/// last poll.
pub trait AttitudeSource: Send {
    fn poll(&mut self) -> Option<AttitudeSample>;
}

/// Source for setups without an inertial sensor
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleAttitude;

impl AttitudeSource for IdleAttitude {
    fn poll(&mut self) -> Option<AttitudeSample> {
        None
    }
}
