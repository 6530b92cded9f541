//! Gamepad report shared between the producers and the serial transmitter
//!
//! ```text
//! Steering loop ──set_steering──┐
//!                               ├──► watch<GamepadReport> ──► Transmitter (snapshot per frame)
//! Attitude source ─apply_attitude┘
//! ```
//!
//! Each producer owns a disjoint set of fields and updates them through
//! [`ReportHandle`]. Updates replace the whole value inside the channel, so the
//! transmitter never observes a half-written report.

pub mod frame;

pub use frame::{FrameError, ReportFrame, FRAME_LEN, PAYLOAD_LEN};

use std::fmt;
use tokio::sync::watch;
use tracing::debug;

/// Signature byte expected by the downstream receiver
pub const DEFAULT_SIGNATURE: u8 = 0x55;

/// One gamepad report as seen by the receiver
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GamepadReport {
    pub signature: u8,
    pub x1: i8,
    pub y1: i8,
    /// Smoothed steering axis
    pub x2: i8,
    pub buttons: u8,
}

impl GamepadReport {
    pub fn new(signature: u8) -> Self {
        Self {
            signature,
            ..Default::default()
        }
    }
}

// signature in hex, then x1 y1 x2 buttons in decimal
impl fmt::Display for GamepadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:x} {} {} {} {}",
            self.signature, self.x1, self.y1, self.x2, self.buttons
        )
    }
}

/// Fields written by the attitude source
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttitudeSample {
    pub x1: i8,
    pub y1: i8,
    pub buttons: u8,
}

/// Write side of the shared report
///
/// Cloning the handle is cheap; all clones publish into the same slot.
#[derive(Clone, Debug)]
pub struct ReportHandle {
    sender: std::sync::Arc<watch::Sender<GamepadReport>>,
}

impl ReportHandle {
    pub fn new(signature: u8) -> Self {
        let (sender, _) = watch::channel(GamepadReport::new(signature));
        Self {
            sender: std::sync::Arc::new(sender),
        }
    }

    pub fn set_steering(&self, x2: i8) {
        self.sender.send_modify(|report| report.x2 = x2);
        debug!("Steering axis updated: {}", x2);
    }

    pub fn apply_attitude(&self, sample: AttitudeSample) {
        self.sender.send_modify(|report| {
            report.x1 = sample.x1;
            report.y1 = sample.y1;
            report.buttons = sample.buttons;
        });
    }

    /// Copy of the current report
    pub fn snapshot(&self) -> GamepadReport {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<GamepadReport> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producers_only_touch_their_fields() {
        let handle = ReportHandle::new(DEFAULT_SIGNATURE);
        handle.apply_attitude(AttitudeSample {
            x1: -5,
            y1: 7,
            buttons: 0b101,
        });
        handle.set_steering(42);
        handle.apply_attitude(AttitudeSample {
            x1: 1,
            y1: 2,
            buttons: 3,
        });

        assert_eq!(
            handle.snapshot(),
            GamepadReport {
                signature: 0x55,
                x1: 1,
                y1: 2,
                x2: 42,
                buttons: 3,
            }
        );
    }

    #[test]
    fn echo_format() {
        let report = GamepadReport {
            signature: 0x55,
            x1: -3,
            y1: 4,
            x2: -128,
            buttons: 9,
        };
        assert_eq!(report.to_string(), "55 -3 4 -128 9");
    }

    #[test]
    fn subscribers_see_latest_value() {
        let handle = ReportHandle::new(DEFAULT_SIGNATURE);
        let receiver = handle.subscribe();
        handle.clone().set_steering(-12);
        assert_eq!(receiver.borrow().x2, -12);
    }
}
