//! Byte-level framing of [`GamepadReport`]
//!
//! Wire layout, one byte each:
//!
//! ```text
//! [signature][x1][y1][x2][buttons][checksum][!checksum]
//! ```
//!
//! `checksum` is the XOR of the five payload bytes. Signed axes travel as their
//! two's complement byte.

use super::GamepadReport;

pub const PAYLOAD_LEN: usize = 5;
pub const FRAME_LEN: usize = PAYLOAD_LEN + 2;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Unexpected signature {found:#04x}, expected {expected:#04x}")]
    SignatureMismatch { expected: u8, found: u8 },

    #[error("Checksum mismatch: computed {computed:#04x}, received {received:#04x}")]
    ChecksumMismatch { computed: u8, received: u8 },

    #[error("Checksum complement {received:#04x} does not match checksum {checksum:#04x}")]
    ComplementMismatch { checksum: u8, received: u8 },
}

pub struct ReportFrame;

impl ReportFrame {
    pub fn payload(report: &GamepadReport) -> [u8; PAYLOAD_LEN] {
        [
            report.signature,
            report.x1 as u8,
            report.y1 as u8,
            report.x2 as u8,
            report.buttons,
        ]
    }

    pub fn checksum(payload: &[u8]) -> u8 {
        payload.iter().fold(0, |sum, byte| sum ^ byte)
    }

    pub fn encode(report: &GamepadReport) -> [u8; FRAME_LEN] {
        let payload = Self::payload(report);
        let checksum = Self::checksum(&payload);

        let mut frame = [0u8; FRAME_LEN];
        frame[..PAYLOAD_LEN].copy_from_slice(&payload);
        frame[PAYLOAD_LEN] = checksum;
        frame[PAYLOAD_LEN + 1] = !checksum;
        frame
    }

    /// Parses one frame, checking signature, checksum and complement
    pub fn decode(frame: &[u8; FRAME_LEN], signature: u8) -> Result<GamepadReport, FrameError> {
        if frame[0] != signature {
            return Err(FrameError::SignatureMismatch {
                expected: signature,
                found: frame[0],
            });
        }

        let computed = Self::checksum(&frame[..PAYLOAD_LEN]);
        let received = frame[PAYLOAD_LEN];
        if computed != received {
            return Err(FrameError::ChecksumMismatch { computed, received });
        }

        let complement = frame[PAYLOAD_LEN + 1];
        if complement != !received {
            return Err(FrameError::ComplementMismatch {
                checksum: received,
                received: complement,
            });
        }

        Ok(GamepadReport {
            signature: frame[0],
            x1: frame[1] as i8,
            y1: frame[2] as i8,
            x2: frame[3] as i8,
            buttons: frame[4],
        })
    }
}
