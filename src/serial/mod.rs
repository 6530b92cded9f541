//! Serial link to the downstream gamepad receiver
//!
//! - [`port`] - opens the device
//! - [`transmitter`] - streams framed reports over it

pub mod port;
pub mod transmitter;

pub use port::open_port;
pub use transmitter::{FramedTransmitter, TransmitterHandle, TransmitterStats};

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Failed to open serial device {path}: {reason}")]
    OpenError { path: String, reason: String },
}
