use super::SerialError;
use crate::config::TransmitterSettings;
use serialport::{DataBits, FlowControl, Parity, StopBits};
use std::io::Write;
use std::time::Duration;
use tracing::info;

// Writes block until the device accepts the byte
const WRITE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Opens the receiver link as 8N1 without flow control
pub fn open_port(settings: &TransmitterSettings) -> Result<Box<dyn Write + Send>, SerialError> {
    info!(
        "Opening serial device {} at {} baud",
        settings.device_path, settings.baud_rate
    );

    let port = serialport::new(&settings.device_path, settings.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(WRITE_TIMEOUT)
        .open()
        .map_err(|e| SerialError::OpenError {
            path: settings.device_path.clone(),
            reason: e.to_string(),
        })?;

    Ok(Box::new(port))
}
