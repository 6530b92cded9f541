//! Paced, checksummed report stream
//!
//! Every cycle copies the current report once and writes its seven frame bytes
//! one at a time, each after a fixed gap. The gap rate-limits the stream to
//! what the receiver can sample; with the default 12 ms a frame takes ~84 ms.

use crate::config::TransmitterSettings;
use crate::report::{GamepadReport, ReportFrame};
use chrono::Local;
use std::io::Write;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransmitterStats {
    pub frames_sent: u64,
    pub write_failures: u64,
}

pub struct FramedTransmitter {
    port: Box<dyn Write + Send>,
    reports: watch::Receiver<GamepadReport>,
    byte_delay: Duration,
    stats: TransmitterStats,
}

impl FramedTransmitter {
    pub fn new(
        port: Box<dyn Write + Send>,
        reports: watch::Receiver<GamepadReport>,
        settings: &TransmitterSettings,
    ) -> Self {
        Self {
            port,
            reports,
            byte_delay: Duration::from_millis(settings.byte_delay_ms),
            stats: TransmitterStats::default(),
        }
    }

    /// Streams frames until `cancel` fires.
    ///
    /// Cancellation is only observed between frames, so the receiver never
    /// sees a truncated frame from a clean shutdown.
    pub async fn run(mut self, cancel: CancellationToken) -> TransmitterStats {
        info!(
            "Starting report transmitter with {:?} inter-byte delay",
            self.byte_delay
        );

        let mut last_log_time = Local::now();
        let mut last_stats = self.stats;
        let log_interval = chrono::Duration::seconds(10);

        while !cancel.is_cancelled() {
            let report = *self.reports.borrow();
            self.send_frame(&report).await;

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Transmitter stats: sent {} frames with {} write failures in last {} seconds",
                    self.stats.frames_sent - last_stats.frames_sent,
                    self.stats.write_failures - last_stats.write_failures,
                    log_interval.num_seconds()
                );
                last_stats = self.stats;
                last_log_time = now;
            }
        }

        info!(
            "Report transmitter stopped after {} frames",
            self.stats.frames_sent
        );
        self.stats
    }

    async fn send_frame(&mut self, report: &GamepadReport) {
        for byte in ReportFrame::encode(report) {
            self.delay_write(byte).await;
        }
        self.stats.frames_sent += 1;
        debug!("Sent report frame {:?}", report);
    }

    // A failed byte is logged and skipped; the next frame resynchronizes the receiver
    async fn delay_write(&mut self, byte: u8) {
        tokio::time::sleep(self.byte_delay).await;
        match self.port.write(&[byte]) {
            Ok(1) => {}
            Ok(written) => {
                self.stats.write_failures += 1;
                error!("Short serial write: {} of 1 bytes", written);
            }
            Err(e) => {
                self.stats.write_failures += 1;
                error!("Serial write failed: {}", e);
            }
        }
    }
}

// Public interface for spawning the transmitter task
pub struct TransmitterHandle {
    task: JoinHandle<TransmitterStats>,
}

impl TransmitterHandle {
    pub fn spawn(transmitter: FramedTransmitter, cancel: CancellationToken) -> Self {
        info!("Spawning report transmitter task");
        let task = tokio::spawn(transmitter.run(cancel));
        Self { task }
    }

    /// Waits for the current frame to finish after cancellation
    pub async fn join(self) -> TransmitterStats {
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Transmitter task failed: {}", e);
                TransmitterStats::default()
            }
        }
    }
}
