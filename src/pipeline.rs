//! Steering loop: turns the newest depth mask into the report's steering axis
//!
//! Runs every `tick_ms`. A mask is processed at most once; ticks without a new
//! mask only poll the attitude source.

use crate::attitude::AttitudeSource;
use crate::camera::MaskReceiver;
use crate::config::{EstimatorSettings, PipelineSettings};
use crate::report::ReportHandle;
use crate::steering::{AxisEstimator, AxisSmoother, MaskCleaner};
use chrono::Local;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

pub struct SteeringLoop {
    masks: MaskReceiver,
    cleaner: Box<dyn MaskCleaner>,
    estimator: AxisEstimator,
    smoother: AxisSmoother,
    attitude: Box<dyn AttitudeSource>,
    report: ReportHandle,
    tick: Duration,
    verbose: bool,
    frames_processed: u64,
}

impl SteeringLoop {
    pub fn new(
        masks: MaskReceiver,
        cleaner: Box<dyn MaskCleaner>,
        attitude: Box<dyn AttitudeSource>,
        report: ReportHandle,
        estimator_settings: &EstimatorSettings,
        pipeline_settings: &PipelineSettings,
    ) -> Self {
        Self {
            masks,
            cleaner,
            estimator: AxisEstimator::new(estimator_settings),
            smoother: AxisSmoother::new(),
            attitude,
            report,
            tick: Duration::from_millis(pipeline_settings.tick_ms.max(1)),
            verbose: false,
            frames_processed: 0,
        }
    }

    /// Echo every updated report to stdout
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// One loop iteration; returns whether the report changed
    pub fn step(&mut self) -> bool {
        let mut updated = false;

        if self.masks.has_changed().unwrap_or(false) {
            let mask = self.masks.borrow_and_update().clone();
            if let Some(mask) = mask {
                let cleaned = self.cleaner.clean(&mask);
                let raw = self.estimator.estimate(&cleaned);
                trace!("Raw axis sample: {}", raw);
                self.frames_processed += 1;

                if let Some(x2) = self.smoother.push(raw) {
                    self.report.set_steering(x2);
                    updated = true;
                }
            }
        }

        if let Some(sample) = self.attitude.poll() {
            self.report.apply_attitude(sample);
            updated = true;
        }

        if updated && self.verbose {
            println!("{}", self.report.snapshot());
        }
        updated
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Starting steering loop with {:?} tick", self.tick);

        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_log_time = Local::now();
        let mut last_count = 0;
        let log_interval = chrono::Duration::seconds(10);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.step();
                }
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Steering loop stats: processed {} masks in last {} seconds",
                    self.frames_processed - last_count,
                    log_interval.num_seconds()
                );
                last_count = self.frames_processed;
                last_log_time = now;
            }
        }

        debug!(
            "Steering loop stopped with smoothing history {:?}",
            self.smoother.history()
        );
        info!("Steering loop stopped after {} masks", self.frames_processed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::AttitudeSample;
    use crate::steering::{BinarizedFrame, PassThrough, FOREGROUND, WINDOW};
    use std::sync::Arc;
    use tokio::sync::watch;

    struct ScriptedAttitude(Vec<AttitudeSample>);

    impl AttitudeSource for ScriptedAttitude {
        fn poll(&mut self) -> Option<AttitudeSample> {
            self.0.pop()
        }
    }

    // Foreground in the bottom-left corner only
    fn left_heavy_mask() -> BinarizedFrame {
        let mut mask = BinarizedFrame::new(8, 40);
        for row in 30..40 {
            for col in 0..3 {
                mask.cells_mut()[row * 8 + col] = FOREGROUND;
            }
        }
        mask
    }

    fn steering_loop(
        attitude: Box<dyn AttitudeSource>,
    ) -> (SteeringLoop, watch::Sender<Option<Arc<BinarizedFrame>>>, ReportHandle) {
        let (sender, masks) = watch::channel(None);
        let report = ReportHandle::new(0x55);
        let steering = SteeringLoop::new(
            masks,
            Box::new(PassThrough),
            attitude,
            report.clone(),
            &EstimatorSettings { border: 0 },
            &PipelineSettings::default(),
        );
        (steering, sender, report)
    }

    #[test]
    fn masks_are_processed_once() {
        let (mut steering, sender, report) = steering_loop(Box::new(crate::attitude::IdleAttitude));
        let mask = Arc::new(left_heavy_mask());

        for _ in 0..WINDOW - 1 {
            sender.send_replace(Some(mask.clone()));
            assert!(!steering.step());
            // No new mask, nothing to do
            assert!(!steering.step());
        }
        sender.send_replace(Some(mask));
        assert!(steering.step());

        let x2 = report.snapshot().x2;
        assert!(x2 > 0);
        assert_eq!(steering.frames_processed, WINDOW as u64);
    }

    #[test]
    fn attitude_updates_are_applied() {
        let sample = AttitudeSample {
            x1: 3,
            y1: -4,
            buttons: 1,
        };
        let (mut steering, _sender, report) =
            steering_loop(Box::new(ScriptedAttitude(vec![sample])));

        assert!(steering.step());
        assert!(!steering.step());
        let snapshot = report.snapshot();
        assert_eq!((snapshot.x1, snapshot.y1, snapshot.buttons), (3, -4, 1));
        assert_eq!(snapshot.x2, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_on_cancel() {
        let (steering, _sender, _report) = steering_loop(Box::new(crate::attitude::IdleAttitude));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(steering.run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        assert!(task.await.is_ok());
    }
}
