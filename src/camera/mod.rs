//! Depth camera lifecycle
//!
//! A [`DepthSource`] delivers raw z16 frames on its own thread. [`DepthCamera`]
//! wraps it in a two-state machine:
//!
//! 1. `Discovering` - checks that a device exists
//! 2. `Streaming` - filters every delivered frame and publishes the newest mask
//!
//! ```text
//! DepthSource ──[DepthFrame]──► DepthThresholdFilter ──► watch<Option<Arc<BinarizedFrame>>>
//!             (source thread)
//! ```
//!
//! Only the latest mask is kept. A slow consumer skips frames instead of queueing them.

pub mod replay;

pub use replay::ReplaySource;

use crate::config::FilterSettings;
use crate::steering::{BinarizedFrame, DepthThresholdFilter};
use chrono::Local;
use statum::{machine, state};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

pub type MaskSender = watch::Sender<Option<Arc<BinarizedFrame>>>;
pub type MaskReceiver = watch::Receiver<Option<Arc<BinarizedFrame>>>;

/// Called by a source for every captured frame
pub type FrameCallback = Box<dyn FnMut(DepthFrame) + Send + 'static>;

// Camera errors
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("No depth camera device found")]
    NoDeviceError,

    #[error("Failed to start depth stream: {0}")]
    StreamError(String),

    #[error("Frame of {width}x{height} needs {expected} samples, got {actual}")]
    FrameShapeError {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}

/// One row-major frame of 16-bit depth samples, 0 meaning no return
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepthFrame {
    width: usize,
    height: usize,
    samples: Vec<u16>,
}

impl DepthFrame {
    pub fn new(width: usize, height: usize, samples: Vec<u16>) -> Result<Self, CameraError> {
        let expected = width * height;
        if samples.len() != expected {
            return Err(CameraError::FrameShapeError {
                width,
                height,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[u16] {
        &self.samples
    }
}

/// Device side of the camera: discovery and per-frame delivery
pub trait DepthSource: Send + fmt::Debug {
    fn device_count(&self) -> usize;

    /// Starts streaming; `on_frame` runs on the source's own thread
    fn start(&mut self, on_frame: FrameCallback) -> Result<(), CameraError>;

    fn stop(&mut self);
}

#[state]
#[derive(Debug, Clone)]
pub enum CameraState {
    Discovering,
    Streaming,
}

#[machine]
#[derive(Debug)]
pub struct DepthCamera<S: CameraState> {
    source: Box<dyn DepthSource>,

    // Filter parameters handed to the frame callback
    filter_settings: FilterSettings,

    // Newest mask for the steering loop
    mask_sender: Arc<MaskSender>,
}

impl DepthCamera<Discovering> {
    pub fn create(
        source: Box<dyn DepthSource>,
        filter_settings: FilterSettings,
    ) -> (Self, MaskReceiver) {
        debug!("Creating depth camera with filter settings: {:?}", filter_settings);
        let (mask_sender, mask_receiver) = watch::channel(None);
        (
            Self::new(source, filter_settings, Arc::new(mask_sender)),
            mask_receiver,
        )
    }

    // Check for a device and start the stream
    pub fn start(mut self) -> Result<DepthCamera<Streaming>, CameraError> {
        let devices = self.source.device_count();
        if devices == 0 {
            error!("No depth camera device discovered");
            return Err(CameraError::NoDeviceError);
        }
        info!("Found {} depth camera device(s), using the first", devices);

        let sender = self.mask_sender.clone();
        let mut filter = DepthThresholdFilter::new(&self.filter_settings);
        let mut frame_count: u64 = 0;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(10);

        self.source.start(Box::new(move |frame: DepthFrame| {
            let mask = filter.apply(&frame).clone();
            sender.send_replace(Some(Arc::new(mask)));
            frame_count += 1;

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Depth stream stats: filtered {} frames in last {} seconds",
                    frame_count,
                    log_interval.num_seconds()
                );
                frame_count = 0;
                last_log_time = now;
            }
        }))?;

        info!("Depth stream started");
        Ok(self.transition())
    }
}

impl DepthCamera<Streaming> {
    pub fn stop(mut self) {
        info!("Stopping depth stream");
        self.source.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steering::FOREGROUND;
    use std::sync::Mutex;

    /// Delivers a fixed list of frames synchronously from `start`
    #[derive(Debug)]
    struct ScriptedSource {
        devices: usize,
        frames: Vec<DepthFrame>,
        stopped: Arc<Mutex<bool>>,
    }

    impl DepthSource for ScriptedSource {
        fn device_count(&self) -> usize {
            self.devices
        }

        fn start(&mut self, mut on_frame: FrameCallback) -> Result<(), CameraError> {
            for frame in self.frames.drain(..) {
                on_frame(frame);
            }
            Ok(())
        }

        fn stop(&mut self) {
            *self.stopped.lock().unwrap() = true;
        }
    }

    #[test]
    fn frame_rejects_wrong_sample_count() {
        let err = DepthFrame::new(3, 2, vec![0; 5]).unwrap_err();
        assert!(matches!(
            err,
            CameraError::FrameShapeError {
                expected: 6,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn missing_device_fails_start() {
        let source = ScriptedSource {
            devices: 0,
            frames: Vec::new(),
            stopped: Arc::default(),
        };
        let (camera, _masks) = DepthCamera::create(Box::new(source), FilterSettings::default());
        assert!(matches!(camera.start(), Err(CameraError::NoDeviceError)));
    }

    #[test]
    fn streaming_publishes_latest_mask() {
        let stopped = Arc::new(Mutex::new(false));
        let source = ScriptedSource {
            devices: 1,
            frames: vec![
                DepthFrame::new(2, 1, vec![10, 20]).unwrap(),
                DepthFrame::new(3, 1, vec![10, 20, 30]).unwrap(),
            ],
            stopped: stopped.clone(),
        };
        let (camera, masks) = DepthCamera::create(Box::new(source), FilterSettings::default());
        let camera = camera.start().unwrap();

        let mask = masks.borrow().clone().unwrap();
        assert!(mask.has_shape(3, 1));
        assert_eq!(mask.cells()[1], FOREGROUND);

        camera.stop();
        assert!(*stopped.lock().unwrap());
    }
}
