//! Replays a recorded depth stream as if it came from a device
//!
//! The recording is a plain concatenation of frames, each `width * height`
//! little-endian u16 samples. Playback loops at the configured frame rate.

use super::{CameraError, DepthFrame, DepthSource, FrameCallback};
use crate::config::CameraSettings;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub struct ReplaySource {
    path: Option<PathBuf>,
    width: usize,
    height: usize,
    frame_interval: Duration,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            path: settings.replay_path.clone(),
            width: settings.width,
            height: settings.height,
            frame_interval: Duration::from_secs(1) / settings.fps.max(1),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

// Reads the next frame, rewinding once at end of file
fn read_frame<R: Read + Seek>(
    reader: &mut R,
    buf: &mut [u8],
    width: usize,
    height: usize,
) -> io::Result<DepthFrame> {
    if let Err(e) = reader.read_exact(buf) {
        if e.kind() != io::ErrorKind::UnexpectedEof {
            return Err(e);
        }
        debug!("Replay reached end of recording, rewinding");
        reader.seek(SeekFrom::Start(0))?;
        reader.read_exact(buf)?;
    }

    let samples = buf
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    DepthFrame::new(width, height, samples)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

impl DepthSource for ReplaySource {
    fn device_count(&self) -> usize {
        match &self.path {
            Some(path) if path.is_file() => 1,
            Some(path) => {
                warn!("Replay recording {} not found", path.display());
                0
            }
            None => 0,
        }
    }

    fn start(&mut self, mut on_frame: FrameCallback) -> Result<(), CameraError> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| CameraError::StreamError("no recording configured".to_string()))?;
        let file = File::open(&path)
            .map_err(|e| CameraError::StreamError(format!("{}: {}", path.display(), e)))?;
        info!(
            "Replaying {} as {}x{} depth stream",
            path.display(),
            self.width,
            self.height
        );

        let (width, height, interval) = (self.width, self.height, self.frame_interval);
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        let worker = std::thread::Builder::new()
            .name("depth-replay".to_string())
            .spawn(move || {
                let mut reader = BufReader::new(file);
                let mut buf = vec![0u8; width * height * 2];
                while running.load(Ordering::SeqCst) {
                    match read_frame(&mut reader, &mut buf, width, height) {
                        Ok(frame) => on_frame(frame),
                        Err(e) => {
                            error!("Replay stream failed: {}", e);
                            break;
                        }
                    }
                    std::thread::sleep(interval);
                }
                debug!("Replay thread exiting");
            })
            .map_err(|e| CameraError::StreamError(e.to_string()))?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Replay thread panicked");
            }
        }
    }
}
