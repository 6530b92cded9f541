//! Depth-to-steering pipeline
//!
//! ```text
//! DepthFrame ──► DepthThresholdFilter ──► MaskCleaner ──► AxisEstimator ──► AxisSmoother ──► x2
//!               (camera thread)          (steering loop)
//! ```

pub mod cleaner;
pub mod estimator;
pub mod filter;
pub mod smoother;

pub use cleaner::{MaskCleaner, Morphology, PassThrough};
pub use estimator::{normalize, AxisEstimator, AXIS_MAX, AXIS_MIN};
pub use filter::{DepthThresholdFilter, Region, RegionMinima};
pub use smoother::{AxisHistory, AxisSmoother, WINDOW};

pub const FOREGROUND: u16 = u16::MAX;
pub const BACKGROUND: u16 = 0;

/// Row-major foreground/background mask
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BinarizedFrame {
    width: usize,
    height: usize,
    cells: Vec<u16>,
}

impl BinarizedFrame {
    /// All-background mask of the given shape
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![BACKGROUND; width * height],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn has_shape(&self, width: usize, height: usize) -> bool {
        self.width == width && self.height == height
    }

    pub fn cells(&self) -> &[u16] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [u16] {
        &mut self.cells
    }

    pub fn is_foreground(&self, col: usize, row: usize) -> bool {
        self.cells[row * self.width + col] != BACKGROUND
    }

    pub fn foreground_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell != BACKGROUND).count()
    }
}
