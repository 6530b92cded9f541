//! Steering axis from left/right row-centroid asymmetry

use super::BinarizedFrame;
use crate::config::EstimatorSettings;

pub const AXIS_MIN: i32 = -128;
pub const AXIS_MAX: i32 = 127;

/// Span of centroid differences mapped onto the full axis range (±30 rows)
const INPUT_SPAN: f64 = 60.0;

/// Scales a centroid difference onto `[min, max]`, clipping instead of wrapping
pub fn normalize(min: i32, max: i32, left: f64, right: f64) -> i32 {
    let angle = ((left - right) * f64::from(max - min) / INPUT_SPAN) as i32;
    angle.clamp(min, max)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Bucket {
    rows: u64,
    count: u64,
}

impl Bucket {
    fn add(&mut self, row: usize) {
        self.rows += row as u64;
        self.count += 1;
    }

    // The +1 keeps empty buckets at zero and damps sparse ones
    fn mean_row(&self) -> f64 {
        (self.rows / (self.count + 1)) as f64
    }
}

#[derive(Clone, Debug)]
pub struct AxisEstimator {
    border: usize,
}

impl AxisEstimator {
    pub fn new(settings: &EstimatorSettings) -> Self {
        Self {
            border: settings.border,
        }
    }

    /// Raw steering sample in `[AXIS_MIN, AXIS_MAX]`
    pub fn estimate(&self, mask: &BinarizedFrame) -> i32 {
        let (width, height) = (mask.width(), mask.height());
        let midpoint = width / 2;
        let mut left = Bucket::default();
        let mut right = Bucket::default();

        let rows = self.border..height.saturating_sub(self.border);
        let cols = self.border..width.saturating_sub(self.border);

        for row in rows {
            for col in cols.clone() {
                if !mask.is_foreground(col, row) {
                    continue;
                }
                if col <= midpoint {
                    left.add(row);
                } else {
                    right.add(row);
                }
            }
        }

        normalize(AXIS_MIN, AXIS_MAX, left.mean_row(), right.mean_row())
    }
}
