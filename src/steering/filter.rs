//! Adaptive two-region depth binarization

use super::{BinarizedFrame, BACKGROUND, FOREGROUND};
use crate::camera::DepthFrame;
use crate::config::FilterSettings;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Left,
    Right,
}

impl Region {
    /// Region-assignment rule. Classifies by depth band parity, not by column.
    pub fn of(depth: u16, split: u16) -> Region {
        if (depth / split) % 2 != 0 {
            Region::Right
        } else {
            Region::Left
        }
    }
}

/// Nearest valid sample per region
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionMinima {
    pub left: u16,
    pub right: u16,
}

impl RegionMinima {
    fn of(&self, region: Region) -> u16 {
        match region {
            Region::Left => self.left,
            Region::Right => self.right,
        }
    }
}

/// Binarizes depth frames, owning an output buffer sized to the last frame
#[derive(Debug)]
pub struct DepthThresholdFilter {
    range: u16,
    region_split: u16,
    output: BinarizedFrame,
}

impl DepthThresholdFilter {
    pub fn new(settings: &FilterSettings) -> Self {
        Self {
            range: settings.range,
            // A zero split would divide by zero; treat it as one band per unit
            region_split: settings.region_split.max(1),
            output: BinarizedFrame::empty(),
        }
    }

    /// First pass: minimum positive depth per region, `u16::MAX` when a region is empty
    pub fn minima(&self, frame: &DepthFrame) -> RegionMinima {
        let mut minima = RegionMinima {
            left: u16::MAX,
            right: u16::MAX,
        };

        for &depth in frame.samples() {
            if depth == 0 {
                continue;
            }
            let slot = match Region::of(depth, self.region_split) {
                Region::Left => &mut minima.left,
                Region::Right => &mut minima.right,
            };
            if depth < *slot {
                *slot = depth;
            }
        }

        minima
    }

    /// Filters `frame` into the owned buffer and returns it.
    ///
    /// The buffer is reallocated whenever the frame shape changes, so the
    /// result never carries cells from an earlier, differently sized frame.
    pub fn apply(&mut self, frame: &DepthFrame) -> &BinarizedFrame {
        let minima = self.minima(frame);
        trace!("Region minima: left={} right={}", minima.left, minima.right);

        if !self.output.has_shape(frame.width(), frame.height()) {
            debug!(
                "Resizing filter buffer to {}x{}",
                frame.width(),
                frame.height()
            );
            self.output = BinarizedFrame::new(frame.width(), frame.height());
        }

        let range = u32::from(self.range);
        for (cell, &depth) in self.output.cells_mut().iter_mut().zip(frame.samples()) {
            let min = minima.of(Region::of(depth, self.region_split));
            let upper = u32::from(min) + range;
            let value = u32::from(depth);
            *cell = if depth > min && value < upper {
                FOREGROUND
            } else {
                BACKGROUND
            };
        }

        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(range: u16, region_split: u16) -> DepthThresholdFilter {
        DepthThresholdFilter::new(&FilterSettings {
            range,
            region_split,
        })
    }

    #[test]
    fn region_rule_uses_depth_parity() {
        assert_eq!(Region::of(0, 314), Region::Left);
        assert_eq!(Region::of(313, 314), Region::Left);
        assert_eq!(Region::of(314, 314), Region::Right);
        assert_eq!(Region::of(627, 314), Region::Right);
        assert_eq!(Region::of(628, 314), Region::Left);
    }

    #[test]
    fn output_is_strictly_binary() {
        let samples: Vec<u16> = (0..64u16).map(|i| i.wrapping_mul(997)).collect();
        let frame = DepthFrame::new(8, 8, samples).unwrap();
        let mut filter = filter(150, 314);
        let mask = filter.apply(&frame);
        assert!(mask
            .cells()
            .iter()
            .all(|&cell| cell == FOREGROUND || cell == BACKGROUND));
    }

    #[test]
    fn acceptance_window_is_open_on_both_ends() {
        // All samples fall in the left band of a split of 1000
        let frame = DepthFrame::new(5, 1, vec![100, 101, 249, 250, 0]).unwrap();
        let mut filter = filter(150, 1000);
        let mask = filter.apply(&frame);
        assert_eq!(
            mask.cells(),
            &[BACKGROUND, FOREGROUND, FOREGROUND, BACKGROUND, BACKGROUND]
        );
    }

    #[test]
    fn regions_track_independent_minima() {
        let frame = DepthFrame::new(4, 1, vec![100, 120, 300, 320]).unwrap();
        let mut filter = filter(150, 200);
        assert_eq!(
            filter.minima(&frame),
            RegionMinima {
                left: 100,
                right: 300
            }
        );
        let mask = filter.apply(&frame);
        assert_eq!(mask.cells(), &[BACKGROUND, FOREGROUND, BACKGROUND, FOREGROUND]);
    }

    #[test]
    fn empty_region_defaults_to_max_depth() {
        let frame = DepthFrame::new(3, 1, vec![0, 10, 20]).unwrap();
        let filter = filter(150, 200);
        let minima = filter.minima(&frame);
        assert_eq!(minima.left, 10);
        assert_eq!(minima.right, u16::MAX);
    }

    #[test]
    fn max_depth_never_overflows_window() {
        let frame = DepthFrame::new(2, 1, vec![u16::MAX, u16::MAX - 1]).unwrap();
        let mut filter = filter(u16::MAX, 1);
        // Each sample is alone in its region and therefore equal to the minimum
        let mask = filter.apply(&frame);
        assert_eq!(mask.cells(), &[BACKGROUND, BACKGROUND]);
    }

    #[test]
    fn buffer_follows_frame_shape() {
        let mut filter = filter(150, 314);

        let large = DepthFrame::new(4, 4, vec![50; 16]).unwrap();
        assert_eq!(filter.apply(&large).cells().len(), 16);

        let small = DepthFrame::new(2, 1, vec![10, 20]).unwrap();
        let mask = filter.apply(&small);
        assert_eq!(mask.cells().len(), 2);
        assert_eq!((mask.width(), mask.height()), (2, 1));
        assert_eq!(mask.cells(), &[BACKGROUND, FOREGROUND]);
    }
}
