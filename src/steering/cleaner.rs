//! Mask denoising between the filter and the estimator

use super::{BinarizedFrame, BACKGROUND, FOREGROUND};

/// Removes speckle from a binarized mask. Output has the input's shape.
pub trait MaskCleaner: Send {
    fn clean(&mut self, mask: &BinarizedFrame) -> BinarizedFrame;
}

/// Leaves the mask untouched
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThrough;

impl MaskCleaner for PassThrough {
    fn clean(&mut self, mask: &BinarizedFrame) -> BinarizedFrame {
        mask.clone()
    }
}

/// 3x3 morphological open followed by a 3x3 close.
///
/// Neighbours outside the frame are ignored, so borders neither erode nor grow.
#[derive(Clone, Debug, Default)]
pub struct Morphology {
    scratch: BinarizedFrame,
}

#[derive(Clone, Copy)]
enum Op {
    Erode,
    Dilate,
}

impl Morphology {
    pub fn new() -> Self {
        Self::default()
    }

    fn pass(src: &BinarizedFrame, dst: &mut BinarizedFrame, op: Op) {
        if !dst.has_shape(src.width(), src.height()) {
            *dst = BinarizedFrame::new(src.width(), src.height());
        }
        let (width, height) = (src.width(), src.height());

        for row in 0..height {
            for col in 0..width {
                let rows = row.saturating_sub(1)..=(row + 1).min(height - 1);
                let mut neighbours = rows.flat_map(|r| {
                    let cols = col.saturating_sub(1)..=(col + 1).min(width - 1);
                    cols.map(move |c| src.is_foreground(c, r))
                });
                let set = match op {
                    Op::Erode => neighbours.all(|fg| fg),
                    Op::Dilate => neighbours.any(|fg| fg),
                };
                dst.cells_mut()[row * width + col] = if set { FOREGROUND } else { BACKGROUND };
            }
        }
    }
}

impl MaskCleaner for Morphology {
    fn clean(&mut self, mask: &BinarizedFrame) -> BinarizedFrame {
        let mut out = BinarizedFrame::new(mask.width(), mask.height());
        if mask.cells().is_empty() {
            return out;
        }

        // open
        Self::pass(mask, &mut self.scratch, Op::Erode);
        Self::pass(&self.scratch, &mut out, Op::Dilate);
        // close
        Self::pass(&out, &mut self.scratch, Op::Dilate);
        Self::pass(&self.scratch, &mut out, Op::Erode);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(width: usize, rows: &[&str]) -> BinarizedFrame {
        let mut mask = BinarizedFrame::new(width, rows.len());
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                if ch == '#' {
                    mask.cells_mut()[r * width + c] = FOREGROUND;
                }
            }
        }
        mask
    }

    #[test]
    fn opening_removes_isolated_pixels() {
        let mask = mask_from(5, &[".....", ".....", "..#..", ".....", "....."]);
        let cleaned = Morphology::new().clean(&mask);
        assert_eq!(cleaned.foreground_count(), 0);
    }

    #[test]
    fn closing_fills_single_holes() {
        let mask = mask_from(
            6,
            &["######", "######", "##.###", "######", "######"],
        );
        let cleaned = Morphology::new().clean(&mask);
        assert_eq!(cleaned.foreground_count(), 30);
    }

    #[test]
    fn solid_blocks_survive() {
        let mask = mask_from(
            8,
            &[
                "........", "........", "..####..", "..####..", "..####..", "........",
                "........",
            ],
        );
        let cleaned = Morphology::new().clean(&mask);
        assert_eq!(cleaned, mask);
    }

    #[test]
    fn shape_is_preserved() {
        let mask = BinarizedFrame::new(7, 3);
        let cleaned = Morphology::new().clean(&mask);
        assert!(cleaned.has_shape(7, 3));
        assert_eq!(PassThrough.clean(&mask), mask);
        assert_eq!(Morphology::new().clean(&BinarizedFrame::empty()).cells().len(), 0);
    }
}
