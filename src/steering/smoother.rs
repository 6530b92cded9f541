//! Fixed-window averaging of raw steering samples

use tracing::debug;

/// Number of raw samples averaged into one steering value
pub const WINDOW: usize = 6;

/// Ring of the last raw samples with a fill cursor in `[0, WINDOW)`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AxisHistory {
    slots: [i32; WINDOW],
    cursor: usize,
}

impl AxisHistory {
    pub fn slots(&self) -> &[i32; WINDOW] {
        &self.slots
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reset(&mut self) {
        self.slots = [0; WINDOW];
        self.cursor = 0;
    }

    fn mean(&self) -> i32 {
        self.slots.iter().sum::<i32>() / WINDOW as i32
    }
}

#[derive(Clone, Debug, Default)]
pub struct AxisSmoother {
    history: AxisHistory,
}

impl AxisSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &AxisHistory {
        &self.history
    }

    /// Feeds one raw sample; returns the window mean once every `WINDOW` samples.
    ///
    /// A zero sample means the frame lost its foreground. It wipes every slot
    /// but still occupies a position in the window. Slots are kept after an
    /// emission and only overwritten by later samples.
    pub fn push(&mut self, sample: i32) -> Option<i8> {
        if sample == 0 {
            debug!("Zero axis sample, clearing smoothing history");
            self.history.slots = [0; WINDOW];
        } else {
            self.history.slots[self.history.cursor] = sample;
        }
        self.history.cursor += 1;

        if self.history.cursor < WINDOW {
            return None;
        }

        self.history.cursor = 0;
        let mean = self.history.mean().clamp(i8::MIN.into(), i8::MAX.into());
        Some(mean as i8)
    }
}
