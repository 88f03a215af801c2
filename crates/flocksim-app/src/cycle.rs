//! Fixed-rate frame cycling for decorative effects (e.g. an animated light
//! cookie). Entirely independent of the simulation core.

/// Cycles an index over `frame_count` frames at a fixed frame rate.
///
/// When polling falls behind schedule, the next deadline snaps forward to one
/// step past the observed time instead of replaying missed frames.
#[derive(Debug, Clone)]
pub struct FrameCycle {
    frame_count: usize,
    step: f64,
    next_time: f64,
    index: usize,
    current: usize,
}

impl FrameCycle {
    /// Create a cycler over `frame_count` frames advancing at `frames_per_second`.
    #[must_use]
    pub fn new(frame_count: usize, frames_per_second: f64) -> Self {
        Self {
            frame_count: frame_count.max(1),
            step: 1.0 / frames_per_second,
            next_time: 0.0,
            index: 0,
            current: 0,
        }
    }

    /// Advance the cycle to `now` and return the frame currently displayed.
    pub fn poll(&mut self, now: f64) -> usize {
        if now >= self.next_time {
            self.current = self.index;
            self.index += 1;
            if self.index == self.frame_count {
                self.index = 0;
            }
            self.next_time += self.step;
            if self.next_time <= now {
                self.next_time = now + self.step;
            }
        }
        self.current
    }
}
