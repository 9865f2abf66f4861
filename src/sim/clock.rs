//! Frame scheduling: host timestamps to simulated frame deltas
//!
//! One simulation step runs per display refresh. A frame cap skips refreshes
//! that arrive too early, long gaps are clamped, and time spent paused never
//! reaches the simulation.

use crate::consts::MAX_FRAME_DELTA_MS;

/// Delta reported for the first frame after start or resume
pub const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_time: Option<f64>,
    min_frame_ms: f64,
    paused: bool,
    frames: u64,
}

impl FrameClock {
    pub fn new(max_fps: Option<u32>) -> Self {
        let mut clock = Self::default();
        clock.set_max_fps(max_fps);
        clock
    }

    /// Frame cap (None or 0 = uncapped)
    pub fn set_max_fps(&mut self, max_fps: Option<u32>) {
        self.min_frame_ms = match max_fps {
            Some(fps) if fps > 0 => 1000.0 / fps as f64,
            _ => 0.0,
        };
    }

    pub fn pause(&mut self) {
        if !self.paused {
            log::info!("Paused after {} frames", self.frames);
        }
        self.paused = true;
    }

    /// Resume; the paused gap is discarded
    pub fn resume(&mut self) {
        if self.paused {
            log::info!("Resumed");
        }
        self.paused = false;
        self.last_time = None;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Frames that produced a step
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Delta in ms to simulate for a refresh at host time `now_ms`
    ///
    /// Returns None while paused or when the frame cap says to skip.
    pub fn frame(&mut self, now_ms: f64) -> Option<f64> {
        if self.paused || !now_ms.is_finite() {
            return None;
        }

        let dt = match self.last_time {
            None => NOMINAL_FRAME_MS,
            Some(last) => {
                let dt = now_ms - last;
                if dt < self.min_frame_ms {
                    return None;
                }
                dt.clamp(0.0, MAX_FRAME_DELTA_MS)
            }
        };

        self.last_time = Some(now_ms);
        self.frames += 1;
        Some(dt)
    }
}
