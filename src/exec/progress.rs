// src/exec/progress.rs

//! Line-count progress heuristic.
//!
//! The total amount of output a script will produce is unknown, so progress
//! is an approximation: every stdout line adds `step` percent, up to `cap`.
//! The cap sits below 100 so a running task never looks finished; only a
//! terminal transition sets 100.

use crate::task::record::MAX_RUNNING_PROGRESS;

pub const DEFAULT_PROGRESS_STEP: u8 = 5;
pub const DEFAULT_PROGRESS_CAP: u8 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPolicy {
    step: u8,
    cap: u8,
}

impl ProgressPolicy {
    /// `step` is raised to at least 1 and `cap` is clamped to `1..=99`.
    pub fn new(step: u8, cap: u8) -> Self {
        Self {
            step: step.max(1),
            cap: cap.clamp(1, MAX_RUNNING_PROGRESS),
        }
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn cap(&self) -> u8 {
        self.cap
    }

    /// Progress after `lines` stdout lines have been seen.
    pub fn for_lines(&self, lines: usize) -> u8 {
        let raw = lines.saturating_mul(usize::from(self.step));
        // Bounded by `cap`, which fits in a u8.
        raw.min(usize::from(self.cap)) as u8
    }
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_STEP, DEFAULT_PROGRESS_CAP)
    }
}
