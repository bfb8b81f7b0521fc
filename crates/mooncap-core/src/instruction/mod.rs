//! User-facing instruction state machine
//!
//! Reflects the latest detection outcome as a short instruction for the
//! person holding the camera.

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consecutive misses before reverting to `Searching` with no hysteresis
pub const DEFAULT_MISS_TOLERANCE: u32 = 1;

/// What the user is being told to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionState {
    /// No moon in the latest frame
    #[default]
    Searching,
    /// Moon found, camera is being steered onto it
    Tracking,
}

impl InstructionState {
    pub fn display_text(&self) -> &'static str {
        match self {
            InstructionState::Searching => "Point the camera at the moon",
            InstructionState::Tracking => "Hold the camera steady",
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self, InstructionState::Tracking)
    }
}

impl fmt::Display for InstructionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_text())
    }
}

/// Message published to the UI after every detection cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstructionUpdate {
    pub state: InstructionState,
    pub text: &'static str,
    /// The state differs from the previous cycle's
    pub changed: bool,
}

/// Searching/Tracking machine driven by per-frame detection results
#[derive(Debug, Clone)]
pub struct InstructionMachine {
    state: InstructionState,
    consecutive_misses: u32,
    miss_tolerance: u32,
}

impl InstructionMachine {
    pub fn new() -> Self {
        Self::with_miss_tolerance(DEFAULT_MISS_TOLERANCE)
    }

    /// Require `tolerance` consecutive misses before leaving `Tracking`.
    ///
    /// A tolerance of 1 (or 0) reverts on the first miss.
    pub fn with_miss_tolerance(tolerance: u32) -> Self {
        Self {
            state: InstructionState::Searching,
            consecutive_misses: 0,
            miss_tolerance: tolerance.max(1),
        }
    }

    pub fn state(&self) -> InstructionState {
        self.state
    }

    pub fn miss_tolerance(&self) -> u32 {
        self.miss_tolerance
    }

    /// Feed one detection outcome and return the update to publish
    pub fn observe(&mut self, found: bool) -> InstructionUpdate {
        let previous = self.state;

        self.state = if found {
            self.consecutive_misses = 0;
            InstructionState::Tracking
        } else {
            self.consecutive_misses = self.consecutive_misses.saturating_add(1);
            if previous.is_tracking() && self.consecutive_misses < self.miss_tolerance {
                InstructionState::Tracking
            } else {
                InstructionState::Searching
            }
        };

        let changed = self.state != previous;
        if changed {
            info!("instruction: {:?} -> {:?}", previous, self.state);
        }

        InstructionUpdate {
            state: self.state,
            text: self.state.display_text(),
            changed,
        }
    }
}

impl Default for InstructionMachine {
    fn default() -> Self {
        Self::new()
    }
}
