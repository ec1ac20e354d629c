//! Cooperative time slicing for resumable import/export sessions.

use std::time::{Duration, Instant};

/// Decision returned by [`TimeSlicer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceState {
    /// Keep working in this step.
    Continue,
    /// Hand control back to the host loop.
    Yield,
}

/// Outcome of one step of a resumable session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The slicer asked for a yield; call `step` again.
    Yielded,
    /// All work, hooks included, is done.
    Complete,
}

/// Decides when a session should hand control back to its caller.
///
/// Sessions call [`reset`](TimeSlicer::reset) at the start of every step
/// and [`tick`](TimeSlicer::tick) after each unit of work.
pub trait TimeSlicer {
    fn tick(&mut self) -> SliceState;
    fn reset(&mut self);
}

/// Never yields.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl TimeSlicer for Unbounded {
    fn tick(&mut self) -> SliceState {
        SliceState::Continue
    }

    fn reset(&mut self) {}
}

/// Yields after a fixed number of ticks per step.
#[derive(Debug, Clone)]
pub struct WorkUnitSlicer {
    budget: usize,
    spent: usize,
}

impl WorkUnitSlicer {
    /// A budget of zero is treated as one.
    pub fn new(budget: usize) -> Self {
        Self {
            budget: budget.max(1),
            spent: 0,
        }
    }
}

impl TimeSlicer for WorkUnitSlicer {
    fn tick(&mut self) -> SliceState {
        self.spent += 1;
        if self.spent >= self.budget {
            SliceState::Yield
        } else {
            SliceState::Continue
        }
    }

    fn reset(&mut self) {
        self.spent = 0;
    }
}

/// Yields once the time since the last reset exceeds a budget.
#[derive(Debug, Clone)]
pub struct WallClockSlicer {
    budget: Duration,
    started: Instant,
}

impl WallClockSlicer {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            started: Instant::now(),
        }
    }
}

impl TimeSlicer for WallClockSlicer {
    fn tick(&mut self) -> SliceState {
        if self.started.elapsed() > self.budget {
            SliceState::Yield
        } else {
            SliceState::Continue
        }
    }

    fn reset(&mut self) {
        self.started = Instant::now();
    }
}
