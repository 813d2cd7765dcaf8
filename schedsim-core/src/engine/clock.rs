//! Tick counter shared by every component of a simulation.

use std::cell::Cell;
use std::rc::Rc;

/// Monotonic simulation clock.
///
/// The engine owns the only `SimulationClock` and is its single writer.
/// Resources and state views read the same counter through [`ClockHandle`]s
/// handed out at construction. Time only moves forward one tick at a time;
/// `reset` is reserved for starting an independent run.
#[derive(Debug, Default)]
pub struct SimulationClock {
    now: Rc<Cell<u64>>,
}

impl SimulationClock {
    /// Creates a clock at tick zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current tick.
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Advances the clock by exactly one tick.
    pub fn tick(&mut self) {
        self.now.set(self.now.get() + 1);
    }

    /// Rewinds to tick zero. Never used mid-run.
    pub fn reset(&mut self) {
        self.now.set(0);
    }

    /// Returns a read-only view of this clock.
    pub fn handle(&self) -> ClockHandle {
        ClockHandle {
            now: Rc::clone(&self.now),
        }
    }
}

/// Read-only view of a [`SimulationClock`].
#[derive(Debug, Clone)]
pub struct ClockHandle {
    now: Rc<Cell<u64>>,
}

impl ClockHandle {
    /// Returns the current tick of the owning clock.
    pub fn now(&self) -> u64 {
        self.now.get()
    }
}
