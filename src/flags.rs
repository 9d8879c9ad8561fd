//! Latched event flags raised from interrupt context and drained by the control core.

use portable_atomic::{AtomicBool, Ordering};

use crate::config::{Cadence, TickKind};

/// Single-writer, single-reader latched boolean.
///
/// The interrupt side only ever calls [`EventFlag::signal`]; the control core
/// reads and clears in one step with [`EventFlag::take`], so each occurrence is
/// observed at most once.
pub struct EventFlag(AtomicBool);

impl EventFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Read and clear.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for EventFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Every interrupt-origin flag the control core polls.
pub struct InterruptFlags {
    pub tap: EventFlag,
    pub freefall: EventFlag,
    pub mode_change: EventFlag,
    pub test_tick: EventFlag,
    pub normal_tick: EventFlag,
    pub stats_tick: EventFlag,
}

impl InterruptFlags {
    pub const fn new() -> Self {
        Self {
            tap: EventFlag::new(),
            freefall: EventFlag::new(),
            mode_change: EventFlag::new(),
            test_tick: EventFlag::new(),
            normal_tick: EventFlag::new(),
            stats_tick: EventFlag::new(),
        }
    }

    pub fn tick(&self, kind: TickKind) -> &EventFlag {
        match kind {
            TickKind::Test => &self.test_tick,
            TickKind::Normal => &self.normal_tick,
            TickKind::Stats => &self.stats_tick,
        }
    }
}

impl Default for InterruptFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Sampling cadence written by the control core, read by the sensor task.
///
/// A stale read costs at most one extra cycle at the old cadence.
pub struct CadenceSelector(AtomicBool);

impl CadenceSelector {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn set(&self, cadence: Cadence) {
        self.0.store(cadence == Cadence::Normal, Ordering::Relaxed);
    }

    pub fn get(&self) -> Cadence {
        if self.0.load(Ordering::Relaxed) {
            Cadence::Normal
        } else {
            Cadence::Test
        }
    }
}

impl Default for CadenceSelector {
    fn default() -> Self {
        Self::new()
    }
}
