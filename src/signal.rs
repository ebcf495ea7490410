//! Single-slot handoff between tasks.
//!
//! Send-or-replace: a new signal overwrites any unconsumed one, so the
//! receiver only ever sees the latest intent. Never blocks, never allocates.

use core::sync::atomic::{AtomicU8, Ordering};

const EMPTY: u8 = 0;
const SIGNAL_FALSE: u8 = 1;
const SIGNAL_TRUE: u8 = 2;

/// One-bit handoff slot.
///
/// ```
/// use tracker_firmware::signal::Handoff;
///
/// let slot = Handoff::new();
/// slot.signal(true);
/// slot.signal(false); // replaces, does not queue
/// assert_eq!(slot.take(), Some(false));
/// assert_eq!(slot.take(), None);
/// ```
pub struct Handoff {
    slot: AtomicU8,
}

impl Handoff {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            slot: AtomicU8::new(EMPTY),
        }
    }

    /// Publish `value`, replacing a pending one.
    ///
    /// Returns `true` if an unconsumed signal was overwritten.
    #[inline]
    pub fn signal(&self, value: bool) -> bool {
        let encoded = if value { SIGNAL_TRUE } else { SIGNAL_FALSE };
        self.slot.swap(encoded, Ordering::AcqRel) != EMPTY
    }

    /// Consume the pending signal, if any.
    #[inline]
    pub fn take(&self) -> Option<bool> {
        match self.slot.swap(EMPTY, Ordering::AcqRel) {
            SIGNAL_TRUE => Some(true),
            SIGNAL_FALSE => Some(false),
            _ => None,
        }
    }
}

impl Default for Handoff {
    fn default() -> Self {
        Self::new()
    }
}
