//! Time-based button debouncing.
//!
//! Pure logic, no hardware dependencies. Fed one logical level per button
//! per poll (true = pressed), reports stable-level changes.
//!
//! # Rule
//!
//! The stable level follows the raw level only after the raw level has held
//! constant for strictly longer than the debounce window. The window restarts
//! on every raw transition, so bounce never leaks through.

use crate::input::InputId;

/// Default debounce window: 50 ms.
pub const DEBOUNCE_WINDOW_US: u64 = 50_000;

/// Debounce state of a single button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceState {
    /// Last level seen on the input.
    pub raw_level: bool,
    /// Accepted (debounced) level.
    pub stable_level: bool,
    /// Timestamp of the last raw transition (not the last stable one).
    pub last_change_us: u64,
}

impl DebounceState {
    /// Fresh state: released, window starting at `now_us`.
    #[inline]
    pub const fn new(now_us: u64) -> Self {
        Self {
            raw_level: false,
            stable_level: false,
            last_change_us: now_us,
        }
    }
}

/// Debounce tracker for every button.
///
/// Slots are created lazily on the first poll of each button and live for
/// the rest of the program.
#[derive(Clone, Debug)]
pub struct DebounceTracker {
    window_us: u64,
    states: [Option<DebounceState>; InputId::COUNT],
}

impl DebounceTracker {
    /// Create a tracker with the given window in microseconds.
    pub const fn new(window_us: u64) -> Self {
        Self {
            window_us,
            states: [None; InputId::COUNT],
        }
    }

    /// Debounce window in microseconds.
    #[inline]
    pub fn window_us(&self) -> u64 {
        self.window_us
    }

    /// Feed one sample.
    ///
    /// Returns `Some(level)` exactly when the stable level just changed to
    /// `level`, `None` otherwise.
    ///
    /// The first poll of a button starts it released with the window opened
    /// at `now_us`, so a pressed first sample still has to hold a full window.
    pub fn poll(&mut self, input: InputId, raw_level: bool, now_us: u64) -> Option<bool> {
        let window_us = self.window_us;
        let state = self.states[input.index()].get_or_insert(DebounceState::new(now_us));

        if raw_level != state.raw_level {
            state.raw_level = raw_level;
            state.last_change_us = now_us;
        }

        // Saturating: a clock step backwards reads as "no time elapsed"
        let held_us = now_us.saturating_sub(state.last_change_us);
        if held_us > window_us && state.raw_level != state.stable_level {
            state.stable_level = state.raw_level;
            return Some(state.stable_level);
        }

        None
    }

    /// State of a button, `None` if it was never polled.
    #[inline]
    pub fn state(&self, input: InputId) -> Option<DebounceState> {
        self.states[input.index()]
    }

    /// Accepted level of a button (false if never polled).
    #[inline]
    pub fn stable_level(&self, input: InputId) -> bool {
        self.states[input.index()].map_or(false, |s| s.stable_level)
    }

    /// Alias of [`stable_level`](Self::stable_level) for pressed-high inputs.
    #[inline]
    pub fn is_pressed(&self, input: InputId) -> bool {
        self.stable_level(input)
    }

    /// Forget every button.
    pub fn reset(&mut self) {
        self.states = [None; InputId::COUNT];
    }
}

impl Default for DebounceTracker {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW_US)
    }
}
