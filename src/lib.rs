//! # TrackerFirmware
//!
//! Test firmware for a handheld music tracker.
//!
//! ## Architecture
//!
//! Two tasks, no locks:
//! - Main loop ([`Controller`]): polls buttons through the [`DebounceTracker`],
//!   toggles playback, redraws the status line, paces itself to a fixed frame.
//! - Audio task ([`AudioStreamer`]): parked while stopped, streams the
//!   precomputed [`PlaybackBuffer`] while playing.
//!
//! The only cross-task state is [`PlaybackControl`] (atomic flag + single-slot
//! handoff), the [`FaultMailbox`] and the per-task log rings.
//!
//! Everything outside `hal` is pure logic and runs on the host.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod input;
pub mod debounce;
pub mod signal;
pub mod fault;
pub mod audio;
pub mod display;
pub mod controller;
pub mod logging;
pub mod log_sink;
pub mod globals;
pub mod hal;

pub use config::FirmwareConfig;
pub use error::ConfigError;
pub use input::InputId;
pub use debounce::DebounceTracker;
pub use signal::Handoff;
pub use fault::{FaultCode, FaultMailbox, FaultReport};
pub use audio::playback::{AudioOutput, AudioStreamer, Park, PlaybackControl, PlaybackStatus, StreamStep};
pub use audio::waveform::{PlaybackBuffer, Fraction, SINE_TABLE};
pub use controller::{Controller, InputReader, TickReport};
pub use display::{StatusDisplay, GraphicsDisplay};

/// Monotonic time source in microseconds.
///
/// On the device this is `esp_timer_get_time()`. Tests drive it by hand.
pub trait Clock {
    fn now_us(&self) -> u64;
}
