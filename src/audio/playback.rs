//! Audio playback driver.
//!
//! Two halves:
//! - [`PlaybackControl`]: shared flag + handoff, toggled by the main loop
//! - [`AudioStreamer`]: owns the I2S output, runs forever on its own task
//!
//! ```text
//!            toggle()                 take() / is_playing()
//! Main loop ─────────▶ [is_playing]  ◀──────────────────── AudioStreamer
//!                      [ handoff  ]                         │ write_stereo_block
//!                                                           ▼
//! Main loop ◀──────── [FaultMailbox] ◀── try_post ──────── I2S
//! ```

use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use embedded_hal::delay::DelayNs;

use super::waveform::{PlaybackBuffer, PLAYBACK_FRAMES};
use crate::config::FirmwareConfig;
use crate::fault::FaultCode;
use crate::globals::TaskLinks;
use crate::signal::Handoff;
use crate::Clock;
use crate::{fw_info, fw_warn};

/// Audio output peripheral.
pub trait AudioOutput {
    type Error: core::fmt::Debug;

    /// Write one block of packed stereo frames, blocking until queued.
    fn write_stereo_block(&mut self, frames: &[u32]) -> Result<(), Self::Error>;
}

/// Idle wait for the streaming task.
///
/// Blocks for at most `max_ms`, returning early once woken by the hook
/// registered with [`PlaybackControl::set_waker`]. Spurious returns are fine:
/// the caller re-checks the handoff.
pub trait Park {
    fn park_ms(&mut self, max_ms: u32);
}

/// Playback state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
}

impl PlaybackStatus {
    #[inline]
    pub fn from_playing(playing: bool) -> Self {
        if playing {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Stopped
        }
    }

    #[inline]
    pub fn is_playing(self) -> bool {
        self == PlaybackStatus::Playing
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Stopped => "STOPPED",
            PlaybackStatus::Playing => "PLAYING",
        }
    }
}

/// Cross-task playback switch.
///
/// The flag is the source of truth; the handoff carries the latest request
/// and the optional waker unparks the streamer.
pub struct PlaybackControl {
    playing: AtomicBool,
    handoff: Handoff,
    /// `fn()` stored as a raw pointer, null when unset.
    waker: AtomicPtr<()>,
}

impl PlaybackControl {
    /// Create a stopped control.
    pub const fn new() -> Self {
        Self {
            playing: AtomicBool::new(false),
            handoff: Handoff::new(),
            waker: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Register the function `toggle` calls after signalling.
    ///
    /// Must not block; it runs on the main loop.
    pub fn set_waker(&self, wake: fn()) {
        self.waker.store(wake as *mut (), Ordering::Release);
    }

    fn wake(&self) {
        let raw = self.waker.load(Ordering::Acquire);
        if raw.is_null() {
            return;
        }
        // SAFETY: only `set_waker` stores non-null values, always from a `fn()`
        let wake = unsafe { core::mem::transmute::<*mut (), fn()>(raw) };
        wake();
    }

    /// Flip playback and signal the streamer. Returns the new state.
    #[inline]
    pub fn toggle(&self) -> PlaybackStatus {
        let playing = !self.playing.fetch_xor(true, Ordering::AcqRel);
        self.handoff.signal(playing);
        self.wake();
        PlaybackStatus::from_playing(playing)
    }

    /// Current flag value.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    #[inline]
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus::from_playing(self.is_playing())
    }

    /// Wake-up slot read by the streamer.
    #[inline]
    pub fn handoff(&self) -> &Handoff {
        &self.handoff
    }
}

impl Default for PlaybackControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one [`AudioStreamer::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamStep {
    /// Stopped, parked until woken or the idle interval ran out.
    Idle,
    /// First block after a start was written.
    Started,
    /// Another block was written.
    Streamed,
    /// Playback was switched off; nothing written.
    Stopped,
    /// Write failed; notification posted, retry delay slept.
    WriteFailed,
}

/// Streaming task.
///
/// Never terminates and never panics on output errors: a failed write is
/// reported, followed by a fixed delay, then the next write is attempted.
pub struct AudioStreamer<'a, O, D, C, const CAP: usize = PLAYBACK_FRAMES> {
    output: O,
    delay: D,
    clock: C,
    buffer: PlaybackBuffer<CAP>,
    links: TaskLinks<'a>,
    retry_delay_ms: u32,
    idle_park_ms: u32,
    /// State last acted on by this task.
    streaming: bool,
    blocks_written: u32,
    write_failures: u32,
}

impl<'a, O, D, C, const CAP: usize> AudioStreamer<'a, O, D, C, CAP>
where
    O: AudioOutput,
    D: DelayNs + Park,
    C: Clock,
{
    pub fn new(
        output: O,
        delay: D,
        clock: C,
        buffer: PlaybackBuffer<CAP>,
        links: TaskLinks<'a>,
        config: &FirmwareConfig,
    ) -> Self {
        Self {
            output,
            delay,
            clock,
            buffer,
            links,
            retry_delay_ms: config.retry_delay_ms,
            idle_park_ms: config.idle_park_ms,
            streaming: false,
            blocks_written: 0,
            write_failures: 0,
        }
    }

    /// Run one iteration.
    ///
    /// Stopped: consume the handoff; park unless it just asked to play.
    /// Playing: write the whole buffer once.
    pub fn step(&mut self) -> StreamStep {
        let now_us = self.clock.now_us();
        let signal = self.links.control.handoff().take();

        if !self.links.control.is_playing() {
            if self.streaming {
                self.streaming = false;
                fw_info!(self.links.log, now_us, "playback stopped ({} blocks)", self.blocks_written);
                return StreamStep::Stopped;
            }

            if signal != Some(true) {
                self.delay.park_ms(self.idle_park_ms);
            }
            return StreamStep::Idle;
        }

        let started = !self.streaming;
        if started {
            self.streaming = true;
            fw_info!(self.links.log, now_us, "playback started");
        }

        match self.output.write_stereo_block(self.buffer.frames()) {
            Ok(()) => {
                self.blocks_written = self.blocks_written.wrapping_add(1);
                if started {
                    StreamStep::Started
                } else {
                    StreamStep::Streamed
                }
            }
            Err(e) => {
                self.write_failures = self.write_failures.wrapping_add(1);
                self.links
                    .faults
                    .try_post(FaultCode::AudioWrite, self.write_failures, now_us);
                fw_warn!(self.links.log, now_us, "audio write failed: {:?}", e);
                self.delay.delay_ms(self.retry_delay_ms);
                StreamStep::WriteFailed
            }
        }
    }

    /// Stream for the device lifetime.
    pub fn run(mut self) -> ! {
        fw_info!(self.links.log, self.clock.now_us(), "audio task up, {} frames/block", self.buffer.len());
        loop {
            self.step();
        }
    }

    /// Blocks written successfully since boot.
    #[inline]
    pub fn blocks_written(&self) -> u32 {
        self.blocks_written
    }

    /// Failed writes since boot.
    #[inline]
    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }

    /// Whether the task is currently streaming.
    #[inline]
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Output peripheral (tests inspect mocks through this).
    #[inline]
    pub fn output(&self) -> &O {
        &self.output
    }
}
