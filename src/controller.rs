//! Main loop controller.
//!
//! Runs on the device main task at a fixed frame rate. Each frame:
//! 1. Poll every button through the debouncer, dispatch presses
//! 2. Redraw the status line if playback state or press count changed
//! 3. Collect at most one fault notification from the audio task
//! 4. Flush logs, sleep until the next frame boundary
//!
//! Nothing in a frame blocks beyond the pacing sleep; display errors are
//! logged and retried on the next frame.

use embedded_hal::delay::DelayNs;

use crate::audio::playback::PlaybackStatus;
use crate::config::FirmwareConfig;
use crate::debounce::DebounceTracker;
use crate::display::{self, StatusDisplay, StatusSnapshot};
use crate::fault::{FaultCode, FaultReport};
use crate::globals::TaskLinks;
use crate::input::InputId;
use crate::log_sink::{LogDrain, LogSink};
use crate::Clock;
use crate::{fw_debug, fw_error, fw_info, fw_warn};

/// Button input peripheral.
pub trait InputReader {
    /// Raw electrical level. Buttons are active-low: `false` = pressed.
    fn read_level(&mut self, input: InputId) -> bool;
}

/// What a button press does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Start/stop the test tone and bump the press counter.
    TogglePlayback,
    /// Not bound yet.
    None,
}

/// Button bindings.
pub fn binding(input: InputId) -> Action {
    match input {
        InputId::Play => Action::TogglePlayback,
        _ => Action::None,
    }
}

/// Summary of one [`Controller::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Bit `InputId::index()` set for each button that became pressed.
    pub pressed_mask: u16,
    /// New playback state if a toggle happened.
    pub toggled: Option<PlaybackStatus>,
    /// Status line redrawn successfully.
    pub refreshed: bool,
    /// Status redraw attempted and failed.
    pub refresh_failed: bool,
    /// Fault notification collected this frame.
    pub fault: Option<FaultReport>,
}

impl TickReport {
    #[inline]
    pub fn was_pressed(&self, input: InputId) -> bool {
        self.pressed_mask & (1 << input.index()) != 0
    }
}

/// Fixed-period frame pacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePacer {
    period_us: u64,
}

impl FramePacer {
    pub fn new(period_us: u64) -> Self {
        Self { period_us }
    }

    #[inline]
    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Time left in the frame that started at `frame_start_us`.
    ///
    /// Zero if the frame overran.
    #[inline]
    pub fn remaining_us(&self, frame_start_us: u64, now_us: u64) -> u64 {
        let elapsed = now_us.saturating_sub(frame_start_us);
        self.period_us.saturating_sub(elapsed)
    }
}

/// Main loop state. Owns the display and the button inputs.
pub struct Controller<'a, I, D> {
    inputs: I,
    display: D,
    tracker: DebounceTracker,
    links: TaskLinks<'a>,
    pacer: FramePacer,
    presses: u32,
    /// What the status line currently shows.
    rendered: StatusSnapshot,
}

impl<'a, I, D> Controller<'a, I, D>
where
    I: InputReader,
    D: StatusDisplay,
{
    pub fn new(inputs: I, display: D, links: TaskLinks<'a>, config: &FirmwareConfig) -> Self {
        Self {
            inputs,
            display,
            tracker: DebounceTracker::new(config.debounce_window_us),
            links,
            pacer: FramePacer::new(config.frame_period_us()),
            presses: 0,
            // The welcome screen stands for "stopped, no presses"
            rendered: StatusSnapshot {
                playing: false,
                presses: 0,
            },
        }
    }

    /// Draw the startup screen. Failure is logged, not fatal.
    pub fn show_welcome(&mut self, now_us: u64) {
        match display::draw_welcome(&mut self.display) {
            Ok(()) => fw_info!(self.links.log, now_us, "welcome screen drawn"),
            Err(e) => fw_error!(self.links.log, now_us, "welcome screen failed: {:?}", e),
        }
    }

    /// Run one frame of work (no pacing).
    pub fn tick(&mut self, now_us: u64) -> TickReport {
        let mut report = TickReport::default();

        // 1. Buttons
        for input in InputId::ALL {
            let pressed_level = !self.inputs.read_level(input);
            if self.tracker.poll(input, pressed_level, now_us) != Some(true) {
                continue;
            }

            report.pressed_mask |= 1 << input.index();
            match binding(input) {
                Action::TogglePlayback => {
                    self.presses = self.presses.wrapping_add(1);
                    let status = self.links.control.toggle();
                    report.toggled = Some(status);
                    fw_info!(
                        self.links.log,
                        now_us,
                        "{} pressed ({}), playback {}",
                        input,
                        self.presses,
                        status.as_str()
                    );
                }
                Action::None => fw_debug!(self.links.log, now_us, "{} pressed", input),
            }
        }

        // 2. Status line
        let snapshot = StatusSnapshot {
            playing: self.links.control.is_playing(),
            presses: self.presses,
        };
        if snapshot != self.rendered {
            match display::draw_status(&mut self.display, snapshot) {
                Ok(()) => {
                    self.rendered = snapshot;
                    report.refreshed = true;
                }
                Err(e) => {
                    report.refresh_failed = true;
                    fw_warn!(self.links.log, now_us, "{} failed: {:?}", FaultCode::DisplayRefresh.as_str(), e);
                }
            }
        }

        // 3. At most one fault notification
        if let Some(fault) = self.links.faults.take() {
            fw_warn!(
                self.links.log,
                now_us,
                "{} fault #{} (dropped {})",
                fault.code.as_str(),
                fault.data,
                self.links.faults.dropped()
            );
            report.fault = Some(fault);
        }

        report
    }

    /// Frame loop: tick, flush logs, sleep to the next frame boundary.
    pub fn run<C, W, S>(mut self, clock: &C, delay: &mut W, mut logs: LogDrain<'_, S>) -> !
    where
        C: Clock,
        W: DelayNs,
        S: LogSink,
    {
        loop {
            let frame_start = clock.now_us();
            self.tick(frame_start);
            logs.service(clock.now_us());

            let remaining = self.pacer.remaining_us(frame_start, clock.now_us());
            if remaining > 0 {
                delay.delay_us(remaining as u32);
            }
        }
    }

    /// Play button presses since boot.
    #[inline]
    pub fn presses(&self) -> u32 {
        self.presses
    }

    /// Snapshot currently on screen.
    #[inline]
    pub fn rendered(&self) -> StatusSnapshot {
        self.rendered
    }

    #[inline]
    pub fn pacer(&self) -> FramePacer {
        self.pacer
    }

    #[inline]
    pub fn display(&self) -> &D {
        &self.display
    }

    #[inline]
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    #[inline]
    pub fn inputs_mut(&mut self) -> &mut I {
        &mut self.inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacer_remaining() {
        let pacer = FramePacer::new(32_000);
        assert_eq!(pacer.remaining_us(1_000, 1_000), 32_000);
        assert_eq!(pacer.remaining_us(1_000, 11_000), 22_000);
        assert_eq!(pacer.remaining_us(1_000, 40_000), 0); // overrun
        assert_eq!(pacer.remaining_us(5_000, 1_000), 32_000); // clock went back
    }

    #[test]
    fn test_only_play_is_bound() {
        for input in InputId::ALL {
            let expected = if input == InputId::Play { Action::TogglePlayback } else { Action::None };
            assert_eq!(binding(input), expected);
        }
    }
}
