//! Global cross-task state.
//!
//! Everything two tasks touch lives here, as statics built from atomics:
//! the playback switch, the fault mailbox and one log ring per task.

use crate::audio::playback::PlaybackControl;
use crate::fault::FaultMailbox;
use crate::logging::{LogRing, Task};

/// Playback flag + handoff (main loop toggles, audio task follows).
pub static PLAYBACK: PlaybackControl = PlaybackControl::new();

/// Audio task → main loop fault notifications.
pub static AUDIO_FAULTS: FaultMailbox = FaultMailbox::new();

/// Main loop log ring (single producer: main loop).
pub static UI_LOG: LogRing = LogRing::new(Task::Ui);

/// Audio log ring (single producer: audio task).
pub static AUDIO_LOG: LogRing = LogRing::new(Task::Audio);

/// Shared state a task needs, plus the log ring it owns.
#[derive(Clone, Copy)]
pub struct TaskLinks<'a> {
    pub control: &'a PlaybackControl,
    pub faults: &'a FaultMailbox,
    pub log: &'a LogRing,
}

/// Links for the main loop.
pub fn ui_links() -> TaskLinks<'static> {
    TaskLinks {
        control: &PLAYBACK,
        faults: &AUDIO_FAULTS,
        log: &UI_LOG,
    }
}

/// Links for the audio task.
pub fn audio_links() -> TaskLinks<'static> {
    TaskLinks {
        control: &PLAYBACK,
        faults: &AUDIO_FAULTS,
        log: &AUDIO_LOG,
    }
}

/// Rings in drain order (audio first: it cannot wait for its own flush).
pub static LOG_RINGS: [&LogRing; 2] = [&AUDIO_LOG, &UI_LOG];
