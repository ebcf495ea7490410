//! Playback control and streaming task tests

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;

use tracker_firmware::audio::{
    AudioOutput, AudioStreamer, Fraction, Park, PlaybackBuffer, PlaybackControl, PlaybackStatus, StreamStep,
};
use tracker_firmware::fault::{FaultCode, FaultMailbox};
use tracker_firmware::globals::TaskLinks;
use tracker_firmware::logging::{LogRing, Task};
use tracker_firmware::{Clock, FirmwareConfig};

/// Records every block; fails the calls listed in `fail_on` (1-based).
#[derive(Default)]
struct MockOutput {
    calls: usize,
    fail_on: Vec<usize>,
    fail_all: bool,
    blocks: Vec<Vec<u32>>,
}

impl AudioOutput for MockOutput {
    type Error = &'static str;

    fn write_stereo_block(&mut self, frames: &[u32]) -> Result<(), Self::Error> {
        self.calls += 1;
        if self.fail_all || self.fail_on.contains(&self.calls) {
            return Err("i2s timeout");
        }
        self.blocks.push(frames.to_vec());
        Ok(())
    }
}

#[derive(Default)]
struct Waits {
    sleeps: Vec<u32>,
    parks: Vec<u32>,
}

/// Records requested sleeps and parks in milliseconds.
#[derive(Clone, Default)]
struct MockDelay(Rc<RefCell<Waits>>);

impl MockDelay {
    fn take(&self) -> Vec<u32> {
        core::mem::take(&mut self.0.borrow_mut().sleeps)
    }

    fn take_parks(&self) -> Vec<u32> {
        core::mem::take(&mut self.0.borrow_mut().parks)
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().sleeps.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().sleeps.push(ms);
    }
}

impl Park for MockDelay {
    fn park_ms(&mut self, max_ms: u32) {
        self.0.borrow_mut().parks.push(max_ms);
    }
}

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now_us(&self) -> u64 {
        self.0
    }
}

struct Shared {
    control: PlaybackControl,
    faults: FaultMailbox,
    log: LogRing,
}

impl Shared {
    fn new() -> Self {
        Self {
            control: PlaybackControl::new(),
            faults: FaultMailbox::new(),
            log: LogRing::new(Task::Audio),
        }
    }

    fn links(&self) -> TaskLinks<'_> {
        TaskLinks {
            control: &self.control,
            faults: &self.faults,
            log: &self.log,
        }
    }

    fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(entry) = self.log.drain() {
            out.push(entry.message().to_string());
        }
        out
    }
}

static WAKES: AtomicU32 = AtomicU32::new(0);

fn count_wake() {
    WAKES.fetch_add(1, Ordering::SeqCst);
}

fn small_buffer() -> PlaybackBuffer<8> {
    PlaybackBuffer::build(&[100, -100], Fraction::ONE, 2).unwrap()
}

fn streamer<'a>(
    shared: &'a Shared,
    output: MockOutput,
    delay: &MockDelay,
) -> AudioStreamer<'a, MockOutput, MockDelay, FixedClock, 8> {
    AudioStreamer::new(
        output,
        delay.clone(),
        FixedClock(1_000),
        small_buffer(),
        shared.links(),
        &FirmwareConfig::DEFAULT,
    )
}

#[test]
fn test_toggle_round_trip() {
    let control = PlaybackControl::new();
    assert_eq!(control.status(), PlaybackStatus::Stopped);

    assert_eq!(control.toggle(), PlaybackStatus::Playing);
    assert!(control.is_playing());
    assert_eq!(control.toggle(), PlaybackStatus::Stopped);
    assert!(!control.is_playing());
}

#[test]
fn test_handoff_keeps_latest_state() {
    let control = PlaybackControl::new();
    control.toggle();
    control.toggle();
    control.toggle();

    // Only the latest value is pending
    assert_eq!(control.handoff().take(), Some(true));
    assert_eq!(control.handoff().take(), None);
}

#[test]
fn test_stopped_streamer_parks() {
    let shared = Shared::new();
    let delay = MockDelay::default();
    let mut streamer = streamer(&shared, MockOutput::default(), &delay);

    assert_eq!(streamer.step(), StreamStep::Idle);
    assert_eq!(streamer.step(), StreamStep::Idle);

    assert_eq!(delay.take_parks(), vec![100, 100]);
    assert!(delay.take().is_empty());
    assert_eq!(streamer.output().calls, 0);
}

#[test]
fn test_start_stream_stop() {
    let shared = Shared::new();
    let delay = MockDelay::default();
    let mut streamer = streamer(&shared, MockOutput::default(), &delay);

    shared.control.toggle();
    assert_eq!(streamer.step(), StreamStep::Started);
    assert_eq!(streamer.step(), StreamStep::Streamed);
    assert!(streamer.is_streaming());
    assert_eq!(streamer.blocks_written(), 2);

    // Whole buffer each time
    let expected = small_buffer();
    for block in &streamer.output().blocks {
        assert_eq!(block.as_slice(), expected.frames());
    }

    // No sleeping while streaming
    assert!(delay.take().is_empty());
    assert!(delay.take_parks().is_empty());

    shared.control.toggle();
    assert_eq!(streamer.step(), StreamStep::Stopped);
    assert!(!streamer.is_streaming());
    assert!(delay.take().is_empty());

    // Back to parking
    assert_eq!(streamer.step(), StreamStep::Idle);
    assert_eq!(delay.take_parks(), vec![100]);
    assert_eq!(streamer.output().calls, 2);

    let messages = shared.messages();
    assert!(messages.iter().any(|m| m == "playback started"));
    assert!(messages.iter().any(|m| m.starts_with("playback stopped")));
}

#[test]
fn test_write_failure_reported_and_retried() {
    let shared = Shared::new();
    let delay = MockDelay::default();
    let output = MockOutput {
        fail_on: vec![3],
        ..Default::default()
    };
    let mut streamer = streamer(&shared, output, &delay);

    shared.control.toggle();
    assert_eq!(streamer.step(), StreamStep::Started);
    assert_eq!(streamer.step(), StreamStep::Streamed);
    assert_eq!(streamer.step(), StreamStep::WriteFailed);
    assert!(delay.take_parks().is_empty());

    // Fixed retry delay after the failure
    assert_eq!(delay.take(), vec![10]);

    let report = shared.faults.take().unwrap();
    assert_eq!(report.code, FaultCode::AudioWrite);
    assert_eq!(report.data, 1);
    assert_eq!(report.timestamp_us, 1_000);

    // Streaming continues
    assert_eq!(streamer.step(), StreamStep::Streamed);
    assert_eq!(streamer.blocks_written(), 3);
    assert_eq!(streamer.write_failures(), 1);
    assert!(streamer.is_streaming());

    let messages = shared.messages();
    assert!(messages.iter().any(|m| m.contains("audio write failed")));
}

#[test]
fn test_fault_dropped_while_mailbox_full() {
    let shared = Shared::new();
    let delay = MockDelay::default();
    let output = MockOutput {
        fail_all: true,
        ..Default::default()
    };
    let mut streamer = streamer(&shared, output, &delay);

    shared.control.toggle();
    for _ in 0..3 {
        assert_eq!(streamer.step(), StreamStep::WriteFailed);
    }

    // First notification kept, later ones dropped
    assert_eq!(shared.faults.count(), 3);
    assert_eq!(shared.faults.dropped(), 2);
    assert_eq!(shared.faults.take().map(|r| r.data), Some(1));
    assert_eq!(shared.faults.take(), None);

    assert_eq!(delay.take(), vec![10, 10, 10]);
}

#[test]
fn test_double_toggle_stays_parked() {
    let shared = Shared::new();
    let delay = MockDelay::default();
    let mut streamer = streamer(&shared, MockOutput::default(), &delay);

    // Quick double press: stopped again, but a stale "stop" is pending
    shared.control.toggle();
    shared.control.toggle();
    assert_eq!(streamer.step(), StreamStep::Idle);
    assert_eq!(delay.take_parks(), vec![100]);
    assert_eq!(streamer.output().calls, 0);
}

#[test]
fn test_toggle_wakes_registered_waker() {
    let control = PlaybackControl::new();

    // No waker yet: toggling is still fine
    control.toggle();
    assert_eq!(WAKES.load(Ordering::SeqCst), 0);

    control.set_waker(count_wake);
    control.toggle();
    control.toggle();
    assert_eq!(WAKES.load(Ordering::SeqCst), 2);
}

#[test]
fn test_start_skips_park() {
    let shared = Shared::new();
    let delay = MockDelay::default();
    let mut streamer = streamer(&shared, MockOutput::default(), &delay);

    assert_eq!(streamer.step(), StreamStep::Idle);
    assert_eq!(delay.take_parks(), vec![100]);

    shared.control.toggle();
    assert_eq!(streamer.step(), StreamStep::Started);
    assert!(delay.take_parks().is_empty());
}

#[test]
fn test_default_config_buffer_streams() {
    let shared = Shared::new();
    let delay = MockDelay::default();
    let config = FirmwareConfig::DEFAULT;

    // Capacity comes from the config helper, no annotation needed
    let buffer = config.playback_buffer().unwrap();
    let frames = buffer.len();
    let mut streamer = AudioStreamer::new(
        MockOutput::default(),
        delay.clone(),
        FixedClock(0),
        buffer,
        shared.links(),
        &config,
    );

    shared.control.toggle();
    assert_eq!(streamer.step(), StreamStep::Started);
    assert_eq!(streamer.output().blocks[0].len(), frames);
}
