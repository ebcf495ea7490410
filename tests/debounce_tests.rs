//! Debounce tracker tests

use tracker_firmware::debounce::{DebounceTracker, DEBOUNCE_WINDOW_US};
use tracker_firmware::input::InputId;

const MS: u64 = 1000;

/// Poll `input` every 10 ms from `from_ms` to `to_ms` inclusive, collecting reports.
fn poll_span(
    tracker: &mut DebounceTracker,
    input: InputId,
    level: bool,
    from_ms: u64,
    to_ms: u64,
) -> Vec<(u64, bool)> {
    let mut reports = Vec::new();
    let mut t = from_ms;
    while t <= to_ms {
        if let Some(stable) = tracker.poll(input, level, t * MS) {
            reports.push((t, stable));
        }
        t += 10;
    }
    reports
}

#[test]
fn test_held_press_reported_after_window() {
    let mut tracker = DebounceTracker::default();

    // Released at t=0, pressed from t=10 on
    assert_eq!(tracker.poll(InputId::Play, false, 0), None);
    let reports = poll_span(&mut tracker, InputId::Play, true, 10, 60);

    // 10 -> 60 is 50 ms: not strictly longer than the window
    assert!(reports.is_empty());

    assert_eq!(tracker.poll(InputId::Play, true, 61 * MS), Some(true));
    assert!(tracker.is_pressed(InputId::Play));
}

#[test]
fn test_press_from_first_poll_reported_at_60ms() {
    let mut tracker = DebounceTracker::default();

    // Pressed from t=0; slot is created released, so the raw change at t=0
    // opens the window. First report once 60 - 0 > 50.
    let reports = poll_span(&mut tracker, InputId::Play, true, 0, 60);
    assert_eq!(reports, vec![(60, true)]);

    // Held: no repeat
    let reports = poll_span(&mut tracker, InputId::Play, true, 70, 300);
    assert!(reports.is_empty());
}

#[test]
fn test_no_report_for_idle_buttons() {
    let mut tracker = DebounceTracker::default();

    for input in InputId::ALL {
        let reports = poll_span(&mut tracker, input, false, 0, 500);
        assert!(reports.is_empty(), "{} reported while idle", input);
        assert!(!tracker.is_pressed(input));
    }
}

#[test]
fn test_bounce_restarts_window() {
    let mut tracker = DebounceTracker::default();
    tracker.poll(InputId::A, false, 0);

    // Contact bounce: toggles every 10 ms for 40 ms
    for (i, t) in (10..=40).step_by(10).enumerate() {
        let level = i % 2 == 0;
        assert_eq!(tracker.poll(InputId::A, level, t * MS), None);
    }
    // Settles pressed at t=50
    assert_eq!(tracker.poll(InputId::A, true, 50 * MS), None);
    assert_eq!(tracker.poll(InputId::A, true, 100 * MS), None); // exactly 50 ms
    assert_eq!(tracker.poll(InputId::A, true, 101 * MS), Some(true));
}

#[test]
fn test_release_reported() {
    let mut tracker = DebounceTracker::default();
    let reports = poll_span(&mut tracker, InputId::B, true, 0, 100);
    assert_eq!(reports, vec![(60, true)]);

    let reports = poll_span(&mut tracker, InputId::B, false, 110, 200);
    assert_eq!(reports, vec![(170, false)]);
    assert!(!tracker.is_pressed(InputId::B));
}

#[test]
fn test_short_glitch_ignored() {
    let mut tracker = DebounceTracker::default();
    tracker.poll(InputId::Up, false, 0);

    // 30 ms pulse
    assert_eq!(tracker.poll(InputId::Up, true, 100 * MS), None);
    assert_eq!(tracker.poll(InputId::Up, true, 130 * MS), None);
    assert_eq!(tracker.poll(InputId::Up, false, 130 * MS + 1), None);

    let reports = poll_span(&mut tracker, InputId::Up, false, 140, 400);
    assert!(reports.is_empty());
}

#[test]
fn test_buttons_are_independent() {
    let mut tracker = DebounceTracker::default();

    let mut presses = Vec::new();
    for t in (0..=100).step_by(10) {
        for input in [InputId::Left, InputId::Right] {
            // Only LEFT is held
            let level = input == InputId::Left;
            if tracker.poll(input, level, t * MS) == Some(true) {
                presses.push(input);
            }
        }
    }

    assert_eq!(presses, vec![InputId::Left]);
    assert!(tracker.is_pressed(InputId::Left));
    assert!(!tracker.is_pressed(InputId::Right));
}

#[test]
fn test_custom_window() {
    let mut tracker = DebounceTracker::new(5 * MS);
    assert_eq!(tracker.window_us(), 5 * MS);

    tracker.poll(InputId::Rt, true, 0);
    assert_eq!(tracker.poll(InputId::Rt, true, 5 * MS), None);
    assert_eq!(tracker.poll(InputId::Rt, true, 5 * MS + 1), Some(true));
}

#[test]
fn test_default_window_is_50ms() {
    assert_eq!(DEBOUNCE_WINDOW_US, 50 * MS);
    assert_eq!(DebounceTracker::default().window_us(), DEBOUNCE_WINDOW_US);
}
