//! Non-blocking logging for TrackerFirmware.
//!
//! # Architecture
//!
//! ```text
//! Audio task           AUDIO_LOG ─┐
//! fw_warn!() ────────▶ [E0][E1]   │
//!                                 ├──▶ LogDrain (main loop) ──▶ UART TX
//! Main loop            UI_LOG   ──┘    N entries per frame       blocking ok
//! fw_info!() ────────▶ [E0][E1]
//! ```
//!
//! # Rules
//!
//! - One ring per task, one producer per ring
//! - Producers never block: a full ring drops the entry and counts it
//! - `println!`-style output never happens on the audio task

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Ring size (number of entries).
pub const LOG_RING_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// Task that produced an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Task {
    /// Main loop (buttons, display)
    Ui = 0,
    /// Audio streaming task
    Audio = 1,
}

impl Task {
    pub fn as_str(self) -> &'static str {
        match self {
            Task::Ui => "ui",
            Task::Audio => "audio",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
pub struct LogEntry {
    pub timestamp_us: u64,
    pub level: LogLevel,
    pub task: Task,
    /// Valid bytes in `msg`.
    pub len: u8,
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        task: Task::Ui,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text. Truncation never splits a UTF-8 sequence.
    pub fn message(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

/// Lock-free SPSC log ring.
///
/// Exactly one task may push into a given ring. Any task may drain it, but
/// only one at a time (the main loop in practice).
pub struct LogRing<const N: usize = LOG_RING_SIZE> {
    task: Task,
    entries: UnsafeCell<[LogEntry; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: single producer writes only the slot at write_idx before
// publishing it with Release; the single consumer reads only slots below
// write_idx (Acquire) and frees them with a Release store of read_idx.
unsafe impl<const N: usize> Sync for LogRing<N> {}
unsafe impl<const N: usize> Send for LogRing<N> {}

impl<const N: usize> LogRing<N> {
    const MASK: u32 = (N as u32).wrapping_sub(1);

    /// Create an empty ring owned by `task`.
    pub const fn new(task: Task) -> Self {
        assert!(N.is_power_of_two(), "Log ring size must be power of 2");

        Self {
            task,
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Producing task.
    #[inline]
    pub fn task(&self) -> Task {
        self.task
    }

    /// Push an entry (never blocks).
    ///
    /// Returns `false` if the ring was full and the entry dropped.
    #[inline]
    pub fn push(&self, timestamp_us: u64, level: LogLevel, msg: &[u8]) -> bool {
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let len = msg.len().min(MAX_MSG_LEN);

        // SAFETY: slot `write` is not visible to the consumer until the
        // Release store below, and only this producer writes it.
        unsafe {
            let entry = &mut (*self.entries.get())[(write & Self::MASK) as usize];
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.task = self.task;
            entry.len = len as u8;
            entry.msg[..len].copy_from_slice(&msg[..len]);
        }

        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Take the oldest entry.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        // SAFETY: slot `read` was published by the producer and is not
        // reused until read_idx moves past it.
        let entry = unsafe { (*self.entries.get())[(read & Self::MASK) as usize] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Entries dropped since the last reset.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Take and clear the dropped counter.
    #[inline]
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

/// `core::fmt::Write` into a byte slice, silently truncating on a char
/// boundary.
pub struct TruncatingWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> TruncatingWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }
}

impl core::fmt::Write for TruncatingWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let remaining = self.buf.len() - self.pos;
        let mut take = s.len().min(remaining);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[self.pos..self.pos + take].copy_from_slice(&s.as_bytes()[..take]);
        self.pos += take;
        Ok(())
    }
}

/// Format `args` into `buf`, returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = TruncatingWriter::new(buf);
    let _ = core::fmt::write(&mut writer, args);
    writer.len()
}

/// Non-blocking log macro.
///
/// # Example
///
/// ```ignore
/// fw_log!(LogLevel::Info, UI_LOG, now_us, "{} pressed", input);
/// ```
#[macro_export]
macro_rules! fw_log {
    ($level:expr, $ring:expr, $timestamp:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $ring.push($timestamp, $level, &buf[..len]);
    }};
}

/// Error log.
#[macro_export]
macro_rules! fw_error {
    ($ring:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Error, $ring, $timestamp, $($arg)*)
    };
}

/// Warning log.
#[macro_export]
macro_rules! fw_warn {
    ($ring:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Warn, $ring, $timestamp, $($arg)*)
    };
}

/// Info log.
#[macro_export]
macro_rules! fw_info {
    ($ring:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Info, $ring, $timestamp, $($arg)*)
    };
}

/// Debug log.
#[macro_export]
macro_rules! fw_debug {
    ($ring:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Debug, $ring, $timestamp, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_basic() {
        let ring = LogRing::<16>::new(Task::Audio);

        assert!(ring.push(1000, LogLevel::Warn, b"write failed"));
        assert_eq!(ring.pending(), 1);

        let entry = ring.drain().unwrap();
        assert_eq!(entry.timestamp_us, 1000);
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.task, Task::Audio);
        assert_eq!(entry.message(), "write failed");

        assert!(ring.drain().is_none());
    }

    #[test]
    fn test_ring_full_drops() {
        let ring = LogRing::<4>::new(Task::Ui);

        for i in 0..4 {
            assert!(ring.push(i, LogLevel::Info, b"x"));
        }
        assert!(!ring.push(5, LogLevel::Info, b"lost"));
        assert_eq!(ring.dropped(), 1);
        assert_eq!(ring.pending(), 4);

        // Drain one, room for one more
        assert_eq!(ring.drain().map(|e| e.timestamp_us), Some(0));
        assert!(ring.push(6, LogLevel::Info, b"y"));

        assert_eq!(ring.take_dropped(), 1);
        assert_eq!(ring.dropped(), 0);
    }

    #[test]
    fn test_long_message_truncated() {
        let ring = LogRing::<4>::new(Task::Ui);
        let long = [b'a'; MAX_MSG_LEN + 20];
        ring.push(0, LogLevel::Info, &long);
        assert_eq!(ring.drain().unwrap().len as usize, MAX_MSG_LEN);
    }

    #[test]
    fn test_truncation_keeps_utf8_valid() {
        let mut buf = [0u8; 5];
        // "abcé" fills all 5 bytes, "€" is dropped whole
        let len = format_to_buffer(&mut buf, format_args!("abcé€"));
        assert_eq!(&buf[..len], "abcé".as_bytes());
    }

    #[test]
    fn test_macro_formats() {
        let ring = LogRing::<4>::new(Task::Ui);
        crate::fw_info!(ring, 42, "START PRESSED: {}", 3);
        let entry = ring.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message(), "START PRESSED: 3");
    }

    #[test]
    fn test_spsc_producer_consumer_threads() {
        use std::sync::Arc;
        use std::thread;

        let ring = Arc::new(LogRing::<64>::new(Task::Audio));
        let producer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for i in 0..500u64 {
                    ring.push(i, LogLevel::Debug, b"block");
                }
            })
        };

        let mut received = 0u32;
        let mut last = None;
        while !producer.is_finished() || ring.pending() > 0 {
            if let Some(entry) = ring.drain() {
                // Order is preserved even with drops
                if let Some(prev) = last {
                    assert!(entry.timestamp_us > prev);
                }
                last = Some(entry.timestamp_us);
                received += 1;
            }
        }
        producer.join().unwrap();

        assert_eq!(received + ring.dropped(), 500);
    }
}
