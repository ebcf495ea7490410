//! Best-effort fault notifications for TrackerFirmware.
//!
//! # Philosophy
//!
//! > Audio is not safety-critical. Never stop the device for it.
//!
//! The audio task reports a failed write by posting into a single-slot
//! mailbox. If the main loop has not collected the previous report yet the
//! new one is dropped and counted; the audio task never waits on it.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Fault codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// Audio block write failed. Retried after a fixed delay.
    AudioWrite = 1,

    /// Status display refresh failed. UI keeps stale content.
    DisplayRefresh = 2,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(FaultCode::AudioWrite),
            2 => Some(FaultCode::DisplayRefresh),
            _ => None,
        }
    }

    /// Short name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::AudioWrite => "audio write",
            FaultCode::DisplayRefresh => "display refresh",
        }
    }
}

/// One collected notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultReport {
    pub code: FaultCode,
    /// Code-specific detail (for `AudioWrite`: failures so far).
    pub data: u32,
    /// Timestamp when posted, microseconds.
    pub timestamp_us: u64,
}

const SLOT_EMPTY: u8 = 0;
const SLOT_WRITING: u8 = 1;
const SLOT_FULL: u8 = 2;

/// Single-slot, drop-if-full fault mailbox.
///
/// One poster (audio task), one collector (main loop).
///
/// # Usage
///
/// ```ignore
/// static FAULTS: FaultMailbox = FaultMailbox::new();
///
/// // In audio task:
/// if output.write_stereo_block(frames).is_err() {
///     FAULTS.try_post(FaultCode::AudioWrite, failures, now_us);
/// }
///
/// // In main loop, at most once per frame:
/// if let Some(report) = FAULTS.take() {
///     fw_warn!(UI_LOG, now_us, "fault: {}", report.code.as_str());
/// }
/// ```
pub struct FaultMailbox {
    /// EMPTY / WRITING / FULL.
    state: AtomicU8,

    code: AtomicU8,
    data: AtomicU32,
    timestamp_lo: AtomicU32,
    timestamp_hi: AtomicU32,

    /// Total posts attempted since boot (never cleared).
    count: AtomicU32,

    /// Posts dropped because the slot was full.
    dropped: AtomicU32,
}

impl FaultMailbox {
    /// Create an empty mailbox.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(SLOT_EMPTY),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            timestamp_lo: AtomicU32::new(0),
            timestamp_hi: AtomicU32::new(0),
            count: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Post a notification without blocking.
    ///
    /// Returns `false` if the slot was still occupied and the notification
    /// was dropped.
    #[inline]
    pub fn try_post(&self, code: FaultCode, data: u32, timestamp_us: u64) -> bool {
        self.count.fetch_add(1, Ordering::Relaxed);

        if self
            .state
            .compare_exchange(SLOT_EMPTY, SLOT_WRITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        self.code.store(code as u8, Ordering::Relaxed);
        self.data.store(data, Ordering::Relaxed);
        self.timestamp_lo.store(timestamp_us as u32, Ordering::Relaxed);
        self.timestamp_hi.store((timestamp_us >> 32) as u32, Ordering::Relaxed);
        self.state.store(SLOT_FULL, Ordering::Release);
        true
    }

    /// Collect the pending notification, if any. Never blocks.
    #[inline]
    pub fn take(&self) -> Option<FaultReport> {
        if self.state.load(Ordering::Acquire) != SLOT_FULL {
            return None;
        }

        let code = self.code.load(Ordering::Relaxed);
        let data = self.data.load(Ordering::Relaxed);
        let timestamp_us = (self.timestamp_hi.load(Ordering::Relaxed) as u64) << 32
            | self.timestamp_lo.load(Ordering::Relaxed) as u64;

        self.state.store(SLOT_EMPTY, Ordering::Release);

        // Only try_post writes the code, always from a FaultCode
        FaultCode::from_u8(code).map(|code| FaultReport {
            code,
            data,
            timestamp_us,
        })
    }

    /// Check if a notification is waiting.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == SLOT_FULL
    }

    /// Total posts since boot, delivered or dropped.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Posts dropped because the slot was full.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for FaultMailbox {
    fn default() -> Self {
        Self::new()
    }
}
