//! Log output.
//!
//! [`LogDrain`] empties the per-task rings into a line-oriented sink (UART
//! TX on the device) from the main loop, a bounded number of entries per
//! frame. Sink write errors are ignored: logging is best-effort.
//!
//! Line format: `[timestamp_us] LEVEL task: message\n`

use core::fmt::Write;

use crate::config::FirmwareConfig;
use crate::logging::{LogEntry, LogRing, TruncatingWriter};

/// Longest formatted line.
pub const LINE_LEN: usize = 160;

/// Line-oriented text output.
pub trait LogSink {
    /// Write one formatted line (newline included). Must not panic.
    fn write_line(&mut self, line: &[u8]);
}

/// Format a log entry. Returns the number of bytes written.
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = TruncatingWriter::new(buf);
    let _ = write!(
        writer,
        "[{:10}] {} {}: {}\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.task.as_str(),
        entry.message()
    );
    writer.len()
}

/// Drains log rings into a sink.
pub struct LogDrain<'a, S> {
    sink: S,
    rings: &'a [&'a LogRing],
    per_frame: usize,
    report_interval_us: u64,
    last_report_us: u64,
    line: [u8; LINE_LEN],
}

impl<'a, S: LogSink> LogDrain<'a, S> {
    /// Rings are drained in slice order, so list the most urgent first.
    pub fn new(sink: S, rings: &'a [&'a LogRing], config: &FirmwareConfig) -> Self {
        Self {
            sink,
            rings,
            per_frame: config.log_drain_per_frame,
            report_interval_us: config.dropped_report_interval_us,
            last_report_us: 0,
            line: [0; LINE_LEN],
        }
    }

    /// Per-frame work: write up to `per_frame` entries, and report dropped
    /// entries once per report interval.
    ///
    /// Returns the number of entries written.
    pub fn service(&mut self, now_us: u64) -> usize {
        let written = self.drain(self.per_frame);

        if now_us.saturating_sub(self.last_report_us) >= self.report_interval_us {
            self.report_dropped(now_us);
            self.last_report_us = now_us;
        }

        written
    }

    /// Write everything pending (startup, fatal paths).
    pub fn flush(&mut self) -> usize {
        self.drain(usize::MAX)
    }

    fn drain(&mut self, budget: usize) -> usize {
        let mut written = 0;
        for ring in self.rings {
            while written < budget {
                let Some(entry) = ring.drain() else { break };
                let len = format_log_entry(&entry, &mut self.line);
                self.sink.write_line(&self.line[..len]);
                written += 1;
            }
        }
        written
    }

    fn report_dropped(&mut self, now_us: u64) {
        for ring in self.rings {
            let dropped = ring.take_dropped();
            if dropped == 0 {
                continue;
            }

            let mut writer = TruncatingWriter::new(&mut self.line);
            let _ = write!(
                writer,
                "[{:10}] WARN {}: dropped {} log entries\n",
                now_us,
                ring.task().as_str(),
                dropped
            );
            let len = writer.len();
            self.sink.write_line(&self.line[..len]);
        }
    }

    /// Underlying sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
