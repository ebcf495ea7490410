//! Module: config
//!
//! Purpose: Startup configuration for TrackerFirmware.
//!
//! Architecture:
//! - All tunables in one `FirmwareConfig`, fixed at build time
//! - `FirmwareConfig::DEFAULT` matches the hardware (30 FPS UI, 1% volume)
//! - `validate()` is called once before any task starts; an error is fatal
//!
//! Safety: Safe. Plain data, no runtime mutation.

use crate::audio::waveform::{Fraction, PlaybackBuffer, SINE_TABLE};
use crate::error::ConfigError;

/// Firmware tunables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FirmwareConfig {
    /// Raw level must hold strictly longer than this to be accepted.
    pub debounce_window_us: u64,

    /// Main loop period in milliseconds.
    pub frame_period_ms: u32,

    /// Amplitude scale applied to the sine table.
    ///
    /// The amp on the board is very loud, 1% is a comfortable level.
    pub volume: Fraction,

    /// Sine periods per playback buffer.
    pub waveform_periods: usize,

    /// Sleep after a failed audio write before retrying.
    pub retry_delay_ms: u32,

    /// Longest park between handoff checks while playback is stopped.
    ///
    /// A toggle wakes the streamer early; this only bounds a missed wake.
    pub idle_park_ms: u32,

    /// I2S sample rate in Hz.
    pub sample_rate: u32,

    /// Max log entries written to the sink per frame.
    pub log_drain_per_frame: usize,

    /// Interval between "dropped log entries" reports.
    pub dropped_report_interval_us: u64,
}

impl FirmwareConfig {
    /// Production configuration: 32 ms frames (~30 FPS).
    pub const DEFAULT: Self = Self {
        debounce_window_us: 50_000,
        frame_period_ms: 32,
        volume: Fraction::new(1, 100),
        waveform_periods: 4,
        retry_delay_ms: 10,
        idle_park_ms: 100,
        sample_rate: 44_100,
        log_drain_per_frame: 16,
        dropped_report_interval_us: 10_000_000,
    };

    /// Same as `DEFAULT` with 16 ms frames.
    pub const FAST_UI: Self = Self {
        frame_period_ms: 16,
        ..Self::DEFAULT
    };

    /// Check every value. Buffer capacity is checked when the buffer is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.volume.validate()?;

        if self.waveform_periods == 0 {
            return Err(ConfigError::ZeroPeriods);
        }
        if self.frame_period_ms == 0 {
            return Err(ConfigError::ZeroFramePeriod);
        }
        if self.debounce_window_us == 0 {
            return Err(ConfigError::ZeroDebounceWindow);
        }

        Ok(())
    }

    /// Validate, then build the default-size playback buffer from the sine table.
    pub fn playback_buffer(&self) -> Result<PlaybackBuffer, ConfigError> {
        self.validate()?;
        PlaybackBuffer::build(&SINE_TABLE, self.volume, self.waveform_periods)
    }

    /// Frame period in microseconds.
    #[inline]
    pub fn frame_period_us(&self) -> u64 {
        self.frame_period_ms as u64 * 1000
    }
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(FirmwareConfig::DEFAULT.validate(), Ok(()));
        assert_eq!(FirmwareConfig::FAST_UI.validate(), Ok(()));
    }

    #[test]
    fn test_fast_ui_only_changes_frame() {
        let fast = FirmwareConfig::FAST_UI;
        assert_eq!(fast.frame_period_ms, 16);
        assert_eq!(fast.frame_period_us(), 16_000);
        assert_eq!(fast.volume, FirmwareConfig::DEFAULT.volume);
    }

    #[test]
    fn test_invalid_volume_rejected() {
        let cfg = FirmwareConfig {
            volume: Fraction::new(3, 2),
            ..FirmwareConfig::DEFAULT
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::VolumeOutOfRange { numerator: 3, denominator: 2 })
        );
    }

    #[test]
    fn test_zero_values_rejected() {
        let cfg = FirmwareConfig { waveform_periods: 0, ..FirmwareConfig::DEFAULT };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroPeriods));

        let cfg = FirmwareConfig { frame_period_ms: 0, ..FirmwareConfig::DEFAULT };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroFramePeriod));

        let cfg = FirmwareConfig { debounce_window_us: 0, ..FirmwareConfig::DEFAULT };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDebounceWindow));
    }

    #[test]
    fn test_playback_buffer_from_config() {
        let buffer = FirmwareConfig::DEFAULT.playback_buffer().unwrap();
        assert_eq!(buffer.len(), crate::audio::waveform::PLAYBACK_FRAMES);

        let cfg = FirmwareConfig { frame_period_ms: 0, ..FirmwareConfig::DEFAULT };
        assert_eq!(cfg.playback_buffer(), Err(ConfigError::ZeroFramePeriod));

        let cfg = FirmwareConfig { waveform_periods: 5, ..FirmwareConfig::DEFAULT };
        assert_eq!(
            cfg.playback_buffer(),
            Err(ConfigError::BufferTooSmall { needed: 160, capacity: 128 })
        );
    }
}
