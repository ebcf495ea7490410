//! Configuration error types
//!
//! Any of these is fatal: the firmware logs it and never enters the main loop.

/// Invalid startup configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// C01: Volume factor is not in (0, 1]
    VolumeOutOfRange { numerator: u32, denominator: u32 },
    /// C02: Waveform table has no samples
    EmptyWaveform,
    /// C03: Buffer must hold at least one waveform period
    ZeroPeriods,
    /// C04: Waveform does not fit the playback buffer
    BufferTooSmall { needed: usize, capacity: usize },
    /// C05: Frame period of zero
    ZeroFramePeriod,
    /// C06: Debounce window of zero
    ZeroDebounceWindow,
}

impl ConfigError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::VolumeOutOfRange { .. } => "C01",
            Self::EmptyWaveform => "C02",
            Self::ZeroPeriods => "C03",
            Self::BufferTooSmall { .. } => "C04",
            Self::ZeroFramePeriod => "C05",
            Self::ZeroDebounceWindow => "C06",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::VolumeOutOfRange { .. } => "volume factor out of range",
            Self::EmptyWaveform => "empty waveform table",
            Self::ZeroPeriods => "zero waveform periods",
            Self::BufferTooSmall { .. } => "playback buffer too small",
            Self::ZeroFramePeriod => "zero frame period",
            Self::ZeroDebounceWindow => "zero debounce window",
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())?;
        match self {
            Self::VolumeOutOfRange { numerator, denominator } => {
                write!(f, " ({}/{})", numerator, denominator)
            }
            Self::BufferTooSmall { needed, capacity } => {
                write!(f, " (need {}, have {})", needed, capacity)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_details() {
        let err = ConfigError::VolumeOutOfRange { numerator: 3, denominator: 2 };
        assert_eq!(err.to_string(), "C01: volume factor out of range (3/2)");

        let err = ConfigError::BufferTooSmall { needed: 160, capacity: 128 };
        assert_eq!(err.to_string(), "C04: playback buffer too small (need 160, have 128)");

        assert_eq!(ConfigError::ZeroPeriods.to_string(), "C03: zero waveform periods");
    }
}
