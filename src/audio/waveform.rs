//! Playback buffer builder.
//!
//! One sine period as a fixed table, scaled by a volume [`Fraction`] and
//! packed into stereo frames (same sample on both channels). Integer-only,
//! so it runs unchanged on the device and on the host.

use heapless::Vec;

use crate::error::ConfigError;

/// Samples per sine period.
pub const TABLE_LEN: usize = 32;

/// Sine periods per buffer in the default configuration.
pub const DEFAULT_PERIODS: usize = 4;

/// Frames in the default playback buffer.
pub const PLAYBACK_FRAMES: usize = TABLE_LEN * DEFAULT_PERIODS;

/// One period of a full-scale sine, starting just after 0°.
pub static SINE_TABLE: [i16; TABLE_LEN] = [
    6392, 12539, 18204, 23169, 27244, 30272, 32137, 32767, 32137,
    30272, 27244, 23169, 18204, 12539, 6392, 0, -6393, -12540,
    -18205, -23170, -27245, -30273, -32138, -32767, -32138, -30273, -27245,
    -23170, -18205, -12540, -6393, -1,
];

/// Volume factor `numerator / denominator`, valid in (0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fraction {
    numerator: u32,
    denominator: u32,
}

impl Fraction {
    /// Unity gain.
    pub const ONE: Self = Self::new(1, 1);

    /// Create a fraction. Range is checked by [`validate`](Self::validate).
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self { numerator, denominator }
    }

    #[inline]
    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    #[inline]
    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// Check the factor lies in (0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.numerator == 0 || self.denominator == 0 || self.numerator > self.denominator {
            return Err(ConfigError::VolumeOutOfRange {
                numerator: self.numerator,
                denominator: self.denominator,
            });
        }
        Ok(())
    }

    /// Scale a sample, rounding half away from zero.
    ///
    /// Only meaningful for a validated fraction.
    #[inline]
    pub fn scale(&self, sample: i16) -> i16 {
        let num = sample as i64 * self.numerator as i64;
        let den = self.denominator as i64;

        // round(num / den) == floor((2|num| + den) / 2den) with the sign restored
        let magnitude = (2 * num.abs() + den) / (2 * den);
        let scaled = if num < 0 { -magnitude } else { magnitude };

        scaled.clamp(i16::MIN as i64, i16::MAX as i64) as i16
    }
}

/// Pack two channel samples into one frame (left = low 16 bits).
#[inline]
pub const fn pack_frame(left: i16, right: i16) -> u32 {
    (left as u16 as u32) | ((right as u16 as u32) << 16)
}

/// Split a frame back into `(left, right)`.
#[inline]
pub const fn unpack_frame(frame: u32) -> (i16, i16) {
    (frame as u16 as i16, (frame >> 16) as u16 as i16)
}

/// Precomputed stereo frames, read-only once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackBuffer<const CAP: usize = PLAYBACK_FRAMES> {
    frames: Vec<u32, CAP>,
}

impl<const CAP: usize> PlaybackBuffer<CAP> {
    /// Build `periods` repetitions of `table`, scaled by `volume`.
    ///
    /// Frame `i` is `pack_frame(s, s)` with `s = round(table[i % N] * volume)`.
    /// Deterministic: identical inputs give identical buffers.
    pub fn build(table: &[i16], volume: Fraction, periods: usize) -> Result<Self, ConfigError> {
        volume.validate()?;

        if table.is_empty() {
            return Err(ConfigError::EmptyWaveform);
        }
        if periods == 0 {
            return Err(ConfigError::ZeroPeriods);
        }

        let needed = table.len().checked_mul(periods).unwrap_or(usize::MAX);
        if needed > CAP {
            return Err(ConfigError::BufferTooSmall { needed, capacity: CAP });
        }

        let mut frames = Vec::new();
        for &sample in table.iter().cycle().take(needed) {
            let scaled = volume.scale(sample);
            // Cannot fail: needed <= CAP checked above
            let _ = frames.push(pack_frame(scaled, scaled));
        }

        Ok(Self { frames })
    }

    /// Frames ready for the I2S peripheral.
    #[inline]
    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
