//! Audio HAL for I2S tone output.

use esp_idf_svc::hal::delay::BLOCK;
use esp_idf_svc::hal::i2s::{I2sDriver, I2sTx};
use esp_idf_svc::sys::EspError;

use crate::audio::playback::AudioOutput;
use crate::audio::waveform::PLAYBACK_FRAMES;

/// Bytes per packed stereo frame.
const FRAME_BYTES: usize = 4;

/// 16-bit stereo I2S output.
///
/// Frames are serialised little-endian (left sample first on the wire).
pub struct I2sStereoOut<'d> {
    driver: I2sDriver<'d, I2sTx>,
    scratch: [u8; PLAYBACK_FRAMES * FRAME_BYTES],
}

impl<'d> I2sStereoOut<'d> {
    /// Take a configured TX driver and start the channel.
    pub fn new(mut driver: I2sDriver<'d, I2sTx>) -> Result<Self, EspError> {
        driver.tx_enable()?;
        Ok(Self {
            driver,
            scratch: [0; PLAYBACK_FRAMES * FRAME_BYTES],
        })
    }
}

impl AudioOutput for I2sStereoOut<'_> {
    type Error = EspError;

    fn write_stereo_block(&mut self, frames: &[u32]) -> Result<(), EspError> {
        // Blocks larger than the scratch buffer go out in pieces
        for chunk in frames.chunks(PLAYBACK_FRAMES) {
            let len = chunk.len() * FRAME_BYTES;
            for (dst, frame) in self.scratch[..len].chunks_exact_mut(FRAME_BYTES).zip(chunk) {
                dst.copy_from_slice(&frame.to_le_bytes());
            }
            self.driver.write_all(&self.scratch[..len], BLOCK)?;
        }
        Ok(())
    }
}
