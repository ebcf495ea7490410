//! Audio subsystem: test tone playback
//!
//! Architecture:
//! - Waveform: fixed 32-sample sine, scaled to 1%, packed L/R, built once
//! - Playback: streaming task owns the I2S output, parked while stopped
//! - I2S @ 44.1 kHz, 16-bit stereo

pub mod waveform;
pub mod playback;

pub use waveform::{pack_frame, unpack_frame, Fraction, PlaybackBuffer, PLAYBACK_FRAMES, SINE_TABLE, TABLE_LEN};
pub use playback::{AudioOutput, AudioStreamer, Park, PlaybackControl, PlaybackStatus, StreamStep};
