//! Hardware Abstraction Layer for TrackerFirmware.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! Business logic stays in core modules, HAL is just I/O.
//!
//! `st7789` only needs `embedded-hal` traits and builds everywhere; the rest
//! is ESP-IDF only.
//!
//! Pin map (ESP32-S3):
//!
//! | Function            | GPIO |
//! |---------------------|------|
//! | LEFT DOWN RIGHT UP  | 8 9 10 11 |
//! | LT B A RT           | 12 13 14 15 |
//! | PLAY                | 16 |
//! | Display SCK SDO SDI | 39 40 41 |
//! | Display CS DC RST BL| 42 21 38 47 |
//! | I2S DOUT BCLK WS    | 17 18 48 |
//! | Log UART TX         | 6 |

pub mod st7789;

#[cfg(target_os = "espidf")]
pub mod gpio;
#[cfg(target_os = "espidf")]
pub mod audio;
#[cfg(target_os = "espidf")]
pub mod uart_log;

pub use st7789::{PanelConfig, Rotation, St7789, St7789Error};

/// `esp_timer` based monotonic clock.
#[cfg(target_os = "espidf")]
#[derive(Clone, Copy, Debug, Default)]
pub struct EspClock;

#[cfg(target_os = "espidf")]
impl crate::Clock for EspClock {
    fn now_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time is always safe to call after boot
        unsafe { esp_idf_svc::sys::esp_timer_get_time() as u64 }
    }
}
