//! GPIO HAL for the front-panel buttons.
//!
//! Buttons short to ground; inputs use the internal pull-ups, so a pressed
//! button reads low.

use esp_idf_svc::hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
use esp_idf_svc::sys::EspError;
use heapless::Vec;

use crate::controller::InputReader;
use crate::input::InputId;

/// All nine buttons, indexed by [`InputId::index`].
pub struct PanelInputs<'d> {
    pins: Vec<PinDriver<'d, AnyIOPin, Input>, { InputId::COUNT }>,
}

impl<'d> PanelInputs<'d> {
    /// Configure every pin as a pulled-up input.
    ///
    /// `pins` must be ordered like [`InputId::ALL`].
    pub fn new(pins: [AnyIOPin; InputId::COUNT]) -> Result<Self, EspError> {
        let mut drivers = Vec::new();
        for pin in pins {
            let mut driver = PinDriver::input(pin)?;
            driver.set_pull(Pull::Up)?;
            // Cannot overflow: exactly COUNT pins
            let _ = drivers.push(driver);
        }
        Ok(Self { pins: drivers })
    }
}

impl InputReader for PanelInputs<'_> {
    fn read_level(&mut self, input: InputId) -> bool {
        self.pins[input.index()].is_high()
    }
}
