//! TrackerFirmware - Main entry point
//!
//! Boot order:
//! 1. UART log sink (everything after this is visible on the serial port)
//! 2. Config validation, playback buffer
//! 3. Display, buttons, I2S
//! 4. Audio task (own thread), then the main loop on this one
//!
//! Only ESP-IDF targets boot; the host build is a stub so `cargo test`
//! can build the workspace.

#[cfg(target_os = "espidf")]
fn main() {
    esp_idf_svc::sys::link_patches();

    if let Err(e) = device::boot() {
        // The log drain is gone by now; the IDF console is all that is left
        println!("boot failed: {:?}", e);
    }

    loop {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(1000);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    println!("{}", env!("VERSION_STRING"));
    println!("build for target_os = \"espidf\" to run on the device");
}

#[cfg(target_os = "espidf")]
mod device {
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver};
    use esp_idf_svc::hal::i2s::config::{DataBitWidth, StdConfig};
    use esp_idf_svc::hal::i2s::I2sDriver;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
    use esp_idf_svc::hal::units::FromValueType;
    use esp_idf_svc::sys::EspError;
    use std::sync::OnceLock;
    use std::thread::{self, Thread};
    use std::time::Duration;

    use embedded_hal::delay::DelayNs;

    use tracker_firmware::audio::{AudioStreamer, Park};
    use tracker_firmware::controller::Controller;
    use tracker_firmware::display::GraphicsDisplay;
    use tracker_firmware::globals::{audio_links, ui_links, LOG_RINGS, PLAYBACK, UI_LOG};
    use tracker_firmware::hal::audio::I2sStereoOut;
    use tracker_firmware::hal::gpio::PanelInputs;
    use tracker_firmware::hal::uart_log::{init_uart_logger, UartLogSink, UartLoggerConfig};
    use tracker_firmware::hal::{EspClock, PanelConfig, St7789};
    use tracker_firmware::log_sink::{LogDrain, LogSink};
    use tracker_firmware::{fw_error, fw_info, Clock, ConfigError, FirmwareConfig};

    /// Audio task stack.
    const AUDIO_STACK_SIZE: usize = 8 * 1024;

    /// Display SPI clock.
    const DISPLAY_SPI_MHZ: u32 = 20;

    /// Audio thread handle, set once after spawn.
    static AUDIO_THREAD: OnceLock<Thread> = OnceLock::new();

    /// Registered as the playback waker.
    fn wake_audio_task() {
        if let Some(audio) = AUDIO_THREAD.get() {
            audio.unpark();
        }
    }

    /// Delays for the audio thread: FreeRTOS sleeps, thread parking when idle.
    struct AudioWait;

    impl DelayNs for AudioWait {
        fn delay_ns(&mut self, ns: u32) {
            DelayNs::delay_ns(&mut FreeRtos, ns);
        }

        fn delay_ms(&mut self, ms: u32) {
            FreeRtos::delay_ms(ms);
        }
    }

    impl Park for AudioWait {
        fn park_ms(&mut self, max_ms: u32) {
            thread::park_timeout(Duration::from_millis(max_ms as u64));
        }
    }

    /// Why boot stopped.
    #[derive(Debug)]
    pub enum StartupError {
        Config(ConfigError),
        Esp(EspError),
        Spawn,
    }

    impl From<ConfigError> for StartupError {
        fn from(e: ConfigError) -> Self {
            StartupError::Config(e)
        }
    }

    impl From<EspError> for StartupError {
        fn from(e: EspError) -> Self {
            StartupError::Esp(e)
        }
    }

    fn select_config() -> FirmwareConfig {
        if cfg!(feature = "fast-ui") {
            FirmwareConfig::FAST_UI
        } else {
            FirmwareConfig::DEFAULT
        }
    }

    /// Bring up the hardware, start the audio task, run the main loop.
    ///
    /// Returns only on a startup error.
    pub fn boot() -> Result<(), StartupError> {
        let clock = EspClock;
        let config = select_config();
        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        // 1. Logging
        let uart_config = UartLoggerConfig::default();
        let uart = init_uart_logger(peripherals.uart1, pins.gpio6, &uart_config)?;
        let mut sink = UartLogSink::new(uart);
        sink.write_line(b"UART ready\n");

        let mut logs = LogDrain::new(sink, &LOG_RINGS, &config);
        let log = &UI_LOG;
        fw_info!(log, clock.now_us(), "{}", env!("VERSION_STRING"));

        // 2. Config and waveform
        let buffer = match config.playback_buffer() {
            Ok(buffer) => buffer,
            Err(e) => {
                fw_error!(log, clock.now_us(), "config rejected: {}", e);
                logs.flush();
                return Err(e.into());
            }
        };
        fw_info!(log, clock.now_us(), "playback buffer: {} frames", buffer.len());
        logs.flush();

        // Let the panel power rail settle
        FreeRtos::delay_ms(500);

        // 3. Display
        let spi = SpiDriver::new(
            peripherals.spi2,
            pins.gpio39,
            pins.gpio40,
            Some(pins.gpio41),
            &SpiDriverConfig::new(),
        )?;
        let spi = SpiDeviceDriver::new(
            spi,
            Some(pins.gpio42),
            &SpiConfig::new().baudrate(DISPLAY_SPI_MHZ.MHz().into()),
        )?;
        let dc = PinDriver::output(pins.gpio21)?;
        let rst = PinDriver::output(pins.gpio38)?;
        let mut panel = St7789::new(spi, dc, rst, PanelConfig::default());
        match panel.init(&mut FreeRtos) {
            Ok(()) => fw_info!(log, clock.now_us(), "Display ready"),
            Err(e) => fw_error!(log, clock.now_us(), "display init failed: {:?}", e),
        }

        let mut backlight = PinDriver::output(pins.gpio47)?;
        backlight.set_high()?;
        // Backlight stays on for the device lifetime
        core::mem::forget(backlight);

        let display = GraphicsDisplay::new(panel);

        // 4. Buttons, ordered like InputId::ALL
        let inputs = PanelInputs::new([
            AnyIOPin::from(pins.gpio8),
            AnyIOPin::from(pins.gpio9),
            AnyIOPin::from(pins.gpio10),
            AnyIOPin::from(pins.gpio11),
            AnyIOPin::from(pins.gpio12),
            AnyIOPin::from(pins.gpio13),
            AnyIOPin::from(pins.gpio14),
            AnyIOPin::from(pins.gpio15),
            AnyIOPin::from(pins.gpio16),
        ])?;
        fw_info!(log, clock.now_us(), "Buttons setup complete");

        // 5. Audio
        let i2s_config = StdConfig::philips(config.sample_rate, DataBitWidth::Bits16);
        let i2s = I2sDriver::new_std_tx(
            peripherals.i2s0,
            &i2s_config,
            pins.gpio18,
            pins.gpio17,
            Option::<AnyIOPin>::None,
            pins.gpio48,
        )?;
        let output = I2sStereoOut::new(i2s)?;
        fw_info!(log, clock.now_us(), "I2S ready at {} Hz", config.sample_rate);
        logs.flush();

        let streamer = AudioStreamer::new(output, AudioWait, EspClock, buffer, audio_links(), &config);
        let audio = thread::Builder::new()
            .name("audio".into())
            .stack_size(AUDIO_STACK_SIZE)
            .spawn(move || streamer.run())
            .map_err(|_| StartupError::Spawn)?;
        let _ = AUDIO_THREAD.set(audio.thread().clone());
        PLAYBACK.set_waker(wake_audio_task);

        // 6. Main loop
        let mut controller = Controller::new(inputs, display, ui_links(), &config);
        controller.show_welcome(clock.now_us());
        FreeRtos::delay_ms(200);
        fw_info!(log, clock.now_us(), "Starting main loop");

        controller.run(&clock, &mut FreeRtos, logs)
    }
}
