//! ST7789 TFT driver
//!
//! 4-wire SPI (SCK, SDO, CS + D/C pin), RGB565, direct drawing (no frame
//! buffer). Implements `embedded-graphics` `DrawTarget`.
//! Reference: ST7789V datasheet

use embedded_graphics::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

/// ST7789 command bytes
pub mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const NORON: u8 = 0x13;
    pub const INVOFF: u8 = 0x20;
    pub const INVON: u8 = 0x21;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
}

/// MADCTL bits
mod madctl {
    pub const MY: u8 = 0x80;
    pub const MX: u8 = 0x40;
    pub const MV: u8 = 0x20;
}

/// COLMOD: 65k colours, 16 bit/pixel
const COLMOD_RGB565: u8 = 0x55;

/// Pixels per SPI write while streaming a fill.
const FILL_CHUNK_PIXELS: usize = 64;

/// Panel rotation (clockwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    fn madctl(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => madctl::MX | madctl::MV,
            Rotation::Deg180 => madctl::MX | madctl::MY,
            Rotation::Deg270 => madctl::MY | madctl::MV,
        }
    }

    fn is_landscape(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// Panel configuration
#[derive(Debug, Clone, Copy)]
pub struct PanelConfig {
    /// Native (portrait) width
    pub width: u16,
    /// Native (portrait) height
    pub height: u16,
    pub rotation: Rotation,
    /// The tracker's panel shows inverted colours without INVON
    pub invert_colors: bool,
    pub column_offset: u16,
    pub row_offset: u16,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 320,
            rotation: Rotation::Deg270,
            invert_colors: true,
            column_offset: 0,
            row_offset: 0,
        }
    }
}

/// ST7789 driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum St7789Error<SpiE, PinE> {
    /// SPI transfer failed
    Spi(SpiE),
    /// D/C or reset pin failed
    Pin(PinE),
}

/// ST7789 driver
pub struct St7789<SPI, DC, RST> {
    spi: SPI,
    dc: DC,
    rst: RST,
    config: PanelConfig,
}

impl<SPI, DC, RST, PinE> St7789<SPI, DC, RST>
where
    SPI: SpiDevice,
    DC: OutputPin<Error = PinE>,
    RST: OutputPin<Error = PinE>,
{
    /// Create driver. Call [`init`](Self::init) before drawing.
    pub fn new(spi: SPI, dc: DC, rst: RST, config: PanelConfig) -> Self {
        Self { spi, dc, rst, config }
    }

    /// Hardware reset + init sequence
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), St7789Error<SPI::Error, PinE>> {
        self.rst.set_high().map_err(St7789Error::Pin)?;
        delay.delay_ms(1);
        self.rst.set_low().map_err(St7789Error::Pin)?;
        delay.delay_ms(10);
        self.rst.set_high().map_err(St7789Error::Pin)?;
        delay.delay_ms(120);

        self.command(cmd::SWRESET, &[])?;
        delay.delay_ms(150);
        self.command(cmd::SLPOUT, &[])?;
        delay.delay_ms(120);

        self.command(cmd::COLMOD, &[COLMOD_RGB565])?;
        delay.delay_ms(10);
        self.command(cmd::MADCTL, &[self.config.rotation.madctl()])?;

        let inversion = if self.config.invert_colors { cmd::INVON } else { cmd::INVOFF };
        self.command(inversion, &[])?;

        self.command(cmd::NORON, &[])?;
        delay.delay_ms(10);
        self.command(cmd::DISPON, &[])?;
        delay.delay_ms(10);

        Ok(())
    }

    /// Send a command byte (D/C low) followed by its parameters (D/C high).
    pub fn command(&mut self, command: u8, params: &[u8]) -> Result<(), St7789Error<SPI::Error, PinE>> {
        self.dc.set_low().map_err(St7789Error::Pin)?;
        self.spi.write(&[command]).map_err(St7789Error::Spi)?;

        if !params.is_empty() {
            self.dc.set_high().map_err(St7789Error::Pin)?;
            self.spi.write(params).map_err(St7789Error::Spi)?;
        }
        Ok(())
    }

    /// Set the drawing window (inclusive) and start a RAM write.
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), St7789Error<SPI::Error, PinE>> {
        let (cx, ry) = (self.config.column_offset, self.config.row_offset);
        // Out-of-range offsets clamp to the controller's last address
        let (x0, x1) = (x0.saturating_add(cx), x1.saturating_add(cx));
        let (y0, y1) = (y0.saturating_add(ry), y1.saturating_add(ry));

        self.command(cmd::CASET, &[(x0 >> 8) as u8, x0 as u8, (x1 >> 8) as u8, x1 as u8])?;
        self.command(cmd::RASET, &[(y0 >> 8) as u8, y0 as u8, (y1 >> 8) as u8, y1 as u8])?;
        self.command(cmd::RAMWR, &[])?;

        // Pixel data follows as parameters
        self.dc.set_high().map_err(St7789Error::Pin)
    }

    /// Stream `count` pixels of one colour into the open window.
    fn write_repeated(&mut self, color: Rgb565, count: usize) -> Result<(), St7789Error<SPI::Error, PinE>> {
        let [hi, lo] = RawU16::from(color).into_inner().to_be_bytes();
        let mut chunk = [0u8; FILL_CHUNK_PIXELS * 2];
        for pair in chunk.chunks_exact_mut(2) {
            pair[0] = hi;
            pair[1] = lo;
        }

        let mut left = count;
        while left > 0 {
            let n = left.min(FILL_CHUNK_PIXELS);
            self.spi.write(&chunk[..n * 2]).map_err(St7789Error::Spi)?;
            left -= n;
        }
        Ok(())
    }

    /// Release the bus and pins.
    pub fn release(self) -> (SPI, DC, RST) {
        (self.spi, self.dc, self.rst)
    }
}

impl<SPI, DC, RST> OriginDimensions for St7789<SPI, DC, RST> {
    fn size(&self) -> Size {
        let (w, h) = (self.config.width as u32, self.config.height as u32);
        if self.config.rotation.is_landscape() {
            Size::new(h, w)
        } else {
            Size::new(w, h)
        }
    }
}

impl<SPI, DC, RST, PinE> DrawTarget for St7789<SPI, DC, RST>
where
    SPI: SpiDevice,
    DC: OutputPin<Error = PinE>,
    RST: OutputPin<Error = PinE>,
{
    type Color = Rgb565;
    type Error = St7789Error<SPI::Error, PinE>;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if !bounds.contains(point) {
                continue;
            }
            let (x, y) = (point.x as u16, point.y as u16);
            self.set_window(x, y, x, y)?;
            self.write_repeated(color, 1)?;
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(()); // zero-sized
        };

        self.set_window(
            area.top_left.x as u16,
            area.top_left.y as u16,
            bottom_right.x as u16,
            bottom_right.y as u16,
        )?;
        self.write_repeated(color, (area.size.width * area.size.height) as usize)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_solid(&self.bounding_box(), color)
    }
}
