//! Status display.
//!
//! The controller only sees [`StatusDisplay`]: fill, write a line, present.
//! [`GraphicsDisplay`] implements it for any `embedded-graphics` RGB565
//! target (the ST7789 panel on the device, a mock in tests).

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_9X15};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

/// Screen width in landscape.
pub const SCREEN_WIDTH: u32 = 320;
/// Screen height in landscape.
pub const SCREEN_HEIGHT: u32 = 240;

/// Screen colours.
pub mod palette {
    use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

    pub const BACKGROUND: Rgb565 = Rgb565::BLACK;
    pub const TEXT: Rgb565 = Rgb565::WHITE;
    pub const PLAYING: Rgb565 = Rgb565::BLUE;
}

/// Fonts available to `write_line`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Font {
    Title,
    Body,
}

impl Font {
    pub fn mono(self) -> &'static MonoFont<'static> {
        match self {
            Font::Title => &FONT_10X20,
            Font::Body => &FONT_9X15,
        }
    }
}

/// Display collaborator used by the main loop.
pub trait StatusDisplay {
    type Error: core::fmt::Debug;

    fn fill_rectangle(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error>;

    /// Draw `text` with its baseline at `y`.
    fn write_line(&mut self, font: Font, x: i32, y: i32, text: &str, color: Rgb565) -> Result<(), Self::Error>;

    /// Push pending drawing to the panel.
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// [`StatusDisplay`] over an `embedded-graphics` draw target.
///
/// Draws go straight to the target; `present` has nothing to flush.
pub struct GraphicsDisplay<T> {
    target: T,
}

impl<T> GraphicsDisplay<T> {
    pub fn new(target: T) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }
}

impl<T> StatusDisplay for GraphicsDisplay<T>
where
    T: DrawTarget<Color = Rgb565>,
    T::Error: core::fmt::Debug,
{
    type Error = T::Error;

    fn fill_rectangle(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        self.target.fill_solid(&area, color)
    }

    fn write_line(&mut self, font: Font, x: i32, y: i32, text: &str, color: Rgb565) -> Result<(), Self::Error> {
        let style = MonoTextStyle::new(font.mono(), color);
        Text::with_baseline(text, Point::new(x, y), style, Baseline::Alphabetic).draw(&mut self.target)?;
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Screen layout (landscape, origin top-left).
pub mod layout {
    use embedded_graphics::prelude::{Point, Size};
    use embedded_graphics::primitives::Rectangle;

    pub const TITLE: (i32, i32) = (40, 100);
    pub const GREETING: (i32, i32) = (20, 150);
    /// Baseline of the status line.
    pub const STATUS: (i32, i32) = (20, 180);

    /// Area cleared before each status redraw.
    pub const STATUS_REGION: Rectangle = Rectangle::new(Point::new(0, 166), Size::new(319, 20));
}

/// What the status line shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub playing: bool,
    pub presses: u32,
}

/// Status line text, e.g. `PLAYING  START PRESSED: 3`.
pub fn status_text(snapshot: StatusSnapshot) -> String<40> {
    let mut text = String::new();
    let state = if snapshot.playing { "PLAYING" } else { "STOPPED" };
    // 7 + 2 + 15 + 10 digits fits in 40
    let _ = write!(text, "{}  START PRESSED: {}", state, snapshot.presses);
    text
}

/// Startup screen. Leaves the status line showing the START hint.
pub fn draw_welcome<D: StatusDisplay>(display: &mut D) -> Result<(), D::Error> {
    display.fill_rectangle(
        Rectangle::new(Point::zero(), Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)),
        palette::BACKGROUND,
    )?;

    let (x, y) = layout::TITLE;
    display.write_line(Font::Title, x, y, "picoTracker", palette::TEXT)?;
    let (x, y) = layout::GREETING;
    display.write_line(Font::Body, x, y, "welcome from Rust!", palette::TEXT)?;
    let (x, y) = layout::STATUS;
    display.write_line(Font::Body, x, y, "Press START to play", palette::TEXT)?;

    display.present()
}

/// Redraw the status region.
pub fn draw_status<D: StatusDisplay>(display: &mut D, snapshot: StatusSnapshot) -> Result<(), D::Error> {
    display.fill_rectangle(layout::STATUS_REGION, palette::BACKGROUND)?;

    let color = if snapshot.playing { palette::PLAYING } else { palette::TEXT };
    let (x, y) = layout::STATUS;
    display.write_line(Font::Body, x, y, &status_text(snapshot), color)?;

    display.present()
}
