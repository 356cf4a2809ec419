use crate::chip::{
    chip8::{
        constants::{CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH},
        Chip8,
    },
    Chip, ChipWithCursiveDisplay,
};

use cursive::{
    direction::Direction,
    event::{Event, EventResult},
    theme::{BaseColor, Color, ColorStyle},
    view::{CannotFocus, View},
    CbSink, Printer, Vec2,
};

/// Name under which the host registers the display view.
pub const DISPLAY_VIEW_NAME: &str = "chip8-display";

const PIXEL_COUNT: usize = CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT;

/// Represents the display of the Chip 8, plus one status line showing
/// the sound gate.
pub struct Display {
    pixels: [u8; PIXEL_COUNT],
    beeping: bool,
}

impl Display {
    /// Creates a new display from a framebuffer.
    pub fn new(pixels: &[u8; PIXEL_COUNT], beeping: bool) -> Self {
        Display {
            pixels: *pixels,
            beeping,
        }
    }

    pub fn update(&mut self, pixels: &[u8; PIXEL_COUNT], beeping: bool) {
        self.pixels = *pixels;
        self.beeping = beeping;
    }

    pub fn is_lit(&self, x: usize, y: usize) -> bool {
        self.pixels[x + CHIP8_DISPLAY_WIDTH * y] != 0
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new(&[0; PIXEL_COUNT], false)
    }
}

/// Implements cursive::view::View for Display to enable drawing it
/// as a View out of the box.
impl View for Display {
    fn draw(&self, printer: &Printer) {
        printer.with_color(
            ColorStyle::new(Color::Dark(BaseColor::Black), Color::RgbLowRes(5, 5, 5)),
            |printer| {
                for x in 0..CHIP8_DISPLAY_WIDTH {
                    for y in 0..CHIP8_DISPLAY_HEIGHT {
                        if self.is_lit(x, y) {
                            printer.print((x, y), " ");
                        }
                    }
                }
            },
        );

        let status = if self.beeping { "\u{266a} beep" } else { "" };
        printer.print((0, CHIP8_DISPLAY_HEIGHT), status);
    }

    fn take_focus(&mut self, _: Direction) -> Result<EventResult, CannotFocus> {
        Ok(EventResult::Consumed(None))
    }

    fn on_event(&mut self, _event: Event) -> EventResult {
        EventResult::Ignored
    }

    fn required_size(&mut self, _: Vec2) -> Vec2 {
        Vec2 {
            x: CHIP8_DISPLAY_WIDTH,
            y: CHIP8_DISPLAY_HEIGHT + 1,
        }
    }
}

impl ChipWithCursiveDisplay for Chip8 {
    fn update_ui(&mut self, gfx_sink: &CbSink) -> bool {
        if !self.take_draw_flag() {
            return true;
        }

        let beeping = self.sound_gate();
        let pixels = *self.framebuffer();
        gfx_sink
            .send(Box::new(move |s: &mut cursive::Cursive| {
                s.call_on_name(DISPLAY_VIEW_NAME, |display: &mut Display| {
                    display.update(&pixels, beeping)
                });
            }))
            .is_ok()
    }
}
