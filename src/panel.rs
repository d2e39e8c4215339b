// Litter Gauge - Display Panel
//
// Cursor-and-primitive drawing surface used by the gauge, header and footer.
// `EgPanel` maps it onto any embedded-graphics target; `FrameBuffer` is the
// 1-bpp image the e-paper driver transfers on flush.

use std::convert::Infallible;
use std::fmt;

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_9X15};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Arc, Circle, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, Sector, StrokeAlignment,
};
use embedded_graphics::text::{Baseline, Text};

/// Ink colour. `On` is black ink, `Off` is bare paper.
pub type Ink = BinaryColor;
pub const BLACK: Ink = BinaryColor::On;
pub const WHITE: Ink = BinaryColor::Off;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    /// Footer countdown.
    Small,
    /// Header bar and volume label.
    Medium,
    /// Percentage label.
    Large,
}

impl TextSize {
    pub fn font(self) -> &'static MonoFont<'static> {
        match self {
            TextSize::Small => &FONT_6X10,
            TextSize::Medium => &FONT_9X15,
            TextSize::Large => &profont::PROFONT_24_POINT,
        }
    }
}

/// Clockwise sweep from `start` to `end` in degrees, in `[0, 360)`.
pub fn sweep_degrees(start: f32, end: f32) -> f32 {
    (end - start).rem_euclid(360.0)
}

pub trait Panel {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Ink);
    fn draw_circle(&mut self, cx: i32, cy: i32, r: u32, color: Ink);

    /// Fill the ring segment between `r_inner` and `r_outer`, clockwise from
    /// `start_deg` to `end_deg`. 0 degrees points right, -90 points up.
    #[allow(clippy::too_many_arguments)]
    fn fill_arc(
        &mut self,
        cx: i32,
        cy: i32,
        r_outer: u32,
        r_inner: u32,
        start_deg: f32,
        end_deg: f32,
        color: Ink,
    );

    fn set_text_style(&mut self, size: TextSize, color: Ink);
    /// Glyph advance of the current text size.
    fn font_width(&self) -> u32;
    fn font_height(&self) -> u32;
    fn set_cursor(&mut self, x: i32, y: i32);
    /// Print at the cursor and advance it.
    fn print_fmt(&mut self, args: fmt::Arguments<'_>);

    /// Buffered panels (e-paper) only show what was drawn after `flush`.
    fn is_buffered(&self) -> bool;
    fn flush(&mut self) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// embedded-graphics adapter
// ---------------------------------------------------------------------------

/// A draw target that may need an explicit transfer to become visible.
pub trait PanelTarget: DrawTarget<Color = BinaryColor> + OriginDimensions {
    fn is_buffered(&self) -> bool;
    fn flush(&mut self) -> anyhow::Result<()>;
}

pub struct EgPanel<D> {
    target: D,
    cursor: Point,
    text_size: TextSize,
    text_color: Ink,
}

impl<D: PanelTarget> EgPanel<D> {
    pub fn new(target: D) -> Self {
        Self {
            target,
            cursor: Point::zero(),
            text_size: TextSize::Small,
            text_color: BLACK,
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    fn draw<T>(&mut self, drawable: T)
    where
        T: Drawable<Color = BinaryColor>,
    {
        if drawable.draw(&mut self.target).is_err() {
            log::error!("Panel draw failed");
        }
    }
}

impl<D: PanelTarget> Panel for EgPanel<D> {
    fn width(&self) -> u32 {
        self.target.size().width
    }

    fn height(&self) -> u32 {
        self.target.size().height
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Ink) {
        let rect = Rectangle::new(Point::new(x, y), Size::new(w, h))
            .into_styled(PrimitiveStyle::with_fill(color));
        self.draw(rect);
    }

    fn draw_circle(&mut self, cx: i32, cy: i32, r: u32, color: Ink) {
        let circle = Circle::with_center(Point::new(cx, cy), 2 * r + 1)
            .into_styled(PrimitiveStyle::with_stroke(color, 1));
        self.draw(circle);
    }

    fn fill_arc(
        &mut self,
        cx: i32,
        cy: i32,
        r_outer: u32,
        r_inner: u32,
        start_deg: f32,
        end_deg: f32,
        color: Ink,
    ) {
        let sweep = sweep_degrees(start_deg, end_deg);
        if sweep == 0.0 || r_outer < r_inner {
            return;
        }
        let center = Point::new(cx, cy);

        if r_inner == 0 {
            let pie = Sector::with_center(center, 2 * r_outer + 1, start_deg.deg(), sweep.deg())
                .into_styled(PrimitiveStyle::with_fill(color));
            self.draw(pie);
            return;
        }

        // A centred stroke on the mid radius covers r_inner..=r_outer.
        let style = PrimitiveStyleBuilder::new()
            .stroke_color(color)
            .stroke_width(r_outer - r_inner + 1)
            .stroke_alignment(StrokeAlignment::Center)
            .build();
        let ring = Arc::with_center(center, r_outer + r_inner, start_deg.deg(), sweep.deg())
            .into_styled(style);
        self.draw(ring);
    }

    fn set_text_style(&mut self, size: TextSize, color: Ink) {
        self.text_size = size;
        self.text_color = color;
    }

    fn font_width(&self) -> u32 {
        let font = self.text_size.font();
        font.character_size.width + font.character_spacing
    }

    fn font_height(&self) -> u32 {
        self.text_size.font().character_size.height
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = Point::new(x, y);
    }

    fn print_fmt(&mut self, args: fmt::Arguments<'_>) {
        let text = fmt::format(args);
        let style = MonoTextStyle::new(self.text_size.font(), self.text_color);
        match Text::with_baseline(&text, self.cursor, style, Baseline::Top).draw(&mut self.target) {
            Ok(next) => self.cursor = next,
            Err(_) => log::error!("Panel text draw failed"),
        }
    }

    fn is_buffered(&self) -> bool {
        self.target.is_buffered()
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.target.flush()
    }
}

// ---------------------------------------------------------------------------
// 1-bpp frame buffer
// ---------------------------------------------------------------------------

/// Row-major, MSB-first, one bit per pixel; a set bit is black ink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width.div_ceil(8) as usize;
        Self {
            width,
            height,
            bits: vec![0; stride * height as usize],
        }
    }

    fn stride(&self) -> usize {
        self.width.div_ceil(8) as usize
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let byte = self.bits[y as usize * self.stride() + (x / 8) as usize];
        let set = byte & (0x80 >> (x % 8)) != 0;
        Some(BinaryColor::from(set))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn fill(&mut self, color: BinaryColor) {
        let value = if color.is_on() { 0xFF } else { 0x00 };
        self.bits.iter_mut().for_each(|b| *b = value);
    }

    /// Number of black pixels inside `area`.
    pub fn ink_in(&self, area: &Rectangle) -> usize {
        area.points()
            .filter(|p| p.x >= 0 && p.y >= 0)
            .filter(|p| self.pixel(p.x as u32, p.y as u32) == Some(BLACK))
            .count()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let stride = self.stride();
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x >= self.width || y >= self.height {
                continue;
            }
            let index = y as usize * stride + (x / 8) as usize;
            let mask = 0x80u8 >> (x % 8);
            if color.is_on() {
                self.bits[index] |= mask;
            } else {
                self.bits[index] &= !mask;
            }
        }
        Ok(())
    }
}

/// An in-memory buffer has no panel behind it; what is drawn is final.
impl PanelTarget for FrameBuffer {
    fn is_buffered(&self) -> bool {
        false
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> EgPanel<FrameBuffer> {
        EgPanel::new(FrameBuffer::new(200, 200))
    }

    #[test]
    fn sweep_is_clockwise_and_normalised() {
        assert_eq!(sweep_degrees(180.0, -90.0), 90.0);
        assert_eq!(sweep_degrees(-89.0, -90.0), 359.0);
        assert_eq!(sweep_degrees(-91.0, -90.0), 1.0);
        assert_eq!(sweep_degrees(270.0, -90.0), 0.0);
    }

    #[test]
    fn frame_buffer_sets_and_clears_bits() {
        let mut fb = FrameBuffer::new(16, 2);
        Pixel(Point::new(9, 1), BLACK).draw(&mut fb).unwrap();
        assert_eq!(fb.as_bytes()[3], 0x40);
        assert_eq!(fb.pixel(9, 1), Some(BLACK));
        Pixel(Point::new(9, 1), WHITE).draw(&mut fb).unwrap();
        assert_eq!(fb.pixel(9, 1), Some(WHITE));
        assert_eq!(fb.pixel(16, 0), None);
    }

    #[test]
    fn out_of_bounds_pixels_are_dropped() {
        let mut fb = FrameBuffer::new(8, 8);
        Pixel(Point::new(-1, 3), BLACK).draw(&mut fb).unwrap();
        Pixel(Point::new(8, 3), BLACK).draw(&mut fb).unwrap();
        assert!(fb.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn fill_rect_covers_exact_area() {
        let mut p = panel();
        p.fill_rect(10, 20, 5, 3, BLACK);
        let area = Rectangle::new(Point::new(10, 20), Size::new(5, 3));
        assert_eq!(p.target().ink_in(&area), 15);
        assert_eq!(p.target().ink_in(&Rectangle::new(Point::zero(), Size::new(200, 200))), 15);
    }

    #[test]
    fn quarter_arc_inks_only_upper_left() {
        let mut p = panel();
        // Clockwise from 9 o'clock to 12 o'clock.
        p.fill_arc(100, 100, 80, 50, 180.0, -90.0, BLACK);
        let upper_left = Rectangle::new(Point::new(20, 20), Size::new(80, 80));
        let lower_right = Rectangle::new(Point::new(101, 101), Size::new(80, 80));
        assert!(p.target().ink_in(&upper_left) > 0);
        assert_eq!(p.target().ink_in(&lower_right), 0);
        // Ring hole stays clear.
        assert_eq!(p.target().pixel(100, 100), Some(WHITE));
    }

    #[test]
    fn zero_sweep_draws_nothing() {
        let mut p = panel();
        p.fill_arc(100, 100, 80, 50, 270.0, -90.0, BLACK);
        assert!(p.target().as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn print_advances_cursor_by_glyphs() {
        let mut p = panel();
        p.set_text_style(TextSize::Small, BLACK);
        p.set_cursor(0, 0);
        p.print_fmt(format_args!("{}", "abc"));
        assert_eq!(p.cursor(), Point::new(3 * p.font_width() as i32, 0));
    }

    #[test]
    fn font_metrics_follow_text_size() {
        let mut p = panel();
        p.set_text_style(TextSize::Small, BLACK);
        assert_eq!((p.font_width(), p.font_height()), (6, 10));
        p.set_text_style(TextSize::Medium, BLACK);
        assert_eq!((p.font_width(), p.font_height()), (9, 15));
    }
}
