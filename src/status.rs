// Litter Gauge - Header & Footer
//
// Header: black title bar with the battery level, redrawn on boot and wake.
// Footer: sleep countdown line along the bottom edge.
// Both sit outside the gauge band so they never touch gauge pixels.

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;

use crate::events::BatteryStatus;
use crate::panel::{Panel, TextSize, BLACK, WHITE};

const BATTERY_LABEL_GLYPHS: u32 = 9; // "BAT: 100%"

pub fn header_rect<P: Panel>(panel: &mut P) -> Rectangle {
    panel.set_text_style(TextSize::Medium, WHITE);
    Rectangle::new(Point::zero(), Size::new(panel.width(), panel.font_height()))
}

pub fn footer_rect<P: Panel>(panel: &mut P) -> Rectangle {
    panel.set_text_style(TextSize::Small, BLACK);
    let h = panel.font_height();
    Rectangle::new(
        Point::new(0, panel.height().saturating_sub(h) as i32),
        Size::new(panel.width(), h),
    )
}

pub fn draw_header<P: Panel>(panel: &mut P, title: &str, battery: BatteryStatus) {
    let bar = header_rect(panel);
    panel.fill_rect(bar.top_left.x, bar.top_left.y, bar.size.width, bar.size.height, BLACK);

    panel.set_cursor(0, 0);
    panel.print_fmt(format_args!("{}", title));

    let x = panel.width() as i32 - (panel.font_width() * BATTERY_LABEL_GLYPHS) as i32;
    panel.set_cursor(x, 0);
    panel.print_fmt(format_args!("BAT: {:3}%", battery.percentage));
}

pub fn draw_countdown<P: Panel>(panel: &mut P, remaining_s: u64) {
    let line = clear_footer(panel);
    panel.set_cursor(line.top_left.x, line.top_left.y);
    panel.print_fmt(format_args!("Sleep after: {} sec...", remaining_s));
}

/// Blank the footer line; returns its area.
pub fn clear_footer<P: Panel>(panel: &mut P) -> Rectangle {
    let line = footer_rect(panel);
    panel.fill_rect(line.top_left.x, line.top_left.y, line.size.width, line.size.height, WHITE);
    line
}
