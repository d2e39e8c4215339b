// Litter Gauge - Gauge Renderer
//
// Ring gauge filled clockwise from 12 o'clock. Redraws only when the value
// differs bit-for-bit from the one on screen.

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;

use crate::config::GAUGE_VERTICAL_MARGIN;
use crate::panel::{sweep_degrees, Panel, TextSize, BLACK, WHITE};

/// 12 o'clock, where every fill ends.
pub const GAUGE_END_DEG: f32 = -90.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepAngles {
    pub start_deg: f32,
    pub end_deg: f32,
    /// The raw angles pointed the same way and `start_deg` was moved.
    pub guarded: bool,
}

impl SweepAngles {
    pub fn sweep(&self) -> f32 {
        sweep_degrees(self.start_deg, self.end_deg)
    }
}

/// Start/end angles for a fill fraction.
///
/// When start and end name the same direction (empty or full gauge) an arc
/// primitive cannot tell "nothing" from "everything", so the start is moved
/// by one degree toward the intended side: a 1 degree sliver when empty,
/// 359 degrees when full.
pub fn sweep_angles(percent: f32) -> SweepAngles {
    let end_deg = GAUGE_END_DEG;
    let start_deg = 360.0 * (1.0 - percent) - 90.0;

    if sweep_degrees(start_deg, end_deg) != 0.0 {
        return SweepAngles {
            start_deg,
            end_deg,
            guarded: false,
        };
    }

    let start_deg = if percent >= 1.0 {
        end_deg + 1.0
    } else {
        end_deg - 1.0
    };
    SweepAngles {
        start_deg,
        end_deg,
        guarded: true,
    }
}

/// The only screen area the gauge clears and draws into.
pub fn gauge_band(width: u32, height: u32) -> Rectangle {
    let size = height.saturating_sub(GAUGE_VERTICAL_MARGIN);
    let top = (height / 2) as i32 - (size / 2) as i32;
    Rectangle::new(Point::new(0, top), Size::new(width, size))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeState {
    /// Value currently on screen; `None` until the first draw.
    pub last_displayed: Option<f32>,
    pub max_capacity: f32,
    pub ring_width: u32,
}

pub struct GaugeRenderer {
    state: GaugeState,
}

impl GaugeRenderer {
    pub fn new(max_capacity: f32, ring_width: u32) -> Self {
        Self {
            state: GaugeState {
                last_displayed: None,
                max_capacity,
                ring_width,
            },
        }
    }

    pub fn state(&self) -> &GaugeState {
        &self.state
    }

    pub fn needs_redraw(&self, value: f32) -> bool {
        match self.state.last_displayed {
            Some(last) => last.to_bits() != value.to_bits(),
            None => true,
        }
    }

    /// Forget what is on screen, e.g. after the whole panel was cleared.
    pub fn invalidate(&mut self) {
        self.state.last_displayed = None;
    }

    /// Draw `value` unless it is already displayed. Returns whether anything
    /// was drawn.
    pub fn render<P: Panel>(&mut self, panel: &mut P, value: f32) -> bool {
        if !self.needs_redraw(value) {
            return false;
        }
        self.state.last_displayed = Some(value);

        let percent = value / self.state.max_capacity;
        let angles = sweep_angles(percent);

        let band = gauge_band(panel.width(), panel.height());
        let cx = (panel.width() / 2) as i32;
        let cy = (panel.height() / 2) as i32;
        let r_outer = band.size.height / 2;
        let r_inner = r_outer.saturating_sub(self.state.ring_width);

        panel.fill_rect(band.top_left.x, band.top_left.y, band.size.width, band.size.height, WHITE);

        panel.draw_circle(cx, cy, r_outer, BLACK);
        panel.draw_circle(cx, cy, r_inner, BLACK);
        panel.fill_arc(cx, cy, r_outer, r_inner, angles.start_deg, angles.end_deg, BLACK);

        panel.set_text_style(TextSize::Large, BLACK);
        let mut y = cy - (panel.font_height() / 2) as i32;
        panel.set_cursor(cx - (panel.font_width() * 2) as i32, y);
        panel.print_fmt(format_args!("{:.1}%", percent * 100.0));

        y += panel.font_height() as i32;
        panel.set_text_style(TextSize::Medium, BLACK);
        panel.set_cursor(cx - (panel.font_width() as f32 * 2.5) as i32, y);
        panel.print_fmt(format_args!("{:.2}L", value));

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DrawCall, RecordingPanel};

    #[test]
    fn empty_gauge_is_guarded_to_a_sliver() {
        let a = sweep_angles(0.0);
        assert!(a.guarded);
        assert!((a.start_deg - a.end_deg).abs() >= 1.0);
        assert_eq!(a.sweep(), 1.0);
    }

    #[test]
    fn full_gauge_is_guarded_to_almost_a_ring() {
        let a = sweep_angles(1.0);
        assert!(a.guarded);
        assert_eq!(a.start_deg, -89.0);
        assert_eq!(a.sweep(), 359.0);
    }

    #[test]
    fn partial_fill_is_not_guarded() {
        let a = sweep_angles(0.25);
        assert!(!a.guarded);
        assert_eq!(a.start_deg, 180.0);
        assert_eq!(a.end_deg, -90.0);
        assert_eq!(a.sweep(), 90.0);
    }

    #[test]
    fn one_kilogram_sweeps_about_fifteen_degrees() {
        let percent = 0.78f32 / 18.0;
        let a = sweep_angles(percent);
        assert!(!a.guarded);
        assert!((a.start_deg - 254.4).abs() < 0.05, "start = {}", a.start_deg);
        assert!((a.sweep() - 15.6).abs() < 0.05);
    }

    #[test]
    fn band_leaves_margin_top_and_bottom() {
        let band = gauge_band(200, 200);
        assert_eq!(band.top_left, Point::new(0, 15));
        assert_eq!(band.size, Size::new(200, 170));
    }

    #[test]
    fn first_render_draws_ring_and_labels() {
        let mut panel = RecordingPanel::new(200, 200);
        let mut gauge = GaugeRenderer::new(18.0, 30);
        assert!(gauge.render(&mut panel, 4.5));

        let calls = panel.take_calls();
        assert_eq!(calls[0], DrawCall::FillRect { x: 0, y: 15, w: 200, h: 170, color: WHITE });
        assert_eq!(calls[1], DrawCall::Circle { cx: 100, cy: 100, r: 85 });
        assert_eq!(calls[2], DrawCall::Circle { cx: 100, cy: 100, r: 55 });
        assert_eq!(
            calls[3],
            DrawCall::Arc { r_outer: 85, r_inner: 55, start_deg: 180.0, end_deg: -90.0 }
        );
        let texts: Vec<String> = calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["25.0%".to_string(), "4.50L".to_string()]);
        assert_eq!(gauge.state().last_displayed, Some(4.5));
    }

    #[test]
    fn identical_value_draws_nothing() {
        let mut panel = RecordingPanel::new(200, 200);
        let mut gauge = GaugeRenderer::new(18.0, 30);
        gauge.render(&mut panel, 0.78);
        panel.take_calls();

        assert!(!gauge.render(&mut panel, 0.78));
        assert!(panel.take_calls().is_empty());
    }

    #[test]
    fn zero_is_drawn_on_first_render() {
        let mut panel = RecordingPanel::new(200, 200);
        let mut gauge = GaugeRenderer::new(18.0, 30);
        assert!(gauge.render(&mut panel, 0.0));
        assert!(!gauge.render(&mut panel, 0.0));
    }

    #[test]
    fn equality_is_bitwise() {
        let mut panel = RecordingPanel::new(200, 200);
        let mut gauge = GaugeRenderer::new(18.0, 30);
        gauge.render(&mut panel, 0.0);
        assert!(gauge.render(&mut panel, -0.0));
        assert!(gauge.render(&mut panel, f32::from_bits(0.78f32.to_bits() + 1)));
    }

    #[test]
    fn invalidate_forces_redraw() {
        let mut panel = RecordingPanel::new(200, 200);
        let mut gauge = GaugeRenderer::new(18.0, 30);
        gauge.render(&mut panel, 3.0);
        gauge.invalidate();
        assert!(gauge.render(&mut panel, 3.0));
    }

    #[test]
    fn negative_value_is_labelled_as_is() {
        let mut panel = RecordingPanel::new(200, 200);
        let mut gauge = GaugeRenderer::new(18.0, 30);
        gauge.render(&mut panel, -0.39);
        let calls = panel.take_calls();
        assert!(calls.contains(&DrawCall::Text("-2.2%".to_string())));
        assert!(calls.contains(&DrawCall::Text("-0.39L".to_string())));
    }

    #[test]
    fn ring_wider_than_radius_becomes_a_pie() {
        let mut panel = RecordingPanel::new(200, 200);
        let mut gauge = GaugeRenderer::new(18.0, 120);
        gauge.render(&mut panel, 9.0);
        let calls = panel.take_calls();
        assert!(calls.contains(&DrawCall::Arc {
            r_outer: 85,
            r_inner: 0,
            start_deg: 90.0,
            end_deg: -90.0
        }));
    }
}
