use std::io::Write;

use cacheview_core::geometry::{Rect, RingGeometry};
use cacheview_core::style::{BorderStyle, ProgressStyle};
use cacheview_core::surface::{Animation, Surface, Transition};
use cacheview_core::Image;
use tracing::{debug, info};

/// Cells in the text progress bar.
pub const BAR_WIDTH: usize = 30;

/// Size of the view the terminal stands in for.
pub const VIEW_BOUNDS: Rect = Rect::new(0.0, 0.0, 256.0, 256.0);

/// Presents the view in a terminal: the ring becomes a one-line bar on
/// stderr, everything else is logged.
pub struct TerminalSurface {
    width: usize,
    ring: RingGeometry,
    drawn: Option<usize>,
}

impl TerminalSurface {
    pub fn new(width: usize, ring: RingGeometry) -> Self {
        Self {
            width,
            ring,
            drawn: None,
        }
    }
}

impl Surface for TerminalSurface {
    fn show_placeholder(&mut self, image: &Image) {
        info!(
            width = image.width(),
            height = image.height(),
            "Showing placeholder"
        );
    }

    fn show_image(&mut self, image: &Image, transition: Transition) {
        info!(
            width = image.width(),
            height = image.height(),
            ?transition,
            "Showing image"
        );
    }

    fn show_progress_ring(&mut self, fraction: f64, style: &ProgressStyle, animation: Animation) {
        let filled = filled_cells(fraction, self.width);
        if self.drawn == Some(filled) {
            return;
        }
        if self.drawn.is_none() {
            debug!(
                radius = self.ring.radius,
                frame = ?self.ring.frame,
                line_width = style.line_width,
                "Ring layout"
            );
        }
        self.drawn = Some(filled);
        debug!(
            fraction,
            end_angle = self.ring.angle_at(fraction),
            ?animation,
            "Progress ring"
        );

        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", render_bar(fraction, self.width));
        let _ = stderr.flush();
    }

    fn hide_progress_ring(&mut self) {
        if self.drawn.take().is_some() {
            eprintln!();
        }
    }

    fn apply_border(&mut self, style: &BorderStyle) {
        debug!(width = style.width, visible = style.is_visible(), "Border");
    }
}

fn filled_cells(fraction: f64, width: usize) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = (fraction.clamp(0.0, 1.0) * width as f64).round() as usize;
    filled.min(width)
}

/// `[#####.....]  50%`
pub fn render_bar(fraction: f64, width: usize) -> String {
    let filled = filled_cells(fraction, width);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u32;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        ".".repeat(width - filled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(0.0, 4), "[....]   0%");
        assert_eq!(render_bar(0.5, 4), "[##..]  50%");
        assert_eq!(render_bar(1.0, 4), "[####] 100%");
    }

    #[test]
    fn test_render_bar_clamps() {
        assert_eq!(render_bar(3.0, 2), "[##] 100%");
        assert_eq!(render_bar(-1.0, 2), "[..]   0%");
    }

    #[test]
    fn test_redraws_only_on_change() {
        let ring = RingGeometry::fit(VIEW_BOUNDS, 4.0);
        let mut surface = TerminalSurface::new(10, ring);
        let style = ProgressStyle::default();
        surface.show_progress_ring(0.41, &style, Animation::Immediate);
        assert_eq!(surface.drawn, Some(4));
        surface.show_progress_ring(0.44, &style, Animation::Immediate);
        assert_eq!(surface.drawn, Some(4));
        surface.hide_progress_ring();
        assert_eq!(surface.drawn, None);
    }
}
