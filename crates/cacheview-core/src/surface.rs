use std::time::Duration;

use crate::decode::Image;
use crate::style::{BorderStyle, ProgressStyle};

/// How the ring moves to a new fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Animation {
    Immediate,
    Animated(Duration),
}

/// How a freshly loaded image replaces the current one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    None,
    CrossFade(Duration),
}

/// Whatever actually puts pixels on screen. Owned by the caller's toolkit.
pub trait Surface {
    fn show_placeholder(&mut self, image: &Image);

    fn show_image(&mut self, image: &Image, transition: Transition);

    /// Show the ring if hidden and move its stroke end to `fraction`.
    fn show_progress_ring(&mut self, fraction: f64, style: &ProgressStyle, animation: Animation);

    fn hide_progress_ring(&mut self);

    fn apply_border(&mut self, style: &BorderStyle);
}

impl<S: Surface + ?Sized> Surface for Box<S> {
    fn show_placeholder(&mut self, image: &Image) {
        (**self).show_placeholder(image);
    }

    fn show_image(&mut self, image: &Image, transition: Transition) {
        (**self).show_image(image, transition);
    }

    fn show_progress_ring(&mut self, fraction: f64, style: &ProgressStyle, animation: Animation) {
        (**self).show_progress_ring(fraction, style, animation);
    }

    fn hide_progress_ring(&mut self) {
        (**self).hide_progress_ring();
    }

    fn apply_border(&mut self, style: &BorderStyle) {
        (**self).apply_border(style);
    }
}
