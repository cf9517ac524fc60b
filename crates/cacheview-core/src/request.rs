use std::fmt;

use crate::decode::Image;
use crate::error::LoadError;
use crate::style::{BorderStyle, Color, ProgressStyle};

/// Epoch token identifying one load attempt.
///
/// Minted by the controller from a strictly increasing counter, so a
/// callback carrying an older token can always be told apart from the
/// current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Called once with the outcome of a load that was not superseded.
pub type Completion = Box<dyn FnOnce(Result<Image, LoadError>)>;

/// Partial progress ring override. Unset fields keep the view's current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressOverride {
    pub color: Option<Color>,
    pub line_width: Option<f64>,
}

impl ProgressOverride {
    pub(crate) fn apply(&self, style: &mut ProgressStyle) {
        if let Some(color) = self.color {
            style.color = color;
        }
        if let Some(width) = self.line_width {
            style.line_width = width;
        }
    }
}

/// Partial border override. Unset fields keep the view's current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BorderOverride {
    pub color: Option<Color>,
    pub width: Option<f64>,
}

impl BorderOverride {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.width.is_none()
    }

    pub(crate) fn apply(&self, style: &mut BorderStyle) {
        if let Some(color) = self.color {
            style.color = color;
        }
        if let Some(width) = self.width {
            style.width = width;
        }
    }
}

/// One "set image" call: where to fetch from and how to present it.
pub struct LoadRequest {
    pub target_url: String,
    pub placeholder: Option<Image>,
    pub progress: ProgressOverride,
    pub border: BorderOverride,
    pub completion: Option<Completion>,
}

impl LoadRequest {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            placeholder: None,
            progress: ProgressOverride::default(),
            border: BorderOverride::default(),
            completion: None,
        }
    }

    pub fn placeholder(mut self, image: Image) -> Self {
        self.placeholder = Some(image);
        self
    }

    pub fn progress_color(mut self, color: Color) -> Self {
        self.progress.color = Some(color);
        self
    }

    pub fn progress_line_width(mut self, width: f64) -> Self {
        self.progress.line_width = Some(width);
        self
    }

    pub fn border(mut self, color: Option<Color>, width: f64) -> Self {
        self.border = BorderOverride {
            color,
            width: Some(width),
        };
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce(Result<Image, LoadError>) + 'static) -> Self {
        self.completion = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("target_url", &self.target_url)
            .field("placeholder", &self.placeholder.is_some())
            .field("progress", &self.progress)
            .field("border", &self.border)
            .field("completion", &self.completion.is_some())
            .finish()
    }
}
