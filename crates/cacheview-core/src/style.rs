use bitflags::bitflags;

/// Default width of the progress ring stroke.
pub const DEFAULT_PROGRESS_LINE_WIDTH: f64 = 5.0;
/// Default border width. Zero means no visible border.
pub const DEFAULT_BORDER_WIDTH: f64 = 0.0;

/// Straight-alpha RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Grey of the given lightness.
    pub const fn white(lightness: f32, a: f32) -> Self {
        Self::rgba(lightness, lightness, lightness, a)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        let a = if hex.len() == 8 { channel(6)? } else { 1.0 };
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

/// Stroke of the circular progress ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressStyle {
    pub color: Color,
    pub line_width: f64,
}

impl Default for ProgressStyle {
    fn default() -> Self {
        Self {
            color: Color::WHITE.with_alpha(0.9),
            line_width: DEFAULT_PROGRESS_LINE_WIDTH,
        }
    }
}

/// Decorative border around the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderStyle {
    pub color: Color,
    pub width: f64,
}

impl BorderStyle {
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.color.a > 0.0
    }
}

impl Default for BorderStyle {
    fn default() -> Self {
        Self {
            color: Color::white(0.9, 1.0),
            width: DEFAULT_BORDER_WIDTH,
        }
    }
}

bitflags! {
    /// Parts of the view that changed and must be pushed to the surface again.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[must_use]
    pub struct Redisplay: u8 {
        /// The displayed image (placeholder swap).
        const IMAGE = 0b0000_0001;
        /// Progress ring color, width or visibility.
        const RING = 0b0000_0010;
        const BORDER = 0b0000_0100;
    }
}
