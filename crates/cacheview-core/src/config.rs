use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::{Rect, RingGeometry, DEFAULT_RING_THICKNESS};
use crate::style::{BorderStyle, Color, ProgressStyle};

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub view: ViewSection,
    pub network: NetworkConfig,
}

/// `[view]`: initial look of the image view. Colors are `#rrggbb[aa]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSection {
    pub progress_line_width: f64,
    pub progress_color: String,
    pub border_width: f64,
    pub border_color: String,
    pub show_loading: bool,
    pub ring_thickness: f64,
    pub cross_fade_ms: u64,
}

/// `[network]`: HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub user_agent: String,
    pub max_redirects: usize,
    pub connect_timeout_secs: u64,
}

impl AppConfig {
    /// Load config: the user file if it exists, otherwise built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Resolve the `[view]` section into a runtime view configuration.
    ///
    /// Unparseable colors fall back to the built-in ones with a warning.
    pub fn view_config(&self) -> ViewConfig {
        let defaults = ViewConfig::default();
        let color = |raw: &str, fallback: Color| {
            Color::from_hex(raw).unwrap_or_else(|| {
                tracing::warn!(color = raw, "Invalid color in config, using default");
                fallback
            })
        };

        ViewConfig {
            progress: ProgressStyle {
                color: color(&self.view.progress_color, defaults.progress.color),
                line_width: self.view.progress_line_width,
            },
            border: BorderStyle {
                color: color(&self.view.border_color, defaults.border.color),
                width: self.view.border_width,
            },
            show_loading: self.view.show_loading,
            ring_thickness: self.view.ring_thickness,
            cross_fade: Duration::from_millis(self.view.cross_fade_ms),
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "cacheview")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

/// Runtime view configuration. Styles persist across loads unless a
/// request overrides them, and an override becomes the new value.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    pub progress: ProgressStyle,
    pub border: BorderStyle,
    pub show_loading: bool,
    pub ring_thickness: f64,
    pub cross_fade: Duration,
}

impl ViewConfig {
    /// Lay out the progress ring for a view occupying `bounds`.
    pub fn ring_geometry(&self, bounds: Rect) -> RingGeometry {
        RingGeometry::fit(bounds, self.ring_thickness)
    }

    /// Ring stroke as drawn: widened by the border so it covers it.
    pub fn effective_progress(&self) -> ProgressStyle {
        ProgressStyle {
            line_width: self.progress.line_width + self.border.width,
            ..self.progress
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            progress: ProgressStyle::default(),
            border: BorderStyle::default(),
            show_loading: true,
            ring_thickness: DEFAULT_RING_THICKNESS,
            cross_fade: Duration::from_millis(300),
        }
    }
}
