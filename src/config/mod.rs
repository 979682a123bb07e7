use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::align::DEFAULT_SNAP_THRESHOLD_PX;
use crate::geometry::Color;
use crate::gesture::GestureLimits;
use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::hit::DEFAULT_TEXT_HIT_PADDING_PX;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "layercraft";
const EDITOR_CONFIG_FILE: &str = "editor.json";

/// Editor tuning from `editor.json`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history_depth: usize,
    pub snap_threshold_px: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub text_hit_padding_px: f32,
    pub default_font_size_px: f32,
    pub max_font_size_px: f32,
    pub import_fit_ratio: f32,
    pub selection_padding_px: f32,
    pub selection_stroke_px: f32,
    pub selection_color: Color,
    pub export_background: Color,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            snap_threshold_px: DEFAULT_SNAP_THRESHOLD_PX,
            min_scale: 0.1,
            max_scale: 2.0,
            text_hit_padding_px: DEFAULT_TEXT_HIT_PADDING_PX,
            default_font_size_px: 80.0,
            max_font_size_px: 300.0,
            import_fit_ratio: 0.9,
            selection_padding_px: 10.0,
            selection_stroke_px: 8.0,
            selection_color: Color::rgb(0xF8, 0x9B, 0x29),
            export_background: Color::WHITE,
        }
    }
}

impl EditorConfig {
    pub fn gesture_limits(&self) -> GestureLimits {
        GestureLimits {
            min_scale: self.min_scale,
            max_scale: self.max_scale,
            snap_threshold: self.snap_threshold_px,
        }
    }

    /// Repairs values a hand-edited file may get wrong, field by field.
    fn normalized(self) -> Self {
        let defaults = Self::default();
        let positive = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        let min_scale = positive(self.min_scale, defaults.min_scale);
        let max_scale = positive(self.max_scale, defaults.max_scale).max(min_scale);
        Self {
            history_depth: self.history_depth.max(1),
            snap_threshold_px: positive(self.snap_threshold_px, defaults.snap_threshold_px),
            min_scale,
            max_scale,
            text_hit_padding_px: self.text_hit_padding_px.max(0.0),
            default_font_size_px: positive(self.default_font_size_px, defaults.default_font_size_px),
            max_font_size_px: positive(self.max_font_size_px, defaults.max_font_size_px),
            import_fit_ratio: positive(self.import_fit_ratio, defaults.import_fit_ratio),
            selection_padding_px: self.selection_padding_px.max(0.0),
            selection_stroke_px: positive(self.selection_stroke_px, defaults.selection_stroke_px),
            ..self
        }
    }
}

pub fn load_editor_config() -> EditorConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_editor_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_editor_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> EditorConfig {
    let path = match app_config_path(APP_DIR, EDITOR_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(%err, "cannot resolve editor.json location; using defaults");
            return EditorConfig::default();
        }
    };
    if !path.exists() {
        return EditorConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_editor_config(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse editor.json; using defaults");
            EditorConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read editor.json; using defaults");
            EditorConfig::default()
        }
    }
}

pub fn parse_editor_config(contents: &str) -> Result<EditorConfig, serde_json::Error> {
    serde_json::from_str::<EditorConfig>(contents).map(EditorConfig::normalized)
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> ConfigResult<PathBuf> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(xdg_config_home: Option<&Path>, home: Option<&Path>) -> ConfigResult<PathBuf> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
