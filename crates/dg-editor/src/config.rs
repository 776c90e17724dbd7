//! Editor configuration.

use dg_core::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid editor config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line_mode_opacity must be within 0.0..=1.0, got {0}")]
    Opacity(f64),
}

/// Size and placement of shapes created by `Editor::add_shape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShapeTemplate {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ShapeTemplate {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        }
    }
}

/// Configuration for an `Editor` session.
///
/// Missing fields take their defaults; unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Undo history cap. Default: **unbounded**.
    pub max_undo_depth: Option<usize>,

    /// Template for new shapes.
    pub new_shape: ShapeTemplate,

    /// Shape opacity while the line tool is armed. Default: **0.4**.
    pub line_mode_opacity: f64,

    /// Where the canvas sits inside the window.
    pub canvas_offset: Point,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: None,
            new_shape: ShapeTemplate::default(),
            line_mode_opacity: 0.4,
            canvas_offset: Point::ZERO,
        }
    }
}

impl EditorConfig {
    /// Parse a JSON config document.
    ///
    /// # Errors
    /// Returns `ConfigError::Json` for malformed JSON or unknown fields and
    /// `ConfigError::Opacity` for an opacity outside `0.0..=1.0`.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        if !(0.0..=1.0).contains(&config.line_mode_opacity) {
            return Err(ConfigError::Opacity(config.line_mode_opacity));
        }
        Ok(config)
    }
}
