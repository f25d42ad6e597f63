use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{BurninError, Result};

/// Font reference accepted in options: a single path or one path per
/// operating system (`windows`, `linux`, `darwin`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontSpec {
    Path(String),
    PerOs(BTreeMap<String, String>),
}

fn default_opacity() -> f64 {
    1.0
}

fn default_bg_opacity() -> f64 {
    0.5
}

fn default_padding() -> u32 {
    5
}

fn default_offset() -> u32 {
    5
}

fn default_font_size() -> u32 {
    42
}

fn default_font_color() -> String {
    "white".to_string()
}

/// Visual appearance of a burn-in element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnOptions {
    /// Text opacity, 0-1
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Background box opacity, 0-1
    #[serde(default = "default_bg_opacity")]
    pub bg_opacity: f64,
    /// Background box color; no box is drawn when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    /// Background box padding in pixels
    #[serde(default = "default_padding")]
    pub bg_padding: u32,
    /// Horizontal distance from the frame border in pixels.
    /// Should be at least `bg_padding` so the box stays in frame.
    #[serde(default = "default_offset")]
    pub x_offset: u32,
    /// Vertical distance from the frame border in pixels
    #[serde(default = "default_offset")]
    pub y_offset: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontSpec>,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Any color ffmpeg understands, e.g. `#000000`, `0x000000`, `black`
    #[serde(default = "default_font_color")]
    pub font_color: String,
    /// Start frame used when a burn-in does not carry its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_offset: Option<i64>,
    /// Last frame, only used to measure text width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_end: Option<i64>,
    /// Explicit timecode rate overriding the probed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
}

impl Default for BurnOptions {
    fn default() -> Self {
        Self {
            opacity: default_opacity(),
            bg_opacity: default_bg_opacity(),
            bg_color: None,
            bg_padding: default_padding(),
            x_offset: default_offset(),
            y_offset: default_offset(),
            font: None,
            font_size: default_font_size(),
            font_color: default_font_color(),
            frame_offset: None,
            frame_end: None,
            fps: None,
        }
    }
}

impl BurnOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(BurninError::Config(format!(
                "opacity must be within 0-1, got {}",
                self.opacity
            )));
        }
        if !(0.0..=1.0).contains(&self.bg_opacity) {
            return Err(BurninError::Config(format!(
                "bg_opacity must be within 0-1, got {}",
                self.bg_opacity
            )));
        }
        if self.font_size == 0 {
            return Err(BurninError::Config("font_size must be greater than 0".to_string()));
        }
        if let Some(fps) = self.fps {
            if !(fps > 0.0) {
                return Err(BurninError::Config(format!("fps must be positive, got {}", fps)));
            }
        }
        Ok(())
    }

    /// Overlay a job's partial options on top of these defaults
    pub fn merged(&self, patch: &BurnOptionsPatch) -> Self {
        let mut options = self.clone();
        if let Some(v) = patch.opacity {
            options.opacity = v;
        }
        if let Some(v) = patch.bg_opacity {
            options.bg_opacity = v;
        }
        if let Some(v) = &patch.bg_color {
            options.bg_color = Some(v.clone());
        }
        if let Some(v) = patch.bg_padding {
            options.bg_padding = v;
        }
        if let Some(v) = patch.x_offset {
            options.x_offset = v;
        }
        if let Some(v) = patch.y_offset {
            options.y_offset = v;
        }
        if let Some(v) = &patch.font {
            options.font = Some(v.clone());
        }
        if let Some(v) = patch.font_size {
            options.font_size = v;
        }
        if let Some(v) = &patch.font_color {
            options.font_color = v.clone();
        }
        if let Some(v) = patch.frame_offset {
            options.frame_offset = Some(v);
        }
        if let Some(v) = patch.frame_end {
            options.frame_end = Some(v);
        }
        if let Some(v) = patch.fps {
            options.fps = Some(v);
        }
        options
    }
}

/// Per-job overrides; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BurnOptionsPatch {
    pub opacity: Option<f64>,
    pub bg_opacity: Option<f64>,
    pub bg_color: Option<String>,
    pub bg_padding: Option<u32>,
    pub x_offset: Option<u32>,
    pub y_offset: Option<u32>,
    pub font: Option<FontSpec>,
    pub font_size: Option<u32>,
    pub font_color: Option<String>,
    pub frame_offset: Option<i64>,
    pub frame_end: Option<i64>,
    pub fps: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = BurnOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.font_size, 42);
        assert_eq!(options.bg_opacity, 0.5);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let options = BurnOptions { opacity: 1.5, ..Default::default() };
        assert!(matches!(options.validate(), Err(BurninError::Config(_))));

        let options = BurnOptions { bg_opacity: -0.1, ..Default::default() };
        assert!(options.validate().is_err());

        let options = BurnOptions { font_size: 0, ..Default::default() };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_merge_patch() {
        let patch: BurnOptionsPatch = serde_json::from_str(
            r##"{"font_size": 52, "bg_color": "#000000", "font": {"linux": "/fonts/a.ttf"}}"##,
        )
        .unwrap();
        let options = BurnOptions::default().merged(&patch);

        assert_eq!(options.font_size, 52);
        assert_eq!(options.bg_color.as_deref(), Some("#000000"));
        assert_eq!(options.x_offset, 5);
        assert!(matches!(options.font, Some(FontSpec::PerOs(_))));
    }

    #[test]
    fn test_merge_patch_frame_range() {
        let patch: BurnOptionsPatch =
            serde_json::from_str(r#"{"frame_offset": 1001, "frame_end": 1096}"#).unwrap();
        let options = BurnOptions::default().merged(&patch);

        assert_eq!(options.frame_offset, Some(1001));
        assert_eq!(options.frame_end, Some(1096));
        assert_eq!(BurnOptions::default().merged(&BurnOptionsPatch::default()).frame_end, None);
    }

    #[test]
    fn test_font_spec_path() {
        let spec: FontSpec = serde_json::from_str(r#""/fonts/arial.ttf""#).unwrap();
        assert_eq!(spec, FontSpec::Path("/fonts/arial.ttf".to_string()));
    }
}
