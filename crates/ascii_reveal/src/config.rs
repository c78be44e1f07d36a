use std::time::Duration;

use serde::Deserialize;

use crate::ascii::gradient::{Gradient, DEFAULT_RAMP, DEFAULT_SCRAMBLE_EXTRA};
use crate::image_pipeline::resize::SampleFilter;
use crate::AsciiError;

pub const DEFAULT_RESOLUTION: u32 = 4;
pub const DEFAULT_SETTLE_MS: u64 = 2000;

/// How glyphs are tinted on the offscreen surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Every glyph in one RGB color.
    Monochrome([u8; 3]),
    /// Each glyph in the color sampled for its cell.
    Source,
}

impl Default for ColorMode {
    fn default() -> Self {
        ColorMode::Monochrome([255, 255, 255])
    }
}

/// Renderer settings. Every field is optional in a config file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealConfig {
    /// Source pixels per glyph cell horizontally.
    pub resolution: u32,
    /// Brightness ramp, darkest first.
    pub charset: String,
    pub settle_duration_ms: u64,
    /// Punctuation mixed into the ramp for unsettled cells.
    pub scramble_extra: String,
    pub sample_filter: SampleFilter,
    pub color_mode: ColorMode,
    pub font_family: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            charset: DEFAULT_RAMP.to_owned(),
            settle_duration_ms: DEFAULT_SETTLE_MS,
            scramble_extra: DEFAULT_SCRAMBLE_EXTRA.to_owned(),
            sample_filter: SampleFilter::default(),
            color_mode: ColorMode::default(),
            font_family: "monospace".to_owned(),
        }
    }
}

impl RevealConfig {
    /// Rejects settings that would silently change the grid; nothing is clamped.
    pub fn validate(&self) -> Result<(), AsciiError> {
        if self.resolution == 0 {
            return Err(AsciiError::InvalidConfiguration("resolution must be positive".into()));
        }
        if self.settle_duration_ms == 0 {
            return Err(AsciiError::InvalidConfiguration(
                "settle duration must be positive".into(),
            ));
        }
        if self.charset.is_empty() {
            return Err(AsciiError::InvalidConfiguration("charset must not be empty".into()));
        }
        Ok(())
    }

    pub fn gradient(&self) -> Result<Gradient, AsciiError> {
        Gradient::new(&self.charset)
            .ok_or_else(|| AsciiError::InvalidConfiguration("charset must not be empty".into()))
    }

    pub fn settle_duration(&self) -> Duration {
        Duration::from_millis(self.settle_duration_ms)
    }
}
