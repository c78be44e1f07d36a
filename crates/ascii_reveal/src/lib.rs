//! Image to ASCII glyph grids, with a hover-driven scramble-to-settle reveal.
//!
//! [`build_glyph_grid`] turns a decoded image into a [`GlyphGrid`]. It is a pure
//! function of the image and the grid-affecting parts of [`RevealConfig`].
//! [`AsciiRenderer`] wraps that in the hover state machine. Frame timing comes
//! from an injected [`FrameScheduler`].

mod ascii;
mod config;
mod image_pipeline;
mod renderer;
mod reveal;
mod surface;

use std::sync::Arc;

use log::debug;

pub use ascii::{
    gradient::{Gradient, DEFAULT_RAMP, DEFAULT_SCRAMBLE_EXTRA},
    grid::{CellGlyph, GlyphGrid, RenderFrame},
    mapping::{perceived_brightness, GlyphMapper, ALPHA_CUTOFF},
};
pub use config::{ColorMode, RevealConfig, DEFAULT_RESOLUTION, DEFAULT_SETTLE_MS};
pub use image_pipeline::{
    loader::SourceImage,
    resize::{GridGeometry, SampleFilter},
};
pub use renderer::{AsciiRenderer, Display, FrameTick, LoadTicket, RendererState};
pub use reveal::{
    animation::{RevealAnimation, TickStatus},
    schedule::RevealSchedule,
    scheduler::{FrameHandle, FrameScheduler, ManualScheduler, PacedScheduler},
};
pub use surface::{CellMetrics, GlyphSurface};

#[derive(Debug, thiserror::Error)]
pub enum AsciiError {
    #[error("failed to load image {source_ref}: {source}")]
    ImageLoad {
        source_ref: String,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("glyph surface error: {0}")]
    Surface(String),
}

/// A grid together with the size of the image it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridBuild {
    pub grid: Arc<GlyphGrid>,
    pub source_width: u32,
    pub source_height: u32,
}

/// Samples `image` into a glyph grid.
///
/// Only `resolution`, `charset` and `sample_filter` are read from `config`, and
/// identical inputs always produce an identical grid.
pub fn build_glyph_grid(
    image: &SourceImage,
    config: &RevealConfig,
) -> Result<GridBuild, AsciiError> {
    config.validate()?;
    let gradient = config.gradient()?;

    let (width, height) = (image.width(), image.height());
    let geometry = GridGeometry::derive(width, height, config.resolution);
    let samples =
        image_pipeline::resize::downsample(image.pixels(), geometry, config.sample_filter);
    let grid = GlyphMapper::new(gradient).map_samples(&samples);
    debug!(
        "built {}x{} glyph grid from {}x{} source at resolution {}",
        grid.columns, grid.rows, width, height, config.resolution
    );

    Ok(GridBuild { grid: Arc::new(grid), source_width: width, source_height: height })
}
