//! Offscreen compositing of glyph frames.
//!
//! Frames are drawn at the source image's pixel size rather than the grid's,
//! so the result can stand in for the original image without changing layout.

use std::sync::Arc;

use image::RgbaImage;
use log::debug;
use resvg::tiny_skia;
use usvg::fontdb;

use crate::ascii::grid::RenderFrame;
use crate::config::{ColorMode, RevealConfig};
use crate::{AsciiError, GridBuild};

/// Glyph size relative to the smaller side of a cell.
pub const FONT_SCALE: f32 = 1.2;

/// Largest surface side we are willing to allocate.
pub const MAX_SURFACE_DIM: u32 = 16_384;

/// Placement of glyphs over the source image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellMetrics {
    pub cell_width: f32,
    pub cell_height: f32,
    pub font_size: f32,
}

impl CellMetrics {
    pub fn new(build: &GridBuild) -> Option<Self> {
        let grid = &build.grid;
        if grid.columns == 0 || grid.rows == 0 {
            return None;
        }

        let cell_width = build.source_width as f32 / grid.columns as f32;
        let cell_height = build.source_height as f32 / grid.rows as f32;
        let font_size = cell_width.min(cell_height) * FONT_SCALE;
        Some(Self { cell_width, cell_height, font_size })
    }

    /// Centre of the cell at (`column`, `row`).
    pub fn center(&self, column: u32, row: u32) -> (f32, f32) {
        ((column as f32 + 0.5) * self.cell_width, (row as f32 + 0.5) * self.cell_height)
    }
}

pub struct GlyphSurface {
    fontdb: Arc<fontdb::Database>,
    max_dimension: u32,
}

impl GlyphSurface {
    /// Surface backed by the fonts installed on this system.
    pub fn system() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!("glyph surface loaded {} font faces", db.len());
        Self::with_fontdb(Arc::new(db))
    }

    pub fn with_fontdb(fontdb: Arc<fontdb::Database>) -> Self {
        Self { fontdb, max_dimension: MAX_SURFACE_DIM }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Draws `frame` over a transparent surface the size of the source image.
    pub fn render(
        &self,
        build: &GridBuild,
        frame: &RenderFrame,
        config: &RevealConfig,
    ) -> Result<RgbaImage, AsciiError> {
        let (width, height) = (build.source_width, build.source_height);
        if width > self.max_dimension || height > self.max_dimension {
            return Err(AsciiError::Surface(format!(
                "surface size too large: {width}x{height} (max {0}x{0})",
                self.max_dimension
            )));
        }
        if frame.columns != build.grid.columns || frame.rows != build.grid.rows {
            return Err(AsciiError::Surface(format!(
                "frame is {}x{} but grid is {}x{}",
                frame.columns, frame.rows, build.grid.columns, build.grid.rows
            )));
        }

        if width == 0 || height == 0 {
            return Ok(RgbaImage::new(width, height));
        }

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| AsciiError::Surface(format!("cannot allocate {width}x{height}")))?;

        if let Some(metrics) = CellMetrics::new(build) {
            if frame.cells.iter().any(|ch| !ch.is_whitespace()) {
                let svg = self.frame_svg(build, frame, config, metrics);
                let options = usvg::Options {
                    fontdb: self.fontdb.clone(),
                    font_resolver: font_resolver(),
                    ..Default::default()
                };
                let tree = usvg::Tree::from_str(&svg, &options)
                    .map_err(|err| AsciiError::Surface(format!("glyph layout failed: {err}")))?;
                resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
            }
        }

        let mut raw = Vec::with_capacity(width as usize * height as usize * 4);
        for pixel in pixmap.pixels() {
            let color = pixel.demultiply();
            raw.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
        RgbaImage::from_raw(width, height, raw)
            .ok_or_else(|| AsciiError::Surface("surface buffer size mismatch".into()))
    }

    fn frame_svg(
        &self,
        build: &GridBuild,
        frame: &RenderFrame,
        config: &RevealConfig,
        metrics: CellMetrics,
    ) -> String {
        let (width, height) = (build.source_width, build.source_height);
        let mut svg = String::with_capacity(frame.cells.len() * 48);
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        ));

        let fill = match config.color_mode {
            ColorMode::Monochrome(rgb) => Some(hex(rgb)),
            ColorMode::Source => None,
        };
        let columns = frame.columns as usize;

        for (row, cells) in frame.cells.chunks(columns).enumerate() {
            if cells.iter().all(|ch| ch.is_whitespace()) {
                continue;
            }

            let (_, y) = metrics.center(0, row as u32);
            svg.push_str(&format!(
                r#"<text y="{y:.3}" font-family="{}" font-size="{:.3}" text-anchor="middle" dominant-baseline="central""#,
                escape(&config.font_family),
                metrics.font_size,
            ));
            if let Some(fill) = &fill {
                svg.push_str(&format!(r#" fill="{fill}""#));
            }
            svg.push('>');

            for (column, ch) in cells.iter().enumerate() {
                if ch.is_whitespace() {
                    continue;
                }
                let (x, _) = metrics.center(column as u32, row as u32);
                svg.push_str(&format!(r#"<tspan x="{x:.3}""#));
                if fill.is_none() {
                    let index = row * columns + column;
                    svg.push_str(&format!(r#" fill="{}""#, hex(build.grid.cells[index].fg)));
                }
                svg.push_str(&format!(">{}</tspan>", escape(ch.encode_utf8(&mut [0; 4]))));
            }
            svg.push_str("</text>");
        }

        svg.push_str("</svg>");
        svg
    }
}

fn hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Prefers the requested family, then any monospace face, then whatever is installed.
fn font_resolver() -> usvg::FontResolver<'static> {
    usvg::FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => fontdb::Family::Monospace,
                    usvg::FontFamily::Named(name) => fontdb::Family::Name(name),
                });
            }
            families.push(fontdb::Family::Monospace);
            families.push(fontdb::Family::SansSerif);

            let query = fontdb::Query {
                families: &families,
                weight: fontdb::Weight(font.weight()),
                stretch: fontdb::Stretch::Normal,
                style: fontdb::Style::Normal,
            };

            fontdb.query(&query).or_else(|| fontdb.faces().next().map(|face| face.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}
