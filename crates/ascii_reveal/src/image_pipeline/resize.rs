use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::Deserialize;

/// Glyph cells are this much taller than wide, expressed as `9 / 5` (1.8).
pub const CELL_ASPECT_NUM: u64 = 9;
pub const CELL_ASPECT_DEN: u64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridGeometry {
    pub columns: u32,
    pub rows: u32,
}

impl GridGeometry {
    /// `columns = floor(W / r)`, `rows = floor(H / (r * 1.8))`.
    ///
    /// Rows are computed in integers so that exact multiples never fall one short.
    pub fn derive(source_width: u32, source_height: u32, resolution: u32) -> Self {
        if resolution == 0 {
            return Self { columns: 0, rows: 0 };
        }

        let columns = source_width / resolution;
        let rows = (u64::from(source_height) * CELL_ASPECT_DEN)
            / (u64::from(resolution) * CELL_ASPECT_NUM);
        Self { columns, rows: rows as u32 }
    }

    pub fn is_empty(&self) -> bool {
        self.columns == 0 || self.rows == 0
    }

    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

/// Filter used when collapsing each cell's region to one pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFilter {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<SampleFilter> for FilterType {
    fn from(filter: SampleFilter) -> Self {
        match filter {
            SampleFilter::Nearest => FilterType::Nearest,
            SampleFilter::Triangle => FilterType::Triangle,
            SampleFilter::CatmullRom => FilterType::CatmullRom,
            SampleFilter::Gaussian => FilterType::Gaussian,
            SampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// One RGBA sample per future glyph cell.
pub fn downsample(source: &RgbaImage, geometry: GridGeometry, filter: SampleFilter) -> RgbaImage {
    if geometry.is_empty() {
        return RgbaImage::new(0, 0);
    }
    imageops::resize(source, geometry.columns, geometry.rows, filter.into())
}
