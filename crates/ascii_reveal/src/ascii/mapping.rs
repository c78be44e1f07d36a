use image::{Rgba, RgbaImage};

use super::{
    gradient::{Gradient, LUMA_SCALE},
    grid::{CellGlyph, GlyphGrid},
};

/// Samples below this alpha are treated as transparent and map to a space.
pub const ALPHA_CUTOFF: u8 = 128;

/// `299 R + 587 G + 114 B`, i.e. perceived brightness scaled by [`LUMA_SCALE`].
pub fn weighted_luma(rgb: [u8; 3]) -> u32 {
    let [r, g, b] = rgb.map(u32::from);
    299 * r + 587 * g + 114 * b
}

/// Perceived brightness of an RGB sample in `[0, 1]`.
pub fn perceived_brightness(rgb: [u8; 3]) -> f32 {
    weighted_luma(rgb) as f32 / LUMA_SCALE as f32
}

pub struct GlyphMapper {
    gradient: Gradient,
}

impl GlyphMapper {
    pub fn new(gradient: Gradient) -> Self {
        Self { gradient }
    }

    pub fn glyph_for(&self, pixel: Rgba<u8>) -> CellGlyph {
        let [r, g, b, a] = pixel.0;
        if a < ALPHA_CUTOFF {
            return CellGlyph::BLANK;
        }

        let index = self.gradient.index_for_luma(weighted_luma([r, g, b]));
        CellGlyph::new(self.gradient.char_at(index), [r, g, b])
    }

    /// Maps a downsampled buffer (one pixel per cell) to a grid.
    pub fn map_samples(&self, samples: &RgbaImage) -> GlyphGrid {
        let cells = samples.pixels().map(|pixel| self.glyph_for(*pixel)).collect();
        GlyphGrid::new(samples.width(), samples.height(), cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_samples_are_blank_whatever_the_color() {
        let mapper = GlyphMapper::new(Gradient::standard());
        for rgb in [[0, 0, 0], [255, 255, 255], [200, 10, 90]] {
            for alpha in [0, 64, 127] {
                let glyph = mapper.glyph_for(Rgba([rgb[0], rgb[1], rgb[2], alpha]));
                assert_eq!(glyph.ch, ' ');
            }
        }
    }

    #[test]
    fn alpha_cutoff_is_inclusive() {
        let mapper = GlyphMapper::new(Gradient::standard());
        assert_eq!(mapper.glyph_for(Rgba([255, 255, 255, 128])).ch, '@');
    }

    #[test]
    fn brightness_weights() {
        assert_eq!(perceived_brightness([0, 0, 0]), 0.0);
        assert_eq!(weighted_luma([255, 255, 255]), LUMA_SCALE);
        assert!((perceived_brightness([255, 255, 255]) - 1.0).abs() < 1e-6);
        assert!((perceived_brightness([255, 0, 0]) - 0.299).abs() < 1e-6);
        assert!((perceived_brightness([0, 255, 0]) - 0.587).abs() < 1e-6);
        assert!((perceived_brightness([0, 0, 255]) - 0.114).abs() < 1e-6);
    }

    #[test]
    fn darker_never_maps_past_lighter() {
        let gradient = Gradient::standard();
        let mapper = GlyphMapper::new(gradient.clone());
        let position = |ch: char| gradient.chars().iter().position(|c| *c == ch).unwrap();

        let mut previous = 0;
        for level in 0..=255u8 {
            let glyph = mapper.glyph_for(Rgba([level, level, level, 255]));
            let index = position(glyph.ch);
            assert!(index >= previous, "level {level} went backwards");
            previous = index;
        }
        assert_eq!(previous, gradient.len() - 1);
    }

    #[test]
    fn mixed_colors_keep_ordering() {
        let gradient = Gradient::standard();
        let mapper = GlyphMapper::new(gradient.clone());
        let position = |ch: char| gradient.chars().iter().position(|c| *c == ch).unwrap();

        // Blue is dimmer than green at equal channel values.
        let blue = mapper.glyph_for(Rgba([0, 0, 255, 255]));
        let green = mapper.glyph_for(Rgba([0, 255, 0, 255]));
        assert!(position(blue.ch) <= position(green.ch));
    }

    #[test]
    fn map_samples_keeps_shape() {
        let mapper = GlyphMapper::new(Gradient::standard());
        let mut samples = RgbaImage::from_pixel(3, 2, Rgba([255, 255, 255, 255]));
        samples.put_pixel(1, 1, Rgba([255, 255, 255, 0]));
        let grid = mapper.map_samples(&samples);
        assert_eq!((grid.columns, grid.rows), (3, 2));
        assert_eq!(grid.to_text(), "@@@\n@ @\n");
    }
}
