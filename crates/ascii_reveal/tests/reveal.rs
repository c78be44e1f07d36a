//! End-to-end behaviour of the renderer through its public API.

use std::time::{Duration, Instant};

use ascii_reveal::{
    build_glyph_grid, AsciiRenderer, Display, FrameTick, ManualScheduler, RendererState,
    RevealConfig, SourceImage, DEFAULT_RAMP,
};
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn solid(width: u32, height: u32, pixel: [u8; 4]) -> SourceImage {
    SourceImage::from_rgba(RgbaImage::from_pixel(width, height, Rgba(pixel)))
}

fn renderer() -> AsciiRenderer<ManualScheduler, StdRng> {
    let rng = StdRng::seed_from_u64(99);
    AsciiRenderer::with_rng(RevealConfig::default(), ManualScheduler::new(), rng).unwrap()
}

#[test]
fn mid_gray_square() {
    let build = build_glyph_grid(&solid(16, 16, [128, 128, 128, 255]), &RevealConfig::default())
        .unwrap();
    assert_eq!((build.grid.columns, build.grid.rows), (4, 2));

    let expected = DEFAULT_RAMP.chars().nth(7).unwrap();
    assert!(build.grid.cells.iter().all(|cell| cell.ch == expected));
}

#[test]
fn documented_grid_size() {
    let build =
        build_glyph_grid(&solid(800, 1000, [10, 200, 30, 255]), &RevealConfig::default()).unwrap();
    assert_eq!((build.grid.columns, build.grid.rows), (200, 138));
    assert_eq!(build.grid.len(), 200 * 138);
}

#[test]
fn transparent_square_never_changes_a_glyph() {
    let mut renderer = renderer();
    let now = Instant::now();
    renderer.load("clear", solid(8, 8, [255, 255, 255, 0]), now).unwrap();
    renderer.hover_enter(now).unwrap();

    assert_eq!(renderer.state(), RendererState::Idle);
    assert!(renderer.scheduler().pending().is_empty());
    match renderer.display() {
        Display::Glyphs(frame) => assert_eq!(frame.to_text(), "  \n"),
        Display::Image => panic!("expected the blank grid to be shown"),
    }
}

#[test]
fn frames_converge_on_the_grid() {
    let mut pixels = RgbaImage::new(48, 36);
    for (x, y, pixel) in pixels.enumerate_pixels_mut() {
        *pixel = Rgba([(x * 5) as u8, (y * 7) as u8, 128, 255]);
    }

    let mut renderer = renderer();
    let start = Instant::now();
    renderer.load("ramp", SourceImage::from_rgba(pixels), start).unwrap();
    renderer.hover_enter(start).unwrap();
    let grid = renderer.grid().unwrap().grid.clone();

    let mut settled_before = 0;
    let mut elapsed = Duration::ZERO;
    loop {
        let handle = renderer.scheduler_mut().take_pending().pop().expect("frame requested");
        elapsed += Duration::from_millis(16);
        let tick = renderer.on_frame(handle, start + elapsed).unwrap();
        if tick == FrameTick::Completed {
            break;
        }

        let settled = renderer.animation().unwrap().schedule().settled_count();
        assert!(settled >= settled_before);
        settled_before = settled;
        assert!(elapsed < Duration::from_millis(2100), "animation overran its settle time");
    }

    match renderer.display() {
        Display::Glyphs(frame) => {
            assert!(frame.matches(&grid));
            assert_eq!(frame.to_text(), grid.to_text());
        },
        Display::Image => panic!("expected the settled grid"),
    }
}

#[test]
fn cancel_without_a_run_is_harmless() {
    let mut renderer = renderer();
    renderer.cancel();
    renderer.hover_exit();
    renderer.teardown();
    renderer.cancel();
    assert_eq!(renderer.state(), RendererState::Unloaded);
    assert_eq!(renderer.scheduler().requested(), 0);
}
