use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ascii_reveal::{
    build_glyph_grid, AsciiRenderer, ColorMode, Display, GlyphSurface, Gradient, GridBuild,
    PacedScheduler, RevealConfig, SampleFilter, SourceImage,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use walkdir::WalkDir;

mod config;
mod logging;

const IMAGE_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "gif", "bmp", "ico", "pnm", "tiff", "webp"];

const BAR_TEMPLATE: &str = "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

#[derive(Parser, Debug)]
#[command(author, version, about = "Render images as ASCII glyph grids and preview the reveal")]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/ascii-reveal/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the settled glyph grid to stdout
    Preview(PreviewArgs),
    /// Convert an image, or every image under a directory, to text or PNG
    Convert(ConvertArgs),
    /// Simulate a hover and emit every reveal frame
    Animate(AnimateArgs),
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Input image path
    input: PathBuf,
    #[command(flatten)]
    settings: RenderSettings,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input image path or directory of images
    input: PathBuf,
    /// Output file, or output directory when the input is a directory
    #[arg(short, long)]
    output: PathBuf,
    /// Output format; inferred from the output extension for single files
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    #[command(flatten)]
    settings: RenderSettings,
}

#[derive(Args, Debug)]
struct AnimateArgs {
    /// Input image path
    input: PathBuf,
    /// Write frames here instead of playing them in the terminal
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
    /// Frame format when writing to a directory
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
    /// Frames per second of the simulated display
    #[arg(long, default_value_t = 60.0)]
    fps: f32,
    /// Move the pointer away after this many milliseconds
    #[arg(long)]
    hover_ms: Option<u64>,
    #[command(flatten)]
    settings: RenderSettings,
}

/// Overrides applied on top of the config file.
#[derive(Args, Debug, Clone)]
struct RenderSettings {
    /// Source pixels per glyph cell
    #[arg(long)]
    resolution: Option<u32>,
    /// Built-in brightness ramp
    #[arg(long, value_enum)]
    ramp: Option<RampPreset>,
    /// Custom brightness ramp, darkest first (overrides --ramp)
    #[arg(long)]
    charset: Option<String>,
    /// Reveal duration in milliseconds
    #[arg(long)]
    settle_ms: Option<u64>,
    /// Downsampling filter
    #[arg(long, value_enum)]
    filter: Option<FilterChoice>,
    /// Tint glyphs with the sampled source colors when rendering PNGs
    #[arg(long)]
    source_colors: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Png,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RampPreset {
    Standard,
    Blocks,
    Detailed,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FilterChoice {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.verbose);

    let base = config::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Preview(args) => preview(args.settings.apply(base)?, &args.input),
        Commands::Convert(args) => {
            let config = args.settings.apply(base)?;
            convert(args, config)
        },
        Commands::Animate(args) => {
            let config = args.settings.apply(base)?;
            animate(args, config)
        },
    }
}

fn preview(config: RevealConfig, input: &Path) -> Result<()> {
    let build = build_path(input, &config)?;
    print!("{}", build.grid.to_text());
    Ok(())
}

fn convert(args: ConvertArgs, config: RevealConfig) -> Result<()> {
    if !args.input.is_dir() {
        let format = args.format.unwrap_or_else(|| OutputFormat::from_path(&args.output));
        let surface = (format == OutputFormat::Png).then(GlyphSurface::system);
        return convert_one(&args.input, &args.output, format, &config, surface.as_ref());
    }

    let format = args.format.unwrap_or(OutputFormat::Text);
    let inputs = collect_images(&args.input)?;
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create output directory {:?}", args.output))?;

    let surface = (format == OutputFormat::Png).then(GlyphSurface::system);
    let progress = progress_bar(inputs.len() as u64, "images")?;
    for input in &inputs {
        let relative = input.strip_prefix(&args.input).unwrap_or(input);
        let output = args.output.join(relative).with_extension(format.extension());
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {:?}", parent))?;
        }

        if let Err(err) = convert_one(input, &output, format, &config, surface.as_ref()) {
            warn!("skipping {}: {err:#}", input.display());
        }
        progress.inc(1);
    }

    progress.finish_with_message(format!("images written to {:?}", args.output));
    Ok(())
}

fn convert_one(
    input: &Path,
    output: &Path,
    format: OutputFormat,
    config: &RevealConfig,
    surface: Option<&GlyphSurface>,
) -> Result<()> {
    let build = build_path(input, config)?;
    match (format, surface) {
        (OutputFormat::Png, Some(surface)) => {
            let image = surface.render(&build, &build.grid.settled_frame(), config)?;
            image.save(output).with_context(|| format!("failed to write {:?}", output))?;
        },
        _ => {
            let mut file =
                File::create(output).with_context(|| format!("failed to create {:?}", output))?;
            file.write_all(build.grid.to_text().as_bytes())?;
        },
    }
    Ok(())
}

fn animate(args: AnimateArgs, config: RevealConfig) -> Result<()> {
    let writes_png = args.out_dir.is_some() && args.format == OutputFormat::Png;
    let scheduler = PacedScheduler::with_fps(args.fps);
    let interval = scheduler.interval();
    let mut renderer = AsciiRenderer::new(config.clone(), scheduler)?;
    if writes_png {
        renderer = renderer.with_surface(GlyphSurface::system());
    }

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {:?}", dir))?;
    }

    let start = Instant::now();
    renderer
        .load_path(&args.input, start)
        .with_context(|| format!("failed to load {:?}", args.input))?;
    renderer.hover_enter(start)?;

    let estimate = (config.settle_duration().as_secs_f64() / interval.as_secs_f64()).ceil() as u64;
    let progress = match &args.out_dir {
        Some(_) => progress_bar(estimate + 1, "frames")?,
        None => ProgressBar::hidden(),
    };

    let leave_at = args.hover_ms.map(|ms| start + Duration::from_millis(ms));
    let mut index = 0;
    emit_frame(&renderer, &args, index)?;
    progress.inc(1);

    while let Some(deadline) = renderer.scheduler().next_deadline() {
        if let Some(leave_at) = leave_at.filter(|leave_at| *leave_at <= deadline) {
            std::thread::sleep(leave_at.saturating_duration_since(Instant::now()));
            renderer.hover_exit();
            info!("pointer left after {:?}; showing the source image", leave_at - start);
            break;
        }

        std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
        let now = Instant::now();
        for handle in renderer.scheduler_mut().take_due(now) {
            renderer.on_frame(handle, now).context("reveal frame failed")?;
        }

        index += 1;
        emit_frame(&renderer, &args, index)?;
        progress.inc(1);
    }

    progress.finish_with_message(format!("frames ({} emitted)", index + 1));
    Ok(())
}

fn emit_frame(
    renderer: &AsciiRenderer<PacedScheduler>,
    args: &AnimateArgs,
    index: usize,
) -> Result<()> {
    let Display::Glyphs(frame) = renderer.display() else {
        return Ok(());
    };

    let Some(dir) = &args.out_dir else {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "\x1b[H\x1b[2J{}", frame.to_text())?;
        stdout.flush()?;
        return Ok(());
    };

    let path = dir.join(format!("frame_{:04}.{}", index, args.format.extension()));
    match (args.format, renderer.surface_image()) {
        (OutputFormat::Png, Some(image)) => {
            image.save(&path).with_context(|| format!("failed to write {:?}", path))?;
        },
        (OutputFormat::Png, None) => {
            // The first frame is composited on the first tick.
            return Ok(());
        },
        (OutputFormat::Text, _) => {
            let mut file =
                File::create(&path).with_context(|| format!("failed to create {:?}", path))?;
            file.write_all(frame.to_text().as_bytes())?;
        },
    }
    Ok(())
}

fn build_path(input: &Path, config: &RevealConfig) -> Result<GridBuild> {
    let image = SourceImage::open(input)?;
    build_glyph_grid(&image, config).with_context(|| format!("failed to render {:?}", input))
}

fn collect_images(root: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .filter(|path| has_image_extension(path))
        .collect();
    entries.sort();
    if entries.is_empty() {
        anyhow::bail!("no image files found in {:?}", root);
    }
    Ok(entries)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn progress_bar(len: u64, unit: &'static str) -> Result<ProgressBar> {
    let progress = ProgressBar::new(len);
    progress.set_style(ProgressStyle::with_template(BAR_TEMPLATE)?.progress_chars("=> "));
    progress.set_message(unit);
    Ok(progress)
}

impl RenderSettings {
    fn apply(&self, mut config: RevealConfig) -> Result<RevealConfig> {
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(ramp) = self.ramp {
            config.charset = ramp.to_gradient().chars().iter().collect();
        }
        if let Some(charset) = &self.charset {
            config.charset = charset.clone();
        }
        if let Some(settle_ms) = self.settle_ms {
            config.settle_duration_ms = settle_ms;
        }
        if let Some(filter) = self.filter {
            config.sample_filter = filter.into();
        }
        if self.source_colors {
            config.color_mode = ColorMode::Source;
        }

        config.validate()?;
        Ok(config)
    }
}

impl OutputFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => OutputFormat::Png,
            _ => OutputFormat::Text,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Png => "png",
        }
    }
}

impl RampPreset {
    fn to_gradient(self) -> Gradient {
        match self {
            RampPreset::Standard => Gradient::standard(),
            RampPreset::Blocks => Gradient::blocks(),
            RampPreset::Detailed => Gradient::detailed(),
        }
    }
}

impl From<FilterChoice> for SampleFilter {
    fn from(choice: FilterChoice) -> Self {
        match choice {
            FilterChoice::Nearest => SampleFilter::Nearest,
            FilterChoice::Triangle => SampleFilter::Triangle,
            FilterChoice::CatmullRom => SampleFilter::CatmullRom,
            FilterChoice::Gaussian => SampleFilter::Gaussian,
            FilterChoice::Lanczos3 => SampleFilter::Lanczos3,
        }
    }
}
