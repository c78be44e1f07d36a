//! Hover state machine around one source image.
//!
//! ```text
//! Unloaded --load ok--> Idle <--hover enter / exit, completion--> Animating
//!     \--load error--> Failed <--compositing error--/
//! ```
//!
//! Every state except `Animating` displays the plain source image unless the
//! pointer is over a loaded image.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ascii::grid::RenderFrame;
use crate::config::RevealConfig;
use crate::image_pipeline::loader::SourceImage;
use crate::reveal::animation::{RevealAnimation, TickStatus};
use crate::reveal::scheduler::{FrameHandle, FrameScheduler};
use crate::surface::GlyphSurface;
use crate::{build_glyph_grid, AsciiError, GridBuild};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererState {
    Unloaded,
    /// Loading or compositing failed; the plain image is shown and hover does nothing.
    Failed,
    Idle,
    Animating,
}

/// Identifies one outstanding image load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameTick {
    /// The handle was cancelled or superseded; nothing happened.
    Stale,
    Running,
    Completed,
}

/// What the host should put in the image's box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Display<'a> {
    Image,
    Glyphs(&'a RenderFrame),
}

enum Phase {
    Unloaded,
    Failed,
    Idle,
    Animating { animation: RevealAnimation, handle: FrameHandle },
}

pub struct AsciiRenderer<S: FrameScheduler, R: Rng = StdRng> {
    config: RevealConfig,
    alphabet: Arc<[char]>,
    scheduler: S,
    rng: R,
    phase: Phase,
    hovered: bool,
    source_key: Option<String>,
    build: Option<GridBuild>,
    pending_load: Option<LoadTicket>,
    next_ticket: u64,
    /// Final frame kept on screen after a run completes while still hovered.
    settled: Option<RenderFrame>,
    surface: Option<GlyphSurface>,
    composited: Option<RgbaImage>,
}

impl<S: FrameScheduler> AsciiRenderer<S, StdRng> {
    pub fn new(config: RevealConfig, scheduler: S) -> Result<Self, AsciiError> {
        Self::with_rng(config, scheduler, StdRng::from_entropy())
    }
}

impl<S: FrameScheduler, R: Rng> AsciiRenderer<S, R> {
    pub fn with_rng(config: RevealConfig, scheduler: S, rng: R) -> Result<Self, AsciiError> {
        config.validate()?;
        let alphabet = config.gradient()?.scramble_alphabet(&config.scramble_extra);

        Ok(Self {
            config,
            alphabet: Arc::from(alphabet),
            scheduler,
            rng,
            phase: Phase::Unloaded,
            hovered: false,
            source_key: None,
            build: None,
            pending_load: None,
            next_ticket: 0,
            settled: None,
            surface: None,
            composited: None,
        })
    }

    /// Composite every frame onto an offscreen surface of the source's size.
    pub fn with_surface(mut self, surface: GlyphSurface) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn state(&self) -> RendererState {
        match self.phase {
            Phase::Unloaded => RendererState::Unloaded,
            Phase::Failed => RendererState::Failed,
            Phase::Idle => RendererState::Idle,
            Phase::Animating { .. } => RendererState::Animating,
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn grid(&self) -> Option<&GridBuild> {
        self.build.as_ref()
    }

    pub fn animation(&self) -> Option<&RevealAnimation> {
        match &self.phase {
            Phase::Animating { animation, .. } => Some(animation),
            _ => None,
        }
    }

    /// Frame callback the renderer is waiting on, if any.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        match &self.phase {
            Phase::Animating { handle, .. } => Some(*handle),
            _ => None,
        }
    }

    pub fn display(&self) -> Display<'_> {
        if !self.hovered {
            return Display::Image;
        }

        match (&self.phase, &self.settled) {
            (Phase::Animating { animation, .. }, _) => Display::Glyphs(animation.frame()),
            (Phase::Idle, Some(frame)) => Display::Glyphs(frame),
            _ => Display::Image,
        }
    }

    /// Last composited surface, present only while glyphs are displayed.
    pub fn surface_image(&self) -> Option<&RgbaImage> {
        match self.display() {
            Display::Glyphs(_) => self.composited.as_ref(),
            Display::Image => None,
        }
    }

    /// Whether `key` is the current source and its grid is built.
    pub fn is_loaded(&self, key: &str) -> bool {
        self.build.is_some() && self.source_key.as_deref() == Some(key)
    }

    /// Starts a load of `key`. A different key discards the current grid and any run.
    pub fn begin_load(&mut self, key: impl Into<String>) -> LoadTicket {
        let key = key.into();
        if self.source_key.as_deref() != Some(key.as_str()) {
            debug!("switching source to {key}");
            self.cancel();
            self.build = None;
            self.settled = None;
            self.composited = None;
            self.phase = Phase::Unloaded;
            self.source_key = Some(key);
        }

        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        self.pending_load = Some(ticket);
        ticket
    }

    /// Completes the load started by `ticket`.
    ///
    /// Hover state at this moment decides whether a reveal starts right away,
    /// so a pointer that already left does not trigger one.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<SourceImage, AsciiError>,
        now: Instant,
    ) -> Result<(), AsciiError> {
        if self.pending_load != Some(ticket) {
            debug!("ignoring superseded load {:?}", ticket);
            return Ok(());
        }
        self.pending_load = None;

        let image = match result {
            Ok(image) => image,
            Err(err) => return Err(self.fail(err)),
        };

        if self.build.is_none() {
            match build_glyph_grid(&image, &self.config) {
                Ok(build) => self.build = Some(build),
                Err(err) => return Err(self.fail(err)),
            }
        }

        if matches!(self.phase, Phase::Unloaded | Phase::Failed) {
            self.phase = Phase::Idle;
        }

        if self.hovered && matches!(self.phase, Phase::Idle) {
            self.start_reveal(now)?;
        }
        Ok(())
    }

    pub fn load(
        &mut self,
        key: impl Into<String>,
        image: SourceImage,
        now: Instant,
    ) -> Result<(), AsciiError> {
        let ticket = self.begin_load(key);
        self.finish_load(ticket, Ok(image), now)
    }

    pub fn load_path<P: AsRef<Path>>(&mut self, path: P, now: Instant) -> Result<(), AsciiError> {
        let path = path.as_ref();
        let key = path.display().to_string();
        if self.is_loaded(&key) {
            return Ok(());
        }

        let ticket = self.begin_load(key);
        self.finish_load(ticket, SourceImage::open(path), now)
    }

    pub fn load_bytes(&mut self, key: &str, bytes: &[u8], now: Instant) -> Result<(), AsciiError> {
        if self.is_loaded(key) {
            return Ok(());
        }

        let ticket = self.begin_load(key);
        self.finish_load(ticket, SourceImage::decode(key, bytes), now)
    }

    pub fn hover_enter(&mut self, now: Instant) -> Result<(), AsciiError> {
        if self.hovered {
            return Ok(());
        }
        self.hovered = true;

        if matches!(self.phase, Phase::Idle) {
            self.start_reveal(now)?;
        }
        Ok(())
    }

    pub fn hover_exit(&mut self) {
        self.hovered = false;
        self.cancel();
        self.settled = None;
        self.composited = None;
    }

    /// Stops the running reveal, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if let Phase::Animating { handle, .. } = &self.phase {
            self.scheduler.cancel_frame(*handle);
            debug!("cancelled reveal frame {}", handle.id());
            self.phase = Phase::Idle;
        }
    }

    /// Cancels any pending frame and drops all per-source state.
    pub fn teardown(&mut self) {
        self.cancel();
        self.phase = Phase::Unloaded;
        self.hovered = false;
        self.source_key = None;
        self.build = None;
        self.pending_load = None;
        self.settled = None;
        self.composited = None;
    }

    /// Host callback for a frame requested through the scheduler.
    ///
    /// A compositing failure ends the run and is returned once. The renderer is
    /// then `Failed`, so later hovers show the plain image without retrying.
    pub fn on_frame(&mut self, handle: FrameHandle, now: Instant) -> Result<FrameTick, AsciiError> {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let mut animation = match phase {
            Phase::Animating { animation, handle: pending } if pending == handle => animation,
            other => {
                self.phase = other;
                return Ok(FrameTick::Stale);
            },
        };

        let status = animation.tick(now, &mut self.rng);
        if let Err(err) = self.composite(animation.frame()) {
            return Err(self.fail(err));
        }

        match status {
            TickStatus::Running => {
                let handle = self.scheduler.request_frame();
                self.phase = Phase::Animating { animation, handle };
                Ok(FrameTick::Running)
            },
            TickStatus::Complete => {
                self.settled = Some(animation.frame().clone());
                Ok(FrameTick::Completed)
            },
        }
    }

    fn start_reveal(&mut self, now: Instant) -> Result<(), AsciiError> {
        self.cancel();
        let Some(build) = &self.build else {
            return Ok(());
        };

        let animation = RevealAnimation::start(
            build.grid.clone(),
            self.config.settle_duration(),
            self.alphabet.clone(),
            now,
            &mut self.rng,
        );
        debug!("starting reveal over {} cells", animation.schedule().len());

        if animation.is_complete() {
            let frame = animation.frame().clone();
            if let Err(err) = self.composite(&frame) {
                return Err(self.fail(err));
            }
            self.settled = Some(frame);
            return Ok(());
        }

        self.settled = None;
        let handle = self.scheduler.request_frame();
        self.phase = Phase::Animating { animation, handle };
        Ok(())
    }

    fn composite(&mut self, frame: &RenderFrame) -> Result<(), AsciiError> {
        if let (Some(surface), Some(build)) = (&self.surface, &self.build) {
            self.composited = Some(surface.render(build, frame, &self.config)?);
        }
        Ok(())
    }

    fn fail(&mut self, err: AsciiError) -> AsciiError {
        warn!("disabling ascii overlay: {err}");
        self.cancel();
        self.build = None;
        self.settled = None;
        self.composited = None;
        self.phase = Phase::Failed;
        err
    }
}

impl<S: FrameScheduler, R: Rng> Drop for AsciiRenderer<S, R> {
    fn drop(&mut self) {
        self.cancel();
    }
}
