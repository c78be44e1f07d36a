use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;

use super::schedule::RevealSchedule;
use crate::ascii::grid::{GlyphGrid, RenderFrame};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    Running,
    Complete,
}

/// One hover-triggered scramble-to-settle run.
///
/// Blank cells stay blank for the whole run; every other cell shows a fresh
/// scramble glyph on each tick until its turn in the schedule comes up.
#[derive(Debug)]
pub struct RevealAnimation {
    grid: Arc<GlyphGrid>,
    schedule: RevealSchedule,
    alphabet: Arc<[char]>,
    started_at: Instant,
    settle: Duration,
    frame: RenderFrame,
    status: TickStatus,
}

impl RevealAnimation {
    pub fn start<R: Rng + ?Sized>(
        grid: Arc<GlyphGrid>,
        settle: Duration,
        alphabet: Arc<[char]>,
        now: Instant,
        rng: &mut R,
    ) -> Self {
        let schedule = RevealSchedule::shuffled(&grid, rng);
        let frame = grid.settled_frame();
        let mut animation = Self {
            grid,
            schedule,
            alphabet,
            started_at: now,
            settle,
            frame,
            status: TickStatus::Running,
        };

        if animation.schedule.is_empty() {
            animation.status = TickStatus::Complete;
        } else {
            animation.scramble_unsettled(rng);
        }
        animation
    }

    pub fn grid(&self) -> &Arc<GlyphGrid> {
        &self.grid
    }

    pub fn schedule(&self) -> &RevealSchedule {
        &self.schedule
    }

    pub fn frame(&self) -> &RenderFrame {
        &self.frame
    }

    pub fn status(&self) -> TickStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == TickStatus::Complete
    }

    /// `min(elapsed / settle, 1)`; a clock running backwards counts as no time elapsed.
    pub fn progress(&self, now: Instant) -> f64 {
        if self.settle.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.settle.as_secs_f64()).min(1.0)
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> TickStatus {
        if self.is_complete() {
            return TickStatus::Complete;
        }

        let progress = self.progress(now);
        let target = self.schedule.target_for(progress);
        for &index in self.schedule.advance_to(target) {
            self.frame.cells[index] = self.grid.cells[index].ch;
        }

        if progress >= 1.0 || self.schedule.is_complete() {
            self.frame = self.grid.settled_frame();
            self.status = TickStatus::Complete;
            return self.status;
        }

        self.scramble_unsettled(rng);
        TickStatus::Running
    }

    fn scramble_unsettled<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for &index in &self.schedule.order()[self.schedule.settled_count()..] {
            if let Some(&ch) = self.alphabet.choose(rng) {
                self.frame.cells[index] = ch;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::ascii::grid::CellGlyph;

    fn grid(text: &str, columns: u32) -> Arc<GlyphGrid> {
        let cells: Vec<_> = text.chars().map(|ch| CellGlyph::new(ch, [255; 3])).collect();
        let rows = cells.len() as u32 / columns;
        Arc::new(GlyphGrid::new(columns, rows, cells))
    }

    fn alphabet() -> Arc<[char]> {
        Arc::from(vec!['?', '!', '%'])
    }

    #[test]
    fn settled_set_only_grows() {
        let grid = grid("abcdefghijklmnop", 4);
        let mut rng = StdRng::seed_from_u64(11);
        let start = Instant::now();
        let settle = Duration::from_millis(2000);
        let mut animation =
            RevealAnimation::start(grid.clone(), settle, alphabet(), start, &mut rng);

        let mut previous: Vec<usize> = Vec::new();
        for step in 0..=20u64 {
            animation.tick(start + Duration::from_millis(step * 100), &mut rng);
            let settled: Vec<usize> =
                (0..grid.len()).filter(|idx| animation.schedule().is_settled(*idx)).collect();
            for index in &previous {
                assert!(settled.contains(index), "cell {index} un-settled at step {step}");
            }
            for index in &settled {
                assert_eq!(animation.frame().cells[*index], grid.cells[*index].ch);
            }
            previous = settled;
        }
    }

    #[test]
    fn settled_count_follows_progress() {
        let grid = grid("abcdefghij", 5);
        let mut rng = StdRng::seed_from_u64(2);
        let start = Instant::now();
        let settle = Duration::from_millis(1000);
        let mut animation = RevealAnimation::start(grid, settle, alphabet(), start, &mut rng);

        let status = animation.tick(start + Duration::from_millis(250), &mut rng);
        assert_eq!(status, TickStatus::Running);
        assert_eq!(animation.schedule().settled_count(), 2);
        animation.tick(start + Duration::from_millis(500), &mut rng);
        assert_eq!(animation.schedule().settled_count(), 5);
    }

    #[test]
    fn completes_exactly_on_the_grid() {
        let grid = grid("ab  cd  ", 4);
        let mut rng = StdRng::seed_from_u64(5);
        let start = Instant::now();
        let settle = Duration::from_millis(2000);
        let mut animation =
            RevealAnimation::start(grid.clone(), settle, alphabet(), start, &mut rng);

        assert!(!animation.frame().matches(&grid));
        let status = animation.tick(start + Duration::from_millis(2000), &mut rng);
        assert_eq!(status, TickStatus::Complete);
        assert!(animation.frame().matches(&grid));

        // Further ticks leave the finished frame alone.
        animation.tick(start + Duration::from_millis(5000), &mut rng);
        assert!(animation.frame().matches(&grid));
    }

    #[test]
    fn unsettled_cells_draw_from_the_alphabet_and_blanks_stay_blank() {
        let grid = grid("ab  cd  ", 4);
        let mut rng = StdRng::seed_from_u64(9);
        let start = Instant::now();
        let settle = Duration::from_secs(10);
        let mut animation =
            RevealAnimation::start(grid.clone(), settle, alphabet(), start, &mut rng);
        animation.tick(start + Duration::from_millis(1), &mut rng);

        for (index, cell) in grid.cells.iter().enumerate() {
            let shown = animation.frame().cells[index];
            if cell.is_blank() {
                assert_eq!(shown, ' ');
            } else if !animation.schedule().is_settled(index) {
                assert!(['?', '!', '%'].contains(&shown));
            }
        }
    }

    #[test]
    fn blank_grid_completes_immediately() {
        let grid = grid("        ", 4);
        let mut rng = StdRng::seed_from_u64(1);
        let start = Instant::now();
        let settle = Duration::from_secs(2);
        let animation = RevealAnimation::start(grid.clone(), settle, alphabet(), start, &mut rng);
        assert!(animation.is_complete());
        assert!(animation.frame().matches(&grid));
    }

    #[test]
    fn clock_going_backwards_is_zero_progress() {
        let grid = grid("ab", 2);
        let mut rng = StdRng::seed_from_u64(1);
        let start = Instant::now() + Duration::from_secs(1);
        let animation =
            RevealAnimation::start(grid, Duration::from_secs(2), alphabet(), start, &mut rng);
        assert_eq!(animation.progress(start - Duration::from_millis(500)), 0.0);
        assert_eq!(animation.progress(start + Duration::from_secs(1)), 0.5);
    }
}
