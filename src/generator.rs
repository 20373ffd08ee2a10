use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

use crate::config::GameConfig;
use crate::error::{SessionError, SessionResult};
use crate::stimulus::{DualBallTrack, Plate, SimonColor, Stimulus, Target, NBACK_GRID_CELLS};

pub const TARGET_MARGIN: f64 = 20.0;
pub const TARGET_MIN_SIZE: f64 = 60.0;
pub const TARGET_MAX_SIZE: f64 = 80.0;
pub const PLATE_COUNT: usize = 10;
pub const MIN_GRID_SIZE: usize = 2;
pub const MAX_GRID_SIZE: usize = 7;
pub const NBACK_REPEAT_PROBABILITY: f64 = 0.3;

pub const PASSAGES: [&str; 5] = [
    "The quick brown fox jumps over the lazy dog. Programming is the art of telling a computer what to do. Practice makes perfect when learning to type faster.",
    "Technology has transformed the way we live and work. Every keystroke brings you closer to mastering the keyboard. Speed and accuracy are both important skills.",
    "The internet connects billions of people around the world. Digital communication has become essential in modern life. Keep practicing to improve your typing speed.",
    "Software development requires both creativity and logic. Good programmers write clean and efficient code. Testing your skills helps track improvement over time.",
    "Learning new skills takes patience and dedication. Consistent practice leads to significant improvements. Challenge yourself to type faster and more accurately.",
];

/// What a generator may look at when producing the next stimulus
#[derive(Debug, Clone, Copy)]
pub struct GenContext<'a> {
    pub level: u32,
    pub config: &'a GameConfig,
    /// Stimuli already presented this session, oldest first
    pub history: &'a [Stimulus],
    /// Stimulus of the last closed trial
    pub previous: Option<&'a Stimulus>,
    /// Same level again after a lost life
    pub retry: bool,
}

/// Trait for the per-game stimulus rules
pub trait StimulusGenerator: std::fmt::Debug {
    fn next(&mut self, ctx: &GenContext<'_>, rng: &mut StdRng) -> SessionResult<Stimulus>;

    /// Forget any per-session state
    fn reset(&mut self) {}
}

/// Reaction go-signal
#[derive(Debug, Default)]
pub struct SignalGenerator;

impl StimulusGenerator for SignalGenerator {
    fn next(&mut self, _ctx: &GenContext<'_>, _rng: &mut StdRng) -> SessionResult<Stimulus> {
        Ok(Stimulus::Signal)
    }
}

/// Aim targets placed inside the arena, clear of a fixed margin
#[derive(Debug, Default)]
pub struct PositionGenerator;

impl StimulusGenerator for PositionGenerator {
    fn next(&mut self, ctx: &GenContext<'_>, rng: &mut StdRng) -> SessionResult<Stimulus> {
        let size = TARGET_MIN_SIZE + rng.gen::<f64>() * (TARGET_MAX_SIZE - TARGET_MIN_SIZE);
        let span_x = ctx.config.arena.width - size - 2.0 * TARGET_MARGIN;
        let span_y = ctx.config.arena.height - size - 2.0 * TARGET_MARGIN;
        if span_x < 0.0 || span_y < 0.0 {
            return Err(SessionError::GenerationImpossible {
                requested: size.ceil() as usize,
                available: (span_x.min(span_y) + size).max(0.0) as usize,
            });
        }
        Ok(Stimulus::Target(Target {
            x: TARGET_MARGIN + rng.gen::<f64>() * span_x,
            y: TARGET_MARGIN + rng.gen::<f64>() * span_y,
            size,
        }))
    }
}

/// N-back grid positions. With some probability the cell from `n` steps back
/// is repeated; otherwise any cell except the one just shown.
#[derive(Debug)]
pub struct SequenceGenerator {
    pub repeat_probability: f64,
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self {
            repeat_probability: NBACK_REPEAT_PROBABILITY,
        }
    }
}

fn grid_cell(stimulus: &Stimulus) -> Option<usize> {
    match stimulus {
        Stimulus::GridCell(cell) => Some(*cell),
        _ => None,
    }
}

impl StimulusGenerator for SequenceGenerator {
    fn next(&mut self, ctx: &GenContext<'_>, rng: &mut StdRng) -> SessionResult<Stimulus> {
        let i = ctx.history.len();
        let n = ctx.level as usize;

        if i >= n && rng.gen_bool(self.repeat_probability) {
            if let Some(cell) = grid_cell(&ctx.history[i - n]) {
                return Ok(Stimulus::GridCell(cell));
            }
        }

        let cell = match ctx.history.last().and_then(grid_cell) {
            Some(prev) => {
                let cell = rng.gen_range(0..NBACK_GRID_CELLS - 1);
                if cell >= prev {
                    cell + 1
                } else {
                    cell
                }
            }
            None => rng.gen_range(0..NBACK_GRID_CELLS),
        };
        Ok(Stimulus::GridCell(cell))
    }
}

/// Number memory: `level` digits, never starting with zero
#[derive(Debug, Default)]
pub struct DigitStringGenerator;

impl StimulusGenerator for DigitStringGenerator {
    fn next(&mut self, ctx: &GenContext<'_>, rng: &mut StdRng) -> SessionResult<Stimulus> {
        let len = ctx.level as usize;
        if len == 0 {
            return Err(SessionError::GenerationImpossible {
                requested: 0,
                available: 10,
            });
        }
        let mut digits = String::with_capacity(len);
        digits.push(char::from(b'0' + rng.gen_range(1..=9u8)));
        for _ in 1..len {
            digits.push(char::from(b'0' + rng.gen_range(0..=9u8)));
        }
        Ok(Stimulus::Digits(digits))
    }
}

/// Simon: the previous sequence plus one more color
#[derive(Debug, Default)]
pub struct ColorSequenceGenerator;

impl StimulusGenerator for ColorSequenceGenerator {
    fn next(&mut self, ctx: &GenContext<'_>, rng: &mut StdRng) -> SessionResult<Stimulus> {
        let colors = match ctx.previous {
            Some(Stimulus::Colors(prev)) if ctx.retry => prev.clone(),
            Some(Stimulus::Colors(prev)) => {
                let mut colors = prev.clone();
                colors.push(random_color(rng));
                colors
            }
            _ => (0..ctx.level.max(1)).map(|_| random_color(rng)).collect(),
        };
        Ok(Stimulus::Colors(colors))
    }
}

fn random_color(rng: &mut StdRng) -> SimonColor {
    SimonColor::ALL[rng.gen_range(0..SimonColor::ALL.len())]
}

/// Side of the visual memory grid at `level`: one row more every three levels
pub fn grid_size_for(start: usize, level: u32) -> usize {
    (start + level.saturating_sub(1) as usize / 3).min(MAX_GRID_SIZE)
}

/// Cells to memorise on an `r`x`r` grid at `level`
pub fn cells_to_show(level: u32, r: usize) -> usize {
    (level as usize + 2).min((0.6 * (r * r) as f64).floor() as usize)
}

/// Visual memory: distinct cells sampled without replacement
#[derive(Debug, Default)]
pub struct GridSubsetGenerator;

impl StimulusGenerator for GridSubsetGenerator {
    fn next(&mut self, ctx: &GenContext<'_>, rng: &mut StdRng) -> SessionResult<Stimulus> {
        let grid_size = grid_size_for(ctx.config.grid_size, ctx.level);
        let available = grid_size * grid_size;
        let requested = cells_to_show(ctx.level, grid_size);
        if requested == 0 || requested > available {
            return Err(SessionError::GenerationImpossible {
                requested,
                available,
            });
        }
        let cells: BTreeSet<usize> = rand::seq::index::sample(rng, available, requested)
            .into_iter()
            .collect();
        Ok(Stimulus::Cells { grid_size, cells })
    }
}

/// Ishihara plates, each shown once in a shuffled order
#[derive(Debug, Default)]
pub struct PlateGenerator {
    order: Vec<usize>,
}

impl StimulusGenerator for PlateGenerator {
    fn next(&mut self, ctx: &GenContext<'_>, rng: &mut StdRng) -> SessionResult<Stimulus> {
        if self.order.is_empty() {
            self.order = (0..PLATE_COUNT).collect();
            self.order.shuffle(rng);
        }
        let position = ctx.history.len();
        match self.order.get(position) {
            Some(&index) => Ok(Stimulus::Plate(Plate::new(index))),
            None => Err(SessionError::GenerationImpossible {
                requested: position + 1,
                available: PLATE_COUNT,
            }),
        }
    }

    fn reset(&mut self) {
        self.order.clear();
    }
}

/// Typing passage picked from the fixed set
#[derive(Debug, Default)]
pub struct PassageGenerator;

impl StimulusGenerator for PassageGenerator {
    fn next(&mut self, _ctx: &GenContext<'_>, rng: &mut StdRng) -> SessionResult<Stimulus> {
        let passage = PASSAGES.choose(rng).copied().unwrap_or(PASSAGES[0]);
        Ok(Stimulus::Passage(passage.to_string()))
    }
}

/// Precision click track. A retry keeps the balls where the miss left them.
#[derive(Debug, Default)]
pub struct OrbitGenerator;

impl StimulusGenerator for OrbitGenerator {
    fn next(&mut self, ctx: &GenContext<'_>, _rng: &mut StdRng) -> SessionResult<Stimulus> {
        match ctx.previous {
            Some(Stimulus::Orbit(track)) if ctx.retry => Ok(Stimulus::Orbit(track.clone())),
            _ => Ok(Stimulus::Orbit(DualBallTrack::for_level(ctx.level))),
        }
    }
}
