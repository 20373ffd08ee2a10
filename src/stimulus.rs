use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Cells of the 3x3 N-back grid
pub const NBACK_GRID_CELLS: usize = 9;

/// Precision click canvas geometry
pub const CANVAS_SIZE: f64 = 800.0;
pub const CANVAS_CENTER: f64 = 400.0;
pub const BALL_RADIUS: f64 = 12.0;
const BOUNCE_MIN: f64 = 20.0;
const BOUNCE_MAX: f64 = 780.0;
const FRAME_MS: f64 = 1000.0 / 60.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum_macros::Display,
)]
pub enum SimonColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl SimonColor {
    pub const ALL: [SimonColor; 4] = [
        SimonColor::Red,
        SimonColor::Blue,
        SimonColor::Green,
        SimonColor::Yellow,
    ];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A circular aim target; `x`/`y` is the top-left corner of its bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl Target {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        let (cx, cy) = self.center();
        (px - cx).hypot(py - cy) <= self.radius()
    }
}

/// An Ishihara plate; normal vision reads `answer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plate {
    pub index: usize,
    pub answer: String,
}

impl Plate {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            answer: index.to_string(),
        }
    }

    pub fn image_path(&self) -> String {
        format!("colorblind/Ishihara_image_{}.jpg", self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub dir: f64,
}

/// Two balls sweeping across the canvas, one horizontally and one vertically,
/// over a static target circle at the canvas center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualBallTrack {
    pub horizontal: Ball,
    pub vertical: Ball,
    pub speed: f64,
    pub target_radius: f64,
    frame_debt_ms: f64,
}

impl DualBallTrack {
    pub fn for_level(level: u32) -> Self {
        let steps = level.saturating_sub(1) as f64;
        Self {
            horizontal: Ball {
                x: 50.0,
                y: CANVAS_CENTER,
                dir: 1.0,
            },
            vertical: Ball {
                x: CANVAS_CENTER,
                y: 50.0,
                dir: 1.0,
            },
            speed: 2.0 + steps * 0.3,
            target_radius: ((150.0 - steps * 8.0) / 2.0).max(BALL_RADIUS),
            frame_debt_ms: 0.0,
        }
    }

    /// Advance by one 60 fps frame
    pub fn step(&mut self) {
        let h = &mut self.horizontal;
        h.x += h.dir * self.speed;
        if h.x <= BOUNCE_MIN {
            h.dir = 1.0;
        } else if h.x >= BOUNCE_MAX {
            h.dir = -1.0;
        }

        let v = &mut self.vertical;
        v.y += v.dir * self.speed;
        if v.y <= BOUNCE_MIN {
            v.dir = 1.0;
        } else if v.y >= BOUNCE_MAX {
            v.dir = -1.0;
        }
    }

    /// Advance by as many whole frames as fit in `elapsed_ms`, carrying the rest
    pub fn advance(&mut self, elapsed_ms: u64) -> usize {
        self.frame_debt_ms += elapsed_ms as f64;
        let mut frames = 0;
        while self.frame_debt_ms >= FRAME_MS {
            self.step();
            self.frame_debt_ms -= FRAME_MS;
            frames += 1;
        }
        frames
    }

    pub fn is_inside(&self, ball: &Ball) -> bool {
        (ball.x - CANVAS_CENTER).hypot(ball.y - CANVAS_CENTER) <= self.target_radius
    }

    pub fn both_inside(&self) -> bool {
        crate::evaluator::track_hit(self)
    }
}

/// What the player must perceive and respond to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stimulus {
    /// Reaction go-signal
    Signal,
    Target(Target),
    /// N-back grid cell
    GridCell(usize),
    Digits(String),
    Colors(Vec<SimonColor>),
    Cells {
        grid_size: usize,
        cells: BTreeSet<usize>,
    },
    Plate(Plate),
    Passage(String),
    Orbit(DualBallTrack),
}

impl Stimulus {
    /// Number of elements shown one after another while priming
    pub fn element_count(&self) -> usize {
        match self {
            Stimulus::Colors(colors) => colors.len(),
            Stimulus::Digits(digits) => digits.len(),
            Stimulus::Cells { cells, .. } => cells.len(),
            _ => 1,
        }
    }
}

/// Player input translated by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    /// Generic press: click on the reaction pad, match key, precision click
    Press,
    Point { x: f64, y: f64 },
    Color(SimonColor),
    Text(String),
    Cells(BTreeSet<usize>),
    Key(char),
    Backspace,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum Outcome {
    Hit,
    Miss,
    FalsePositive,
    TooEarly,
    Skipped,
}

impl Outcome {
    pub fn is_correct(self) -> bool {
        matches!(self, Outcome::Hit)
    }

    pub fn is_incorrect(self) -> bool {
        matches!(self, Outcome::Miss | Outcome::FalsePositive)
    }

    /// TooEarly attempts are restarted and never enter the result set
    pub fn counts_toward_results(self) -> bool {
        !matches!(self, Outcome::TooEarly)
    }
}
