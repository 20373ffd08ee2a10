//! The nine games and the strategy triple each one plugs into a session

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::evaluator::{
    DualBallEvaluator, NBackEvaluator, ReactionEvaluator, RecallEvaluator, ResponseEvaluator,
    SimonEvaluator, TargetEvaluator, TypingEvaluator,
};
use crate::generator::{
    ColorSequenceGenerator, DigitStringGenerator, GridSubsetGenerator, OrbitGenerator,
    PassageGenerator, PlateGenerator, PositionGenerator, SequenceGenerator, SignalGenerator,
    StimulusGenerator, PLATE_COUNT,
};
use crate::metrics;
use crate::session::{Delay, EarlyInput, Pacing, Progression, Session};

/// How long an N-back cell stays lit at the start of its window
pub const NBACK_SHOW_MS: u64 = 500;
pub const NBACK_GAP_MS: u64 = 2000;
/// Accuracy needed for an N-back level to count as passed
pub const NBACK_PASS_ACCURACY: f64 = 80.0;
pub const SIMON_ELEMENT_MS: u64 = 800;
pub const PRECISION_MAX_LEVEL: u32 = 15;
const FEEDBACK_MS: u64 = 1500;

pub fn nback_sequence_length(n: u32) -> usize {
    20 + 5 * n as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOrdering {
    LowerIsBetter,
    HigherIsBetter,
}

impl ScoreOrdering {
    /// Strictly better; equal values never replace a record
    pub fn is_better(self, candidate: u64, current: u64) -> bool {
        match self {
            ScoreOrdering::LowerIsBetter => candidate < current,
            ScoreOrdering::HigherIsBetter => candidate > current,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GameKind {
    Reaction,
    AimTrainer,
    NBack,
    Simon,
    ColorBlind,
    VisualMemory,
    Typing,
    NumberMemory,
    PrecisionClick,
}

impl GameKind {
    pub const ALL: [GameKind; 9] = [
        GameKind::Reaction,
        GameKind::AimTrainer,
        GameKind::NBack,
        GameKind::Simon,
        GameKind::ColorBlind,
        GameKind::VisualMemory,
        GameKind::Typing,
        GameKind::NumberMemory,
        GameKind::PrecisionClick,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameKind::Reaction => "Reaction Time",
            GameKind::AimTrainer => "Aim Trainer",
            GameKind::NBack => "N-Back",
            GameKind::Simon => "Simon Says",
            GameKind::ColorBlind => "Color Blind Test",
            GameKind::VisualMemory => "Visual Memory",
            GameKind::Typing => "Typing Test",
            GameKind::NumberMemory => "Number Memory",
            GameKind::PrecisionClick => "Precision Click",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GameKind::Reaction => "Press as soon as the screen turns green",
            GameKind::AimTrainer => "Hit as many targets as you can in 30 seconds",
            GameKind::NBack => "Press when the lit cell matches the one n steps back",
            GameKind::Simon => "Repeat the growing color sequence",
            GameKind::ColorBlind => "Read the numbers hidden in Ishihara plates",
            GameKind::VisualMemory => "Remember which tiles lit up",
            GameKind::Typing => "Type the passage as fast and accurately as you can",
            GameKind::NumberMemory => "Remember the longest number you can",
            GameKind::PrecisionClick => "Click when both balls are inside the circle",
        }
    }

    pub fn category(self) -> &'static str {
        match self {
            GameKind::Reaction | GameKind::AimTrainer | GameKind::PrecisionClick => "Speed",
            GameKind::NBack | GameKind::Simon | GameKind::VisualMemory | GameKind::NumberMemory => {
                "Memory"
            }
            GameKind::ColorBlind => "Perception",
            GameKind::Typing => "Skill",
        }
    }

    pub fn score_key(self) -> &'static str {
        match self {
            GameKind::Reaction => "best-score-reaction",
            GameKind::AimTrainer => "best-score-aim",
            GameKind::NBack => "best-nback-level",
            GameKind::Simon => "best-level-simon",
            GameKind::ColorBlind => "colorblind-result",
            GameKind::VisualMemory => "best-level-visual",
            GameKind::Typing => "best-wpm-typing",
            GameKind::NumberMemory => "best-digits-number",
            GameKind::PrecisionClick => "best-level-precision",
        }
    }

    pub fn from_score_key(key: &str) -> Option<GameKind> {
        Self::ALL.into_iter().find(|kind| kind.score_key() == key)
    }

    pub fn ordering(self) -> ScoreOrdering {
        match self {
            GameKind::Reaction => ScoreOrdering::LowerIsBetter,
            _ => ScoreOrdering::HigherIsBetter,
        }
    }

    pub fn format_score(self, value: u64) -> String {
        match self {
            GameKind::Reaction => format!("{value}ms"),
            GameKind::AimTrainer => format!("{value}%"),
            GameKind::NBack => format!("{value}-Back"),
            GameKind::Simon | GameKind::VisualMemory | GameKind::PrecisionClick => {
                format!("Level {value}")
            }
            GameKind::ColorBlind if value >= 1 => "Normal".to_string(),
            GameKind::ColorBlind => "Completed".to_string(),
            GameKind::Typing => format!("{value} WPM"),
            GameKind::NumberMemory => format!("{value} digits"),
        }
    }

    pub fn default_config(self) -> GameConfig {
        let base = GameConfig::default();
        match self {
            GameKind::Reaction => GameConfig {
                length: Some(5),
                ..base
            },
            GameKind::AimTrainer => GameConfig {
                time_limit_secs: Some(30),
                ..base
            },
            GameKind::NBack => GameConfig {
                length: Some(nback_sequence_length(base.level)),
                ..base
            },
            GameKind::Simon => GameConfig {
                lives: Some(1),
                ..base
            },
            GameKind::ColorBlind => GameConfig {
                length: Some(PLATE_COUNT),
                ..base
            },
            GameKind::VisualMemory | GameKind::NumberMemory => GameConfig {
                lives: Some(3),
                ..base
            },
            GameKind::Typing => GameConfig {
                length: Some(1),
                time_limit_secs: Some(60),
                ..base
            },
            GameKind::PrecisionClick => GameConfig {
                lives: Some(3),
                max_level: Some(PRECISION_MAX_LEVEL),
                ..base
            },
        }
    }

    pub fn pacing(self) -> Pacing {
        let base = Pacing::default();
        match self {
            GameKind::Reaction => Pacing {
                priming: Delay::Uniform {
                    min_ms: 2000,
                    max_ms: 5000,
                },
                early_input: EarlyInput::TooEarly,
                ..base
            },
            GameKind::NBack => Pacing {
                response_window_ms: Some(NBACK_SHOW_MS + NBACK_GAP_MS),
                ..base
            },
            GameKind::Simon => Pacing {
                priming: Delay::PerElement {
                    lead_ms: 500,
                    per_element_ms: SIMON_ELEMENT_MS,
                },
                intermission_ms: 500,
                feedback_ms: FEEDBACK_MS,
                progression: Progression::LevelUp,
                ..base
            },
            GameKind::VisualMemory => Pacing {
                priming: Delay::Fixed(2000),
                intermission_ms: 1000,
                feedback_ms: FEEDBACK_MS,
                progression: Progression::LevelUp,
                ..base
            },
            GameKind::NumberMemory => Pacing {
                priming: Delay::Fixed(1000),
                intermission_ms: 1000,
                feedback_ms: FEEDBACK_MS,
                progression: Progression::LevelUp,
                ..base
            },
            GameKind::PrecisionClick => Pacing {
                progression: Progression::LevelUp,
                ..base
            },
            GameKind::AimTrainer | GameKind::ColorBlind | GameKind::Typing => base,
        }
    }

    pub fn strategies(self) -> (Box<dyn StimulusGenerator>, Box<dyn ResponseEvaluator>) {
        match self {
            GameKind::Reaction => (Box::new(SignalGenerator), Box::new(ReactionEvaluator)),
            GameKind::AimTrainer => (Box::new(PositionGenerator), Box::new(TargetEvaluator)),
            GameKind::NBack => (Box::<SequenceGenerator>::default(), Box::new(NBackEvaluator)),
            GameKind::Simon => (Box::new(ColorSequenceGenerator), Box::new(SimonEvaluator)),
            GameKind::ColorBlind => (Box::<PlateGenerator>::default(), Box::new(RecallEvaluator)),
            GameKind::VisualMemory => (Box::new(GridSubsetGenerator), Box::new(RecallEvaluator)),
            GameKind::Typing => (Box::new(PassageGenerator), Box::new(TypingEvaluator)),
            GameKind::NumberMemory => (Box::new(DigitStringGenerator), Box::new(RecallEvaluator)),
            GameKind::PrecisionClick => (Box::new(OrbitGenerator), Box::new(DualBallEvaluator)),
        }
    }

    /// Value to offer the score store; `None` when the run earned nothing
    /// worth keeping or did not run to completion
    pub fn final_score(self, session: &Session) -> Option<u64> {
        if !session.is_completed() {
            return None;
        }
        let positive = |v: u64| (v > 0).then_some(v);
        match self {
            GameKind::Reaction => metrics::reaction_stats(session.trials())
                .map(|stats| stats.mean_ms.round() as u64),
            GameKind::AimTrainer => {
                let report = metrics::aim_report(session);
                (report.hits > 0).then(|| report.accuracy.round() as u64)
            }
            GameKind::NBack => {
                let report = metrics::nback_report(session);
                (report.total_matches > 0 && report.accuracy >= NBACK_PASS_ACCURACY)
                    .then_some(u64::from(session.config().level))
            }
            GameKind::ColorBlind => {
                let report = metrics::colorblind_report(session);
                Some(u64::from(report.classification == metrics::Vision::Normal))
            }
            GameKind::Typing => metrics::typing_report(session).and_then(|r| positive(r.wpm)),
            GameKind::Simon
            | GameKind::VisualMemory
            | GameKind::NumberMemory
            | GameKind::PrecisionClick => positive(u64::from(session.levels_completed())),
        }
    }
}
