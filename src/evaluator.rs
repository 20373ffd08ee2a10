use crate::session::Input;
use crate::stimulus::{Ball, DualBallTrack, Outcome, Response, Stimulus, CANVAS_CENTER};
use crate::timers::Millis;

/// What the evaluator sees of the open trial
#[derive(Debug, Clone, Copy)]
pub struct Evaluation<'a> {
    pub stimulus: &'a Stimulus,
    /// Stimuli presented before this one
    pub history: &'a [Stimulus],
    /// Inputs already accepted for this trial
    pub inputs: &'a [Input],
    pub level: u32,
    pub presented_at: Option<Millis>,
}

/// Verdict on a single input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgement {
    /// Not meaningful for this game; nothing recorded
    Ignore,
    /// Accepted, the trial stays open
    Progress,
    /// Removes the last accepted input
    Retract,
    /// Counted, but the trial stays open with the same stimulus
    Stray(Outcome),
    /// Decides the outcome now; the trial still closes at its deadline
    Latch(Outcome),
    /// Closes the trial now
    Resolve(Outcome),
}

pub trait ResponseEvaluator: std::fmt::Debug {
    fn judge(&self, eval: &Evaluation<'_>, response: &Response) -> Judgement;

    /// Response window ran out without a latched outcome
    fn on_deadline(&self, _eval: &Evaluation<'_>) -> Outcome {
        Outcome::Miss
    }

    /// Session countdown ended with this trial still open
    fn on_timeout(&self, _eval: &Evaluation<'_>) -> Outcome {
        Outcome::Skipped
    }
}

/// Any press once the signal is up
#[derive(Debug, Default)]
pub struct ReactionEvaluator;

impl ResponseEvaluator for ReactionEvaluator {
    fn judge(&self, _eval: &Evaluation<'_>, response: &Response) -> Judgement {
        match response {
            Response::Press | Response::Point { .. } => Judgement::Resolve(Outcome::Hit),
            _ => Judgement::Ignore,
        }
    }
}

/// Clicks inside the target circle hit; anything else is a miss that keeps
/// the target on screen
#[derive(Debug, Default)]
pub struct TargetEvaluator;

impl ResponseEvaluator for TargetEvaluator {
    fn judge(&self, eval: &Evaluation<'_>, response: &Response) -> Judgement {
        match (eval.stimulus, response) {
            (Stimulus::Target(target), Response::Point { x, y }) if target.contains(*x, *y) => {
                Judgement::Resolve(Outcome::Hit)
            }
            (Stimulus::Target(_), Response::Point { .. }) => Judgement::Stray(Outcome::Miss),
            _ => Judgement::Ignore,
        }
    }
}

/// True when the current cell equals the one `n` trials back
pub fn is_nback_match(stimulus: &Stimulus, history: &[Stimulus], n: usize) -> bool {
    n > 0 && history.len() >= n && history[history.len() - n] == *stimulus
}

#[derive(Debug, Default)]
pub struct NBackEvaluator;

impl ResponseEvaluator for NBackEvaluator {
    fn judge(&self, eval: &Evaluation<'_>, response: &Response) -> Judgement {
        if *response != Response::Press {
            return Judgement::Ignore;
        }
        if is_nback_match(eval.stimulus, eval.history, eval.level as usize) {
            Judgement::Latch(Outcome::Hit)
        } else {
            Judgement::Latch(Outcome::FalsePositive)
        }
    }

    fn on_deadline(&self, eval: &Evaluation<'_>) -> Outcome {
        if is_nback_match(eval.stimulus, eval.history, eval.level as usize) {
            Outcome::Miss
        } else {
            Outcome::Skipped
        }
    }
}

/// Each press must match the sequence so far; the first slip fails the round
#[derive(Debug, Default)]
pub struct SimonEvaluator;

impl ResponseEvaluator for SimonEvaluator {
    fn judge(&self, eval: &Evaluation<'_>, response: &Response) -> Judgement {
        let (Stimulus::Colors(colors), Response::Color(pressed)) = (eval.stimulus, response) else {
            return Judgement::Ignore;
        };
        let position = eval.inputs.len();
        match colors.get(position) {
            Some(expected) if expected != pressed => Judgement::Resolve(Outcome::Miss),
            Some(_) if position + 1 == colors.len() => Judgement::Resolve(Outcome::Hit),
            Some(_) => Judgement::Progress,
            None => Judgement::Ignore,
        }
    }
}

/// Whole-answer recall: digits, cells and plates. No partial credit.
#[derive(Debug, Default)]
pub struct RecallEvaluator;

impl ResponseEvaluator for RecallEvaluator {
    fn judge(&self, eval: &Evaluation<'_>, response: &Response) -> Judgement {
        let verdict = |correct: bool| {
            Judgement::Resolve(if correct { Outcome::Hit } else { Outcome::Miss })
        };
        match (eval.stimulus, response) {
            (_, Response::Text(text)) if text.trim().is_empty() => Judgement::Ignore,
            (Stimulus::Digits(digits), Response::Text(text)) => verdict(text.trim() == digits),
            (Stimulus::Plate(plate), Response::Text(text)) => verdict(text.trim() == plate.answer),
            (Stimulus::Plate(_), Response::Skip) => Judgement::Resolve(Outcome::Skipped),
            (Stimulus::Cells { cells, .. }, Response::Cells(picked)) => verdict(picked == cells),
            _ => Judgement::Ignore,
        }
    }
}

/// Typing passage: keystrokes accumulate until the passage length is reached
#[derive(Debug, Default)]
pub struct TypingEvaluator;

impl ResponseEvaluator for TypingEvaluator {
    fn judge(&self, eval: &Evaluation<'_>, response: &Response) -> Judgement {
        let Stimulus::Passage(passage) = eval.stimulus else {
            return Judgement::Ignore;
        };
        match response {
            Response::Key(_) if eval.inputs.len() + 1 >= passage.chars().count() => {
                Judgement::Resolve(Outcome::Hit)
            }
            Response::Key(_) => Judgement::Progress,
            Response::Backspace if !eval.inputs.is_empty() => Judgement::Retract,
            _ => Judgement::Ignore,
        }
    }
}

/// Both balls must sit inside the target circle around `center`
pub fn dual_ball_hit(a: &Ball, b: &Ball, center: (f64, f64), radius: f64) -> bool {
    let inside = |ball: &Ball| (ball.x - center.0).hypot(ball.y - center.1) <= radius;
    inside(a) && inside(b)
}

pub fn track_hit(track: &DualBallTrack) -> bool {
    dual_ball_hit(
        &track.horizontal,
        &track.vertical,
        (CANVAS_CENTER, CANVAS_CENTER),
        track.target_radius,
    )
}

#[derive(Debug, Default)]
pub struct DualBallEvaluator;

impl ResponseEvaluator for DualBallEvaluator {
    fn judge(&self, eval: &Evaluation<'_>, response: &Response) -> Judgement {
        match (eval.stimulus, response) {
            (Stimulus::Orbit(track), Response::Press | Response::Point { .. }) => {
                Judgement::Resolve(if track_hit(track) {
                    Outcome::Hit
                } else {
                    Outcome::Miss
                })
            }
            _ => Judgement::Ignore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::{Plate, SimonColor, Target};
    use std::collections::BTreeSet;

    fn eval<'a>(stimulus: &'a Stimulus, history: &'a [Stimulus], inputs: &'a [Input], level: u32) -> Evaluation<'a> {
        Evaluation {
            stimulus,
            history,
            inputs,
            level,
            presented_at: Some(0),
        }
    }

    fn key_inputs(s: &str) -> Vec<Input> {
        s.chars()
            .map(|c| Input {
                response: Response::Key(c),
                at: 0,
            })
            .collect()
    }

    #[test]
    fn test_target_hit_and_stray_miss() {
        let stimulus = Stimulus::Target(Target {
            x: 100.0,
            y: 100.0,
            size: 60.0,
        });
        let e = eval(&stimulus, &[], &[], 1);
        assert_eq!(
            TargetEvaluator.judge(&e, &Response::Point { x: 130.0, y: 130.0 }),
            Judgement::Resolve(Outcome::Hit)
        );
        assert_eq!(
            TargetEvaluator.judge(&e, &Response::Point { x: 10.0, y: 10.0 }),
            Judgement::Stray(Outcome::Miss)
        );
    }

    #[test]
    fn test_nback_match_classification() {
        let history = vec![Stimulus::GridCell(4), Stimulus::GridCell(2)];
        let matching = Stimulus::GridCell(4);
        let other = Stimulus::GridCell(7);

        assert!(is_nback_match(&matching, &history, 2));
        assert!(!is_nback_match(&matching, &history[..1], 2));

        let e = eval(&matching, &history, &[], 2);
        assert_eq!(NBackEvaluator.judge(&e, &Response::Press), Judgement::Latch(Outcome::Hit));
        assert_eq!(NBackEvaluator.on_deadline(&e), Outcome::Miss);

        let e = eval(&other, &history, &[], 2);
        assert_eq!(
            NBackEvaluator.judge(&e, &Response::Press),
            Judgement::Latch(Outcome::FalsePositive)
        );
        assert_eq!(NBackEvaluator.on_deadline(&e), Outcome::Skipped);
    }

    #[test]
    fn test_simon_checks_prefix() {
        let stimulus = Stimulus::Colors(vec![SimonColor::Red, SimonColor::Green]);
        let none = [];
        let first = [Input {
            response: Response::Color(SimonColor::Red),
            at: 0,
        }];

        assert_eq!(
            SimonEvaluator.judge(&eval(&stimulus, &[], &none, 2), &Response::Color(SimonColor::Red)),
            Judgement::Progress
        );
        assert_eq!(
            SimonEvaluator.judge(&eval(&stimulus, &[], &none, 2), &Response::Color(SimonColor::Blue)),
            Judgement::Resolve(Outcome::Miss)
        );
        assert_eq!(
            SimonEvaluator.judge(&eval(&stimulus, &[], &first, 2), &Response::Color(SimonColor::Green)),
            Judgement::Resolve(Outcome::Hit)
        );
    }

    #[test]
    fn test_recall_exact_match_only() {
        let digits = Stimulus::Digits("4821".into());
        let e = eval(&digits, &[], &[], 4);
        assert_eq!(
            RecallEvaluator.judge(&e, &Response::Text("4821".into())),
            Judgement::Resolve(Outcome::Hit)
        );
        assert_eq!(
            RecallEvaluator.judge(&e, &Response::Text("482".into())),
            Judgement::Resolve(Outcome::Miss)
        );
        assert_eq!(RecallEvaluator.judge(&e, &Response::Text("  ".into())), Judgement::Ignore);

        let cells: BTreeSet<usize> = [1, 4, 8].into_iter().collect();
        let grid = Stimulus::Cells {
            grid_size: 3,
            cells: cells.clone(),
        };
        let e = eval(&grid, &[], &[], 1);
        assert_eq!(
            RecallEvaluator.judge(&e, &Response::Cells(cells)),
            Judgement::Resolve(Outcome::Hit)
        );
        assert_eq!(
            RecallEvaluator.judge(&e, &Response::Cells([1, 4].into_iter().collect())),
            Judgement::Resolve(Outcome::Miss)
        );

        let plate = Stimulus::Plate(Plate::new(7));
        let e = eval(&plate, &[], &[], 1);
        assert_eq!(
            RecallEvaluator.judge(&e, &Response::Text("7".into())),
            Judgement::Resolve(Outcome::Hit)
        );
        assert_eq!(
            RecallEvaluator.judge(&e, &Response::Skip),
            Judgement::Resolve(Outcome::Skipped)
        );
    }

    #[test]
    fn test_typing_completes_at_passage_length() {
        let passage = Stimulus::Passage("abc".into());
        let typed = key_inputs("ab");
        assert_eq!(
            TypingEvaluator.judge(&eval(&passage, &[], &typed[..1], 1), &Response::Key('x')),
            Judgement::Progress
        );
        assert_eq!(
            TypingEvaluator.judge(&eval(&passage, &[], &typed, 1), &Response::Key('c')),
            Judgement::Resolve(Outcome::Hit)
        );
        assert_eq!(
            TypingEvaluator.judge(&eval(&passage, &[], &typed, 1), &Response::Backspace),
            Judgement::Retract
        );
        assert_eq!(
            TypingEvaluator.judge(&eval(&passage, &[], &[], 1), &Response::Backspace),
            Judgement::Ignore
        );
    }

    #[test]
    fn test_dual_ball_requires_both_inside() {
        let center = (400.0, 400.0);
        let inside = Ball {
            x: 410.0,
            y: 395.0,
            dir: 1.0,
        };
        let outside = Ball {
            x: 600.0,
            y: 400.0,
            dir: 1.0,
        };
        assert!(dual_ball_hit(&inside, &inside, center, 40.0));
        assert!(!dual_ball_hit(&inside, &outside, center, 40.0));
        assert!(!dual_ball_hit(&outside, &inside, center, 40.0));
        assert!(!dual_ball_hit(&outside, &outside, center, 40.0));
    }

    #[test]
    fn test_fresh_track_is_a_miss() {
        let stimulus = Stimulus::Orbit(DualBallTrack::for_level(1));
        assert_eq!(
            DualBallEvaluator.judge(&eval(&stimulus, &[], &[], 1), &Response::Press),
            Judgement::Resolve(Outcome::Miss)
        );
    }
}
