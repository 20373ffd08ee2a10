//! Summary numbers computed from a session's trials

use itertools::Itertools;

use crate::generator::PLATE_COUNT;
use crate::session::{Input, Session, Trial};
use crate::stimulus::{Outcome, Response, Stimulus};
use crate::time_series::TimeSeriesPoint;
use crate::timers::Millis;
use crate::util::{mean, percent, std_dev};

const CHARS_PER_WORD: f64 = 5.0;
const MIN_MINUTES: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionStats {
    pub attempts: usize,
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub best_ms: u64,
}

pub fn reaction_stats(trials: &[Trial]) -> Option<ReactionStats> {
    let latencies: Vec<u64> = trials
        .iter()
        .filter(|t| t.outcome == Outcome::Hit)
        .filter_map(Trial::latency_ms)
        .collect();
    let as_f64: Vec<f64> = latencies.iter().map(|&ms| ms as f64).collect();
    Some(ReactionStats {
        attempts: latencies.len(),
        mean_ms: mean(&as_f64)?,
        std_dev_ms: std_dev(&as_f64)?,
        best_ms: latencies.iter().copied().min()?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimReport {
    pub hits: usize,
    pub misses: usize,
    /// Percent of clicks that landed on a target
    pub accuracy: f64,
    pub mean_hit_ms: Option<f64>,
}

pub fn aim_report(session: &Session) -> AimReport {
    let counters = session.counters();
    let clicks = counters.hits + counters.misses;
    let hit_times: Vec<f64> = session
        .trials()
        .iter()
        .filter(|t| t.outcome == Outcome::Hit)
        .filter_map(|t| t.latency_ms())
        .map(|ms| ms as f64)
        .collect();
    AimReport {
        hits: counters.hits,
        misses: counters.misses,
        accuracy: percent(counters.hits, clicks),
        mean_hit_ms: mean(&hit_times),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NBackReport {
    pub hits: usize,
    pub misses: usize,
    pub false_positives: usize,
    pub total_matches: usize,
    pub accuracy: f64,
}

pub fn nback_report(session: &Session) -> NBackReport {
    let counters = session.counters();
    let total_matches = counters.hits + counters.misses;
    NBackReport {
        hits: counters.hits,
        misses: counters.misses,
        false_positives: counters.false_positives,
        total_matches,
        accuracy: percent(counters.hits, total_matches),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Vision {
    Normal,
    #[strum(to_string = "Mild deficiency")]
    Mild,
    #[strum(to_string = "Possible deficiency")]
    Possible,
}

impl Vision {
    pub fn classify(percent: f64) -> Self {
        if percent >= 90.0 {
            Vision::Normal
        } else if percent >= 70.0 {
            Vision::Mild
        } else {
            Vision::Possible
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBlindReport {
    pub correct: usize,
    pub total: usize,
    pub percent: f64,
    pub classification: Vision,
}

pub fn colorblind_report(session: &Session) -> ColorBlindReport {
    let total = session.config().length.unwrap_or(PLATE_COUNT);
    let correct = session.counters().hits;
    let percent = percent(correct, total);
    ColorBlindReport {
        correct,
        total,
        percent,
        classification: Vision::classify(percent),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypingReport {
    pub wpm: u64,
    /// Percent of typed characters that were right
    pub accuracy: u64,
    pub errors: usize,
    pub typed: usize,
    pub elapsed_ms: u64,
    pub series: Vec<TimeSeriesPoint>,
}

fn typed_chars(inputs: &[Input]) -> impl Iterator<Item = (char, Millis)> + '_ {
    inputs.iter().filter_map(|i| match i.response {
        Response::Key(c) => Some((c, i.at)),
        _ => None,
    })
}

fn correct_count(passage: &str, typed: &[char]) -> usize {
    passage
        .chars()
        .zip(typed.iter())
        .filter(|(expected, got)| expected == *got)
        .count()
}

/// Final typing numbers. Speed counts correct characters only.
pub fn typing_metrics(passage: &str, typed: &[char], elapsed_ms: u64) -> (u64, u64, usize) {
    let correct = correct_count(passage, typed);
    let minutes = (elapsed_ms as f64 / 60_000.0).max(MIN_MINUTES);
    let wpm = ((correct as f64 / CHARS_PER_WORD) / minutes).round() as u64;
    let accuracy = if typed.is_empty() {
        0
    } else {
        (correct as f64 / typed.len() as f64 * 100.0).round() as u64
    };
    (wpm, accuracy, typed.len() - correct)
}

/// Speed shown while typing. The first second is clamped so the number does
/// not spike on the opening keystroke.
pub fn live_wpm(passage: &str, typed: &[char], elapsed_ms: u64) -> u64 {
    let correct = correct_count(passage, typed);
    let minutes = elapsed_ms.max(1000) as f64 / 60_000.0;
    ((correct as f64 / CHARS_PER_WORD) / minutes).round() as u64
}

/// Cumulative WPM sampled at every whole second up to `end`
pub fn wpm_series(passage: &str, inputs: &[Input], start: Millis, end: Millis) -> Vec<TimeSeriesPoint> {
    let second_of = |at: Millis| ((at.saturating_sub(start)) as f64 / 1000.0).ceil().max(1.0) as u64;
    let per_second = typed_chars(inputs)
        .zip(passage.chars())
        .filter(|((got, _), expected)| got == expected)
        .map(|((_, at), _)| second_of(at))
        .counts();

    let mut correct = 0;
    (1..=second_of(end))
        .map(|sec| {
            correct += per_second.get(&sec).copied().unwrap_or(0);
            let minutes = sec as f64 / 60.0;
            TimeSeriesPoint::new(sec as f64, (correct as f64 / CHARS_PER_WORD) / minutes)
        })
        .collect()
}

fn passage_trial(session: &Session) -> Option<(&str, &[Input], Millis, Millis)> {
    session.trials().iter().find_map(|t| match &t.stimulus {
        Stimulus::Passage(p) => Some((p.as_str(), t.inputs.as_slice(), t.presented_at?, t.closed_at)),
        _ => None,
    })
}

/// Typing results for a finished session
pub fn typing_report(session: &Session) -> Option<TypingReport> {
    let (passage, inputs, start, end) = passage_trial(session)?;
    let typed: Vec<char> = typed_chars(inputs).map(|(c, _)| c).collect();
    let elapsed_ms = end.saturating_sub(start);
    let (wpm, accuracy, errors) = typing_metrics(passage, &typed, elapsed_ms);
    Some(TypingReport {
        wpm,
        accuracy,
        errors,
        typed: typed.len(),
        elapsed_ms,
        series: wpm_series(passage, inputs, start, end),
    })
}

/// Errors in the text typed so far
pub fn typing_errors(passage: &str, typed: &[char]) -> usize {
    typed.len() - correct_count(passage, typed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(s: &str, start: Millis, step: Millis) -> Vec<Input> {
        s.chars()
            .enumerate()
            .map(|(i, c)| Input {
                response: Response::Key(c),
                at: start + (i as Millis + 1) * step,
            })
            .collect()
    }

    #[test]
    fn test_typing_metrics() {
        let passage = "hello world";
        let typed: Vec<char> = "hellx world".chars().collect();
        // 10 correct chars in half a minute
        let (wpm, accuracy, errors) = typing_metrics(passage, &typed, 30_000);
        assert_eq!(wpm, 4);
        assert_eq!(accuracy, 91);
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_typing_metrics_floor_on_minutes() {
        let typed: Vec<char> = "abcde".chars().collect();
        assert_eq!(typing_metrics("abcde", &typed, 0), (100, 100, 0));
        assert_eq!(typing_metrics("abcde", &[], 0), (0, 0, 0));
    }

    #[test]
    fn test_live_wpm_clamps_first_second() {
        let typed: Vec<char> = "abcde".chars().collect();
        assert_eq!(live_wpm("abcde", &typed, 100), 60);
        assert_eq!(live_wpm("abcde", &typed, 2000), 30);
    }

    #[test]
    fn test_wpm_series_is_cumulative_per_second() {
        let inputs = keys("aaaaaaaaaa", 0, 500);
        let series = wpm_series("aaaaaaaaaa", &inputs, 0, 5000);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0].secs, 1.0);
        assert_eq!(series[4].secs, 5.0);
        assert!(series.iter().all(|p| (p.wpm - 24.0).abs() < 1e-9));
    }

    #[test]
    fn test_vision_classification() {
        assert_eq!(Vision::classify(100.0), Vision::Normal);
        assert_eq!(Vision::classify(90.0), Vision::Normal);
        assert_eq!(Vision::classify(80.0), Vision::Mild);
        assert_eq!(Vision::classify(60.0), Vision::Possible);
        assert_eq!(Vision::Mild.to_string(), "Mild deficiency");
    }

    #[test]
    fn test_reaction_stats_ignore_too_early() {
        let trial = |outcome, presented: Option<Millis>, responded| Trial {
            index: 0,
            level: 1,
            stimulus: Stimulus::Signal,
            presented_at: presented,
            responded_at: Some(responded),
            closed_at: responded,
            outcome,
            inputs: vec![],
        };
        let trials = vec![
            trial(Outcome::Hit, Some(1000), 1200),
            trial(Outcome::TooEarly, None, 1500),
            trial(Outcome::Hit, Some(5000), 5300),
        ];
        let stats = reaction_stats(&trials).unwrap();
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.mean_ms, 250.0);
        assert_eq!(stats.std_dev_ms, 50.0);
        assert_eq!(stats.best_ms, 200);
        assert_eq!(reaction_stats(&[]), None);
    }
}
