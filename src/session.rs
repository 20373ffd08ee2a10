//! The timed-trial state machine shared by every game.
//!
//! A [`Session`] never reads a clock. The host passes monotonic milliseconds
//! into [`Session::start`], [`Session::record_response`], [`Session::tick`] and
//! [`Session::frame`], and every timed transition is a timer in the session's
//! own [`TimerQueue`]. A timer fires only once `now` is strictly past its
//! deadline, so a response stamped exactly at a deadline still wins it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::error::{SessionError, SessionResult};
use crate::evaluator::{Evaluation, Judgement, ResponseEvaluator};
use crate::game::{GameKind, ScoreOrdering};
use crate::generator::{GenContext, StimulusGenerator};
use crate::stimulus::{Outcome, Response, Stimulus};
use crate::timers::{Millis, TimerHandle, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
pub enum SessionState {
    Idle,
    Priming,
    Active,
    Evaluating,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Input {
    pub response: Response,
    pub at: Millis,
}

/// One stimulus/response pair, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trial {
    pub index: usize,
    pub level: u32,
    pub stimulus: Stimulus,
    pub presented_at: Option<Millis>,
    pub responded_at: Option<Millis>,
    pub closed_at: Millis,
    pub outcome: Outcome,
    pub inputs: Vec<Input>,
}

impl Trial {
    pub fn latency_ms(&self) -> Option<u64> {
        Some(self.responded_at?.saturating_sub(self.presented_at?))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub hits: usize,
    pub misses: usize,
    pub false_positives: usize,
    pub too_early: usize,
    pub skipped: usize,
}

impl Counters {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::Miss => self.misses += 1,
            Outcome::FalsePositive => self.false_positives += 1,
            Outcome::TooEarly => self.too_early += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

/// How long a stimulus stays in Priming before it accepts input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    Immediate,
    Fixed(u64),
    Uniform { min_ms: u64, max_ms: u64 },
    /// A lead-in plus a slot for every element played back
    PerElement { lead_ms: u64, per_element_ms: u64 },
}

impl Delay {
    pub fn sample(&self, stimulus: &Stimulus, rng: &mut StdRng) -> u64 {
        match *self {
            Delay::Immediate => 0,
            Delay::Fixed(ms) => ms,
            Delay::Uniform { min_ms, max_ms } if max_ms > min_ms => rng.gen_range(min_ms..=max_ms),
            Delay::Uniform { min_ms, .. } => min_ms,
            Delay::PerElement {
                lead_ms,
                per_element_ms,
            } => lead_ms + per_element_ms * stimulus.element_count() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyInput {
    Ignore,
    /// Input during Priming is recorded as TooEarly and the trial restarts
    TooEarly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progression {
    Fixed,
    /// Each Hit completes the current level
    LevelUp,
}

/// Per-game timing rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub priming: Delay,
    /// Extra pause before the stimulus that follows a Hit
    pub intermission_ms: u64,
    /// Closes the trial automatically; `None` waits for input
    pub response_window_ms: Option<u64>,
    /// Time spent in Evaluating after a mistake that costs a life
    pub feedback_ms: u64,
    pub early_input: EarlyInput,
    pub progression: Progression,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            priming: Delay::Immediate,
            intermission_ms: 0,
            response_window_ms: None,
            feedback_ms: 0,
            early_input: EarlyInput::Ignore,
            progression: Progression::Fixed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    StimulusReady,
    TrialDeadline,
    FeedbackDone,
    CountdownExpired,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    Completed,
    Aborted,
    Failed(SessionError),
}

#[derive(Debug)]
struct PendingTrial {
    stimulus: Stimulus,
    level: u32,
    presented_at: Option<Millis>,
    inputs: Vec<Input>,
    latched: Option<Outcome>,
    ready: Option<TimerHandle>,
    deadline: Option<TimerHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub kind: GameKind,
    pub end: Option<SessionEnd>,
    pub counters: Counters,
    pub trials: usize,
    pub level: u32,
    pub levels_completed: u32,
    pub lives: Option<u32>,
    pub duration_ms: Option<u64>,
}

/// One play-through of a game
#[derive(Debug)]
pub struct Session {
    kind: GameKind,
    config: GameConfig,
    pacing: Pacing,
    generator: Box<dyn StimulusGenerator>,
    evaluator: Box<dyn ResponseEvaluator>,
    ordering: ScoreOrdering,
    rng: StdRng,
    state: SessionState,
    state_since: Millis,
    timers: TimerQueue<TimerEvent>,
    countdown: Option<(TimerHandle, Millis)>,
    pending: Option<PendingTrial>,
    trials: Vec<Trial>,
    presented: Vec<Stimulus>,
    counters: Counters,
    level: u32,
    levels_completed: u32,
    lives: Option<u32>,
    next_index: usize,
    started_at: Option<Millis>,
    finished_at: Option<Millis>,
    last_frame: Option<Millis>,
    end: Option<SessionEnd>,
}

impl Session {
    /// An idle session wired with the game's own strategies
    pub fn new(kind: GameKind) -> Self {
        let (generator, evaluator) = kind.strategies();
        Self::with_strategies(kind, kind.pacing(), generator, evaluator, kind.ordering())
    }

    pub fn with_strategies(
        kind: GameKind,
        pacing: Pacing,
        generator: Box<dyn StimulusGenerator>,
        evaluator: Box<dyn ResponseEvaluator>,
        ordering: ScoreOrdering,
    ) -> Self {
        let config = kind.default_config();
        Self {
            kind,
            level: config.level,
            lives: config.lives,
            config,
            pacing,
            generator,
            evaluator,
            ordering,
            rng: StdRng::from_entropy(),
            state: SessionState::Idle,
            state_since: 0,
            timers: TimerQueue::new(),
            countdown: None,
            pending: None,
            trials: Vec::new(),
            presented: Vec::new(),
            counters: Counters::default(),
            levels_completed: 0,
            next_index: 0,
            started_at: None,
            finished_at: None,
            last_frame: None,
            end: None,
        }
    }

    /// Begin a fresh play-through. Any previous run is discarded along with
    /// its timers. An invalid config leaves the session untouched.
    pub fn start(&mut self, config: GameConfig, now: Millis) -> SessionResult<()> {
        config.validate(self.kind)?;

        self.timers.cancel_all();
        self.rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.generator.reset();
        self.level = config.level;
        self.lives = config.lives;
        self.config = config;
        self.countdown = None;
        self.pending = None;
        self.trials.clear();
        self.presented.clear();
        self.counters = Counters::default();
        self.levels_completed = 0;
        self.next_index = 0;
        self.started_at = Some(now);
        self.finished_at = None;
        self.last_frame = None;
        self.end = None;

        info!(game = %self.kind, level = self.level, "session started");
        self.transition(SessionState::Priming, now);

        if let Some(secs) = self.config.time_limit_secs {
            let deadline = now + u64::from(secs) * 1000;
            let handle = self.timers.schedule(deadline, TimerEvent::CountdownExpired);
            self.countdown = Some((handle, deadline));
        }

        self.begin_trial(now, false, false);
        match &self.end {
            Some(SessionEnd::Failed(err)) => Err(err.clone()),
            _ => Ok(()),
        }
    }

    /// Route one player input. Timers due strictly before `at` fire first.
    pub fn record_response(&mut self, response: Response, at: Millis) -> SessionResult<Judgement> {
        self.advance_to(at);

        match self.state {
            SessionState::Active => {}
            SessionState::Priming if self.pacing.early_input == EarlyInput::TooEarly => {
                self.restart_too_early(response, at);
                return Ok(Judgement::Resolve(Outcome::TooEarly));
            }
            state => return Err(SessionError::UnexpectedResponse { state }),
        }

        let judgement = {
            let Some(pending) = self.pending.as_ref() else {
                return Err(SessionError::UnexpectedResponse { state: self.state });
            };
            if pending.latched.is_some() {
                return Err(SessionError::UnexpectedResponse { state: self.state });
            }
            let eval = self.evaluation(pending);
            self.evaluator.judge(&eval, &response)
        };

        let input = Input { response, at };
        match judgement {
            Judgement::Ignore => {}
            Judgement::Progress => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.inputs.push(input);
                }
            }
            Judgement::Retract => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.inputs.pop();
                }
            }
            Judgement::Stray(outcome) => self.record_stray(outcome, input, at),
            Judgement::Latch(outcome) => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.inputs.push(input);
                    pending.latched = Some(outcome);
                }
            }
            Judgement::Resolve(outcome) => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.inputs.push(input);
                }
                self.resolve(outcome, at);
            }
        }
        Ok(judgement)
    }

    /// Fire every timer due strictly before `now`
    pub fn tick(&mut self, now: Millis) {
        self.advance_to(now);
    }

    /// Animate the active stimulus up to `now`, then fire due timers
    pub fn frame(&mut self, now: Millis) {
        if self.state == SessionState::Active {
            let since = self.last_frame.unwrap_or(now);
            if let Some(PendingTrial {
                stimulus: Stimulus::Orbit(track),
                ..
            }) = self.pending.as_mut()
            {
                track.advance(now.saturating_sub(since));
            }
            self.last_frame = Some(now);
        }
        self.advance_to(now);
    }

    /// Stop immediately. Nothing from an aborted session is ever saved.
    pub fn abort(&mut self, now: Millis) {
        if self.state == SessionState::Summary {
            return;
        }
        warn!(game = %self.kind, state = %self.state, "session aborted");
        self.finish(SessionEnd::Aborted, now);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// When the current state was entered
    pub fn state_since(&self) -> Millis {
        self.state_since
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    pub fn ordering(&self) -> ScoreOrdering {
        self.ordering
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn levels_completed(&self) -> u32 {
        self.levels_completed
    }

    pub fn lives(&self) -> Option<u32> {
        self.lives
    }

    pub fn trial_index(&self) -> usize {
        self.next_index
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Trials that count toward the result set
    pub fn counted_trials(&self) -> usize {
        self.trials
            .iter()
            .filter(|t| t.outcome.counts_toward_results())
            .count()
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn current_stimulus(&self) -> Option<&Stimulus> {
        self.pending.as_ref().map(|p| &p.stimulus)
    }

    pub fn current_inputs(&self) -> &[Input] {
        self.pending.as_ref().map_or(&[], |p| p.inputs.as_slice())
    }

    pub fn presented_at(&self) -> Option<Millis> {
        self.pending.as_ref().and_then(|p| p.presented_at)
    }

    /// Every stimulus that reached Active, in order
    pub fn presented_sequence(&self) -> &[Stimulus] {
        &self.presented
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.next_deadline()
    }

    pub fn time_remaining_ms(&self, now: Millis) -> Option<u64> {
        self.countdown.map(|(_, deadline)| deadline.saturating_sub(now))
    }

    pub fn started_at(&self) -> Option<Millis> {
        self.started_at
    }

    pub fn end(&self) -> Option<&SessionEnd> {
        self.end.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Summary
    }

    pub fn is_completed(&self) -> bool {
        self.end == Some(SessionEnd::Completed)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            kind: self.kind,
            end: self.end.clone(),
            counters: self.counters,
            trials: self.counted_trials(),
            level: self.level,
            levels_completed: self.levels_completed,
            lives: self.lives,
            duration_ms: self
                .started_at
                .zip(self.finished_at)
                .map(|(s, f)| f.saturating_sub(s)),
        }
    }

    fn transition(&mut self, to: SessionState, at: Millis) {
        debug!(game = %self.kind, from = %self.state, to = %to, at, "transition");
        self.state = to;
        self.state_since = at;
    }

    fn evaluation<'a>(&'a self, pending: &'a PendingTrial) -> Evaluation<'a> {
        let shown = match pending.presented_at {
            Some(_) => self.presented.len().saturating_sub(1),
            None => self.presented.len(),
        };
        Evaluation {
            stimulus: &pending.stimulus,
            history: &self.presented[..shown],
            inputs: &pending.inputs,
            level: pending.level,
            presented_at: pending.presented_at,
        }
    }

    fn advance_to(&mut self, now: Millis) {
        while let Some((_, deadline, event)) = self.timers.pop_due(now) {
            match event {
                TimerEvent::StimulusReady => self.activate(deadline),
                TimerEvent::TrialDeadline => self.close_at_deadline(deadline),
                TimerEvent::FeedbackDone => {
                    if self.is_over() {
                        self.finish(SessionEnd::Completed, deadline);
                    } else {
                        self.begin_trial(deadline, false, true);
                    }
                }
                TimerEvent::CountdownExpired => {
                    self.countdown = None;
                    self.close_on_timeout(deadline);
                    self.finish(SessionEnd::Completed, deadline);
                }
            }
        }
    }

    fn begin_trial(&mut self, now: Millis, after_hit: bool, retry: bool) {
        let ctx = GenContext {
            level: self.level,
            config: &self.config,
            history: &self.presented,
            previous: self.trials.last().map(|t| &t.stimulus),
            retry,
        };
        let stimulus = match self.generator.next(&ctx, &mut self.rng) {
            Ok(stimulus) => stimulus,
            Err(err) => {
                warn!(game = %self.kind, "stimulus generation failed: {err}");
                self.finish(SessionEnd::Failed(err), now);
                return;
            }
        };

        let mut delay = self.pacing.priming.sample(&stimulus, &mut self.rng);
        if after_hit {
            delay += self.pacing.intermission_ms;
        }
        self.pending = Some(PendingTrial {
            stimulus,
            level: self.level,
            presented_at: None,
            inputs: Vec::new(),
            latched: None,
            ready: None,
            deadline: None,
        });

        if delay == 0 {
            if !matches!(self.state, SessionState::Active | SessionState::Priming) {
                self.transition(SessionState::Priming, now);
            }
            self.activate(now);
        } else {
            if self.state != SessionState::Priming {
                self.transition(SessionState::Priming, now);
            }
            let handle = self
                .timers
                .schedule(now + delay, TimerEvent::StimulusReady);
            if let Some(pending) = self.pending.as_mut() {
                pending.ready = Some(handle);
            }
        }
    }

    fn activate(&mut self, at: Millis) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        pending.ready = None;
        pending.presented_at = Some(at);
        self.presented.push(pending.stimulus.clone());
        if let Some(window) = self.pacing.response_window_ms {
            pending.deadline = Some(self.timers.schedule(at + window, TimerEvent::TrialDeadline));
        }
        self.last_frame = Some(at);
        if self.state != SessionState::Active {
            self.transition(SessionState::Active, at);
        }
    }

    fn restart_too_early(&mut self, response: Response, at: Millis) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if let Some(handle) = pending.ready.take() {
            self.timers.cancel(handle);
        }
        self.trials.push(Trial {
            index: self.next_index,
            level: pending.level,
            stimulus: pending.stimulus.clone(),
            presented_at: None,
            responded_at: Some(at),
            closed_at: at,
            outcome: Outcome::TooEarly,
            inputs: vec![Input { response, at }],
        });
        self.next_index += 1;
        self.counters.record(Outcome::TooEarly);

        let delay = self.pacing.priming.sample(&pending.stimulus, &mut self.rng);
        let handle = self.timers.schedule(at + delay, TimerEvent::StimulusReady);
        pending.ready = Some(handle);
        debug!(game = %self.kind, at, "too early, priming restarted");
        self.transition(SessionState::Priming, at);
    }

    fn close_trial(&mut self, outcome: Outcome, at: Millis) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        for handle in [pending.ready, pending.deadline].into_iter().flatten() {
            self.timers.cancel(handle);
        }
        self.counters.record(outcome);
        self.trials.push(Trial {
            index: self.next_index,
            level: pending.level,
            responded_at: pending.inputs.first().map(|i| i.at),
            stimulus: pending.stimulus,
            presented_at: pending.presented_at,
            closed_at: at,
            outcome,
            inputs: pending.inputs,
        });
        self.next_index += 1;
        debug!(game = %self.kind, trial = self.next_index - 1, %outcome, at, "trial closed");
    }

    /// Log a response that misses without closing the open trial. It gets a
    /// closed trial of its own on the same stimulus.
    fn record_stray(&mut self, outcome: Outcome, input: Input, at: Millis) {
        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        self.counters.record(outcome);
        self.trials.push(Trial {
            index: self.next_index,
            level: pending.level,
            stimulus: pending.stimulus.clone(),
            presented_at: pending.presented_at,
            responded_at: Some(input.at),
            closed_at: at,
            outcome,
            inputs: vec![input],
        });
        self.next_index += 1;
        debug!(game = %self.kind, trial = self.next_index - 1, %outcome, at, "stray response");
    }

    fn resolve(&mut self, outcome: Outcome, at: Millis) {
        self.close_trial(outcome, at);

        if outcome.is_correct() && self.pacing.progression == Progression::LevelUp {
            self.levels_completed = self.level;
            self.level += 1;
        }

        if outcome.is_incorrect() {
            if let Some(lives) = self.lives {
                self.lives = Some(lives.saturating_sub(1));
                self.transition(SessionState::Evaluating, at);
                self.timers
                    .schedule(at + self.pacing.feedback_ms, TimerEvent::FeedbackDone);
                return;
            }
        }

        if self.is_over() {
            self.finish(SessionEnd::Completed, at);
        } else {
            self.begin_trial(at, outcome.is_correct(), false);
        }
    }

    fn close_at_deadline(&mut self, at: Millis) {
        let outcome = match self.pending.as_ref() {
            Some(pending) => match pending.latched {
                Some(outcome) => outcome,
                None => self.evaluator.on_deadline(&self.evaluation(pending)),
            },
            None => return,
        };
        self.resolve(outcome, at);
    }

    fn close_on_timeout(&mut self, at: Millis) {
        let outcome = match self.pending.as_ref() {
            Some(pending) if pending.presented_at.is_some() => match pending.latched {
                Some(outcome) => outcome,
                None => self.evaluator.on_timeout(&self.evaluation(pending)),
            },
            _ => return,
        };
        self.close_trial(outcome, at);
    }

    fn is_over(&self) -> bool {
        self.lives == Some(0)
            || self
                .config
                .length
                .is_some_and(|length| self.counted_trials() >= length)
            || self.config.max_level.is_some_and(|max| self.level > max)
    }

    fn finish(&mut self, end: SessionEnd, at: Millis) {
        let cancelled = self.timers.cancel_all();
        self.countdown = None;
        self.pending = None;
        self.finished_at = Some(at);
        info!(
            game = %self.kind,
            ?end,
            trials = self.counted_trials(),
            hits = self.counters.hits,
            cancelled,
            "session finished"
        );
        self.end = Some(end);
        self.transition(SessionState::Summary, at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn seeded(kind: GameKind) -> GameConfig {
        let mut cfg = kind.default_config();
        cfg.seed = Some(42);
        cfg
    }

    #[test]
    fn test_invalid_config_leaves_session_idle() {
        let mut session = Session::new(GameKind::NBack);
        let mut cfg = seeded(GameKind::NBack);
        cfg.level = 0;
        assert_matches!(session.start(cfg, 0), Err(SessionError::InvalidConfig(_)));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn test_reaction_latency_measured_from_ready() {
        let mut session = Session::new(GameKind::Reaction);
        session.start(seeded(GameKind::Reaction), 0).unwrap();
        assert_eq!(session.state(), SessionState::Priming);

        let ready = session.next_deadline().unwrap();
        assert!((2000..=5000).contains(&ready));

        session.tick(ready + 1);
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.presented_at(), Some(ready));

        let judgement = session.record_response(Response::Press, ready + 230).unwrap();
        assert_eq!(judgement, Judgement::Resolve(Outcome::Hit));
        assert_eq!(session.trials()[0].latency_ms(), Some(230));
        assert_eq!(session.state(), SessionState::Priming);
    }

    #[test]
    fn test_early_press_restarts_priming_without_counting() {
        let mut session = Session::new(GameKind::Reaction);
        session.start(seeded(GameKind::Reaction), 0).unwrap();
        let ready = session.next_deadline().unwrap();

        let judgement = session.record_response(Response::Press, ready).unwrap();
        assert_eq!(judgement, Judgement::Resolve(Outcome::TooEarly));
        assert_eq!(session.state(), SessionState::Priming);
        assert_eq!(session.counters().too_early, 1);
        assert_eq!(session.counted_trials(), 0);

        let restarted = session.next_deadline().unwrap();
        assert!(restarted >= ready + 2000);
    }

    #[test]
    fn test_response_outside_active_is_rejected() {
        let mut session = Session::new(GameKind::NumberMemory);
        assert_matches!(
            session.record_response(Response::Text("1".into()), 0),
            Err(SessionError::UnexpectedResponse {
                state: SessionState::Idle
            })
        );

        session.start(seeded(GameKind::NumberMemory), 0).unwrap();
        assert_eq!(session.state(), SessionState::Priming);
        assert_matches!(
            session.record_response(Response::Text("1".into()), 10),
            Err(SessionError::UnexpectedResponse {
                state: SessionState::Priming
            })
        );
        assert!(session.trials().is_empty());
    }

    #[test]
    fn test_nback_latch_rejects_second_press_and_wins_tie() {
        let mut session = Session::new(GameKind::NBack);
        session.start(seeded(GameKind::NBack), 0).unwrap();
        assert_eq!(session.state(), SessionState::Active);

        let deadline = session.next_deadline().unwrap();
        assert_eq!(deadline, 2500);

        // a press stamped exactly at the deadline still belongs to trial 0
        assert_matches!(
            session.record_response(Response::Press, deadline),
            Ok(Judgement::Latch(Outcome::FalsePositive))
        );
        assert_matches!(
            session.record_response(Response::Press, deadline),
            Err(SessionError::UnexpectedResponse { .. })
        );

        session.tick(deadline + 1);
        assert_eq!(session.trials().len(), 1);
        assert_eq!(session.trials()[0].outcome, Outcome::FalsePositive);
        assert_eq!(session.trial_index(), 1);
        assert_eq!(session.presented_at(), Some(deadline));
    }

    #[test]
    fn test_wrong_recall_costs_a_life_and_retries_level() {
        let mut session = Session::new(GameKind::NumberMemory);
        session.start(seeded(GameKind::NumberMemory), 0).unwrap();
        session.tick(1001);
        assert_eq!(session.state(), SessionState::Active);

        let Some(Stimulus::Digits(shown)) = session.current_stimulus().cloned() else {
            panic!("expected digits");
        };
        let wrong = if shown == "1" { "2" } else { "1" };
        session
            .record_response(Response::Text(wrong.into()), 1500)
            .unwrap();
        assert_eq!(session.state(), SessionState::Evaluating);
        assert_eq!(session.lives(), Some(2));

        session.tick(3001);
        assert_eq!(session.state(), SessionState::Priming);
        assert_eq!(session.level(), 1);
    }

    #[test]
    fn test_stray_click_logs_a_miss_on_the_same_target() {
        let mut session = Session::new(GameKind::AimTrainer);
        session.start(seeded(GameKind::AimTrainer), 0).unwrap();
        assert_eq!(session.state(), SessionState::Active);
        let Some(Stimulus::Target(target)) = session.current_stimulus().cloned() else {
            panic!("expected a target");
        };
        let (cx, cy) = target.center();
        let far = if cx > 400.0 { 0.0 } else { 799.0 };

        assert_eq!(
            session.record_response(Response::Point { x: far, y: cy }, 200).unwrap(),
            Judgement::Stray(Outcome::Miss)
        );
        assert_eq!(session.current_stimulus(), Some(&Stimulus::Target(target)));
        assert!(session.current_inputs().is_empty());

        session.record_response(Response::Point { x: cx, y: cy }, 450).unwrap();
        let trials = session.trials();
        assert_eq!(trials.len(), 2);
        assert_eq!(trials[0].outcome, Outcome::Miss);
        assert_eq!(trials[0].latency_ms(), Some(200));
        assert_eq!(trials[0].stimulus, trials[1].stimulus);
        assert_eq!(trials[1].outcome, Outcome::Hit);
        assert_eq!(trials[1].latency_ms(), Some(450));
        assert_eq!(
            trials.iter().filter(|t| t.outcome == Outcome::Miss).count(),
            session.counters().misses
        );
    }

    #[test]
    fn test_countdown_closes_in_flight_trial() {
        let mut session = Session::new(GameKind::AimTrainer);
        session.start(seeded(GameKind::AimTrainer), 0).unwrap();
        assert_eq!(session.time_remaining_ms(10_000), Some(20_000));

        session.tick(30_001);
        assert!(session.is_finished());
        assert!(session.is_completed());
        assert_eq!(session.trials().last().map(|t| t.outcome), Some(Outcome::Skipped));
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn test_abort_cancels_everything() {
        let mut session = Session::new(GameKind::Simon);
        session.start(seeded(GameKind::Simon), 0).unwrap();
        assert!(session.next_deadline().is_some());

        session.abort(100);
        assert_eq!(session.state(), SessionState::Summary);
        assert_eq!(session.end(), Some(&SessionEnd::Aborted));
        assert_eq!(session.next_deadline(), None);
        assert!(session.current_stimulus().is_none());

        session.tick(u64::MAX);
        assert_eq!(session.state(), SessionState::Summary);
    }

    #[test]
    fn test_restart_from_summary() {
        let mut session = Session::new(GameKind::ColorBlind);
        session.start(seeded(GameKind::ColorBlind), 0).unwrap();
        session.abort(5);
        session.start(seeded(GameKind::ColorBlind), 10).unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.trials().is_empty());
        assert_eq!(session.end(), None);
    }
}
