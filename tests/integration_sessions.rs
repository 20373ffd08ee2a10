use assert_matches::assert_matches;
use mindgames::config::GameConfig;
use mindgames::evaluator::Judgement;
use mindgames::session::{Session, SessionEnd, SessionState};
use mindgames::stimulus::{Outcome, Response, Stimulus};
use mindgames::timers::Millis;
use mindgames::game::nback_sequence_length;
use mindgames::GameKind;

fn seeded(kind: GameKind, seed: u64) -> GameConfig {
    GameConfig {
        seed: Some(seed),
        ..kind.default_config()
    }
}

/// Fire every pending timer until the session ends
fn run_out(session: &mut Session) {
    for _ in 0..10_000 {
        match session.next_deadline() {
            Some(deadline) => session.tick(deadline + 1),
            None => break,
        }
    }
}

#[test]
fn reaction_run_reports_mean_latency() {
    let mut session = Session::new(GameKind::Reaction);
    session.start(seeded(GameKind::Reaction, 1), 0).unwrap();

    for _ in 0..5 {
        let ready = session.next_deadline().unwrap();
        session.tick(ready + 1);
        assert_eq!(session.state(), SessionState::Active);
        session.record_response(Response::Press, ready + 230).unwrap();
    }

    assert!(session.is_completed());
    assert_eq!(session.counted_trials(), 5);
    assert!(session.trials().iter().all(|t| t.latency_ms() == Some(230)));
    assert_eq!(GameKind::Reaction.final_score(&session), Some(230));
}

#[test]
fn colorblind_all_correct_reads_normal() {
    let mut session = Session::new(GameKind::ColorBlind);
    session.start(seeded(GameKind::ColorBlind, 7), 0).unwrap();

    let mut now: Millis = 0;
    let mut seen = Vec::new();
    while !session.is_finished() {
        now += 1000;
        let Some(Stimulus::Plate(plate)) = session.current_stimulus().cloned() else {
            panic!("expected a plate");
        };
        seen.push(plate.index);
        let judgement = session
            .record_response(Response::Text(plate.answer.clone()), now)
            .unwrap();
        assert_eq!(judgement, Judgement::Resolve(Outcome::Hit));
    }

    seen.sort_unstable();
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
    let counters = session.counters();
    assert_eq!(counters.hits, 10);
    assert_eq!(counters.misses, 0);
    assert_eq!(GameKind::ColorBlind.final_score(&session), Some(1));
}

#[test]
fn colorblind_skips_count_against_the_result() {
    let mut session = Session::new(GameKind::ColorBlind);
    session.start(seeded(GameKind::ColorBlind, 8), 0).unwrap();
    for i in 0..10 {
        session.record_response(Response::Skip, 100 * (i + 1)).unwrap();
    }
    assert!(session.is_completed());
    assert_eq!(session.counters().hits, 0);
    assert_eq!(GameKind::ColorBlind.final_score(&session), Some(0));
}

fn is_match(sequence: &[Stimulus], n: usize) -> bool {
    let len = sequence.len();
    len > n && sequence[len - 1] == sequence[len - 1 - n]
}

fn assert_unpressed_misses_every_match(n: u32, seeds: std::ops::Range<u64>) {
    for seed in seeds {
        let config = GameConfig {
            level: n,
            length: Some(nback_sequence_length(n)),
            ..seeded(GameKind::NBack, seed)
        };
        let mut session = Session::new(GameKind::NBack);
        session.start(config, 0).unwrap();
        run_out(&mut session);

        let sequence = session.presented_sequence().to_vec();
        assert_eq!(sequence.len(), nback_sequence_length(n));
        let matches = (1..=sequence.len())
            .filter(|&len| is_match(&sequence[..len], n as usize))
            .count();

        let counters = session.counters();
        assert_eq!(counters.misses, matches, "n {n} seed {seed}");
        assert_eq!(counters.hits, 0);
        assert_eq!(counters.false_positives, 0);
        assert_eq!(GameKind::NBack.final_score(&session), None);
    }
}

#[test]
fn nback_misses_equal_matches_when_never_pressed() {
    assert_unpressed_misses_every_match(1, 0..20);
}

#[test]
fn nback_misses_equal_matches_at_higher_levels() {
    assert_eq!(nback_sequence_length(3), 35);
    assert_unpressed_misses_every_match(2, 0..10);
    assert_unpressed_misses_every_match(3, 0..30);
}

#[test]
fn nback_pressing_every_match_passes() {
    let mut session = Session::new(GameKind::NBack);
    session.start(seeded(GameKind::NBack, 3), 0).unwrap();

    while !session.is_finished() {
        let presented = session.presented_at().unwrap();
        if is_match(session.presented_sequence(), 1) {
            assert_matches!(
                session.record_response(Response::Press, presented + 400),
                Ok(Judgement::Latch(Outcome::Hit))
            );
        }
        let deadline = session.next_deadline().unwrap();
        session.tick(deadline + 1);
    }

    let counters = session.counters();
    assert_eq!(counters.misses, 0);
    assert_eq!(counters.false_positives, 0);
    if counters.hits > 0 {
        assert_eq!(GameKind::NBack.final_score(&session), Some(1));
    }
}

#[test]
fn visual_memory_shows_distinct_cells_and_levels_up() {
    let mut session = Session::new(GameKind::VisualMemory);
    session.start(seeded(GameKind::VisualMemory, 5), 0).unwrap();
    assert_eq!(session.state(), SessionState::Priming);

    let Some(Stimulus::Cells { grid_size, cells }) = session.current_stimulus().cloned() else {
        panic!("expected cells");
    };
    assert_eq!(grid_size, 3);
    assert_eq!(cells.len(), 3);
    assert!(cells.iter().all(|&c| c < 9));

    session.tick(2001);
    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(
        session.record_response(Response::Cells(cells), 2500).unwrap(),
        Judgement::Resolve(Outcome::Hit)
    );
    assert_eq!(session.level(), 2);
    assert_eq!(session.levels_completed(), 1);
    assert_eq!(session.state(), SessionState::Priming);
}

#[test]
fn number_memory_digits_grow_and_never_lead_with_zero() {
    let mut session = Session::new(GameKind::NumberMemory);
    session.start(seeded(GameKind::NumberMemory, 9), 0).unwrap();

    for level in 1..=8usize {
        let ready = session.next_deadline().unwrap();
        let Some(Stimulus::Digits(digits)) = session.current_stimulus().cloned() else {
            panic!("expected digits");
        };
        assert_eq!(digits.len(), level);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
        assert!(!digits.starts_with('0'));

        session.tick(ready + 1);
        session
            .record_response(Response::Text(digits), ready + 500)
            .unwrap();
    }

    assert_eq!(session.levels_completed(), 8);
    assert_eq!(session.lives(), Some(3));

    // three wrong answers end the run
    for _ in 0..3 {
        let ready = session.next_deadline().unwrap();
        session.tick(ready + 1);
        session
            .record_response(Response::Text("x".into()), ready + 10)
            .unwrap();
        run_until_state_changes(&mut session);
    }
    assert!(session.is_completed());
    assert_eq!(GameKind::NumberMemory.final_score(&session), Some(8));
}

fn run_until_state_changes(session: &mut Session) {
    if session.state() == SessionState::Evaluating {
        let done = session.next_deadline().unwrap();
        session.tick(done + 1);
    }
}

#[test]
fn precision_click_needs_both_balls_inside() {
    let mut session = Session::new(GameKind::PrecisionClick);
    session.start(seeded(GameKind::PrecisionClick, 2), 0).unwrap();
    assert_eq!(session.state(), SessionState::Active);

    // balls start far from the center
    assert_eq!(
        session.record_response(Response::Press, 0).unwrap(),
        Judgement::Resolve(Outcome::Miss)
    );
    assert_eq!(session.lives(), Some(2));
    run_until_state_changes(&mut session);
    assert_eq!(session.state(), SessionState::Active);

    let start = session.presented_at().unwrap();
    let mut now = start;
    let inside = loop {
        now += 16;
        session.frame(now);
        match session.current_stimulus() {
            Some(Stimulus::Orbit(track)) if track.both_inside() => break true,
            _ if now > start + 20_000 => break false,
            _ => {}
        }
    };
    assert!(inside, "balls never met in the target");
    assert_eq!(
        session.record_response(Response::Press, now).unwrap(),
        Judgement::Resolve(Outcome::Hit)
    );
    assert_eq!(session.level(), 2);
}

#[test]
fn simon_wrong_color_ends_with_single_life() {
    let mut session = Session::new(GameKind::Simon);
    session.start(seeded(GameKind::Simon, 4), 0).unwrap();
    let Some(Stimulus::Colors(sequence)) = session.current_stimulus().cloned() else {
        panic!("expected colors");
    };
    assert_eq!(sequence.len(), 1);

    let ready = session.next_deadline().unwrap();
    assert_eq!(ready, 500 + 800);
    session.tick(ready + 1);
    session
        .record_response(Response::Color(sequence[0]), ready + 300)
        .unwrap();
    assert_eq!(session.level(), 2);

    let ready = session.next_deadline().unwrap();
    session.tick(ready + 1);
    let Some(Stimulus::Colors(longer)) = session.current_stimulus().cloned() else {
        panic!("expected colors");
    };
    assert_eq!(longer.len(), 2);
    assert_eq!(longer[0], sequence[0]);

    let wrong = mindgames::stimulus::SimonColor::ALL
        .into_iter()
        .find(|&c| c != longer[0])
        .unwrap();
    session.record_response(Response::Color(wrong), ready + 100).unwrap();
    run_out(&mut session);
    assert_eq!(session.end(), Some(&SessionEnd::Completed));
    assert_eq!(GameKind::Simon.final_score(&session), Some(1));
}

#[test]
fn typing_timeout_scores_typed_text() {
    let mut session = Session::new(GameKind::Typing);
    session.start(seeded(GameKind::Typing, 1), 0).unwrap();
    let Some(Stimulus::Passage(passage)) = session.current_stimulus().cloned() else {
        panic!("expected a passage");
    };

    for (i, c) in passage.chars().take(50).enumerate() {
        session
            .record_response(Response::Key(c), 200 * (i as Millis + 1))
            .unwrap();
    }
    session.tick(60_001);
    assert!(session.is_completed());
    // 50 correct characters in one minute
    assert_eq!(GameKind::Typing.final_score(&session), Some(10));
}

#[test]
fn reaction_fixed_priming_measures_from_ready() {
    use mindgames::evaluator::ReactionEvaluator;
    use mindgames::generator::SignalGenerator;
    use mindgames::session::{Delay, Pacing};

    let pacing = Pacing {
        priming: Delay::Fixed(2500),
        ..GameKind::Reaction.pacing()
    };
    let mut session = Session::with_strategies(
        GameKind::Reaction,
        pacing,
        Box::new(SignalGenerator),
        Box::new(ReactionEvaluator),
        GameKind::Reaction.ordering(),
    );
    session.start(seeded(GameKind::Reaction, 0), 0).unwrap();
    assert_eq!(session.next_deadline(), Some(2500));

    assert_eq!(
        session.record_response(Response::Press, 2730).unwrap(),
        Judgement::Resolve(Outcome::Hit)
    );
    assert_eq!(session.trials()[0].latency_ms(), Some(230));
    assert_eq!(session.counters().too_early, 0);
}
