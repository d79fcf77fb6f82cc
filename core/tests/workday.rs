//! Work-day behaviour through the engine: energy drain, hour sequencing,
//! salary and death.

use salaryman_core::{
    config::GameConfig,
    engine::GameEngine,
    event::GameEvent,
    rng::ScriptedRandom,
    state::Screen,
    store::GameStore,
    task::{TaskKind, TaskProgress},
    workday::WorkPhase,
};

const EPS: f64 = 1e-9;

/// Engine whose task picks always land on `pick` (0 = stapling, 1 = pen refill).
fn build_engine(pick: u64) -> GameEngine {
    build_engine_with(GameConfig::default(), pick)
}

fn build_engine_with(config: GameConfig, pick: u64) -> GameEngine {
    let store = GameStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    GameEngine::new("workday-test".into(), 7, config, store)
        .expect("engine")
        .with_random_source(Box::new(ScriptedRandom::new(vec![pick])))
}

fn fill_pens(engine: &mut GameEngine) {
    for holder in 0..4 {
        for _ in 0..3 {
            engine.place_pen(holder).expect("place pen");
        }
    }
}

fn staple_papers(engine: &mut GameEngine) {
    // Slide the stapler over the paper stack, then hit it 15 times.
    engine.advance_time(1_200).expect("advance");
    for _ in 0..15 {
        let outcome = engine.activate_target().expect("activate");
        assert!(outcome.is_accepted(), "stapler missed: {outcome:?}");
    }
}

fn tasks_started(events: &[GameEvent]) -> Vec<(u32, TaskKind)> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::TaskStarted { hour, task } => Some((*hour, *task)),
            _ => None,
        })
        .collect()
}

#[test]
fn idle_worker_dies_after_thirty_seconds() {
    let mut engine = build_engine(0);
    engine.select_newspaper("free_tabloid").expect("select");
    assert_eq!(engine.state().screen(), Screen::Work);

    engine.advance_time(29_999).expect("advance");
    assert_eq!(engine.state().screen(), Screen::Work, "still alive at 29.999s");
    assert!(engine.state().energy() > 0.0);

    engine.advance_time(1).expect("advance");
    assert_eq!(engine.state().screen(), Screen::Death);
    assert_eq!(engine.state().energy(), 0.0);
    assert_eq!(engine.work_phase(), Some(WorkPhase::Dead));
    assert!(engine.task_progress().is_none(), "active task destroyed on death");

    let died_at = engine
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::PlayerDied { .. }))
        .count();
    assert_eq!(died_at, 1);
}

#[test]
fn energy_drains_linearly_and_never_rises() {
    let mut engine = build_engine(0);
    engine.select_newspaper("free_tabloid").expect("select");

    let drain = engine.config().energy.drain_rate;
    let mut previous = engine.state().energy();
    for second in 1..=20u32 {
        engine.advance_time(1_000).expect("advance");
        let energy = engine.state().energy();
        assert!(energy <= previous, "energy rose at {second}s");
        assert!(
            (energy - (3.0 - drain * f64::from(second))).abs() < EPS,
            "energy {energy} off the line at {second}s"
        );
        previous = energy;
    }
}

#[test]
fn completed_day_pays_the_salary() {
    let mut engine = build_engine(1);
    engine.select_newspaper("free_tabloid").expect("select");
    assert_eq!(engine.state().money(), 0);

    // Hour 1: pens placed at t=0, result at 2s, next hour at 3s.
    fill_pens(&mut engine);
    engine.advance_time(3_000).expect("advance");
    assert_eq!(engine.state().current_hour(), 2);
    assert_eq!(engine.state().screen(), Screen::Work);

    // Hour 2, then the day closes after the pause.
    fill_pens(&mut engine);
    engine.advance_time(3_000).expect("advance");

    assert_eq!(engine.state().screen(), Screen::Shop);
    assert_eq!(engine.state().money(), 100);
    assert_eq!(engine.work_phase(), Some(WorkPhase::DayComplete));
    // The day closes at 6s, just before the sixth drain would fire.
    assert!((engine.state().energy() - 2.5).abs() < EPS, "five drains");

    let events = engine.take_events();
    assert_eq!(
        tasks_started(&events),
        vec![(1, TaskKind::PenRefill), (2, TaskKind::PenRefill)]
    );
    let paid = events.iter().find_map(|e| match e {
        GameEvent::DayCompleted { salary, money, total_score, .. } => {
            Some((*salary, *money, *total_score))
        }
        _ => None,
    });
    assert_eq!(paid, Some((100, 100, 2_500)));

    // Nothing keeps ticking once the day is over.
    engine.advance_time(60_000).expect("advance");
    assert!((engine.state().energy() - 2.5).abs() < EPS);
}

#[test]
fn stapling_day_runs_hour_by_hour() {
    let mut engine = build_engine(0);
    engine.select_newspaper("free_tabloid").expect("select");

    staple_papers(&mut engine);
    // Emit one second after the last hit, pause one more second.
    engine.advance_time(1_999).expect("advance");
    assert_eq!(engine.state().current_hour(), 1);
    engine.advance_time(1).expect("advance");
    assert_eq!(engine.state().current_hour(), 2);

    staple_papers(&mut engine);
    engine.advance_time(2_000).expect("advance");
    assert_eq!(engine.state().screen(), Screen::Shop);
    assert_eq!(engine.state().money(), 100);

    let completions: Vec<f64> = engine
        .take_events()
        .iter()
        .filter_map(|e| match e {
            GameEvent::TaskCompleted { result, .. } => Some(result.completion_time),
            _ => None,
        })
        .collect();
    assert_eq!(completions, vec![1.2, 1.2]);
}

#[test]
fn death_supersedes_a_pending_result() {
    let mut engine = build_engine(1);
    engine.select_newspaper("free_tabloid").expect("select");

    // Finish the pens at 28.5s; the result would land at 30.5s.
    engine.advance_time(28_500).expect("advance");
    fill_pens(&mut engine);
    engine.advance_time(5_000).expect("advance");

    assert_eq!(engine.state().screen(), Screen::Death);
    let events = engine.take_events();
    assert!(
        !events.iter().any(|e| matches!(e, GameEvent::TaskCompleted { .. })),
        "a dead worker's task must not complete"
    );
    assert_eq!(engine.state().money(), 0);
}

#[test]
fn only_one_task_runs_at_a_time() {
    let mut engine = build_engine(1);
    engine.select_newspaper("free_tabloid").expect("select");
    fill_pens(&mut engine);

    // During the emit delay the finished task still shows, inputs are refused.
    let outcome = engine.place_pen(0).expect("place");
    assert!(!outcome.is_accepted());
    engine.advance_time(2_000).expect("advance");
    assert!(engine.task_progress().is_none(), "pause between tasks");
    assert_eq!(engine.work_phase(), Some(WorkPhase::Paused));

    engine.advance_time(1_000).expect("advance");
    match engine.task_progress() {
        Some(TaskProgress::PenRefill { pens_filled, .. }) => assert_eq!(pens_filled, 0),
        other => panic!("expected a fresh pen task, got {other:?}"),
    }
}

#[test]
fn day_two_uses_its_own_progression_entry() {
    let mut engine = build_engine(1);
    engine.select_newspaper("free_tabloid").expect("select");
    for _ in 0..2 {
        fill_pens(&mut engine);
        engine.advance_time(3_000).expect("advance");
    }
    engine.continue_to_next_day().expect("continue");
    engine.take_events();

    engine.select_newspaper("free_tabloid").expect("select day 2");
    let started = engine.take_events().into_iter().find_map(|e| match e {
        GameEvent::WorkDayStarted { day, hours, difficulty, .. } => Some((day, hours, difficulty)),
        _ => None,
    });
    assert_eq!(started, Some((2, 5, 1.2)));
}

#[test]
fn unimplemented_task_types_are_never_picked() {
    let mut config = GameConfig::default();
    if let Some(paper) = config.newspapers.get_mut("free_tabloid") {
        paper.jobs[0].tasks = vec!["typing".into(), "pen_refill".into(), "filing".into()];
    }
    // Any draw must land on the single playable task.
    let mut engine = build_engine_with(config, 2);
    engine.select_newspaper("free_tabloid").expect("select");
    assert!(matches!(engine.task_progress(), Some(TaskProgress::PenRefill { .. })));
}

#[test]
fn inputs_outside_work_are_no_task() {
    let mut engine = build_engine(0);
    let outcome = engine.activate_target().expect("activate");
    assert_eq!(outcome, salaryman_core::task::InputOutcome::NoTask);
    assert!(engine.take_events().iter().all(|e| !matches!(e, GameEvent::InputRejected { .. })));
}
