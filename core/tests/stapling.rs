//! Stapling minigame, driven directly against a scheduler.

use salaryman_core::{
    clock::Scheduler,
    config::{GameConfig, StaplingConfig},
    stapling_task::StaplingTask,
    task::{InputOutcome, MinigameResult, MinigameTask, TaskInput, TaskKind, TaskStatus, WorkSurface},
    types::Millis,
};

fn stapling_config() -> StaplingConfig {
    GameConfig::default().minigames.stapling
}

fn started_task() -> (StaplingTask, Scheduler) {
    let mut scheduler = Scheduler::new();
    let mut task = StaplingTask::new(stapling_config(), WorkSurface::plain(1));
    task.start(&mut scheduler);
    (task, scheduler)
}

/// Fire every timer due up to `until`, returning the task's result if it
/// emitted one.
fn run_until(
    task:      &mut StaplingTask,
    scheduler: &mut Scheduler,
    until:     Millis,
) -> Option<MinigameResult> {
    let mut result = None;
    while let Some(id) = scheduler.pop_due(until) {
        if task.owns_timer(id) {
            if let Some(r) = task.on_timer(id, scheduler) {
                assert!(result.is_none(), "task emitted twice");
                result = Some(r);
            }
        }
    }
    scheduler.settle(until);
    result
}

fn activate(task: &mut StaplingTask, scheduler: &mut Scheduler) -> InputOutcome {
    task.handle_input(TaskInput::ActivateTarget, scheduler)
}

#[test]
fn completes_after_exactly_required_hits_and_misses_do_not_count() {
    let (mut task, mut scheduler) = started_task();

    // Stapler starts far left of the paper stack.
    let outcome = activate(&mut task, &mut scheduler);
    assert!(matches!(outcome, InputOutcome::Miss { .. }), "got {outcome:?}");
    assert_eq!(task.clicks_remaining(), 15);
    assert_eq!(task.misses(), 1);

    // 75 movement ticks → 50 + 75 * 1.5 = 162.5, inside tolerance of 170.
    assert!(run_until(&mut task, &mut scheduler, 1_200).is_none());
    assert_eq!(task.position(), 162.5);

    for expected in (1..15).rev() {
        assert_eq!(
            activate(&mut task, &mut scheduler),
            InputOutcome::Hit { clicks_remaining: expected }
        );
    }
    assert_eq!(task.status(), TaskStatus::Active, "one hit still missing");

    assert_eq!(activate(&mut task, &mut scheduler), InputOutcome::Hit { clicks_remaining: 0 });
    assert_eq!(task.status(), TaskStatus::Complete);
    assert_eq!(activate(&mut task, &mut scheduler), InputOutcome::Inactive);

    // Result waits out the one-second emit delay.
    assert!(run_until(&mut task, &mut scheduler, 2_199).is_none());
    let result = run_until(&mut task, &mut scheduler, 2_200).expect("result after delay");
    assert_eq!(result.task_type, TaskKind::Stapling);
    assert!(result.success);
    assert_eq!(result.completion_time, 1.2);
    assert!(result.score.is_none());
    assert_eq!(task.status(), TaskStatus::Emitted);
    assert_eq!(scheduler.active_count(), 0, "movement and emit timers are gone");
}

#[test]
fn stapler_bounces_inside_the_track() {
    let (mut task, mut scheduler) = started_task();
    let config = stapling_config();

    // 180 ticks reach exactly 320 and turn around.
    run_until(&mut task, &mut scheduler, 180 * 16);
    assert_eq!(task.position(), 320.0);
    run_until(&mut task, &mut scheduler, 181 * 16);
    assert_eq!(task.position(), 318.5);

    // A full sweep back to the left wall and beyond.
    let mut t = 181 * 16;
    while t < 600 * 16 {
        t += 16;
        run_until(&mut task, &mut scheduler, t);
        assert!(
            task.position() >= config.track_min - config.stapler_speed
                && task.position() <= config.track_max,
            "stapler left the track at {}",
            task.position()
        );
    }
}

#[test]
fn stapler_placed_past_the_wall_walks_back_in() {
    let mut config = stapling_config();
    config.start_position = 400.0;
    let mut scheduler = Scheduler::new();
    let mut task = StaplingTask::new(config.clone(), WorkSurface::plain(1));
    task.start(&mut scheduler);

    // First tick overshoots further, then every tick heads left.
    run_until(&mut task, &mut scheduler, 16);
    assert_eq!(task.position(), 401.5);
    run_until(&mut task, &mut scheduler, 32);
    assert_eq!(task.position(), 400.0);

    run_until(&mut task, &mut scheduler, 60_000);
    assert!(
        task.position() <= config.track_max + config.stapler_speed,
        "stuck at {}",
        task.position()
    );
    assert!(task.position() >= config.track_min - config.stapler_speed);
}

#[test]
fn destroy_before_emit_suppresses_result() {
    let (mut task, mut scheduler) = started_task();
    run_until(&mut task, &mut scheduler, 1_200);
    for _ in 0..15 {
        activate(&mut task, &mut scheduler);
    }
    assert_eq!(task.status(), TaskStatus::Complete);

    task.destroy(&mut scheduler);
    task.destroy(&mut scheduler);
    assert_eq!(task.status(), TaskStatus::Destroyed);
    assert_eq!(scheduler.active_count(), 0);
    assert!(run_until(&mut task, &mut scheduler, 10_000).is_none());
}

#[test]
fn foreign_and_early_inputs_are_rejected() {
    let mut scheduler = Scheduler::new();
    let mut task = StaplingTask::new(stapling_config(), WorkSurface::plain(1));
    assert_eq!(activate(&mut task, &mut scheduler), InputOutcome::Inactive, "not started");

    task.start(&mut scheduler);
    task.start(&mut scheduler);
    assert_eq!(scheduler.active_count(), 1, "second start is a no-op");
    assert_eq!(
        task.handle_input(TaskInput::PlacePen { holder: 0 }, &mut scheduler),
        InputOutcome::WrongTask
    );
}
