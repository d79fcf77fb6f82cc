//! Work-day simulator.
//!
//! STATE MACHINE:
//!   Idle → TaskActive → Paused → TaskActive → … → DayComplete
//!                 └──────────┴── energy ≤ 0 ──→ Dead
//!
//! RULES:
//!   - The drain timer runs for the whole day, independent of task progress.
//!   - One task per hour; current_hour is incremented before the task starts.
//!   - A finished task is destroyed before anything else is scheduled, so
//!     no two tasks ever own live timers.
//!   - Every step, including the first, checks the hour budget before picking
//!     a task: reaching the budget ends the day instead of starting a task.
//!   - Death cancels everything the day owns, including a pending result.

use crate::{
    clock::{Scheduler, TimerId, TimerSlot},
    config::{DayConfig, GameConfig, Job},
    event::GameEvent,
    rng::{pick_from, RandomSource},
    state::GameState,
    task::{
        spawn_task, InputOutcome, MinigameResult, MinigameTask, TaskInput, TaskKind,
        TaskProgress, WorkSurface,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkPhase {
    Idle,
    TaskActive,
    /// Between a task's result and the next step.
    Paused,
    DayComplete,
    Dead,
}

impl WorkPhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::DayComplete | Self::Dead)
    }
}

/// Everything the simulator may touch while handling a step.
pub struct WorkContext<'a> {
    pub state:     &'a mut GameState,
    pub scheduler: &'a mut Scheduler,
    pub rng:       &'a mut dyn RandomSource,
    pub config:    &'a GameConfig,
}

pub struct WorkDaySimulator {
    job:     Job,
    day:     DayConfig,
    pool:    Vec<TaskKind>,
    phase:   WorkPhase,
    drain:   TimerSlot,
    pause:   TimerSlot,
    task:    Option<Box<dyn MinigameTask>>,
    results: Vec<MinigameResult>,
}

impl WorkDaySimulator {
    pub fn new(job: Job, day: DayConfig) -> Self {
        Self {
            pool:    job.playable_tasks(),
            job,
            day,
            phase:   WorkPhase::Idle,
            drain:   TimerSlot::empty(),
            pause:   TimerSlot::empty(),
            task:    None,
            results: Vec::new(),
        }
    }

    pub fn phase(&self) -> WorkPhase {
        self.phase
    }

    pub fn results(&self) -> &[MinigameResult] {
        &self.results
    }

    pub fn task_progress(&self) -> Option<TaskProgress> {
        self.task.as_ref().map(|t| t.progress())
    }

    /// Start the drain clock and the first hour.
    pub fn begin(&mut self, ctx: &mut WorkContext<'_>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.phase != WorkPhase::Idle {
            return events;
        }
        events.push(GameEvent::WorkDayStarted {
            day:        ctx.state.day(),
            hours:      self.day.hours,
            difficulty: self.day.difficulty,
            job_title:  self.job.title.clone(),
        });
        log::debug!(
            "day={} work: {} at {} for {} hours (difficulty {})",
            ctx.state.day(), self.job.title, self.job.company, self.day.hours, self.day.difficulty
        );

        let id = ctx.scheduler.schedule_repeating(ctx.config.timing.drain_interval_ms);
        self.drain.arm(ctx.scheduler, id);
        self.step(ctx, &mut events);
        events
    }

    pub fn owns_timer(&self, id: TimerId) -> bool {
        self.drain.holds(id)
            || self.pause.holds(id)
            || self.task.as_ref().is_some_and(|t| t.owns_timer(id))
    }

    pub fn on_timer(&mut self, id: TimerId, ctx: &mut WorkContext<'_>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.phase.is_finished() {
            return events;
        }

        if self.drain.holds(id) {
            self.drain_energy(ctx, &mut events);
        } else if self.pause.holds(id) {
            self.pause.clear_fired(id);
            self.step(ctx, &mut events);
        } else if let Some(task) = self.task.as_mut() {
            if task.owns_timer(id) {
                if let Some(result) = task.on_timer(id, ctx.scheduler) {
                    self.finish_task(result, ctx, &mut events);
                }
            }
        }
        events
    }

    /// Forward a logical input to the running task.
    pub fn handle_input(
        &mut self,
        input: TaskInput,
        ctx:   &mut WorkContext<'_>,
    ) -> (InputOutcome, Vec<GameEvent>) {
        let hour = ctx.state.current_hour();
        let task = match self.task.as_mut() {
            Some(task) if self.phase == WorkPhase::TaskActive => task,
            _ => return (InputOutcome::NoTask, Vec::new()),
        };

        let outcome = task.handle_input(input, ctx.scheduler);
        let mut events = Vec::new();
        match outcome {
            InputOutcome::Hit { clicks_remaining } => {
                events.push(GameEvent::StapleHit { hour, clicks_remaining });
            }
            InputOutcome::Miss { distance } => {
                events.push(GameEvent::StapleMissed { hour, distance });
            }
            InputOutcome::Placed { holder, pens_filled, combo, holder_completed, .. } => {
                events.push(GameEvent::PenPlaced { hour, holder, pens_filled, combo });
                if holder_completed {
                    events.push(GameEvent::HolderCompleted { hour, holder });
                }
            }
            rejected => {
                log::debug!("day={} hour={hour} work: input rejected: {rejected:?}", ctx.state.day());
                events.push(GameEvent::InputRejected { hour, outcome: rejected });
            }
        }
        (outcome, events)
    }

    /// Start the next hour, or close the day if the hour budget is spent.
    fn step(&mut self, ctx: &mut WorkContext<'_>, events: &mut Vec<GameEvent>) {
        if ctx.state.current_hour() >= self.day.hours {
            self.complete_day(ctx, events);
            return;
        }

        let Some(kind) = pick_from(ctx.rng, &self.pool).copied() else {
            log::warn!(
                "day={} work: job '{}' has no playable tasks; closing the day",
                ctx.state.day(), self.job.title
            );
            self.complete_day(ctx, events);
            return;
        };

        let hour = ctx.state.clock_in_hour();
        let surface = WorkSurface::new(hour, self.day, ctx.state, ctx.config);
        let mut task = spawn_task(kind, surface, &ctx.config.minigames);
        task.start(ctx.scheduler);
        self.task = Some(task);
        self.phase = WorkPhase::TaskActive;

        log::debug!("day={} hour={hour} work: starting {}", ctx.state.day(), kind.id());
        events.push(GameEvent::TaskStarted { hour, task: kind });
    }

    fn finish_task(
        &mut self,
        result: MinigameResult,
        ctx:    &mut WorkContext<'_>,
        events: &mut Vec<GameEvent>,
    ) {
        if let Some(mut task) = self.task.take() {
            task.destroy(ctx.scheduler);
        }
        let hour = ctx.state.current_hour();
        log::debug!(
            "day={} hour={hour} work: {} done in {:.1}s",
            ctx.state.day(), result.task_type.id(), result.completion_time
        );
        events.push(GameEvent::TaskCompleted { hour, result: result.clone() });
        self.results.push(result);

        self.phase = WorkPhase::Paused;
        let id = ctx.scheduler.schedule_once(ctx.config.timing.next_task_pause_ms);
        self.pause.arm(ctx.scheduler, id);
    }

    fn drain_energy(&mut self, ctx: &mut WorkContext<'_>, events: &mut Vec<GameEvent>) {
        let mut meter = ctx.state.energy_meter();
        let energy = meter.drain(ctx.config.energy.drain_rate);
        let depleted = meter.is_depleted();
        events.push(GameEvent::EnergyDrained { energy });
        if depleted {
            self.die(ctx, events);
        }
    }

    fn die(&mut self, ctx: &mut WorkContext<'_>, events: &mut Vec<GameEvent>) {
        if let Some(mut task) = self.task.take() {
            task.destroy(ctx.scheduler);
        }
        self.pause.cancel(ctx.scheduler);
        self.drain.cancel(ctx.scheduler);
        self.phase = WorkPhase::Dead;

        log::info!(
            "generation={} day={} work: out of energy in hour {}",
            ctx.state.generation(), ctx.state.day(), ctx.state.current_hour()
        );
        events.push(GameEvent::PlayerDied {
            generation: ctx.state.generation(),
            day:        ctx.state.day(),
            hour:       ctx.state.current_hour(),
        });
    }

    fn complete_day(&mut self, ctx: &mut WorkContext<'_>, events: &mut Vec<GameEvent>) {
        self.drain.cancel(ctx.scheduler);
        self.pause.cancel(ctx.scheduler);
        let salary = self.job.salary;
        let money = ctx.state.ledger().pay(salary);
        self.phase = WorkPhase::DayComplete;

        let total_score: u32 = self
            .results
            .iter()
            .filter_map(|r| r.score.map(|s| s.total))
            .sum();
        log::info!(
            "day={} work: complete, paid {salary} (balance {money}, score {total_score})",
            ctx.state.day()
        );
        events.push(GameEvent::DayCompleted {
            day: ctx.state.day(),
            salary,
            money,
            total_score,
        });
    }
}
