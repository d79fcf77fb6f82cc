//! Stapling minigame.
//!
//! A stapler slides back and forth along a bounded track. Each activation is
//! judged against the paper stack's fixed position: within tolerance it
//! staples one set of papers, otherwise it is a miss that changes nothing.
//! Misses never count towards progress.

use crate::{
    clock::{Scheduler, TimerId, TimerSlot},
    config::StaplingConfig,
    task::{
        CompletionLatch, InputOutcome, MinigameResult, MinigameTask, TaskInput, TaskKind,
        TaskProgress, TaskStatus, WorkSurface,
    },
    types::{millis_to_secs, Millis},
};

pub struct StaplingTask {
    config:           StaplingConfig,
    surface:          WorkSurface,
    clicks_remaining: u32,
    position:         f64,
    /// +1.0 moving towards track_max, -1.0 towards track_min.
    direction:        f64,
    status:           TaskStatus,
    started_at:       Millis,
    completion_time:  f64,
    misses:           u32,
    movement:         TimerSlot,
    emit:             TimerSlot,
    latch:            CompletionLatch,
}

impl StaplingTask {
    pub fn new(config: StaplingConfig, surface: WorkSurface) -> Self {
        Self {
            clicks_remaining: config.required_clicks,
            position:         config.start_position,
            direction:        1.0,
            status:           TaskStatus::Idle,
            started_at:       0,
            completion_time:  0.0,
            misses:           0,
            movement:         TimerSlot::empty(),
            emit:             TimerSlot::empty(),
            latch:            CompletionLatch::new(),
            config,
            surface,
        }
    }

    pub fn clicks_remaining(&self) -> u32 {
        self.clicks_remaining
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    /// Absolute distance between the stapler and the paper stack.
    pub fn distance_to_target(&self) -> f64 {
        (self.position - self.config.target_position).abs()
    }

    /// One movement tick: advance, then bounce at either bound. The new
    /// heading always points back into the track.
    fn step(&mut self) {
        self.position += self.direction * self.config.stapler_speed;
        if self.position >= self.config.track_max {
            self.direction = -1.0;
        } else if self.position <= self.config.track_min {
            self.direction = 1.0;
        }
    }

    fn activate(&mut self, scheduler: &mut Scheduler) -> InputOutcome {
        let distance = self.distance_to_target();
        if distance > self.config.tolerance {
            self.misses += 1;
            log::debug!(
                "hour={} stapling: miss at {:.1} (distance {distance:.1})",
                self.surface.hour, self.position
            );
            return InputOutcome::Miss { distance };
        }

        self.clicks_remaining = self.clicks_remaining.saturating_sub(1);
        if self.clicks_remaining == 0 {
            self.complete(scheduler);
        }
        InputOutcome::Hit { clicks_remaining: self.clicks_remaining }
    }

    fn complete(&mut self, scheduler: &mut Scheduler) {
        self.status = TaskStatus::Complete;
        self.movement.cancel(scheduler);
        self.completion_time = millis_to_secs(scheduler.now() - self.started_at);
        let id = scheduler.schedule_once(self.config.completion_delay_ms);
        self.emit.arm(scheduler, id);
        log::debug!(
            "hour={} stapling: complete in {:.1}s with {} misses",
            self.surface.hour, self.completion_time, self.misses
        );
    }
}

impl MinigameTask for StaplingTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Stapling
    }

    fn start(&mut self, scheduler: &mut Scheduler) {
        if self.status != TaskStatus::Idle {
            return;
        }
        self.status = TaskStatus::Active;
        self.started_at = scheduler.now();
        let id = scheduler.schedule_repeating(self.config.tick_interval_ms);
        self.movement.arm(scheduler, id);
    }

    fn owns_timer(&self, timer: TimerId) -> bool {
        self.movement.holds(timer) || self.emit.holds(timer)
    }

    fn on_timer(&mut self, timer: TimerId, _scheduler: &mut Scheduler) -> Option<MinigameResult> {
        if self.movement.holds(timer) {
            if self.status == TaskStatus::Active {
                self.step();
            }
            return None;
        }
        if !self.emit.holds(timer) {
            return None;
        }
        self.emit.clear_fired(timer);
        self.status = TaskStatus::Emitted;
        self.latch.fire(MinigameResult {
            task_type:       TaskKind::Stapling,
            completion_time: self.completion_time,
            success:         true,
            score:           None,
            bonus_item:      None,
            stats:           None,
        })
    }

    fn handle_input(&mut self, input: TaskInput, scheduler: &mut Scheduler) -> InputOutcome {
        match input {
            TaskInput::ActivateTarget if self.status == TaskStatus::Active => {
                self.activate(scheduler)
            }
            TaskInput::ActivateTarget => InputOutcome::Inactive,
            TaskInput::PlacePen { .. } => InputOutcome::WrongTask,
        }
    }

    fn progress(&self) -> TaskProgress {
        TaskProgress::Stapling {
            clicks_remaining: self.clicks_remaining,
            required_clicks:  self.config.required_clicks,
            position:         self.position,
            target_position:  self.config.target_position,
            tolerance:        self.config.tolerance,
            status:           self.status,
        }
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn destroy(&mut self, scheduler: &mut Scheduler) {
        self.movement.cancel(scheduler);
        self.emit.cancel(scheduler);
        self.latch.cancel();
        if self.status != TaskStatus::Emitted {
            self.status = TaskStatus::Destroyed;
        }
    }
}
