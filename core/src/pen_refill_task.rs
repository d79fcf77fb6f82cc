//! Pen refill minigame.
//!
//! Pens from a finite supply are placed into a row of holders, each with a
//! fixed capacity. Quick successive placements build a combo. The task ends
//! when the required number of pens sit in holders; the score rewards speed
//! and the combo standing at the finish.

use crate::{
    clock::{Scheduler, TimerId, TimerSlot},
    config::PenRefillConfig,
    task::{
        CompletionLatch, InputOutcome, MinigameResult, MinigameTask, PenRefillStats,
        ScoreBreakdown, TaskInput, TaskKind, TaskProgress, TaskStatus, WorkSurface,
    },
    types::{millis_to_secs, Millis},
};

pub const BASE_SCORE: u32 = 100;
/// Completions faster than this earn a time bonus.
pub const PAR_TIME_SECS: f64 = 60.0;
pub const TIME_BONUS_PER_SEC: f64 = 10.0;
pub const COMBO_BONUS_PER_STEP: u32 = 50;

/// Score for a finish after `completion_time` seconds with `final_combo`.
pub fn score_breakdown(completion_time: f64, final_combo: u32) -> ScoreBreakdown {
    let time_bonus = if completion_time < PAR_TIME_SECS {
        ((PAR_TIME_SECS - completion_time) * TIME_BONUS_PER_SEC).floor() as u32
    } else {
        0
    };
    let combo_bonus = final_combo.saturating_sub(1) * COMBO_BONUS_PER_STEP;
    ScoreBreakdown {
        base: BASE_SCORE,
        time_bonus,
        combo_bonus,
        total: BASE_SCORE + time_bonus + combo_bonus,
    }
}

pub struct PenRefillTask {
    config:            PenRefillConfig,
    surface:           WorkSurface,
    holders:           Vec<u32>,
    pens_filled:       u32,
    supply_left:       u32,
    combo:             u32,
    completed_holders: u32,
    last_placement:    Option<Millis>,
    status:            TaskStatus,
    started_at:        Millis,
    pending:           Option<MinigameResult>,
    emit:              TimerSlot,
    latch:             CompletionLatch,
}

impl PenRefillTask {
    pub fn new(config: PenRefillConfig, surface: WorkSurface) -> Self {
        let mut holders = vec![0; config.holders_count as usize];
        let mut pens_filled = 0;
        // The head-start pen goes into the first holder.
        if surface.pen_bonus_item.is_some() {
            if let Some(first) = holders.first_mut() {
                *first = 1;
                pens_filled = 1;
            }
        }
        Self {
            supply_left:       config.pen_supply,
            holders,
            pens_filled,
            combo:             0,
            completed_holders: 0,
            last_placement:    None,
            status:            TaskStatus::Idle,
            started_at:        0,
            pending:           None,
            emit:              TimerSlot::empty(),
            latch:             CompletionLatch::new(),
            config,
            surface,
        }
    }

    pub fn pens_filled(&self) -> u32 {
        self.pens_filled
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn holders(&self) -> &[u32] {
        &self.holders
    }

    fn place(&mut self, holder: usize, scheduler: &mut Scheduler) -> InputOutcome {
        let capacity = self.config.pens_per_holder;
        let Some(&in_holder) = self.holders.get(holder) else {
            return InputOutcome::NoSuchHolder { holder };
        };
        if in_holder >= capacity {
            log::debug!("hour={} pen_refill: holder {holder} is full", self.surface.hour);
            return InputOutcome::HolderFull { holder };
        }
        if self.supply_left == 0 {
            return InputOutcome::SupplyEmpty;
        }

        let now = scheduler.now();
        self.combo = match self.last_placement {
            Some(last) if now - last < self.config.combo_window_ms => self.combo + 1,
            _ => 1,
        };
        self.last_placement = Some(now);

        let pens_in_holder = in_holder + 1;
        self.holders[holder] = pens_in_holder;
        self.supply_left -= 1;
        self.pens_filled += 1;

        let holder_completed = pens_in_holder >= capacity;
        if holder_completed {
            self.completed_holders += 1;
        }

        if self.pens_filled >= self.config.required_pens {
            self.complete(scheduler);
        }

        InputOutcome::Placed {
            holder,
            pens_in_holder,
            pens_filled: self.pens_filled,
            combo: self.combo,
            holder_completed,
        }
    }

    fn complete(&mut self, scheduler: &mut Scheduler) {
        self.status = TaskStatus::Complete;
        let completion_time = millis_to_secs(scheduler.now() - self.started_at);
        let score = score_breakdown(completion_time, self.combo);
        log::debug!(
            "hour={} pen_refill: complete in {completion_time:.1}s combo={} score={}",
            self.surface.hour, self.combo, score.total
        );
        self.pending = Some(MinigameResult {
            task_type: TaskKind::PenRefill,
            completion_time,
            success: true,
            score: Some(score),
            bonus_item: self.surface.pen_bonus_item.clone(),
            // The reported combo is the streak standing at completion.
            stats: Some(PenRefillStats {
                max_combo:         self.combo,
                completed_holders: self.completed_holders,
            }),
        });
        let id = scheduler.schedule_once(self.config.completion_delay_ms);
        self.emit.arm(scheduler, id);
    }
}

impl MinigameTask for PenRefillTask {
    fn kind(&self) -> TaskKind {
        TaskKind::PenRefill
    }

    fn start(&mut self, scheduler: &mut Scheduler) {
        if self.status != TaskStatus::Idle {
            return;
        }
        self.status = TaskStatus::Active;
        self.started_at = scheduler.now();
        // A head start can already meet a tiny requirement.
        if self.pens_filled >= self.config.required_pens {
            self.complete(scheduler);
        }
    }

    fn owns_timer(&self, timer: TimerId) -> bool {
        self.emit.holds(timer)
    }

    fn on_timer(&mut self, timer: TimerId, _scheduler: &mut Scheduler) -> Option<MinigameResult> {
        if !self.emit.holds(timer) {
            return None;
        }
        self.emit.clear_fired(timer);
        self.status = TaskStatus::Emitted;
        let result = self.pending.take()?;
        self.latch.fire(result)
    }

    fn handle_input(&mut self, input: TaskInput, scheduler: &mut Scheduler) -> InputOutcome {
        match input {
            TaskInput::PlacePen { holder } if self.status == TaskStatus::Active => {
                self.place(holder, scheduler)
            }
            TaskInput::PlacePen { .. } => InputOutcome::Inactive,
            TaskInput::ActivateTarget => InputOutcome::WrongTask,
        }
    }

    fn progress(&self) -> TaskProgress {
        TaskProgress::PenRefill {
            pens_filled:       self.pens_filled,
            required_pens:     self.config.required_pens,
            holders:           self.holders.clone(),
            pens_per_holder:   self.config.pens_per_holder,
            combo:             self.combo,
            completed_holders: self.completed_holders,
            supply_left:       self.supply_left,
            status:            self.status,
        }
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn destroy(&mut self, scheduler: &mut Scheduler) {
        self.emit.cancel(scheduler);
        self.latch.cancel();
        self.pending = None;
        if self.status != TaskStatus::Emitted {
            self.status = TaskStatus::Destroyed;
        }
    }
}
