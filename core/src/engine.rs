//! The game engine: flow controller and owner of every piece of state.
//!
//! SCREEN FLOW (exactly one screen is active):
//!   Newspaper --select--> Work --day complete--> Shop --continue--> Newspaper
//!                           └──── out of energy ──> Death --advance--> Rebirth
//!   Rebirth --confirm--> Newspaper (next generation)
//!
//! RULES:
//!   - Actions are only accepted on their own screen; anything else is
//!     rejected with InvalidAction and changes nothing.
//!   - Every rejected action leaves the whole state untouched.
//!   - Time only moves through advance_time(); timers fire in order.
//!   - All randomness flows through the injected RandomSource.
//!   - Every event is appended to the store's event log.
//!   - The game is saved after every day advance and every rebirth.

use crate::{
    clock::{Scheduler, TimerId},
    command::PlayerCommand,
    config::{GameConfig, Job, PurchaseKind},
    economy::{shop_listing, ShopEntry},
    error::{GameError, GameResult},
    event::{EventLogEntry, GameEvent},
    generation::{GenerationManager, RebirthPreview},
    rng::{RandomSource, RngBank, RngSlot},
    snapshot::{self, SAVE_FORMAT_VERSION},
    state::{GameState, Screen},
    store::GameStore,
    task::{InputOutcome, TaskInput, TaskProgress},
    types::{Millis, SessionId},
    workday::{WorkContext, WorkDaySimulator, WorkPhase},
};
use serde::{Deserialize, Serialize};

/// One row of the newspaper screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewspaperListing {
    pub key:            String,
    pub name:           String,
    pub cost:           u64,
    pub locked_message: Option<String>,
    pub affordable:     bool,
    /// The job this paper offers, if it lists any.
    pub job:            Option<Job>,
}

pub struct GameEngine {
    pub session_id:  SessionId,
    seed:            u64,
    config:          GameConfig,
    state:           GameState,
    scheduler:       Scheduler,
    rng:             Box<dyn RandomSource>,
    store:           GameStore,
    workday:         Option<WorkDaySimulator>,
    rebirth_preview: Option<RebirthPreview>,
    pending:         Vec<GameEvent>,
}

impl GameEngine {
    /// A fresh first-generation game.
    pub fn new(
        session_id: SessionId,
        seed:       u64,
        config:     GameConfig,
        store:      GameStore,
    ) -> GameResult<Self> {
        config.validate()?;
        let state = GameState::initial(&config);
        let mut engine = Self {
            rng:             Box::new(RngBank::new(seed).for_slot(RngSlot::TaskSelection)),
            scheduler:       Scheduler::new(),
            workday:         None,
            rebirth_preview: None,
            pending:         Vec::new(),
            session_id,
            seed,
            config,
            state,
            store,
        };
        engine.record(GameEvent::SessionStarted {
            session_id: engine.session_id.clone(),
            seed,
        })?;
        Ok(engine)
    }

    /// Continue from the store's save slot, or start fresh if it is empty.
    /// A damaged save is repaired key by key, never rejected.
    pub fn resume(
        session_id: SessionId,
        seed:       u64,
        config:     GameConfig,
        store:      GameStore,
    ) -> GameResult<Self> {
        let mut engine = Self::new(session_id, seed, config, store)?;
        let Some(saved) = engine.store.load_state()? else {
            log::info!("no save found; starting generation 1");
            return Ok(engine);
        };
        if saved.format_version != SAVE_FORMAT_VERSION {
            log::warn!(
                "save format {} differs from {SAVE_FORMAT_VERSION}; merging what fits",
                saved.format_version
            );
        }

        let restored = snapshot::restore(&saved.state_json, &engine.config)?;
        engine.state = restored.state;
        log::info!(
            "generation={} day={} restored save from {}",
            engine.state.generation(), engine.state.day(), saved.saved_at
        );
        engine.record(GameEvent::StateRestored {
            generation:  engine.state.generation(),
            day:         engine.state.day(),
            corrections: restored.corrections,
        })?;
        Ok(engine)
    }

    /// Replace the seeded task-selection source, e.g. with a scripted one.
    pub fn with_random_source(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    // ── Read access ────────────────────────────────────────────

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Virtual milliseconds since the engine was created.
    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    /// Shut the engine down and hand back its store, save slot included.
    pub fn into_store(self) -> GameStore {
        self.store
    }

    pub fn work_phase(&self) -> Option<WorkPhase> {
        self.workday.as_ref().map(|w| w.phase())
    }

    pub fn task_progress(&self) -> Option<TaskProgress> {
        self.workday.as_ref().and_then(|w| w.task_progress())
    }

    pub fn rebirth_preview(&self) -> Option<RebirthPreview> {
        self.rebirth_preview
    }

    pub fn newspapers(&self) -> Vec<NewspaperListing> {
        self.config
            .newspapers
            .iter()
            .map(|(key, paper)| NewspaperListing {
                key:            key.clone(),
                name:           paper.name.clone(),
                cost:           paper.cost,
                locked_message: paper.locked_message.clone(),
                affordable:     paper.cost <= self.state.money(),
                job:            paper.featured_job().cloned(),
            })
            .collect()
    }

    pub fn shop_listing(&self) -> Vec<ShopEntry> {
        shop_listing(&self.config, &self.state)
    }

    /// Drain the notifications produced since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    // ── Screen actions ─────────────────────────────────────────

    /// Buy a newspaper and go to work at its job.
    pub fn select_newspaper(&mut self, key: &str) -> GameResult<()> {
        self.require_screen(Screen::Newspaper, "select_newspaper")?;
        let paper = self
            .config
            .newspapers
            .get(key)
            .ok_or_else(|| GameError::UnknownNewspaper { key: key.to_string() })?;
        let job = paper
            .featured_job()
            .cloned()
            .ok_or_else(|| GameError::NoJobs { key: key.to_string() })?;
        let cost = paper.cost;

        let today = self.state.day();
        let before = self.state.clone();
        let queued = self.pending.len();
        let money = self.state.ledger().charge(cost).inspect_err(|e| {
            log::warn!("day={today} flow: newspaper '{key}' rejected: {e}");
        })?;
        let day = self.config.day_config(today, &job);
        self.state.begin_shift(job.clone());
        let committed = self
            .record(GameEvent::NewspaperSelected {
                newspaper: key.to_string(),
                cost,
                job_title: job.title.clone(),
                money,
            })
            .and_then(|()| self.change_screen(Screen::Work));
        if let Err(e) = committed {
            log::warn!("day={today} flow: newspaper '{key}' not logged, purchase undone: {e}");
            self.state = before;
            self.pending.truncate(queued);
            return Err(e);
        }

        let mut sim = WorkDaySimulator::new(job, day);
        let events = sim.begin(&mut WorkContext {
            state:     &mut self.state,
            scheduler: &mut self.scheduler,
            rng:       &mut *self.rng,
            config:    &self.config,
        });
        self.workday = Some(sim);
        self.record_all(events)?;
        self.follow_work_phase()
    }

    pub fn purchase(&mut self, kind: PurchaseKind, key: &str) -> GameResult<()> {
        self.require_screen(Screen::Shop, "purchase")?;
        let cost = self
            .config
            .catalog_item(kind, key)
            .map(|item| item.cost)
            .ok_or_else(|| GameError::UnknownItem { key: key.to_string() })?;

        let today = self.state.day();
        self.state.purchase(kind, key, cost).inspect_err(|e| {
            log::warn!("day={today} shop: purchase of '{key}' rejected: {e}");
        })?;
        log::info!("day={} shop: bought '{key}' for {cost}", self.state.day());
        self.record(GameEvent::ItemPurchased {
            kind,
            key: key.to_string(),
            cost,
            money: self.state.money(),
        })
    }

    /// Leave the shop for the next day's newspaper, then save.
    pub fn continue_to_next_day(&mut self) -> GameResult<()> {
        self.require_screen(Screen::Shop, "continue_to_next_day")?;
        self.workday = None;
        self.state.advance_day();
        self.record(GameEvent::DayAdvanced { day: self.state.day() })?;
        self.change_screen(Screen::Newspaper)?;
        self.save()
    }

    /// Leave the death screen and show what the next generation inherits.
    pub fn advance_to_rebirth(&mut self) -> GameResult<RebirthPreview> {
        self.require_screen(Screen::Death, "advance_to_rebirth")?;
        self.workday = None;
        let preview = GenerationManager::new(&self.config).preview(&self.state);
        self.rebirth_preview = Some(preview);
        self.record(GameEvent::RebirthPreviewed { preview })?;
        self.change_screen(Screen::Rebirth)?;
        Ok(preview)
    }

    /// Start the next generation, then save.
    pub fn confirm_rebirth(&mut self) -> GameResult<RebirthPreview> {
        self.require_screen(Screen::Rebirth, "confirm_rebirth")?;
        let applied = GenerationManager::new(&self.config).rebirth(&mut self.state);
        self.rebirth_preview = None;
        self.record(GameEvent::GenerationStarted {
            generation:      self.state.generation(),
            starting_energy: applied.starting_energy,
            energy_bonus:    applied.energy_bonus,
        })?;
        self.change_screen(Screen::Newspaper)?;
        self.save()?;
        Ok(applied)
    }

    /// Write the current state to the save slot.
    pub fn save(&mut self) -> GameResult<()> {
        let json = snapshot::to_json(&self.state)?;
        self.store.save_state(&json, SAVE_FORMAT_VERSION)?;
        log::info!("generation={} day={} saved", self.state.generation(), self.state.day());
        self.record(GameEvent::StateSaved {
            generation: self.state.generation(),
            day:        self.state.day(),
        })
    }

    // ── Time and input ─────────────────────────────────────────

    /// Move virtual time forward by `ms`, firing every timer that falls due,
    /// including timers scheduled along the way.
    pub fn advance_time(&mut self, ms: Millis) -> GameResult<()> {
        let until = self.scheduler.now() + ms;
        while let Some(id) = self.scheduler.pop_due(until) {
            self.dispatch_timer(id)?;
        }
        self.scheduler.settle(until);
        Ok(())
    }

    /// Press the stapler. Rejections come back as outcomes, not errors.
    pub fn activate_target(&mut self) -> GameResult<InputOutcome> {
        self.send_input(TaskInput::ActivateTarget)
    }

    /// Drop a pen into `holder`. Rejections come back as outcomes, not errors.
    pub fn place_pen(&mut self, holder: usize) -> GameResult<InputOutcome> {
        self.send_input(TaskInput::PlacePen { holder })
    }

    pub fn apply(&mut self, command: PlayerCommand) -> GameResult<()> {
        match command {
            PlayerCommand::SelectNewspaper { newspaper } => self.select_newspaper(&newspaper),
            PlayerCommand::Purchase { kind, key }        => self.purchase(kind, &key),
            PlayerCommand::ContinueToNextDay             => self.continue_to_next_day(),
            PlayerCommand::AdvanceToRebirth              => self.advance_to_rebirth().map(|_| ()),
            PlayerCommand::ConfirmRebirth                => self.confirm_rebirth().map(|_| ()),
            PlayerCommand::AdvanceTime { ms }            => self.advance_time(ms),
            PlayerCommand::ActivateTarget                => self.activate_target().map(|_| ()),
            PlayerCommand::PlacePen { holder }           => self.place_pen(holder).map(|_| ()),
        }
    }

    // ── Internals ──────────────────────────────────────────────

    fn send_input(&mut self, input: TaskInput) -> GameResult<InputOutcome> {
        if self.state.screen() != Screen::Work {
            return Ok(InputOutcome::NoTask);
        }
        let Some(sim) = self.workday.as_mut() else {
            return Ok(InputOutcome::NoTask);
        };
        let (outcome, events) = sim.handle_input(input, &mut WorkContext {
            state:     &mut self.state,
            scheduler: &mut self.scheduler,
            rng:       &mut *self.rng,
            config:    &self.config,
        });
        self.record_all(events)?;
        Ok(outcome)
    }

    fn dispatch_timer(&mut self, id: TimerId) -> GameResult<()> {
        let Some(sim) = self.workday.as_mut().filter(|w| w.owns_timer(id)) else {
            log::debug!("t={} stray timer {id:?} ignored", self.scheduler.now());
            return Ok(());
        };
        let events = sim.on_timer(id, &mut WorkContext {
            state:     &mut self.state,
            scheduler: &mut self.scheduler,
            rng:       &mut *self.rng,
            config:    &self.config,
        });
        self.record_all(events)?;
        self.follow_work_phase()
    }

    /// Leave the work screen once the day has ended one way or the other.
    fn follow_work_phase(&mut self) -> GameResult<()> {
        if self.state.screen() != Screen::Work {
            return Ok(());
        }
        match self.work_phase() {
            Some(WorkPhase::DayComplete) => self.change_screen(Screen::Shop),
            Some(WorkPhase::Dead)        => self.change_screen(Screen::Death),
            _                            => Ok(()),
        }
    }

    fn require_screen(&self, expected: Screen, action: &'static str) -> GameResult<()> {
        let screen = self.state.screen();
        if screen != expected {
            log::warn!("day={} flow: '{action}' rejected on {screen:?} screen", self.state.day());
            return Err(GameError::InvalidAction { action, screen });
        }
        Ok(())
    }

    fn change_screen(&mut self, to: Screen) -> GameResult<()> {
        let from = self.state.screen();
        if from == to {
            return Ok(());
        }
        self.state.set_screen(to);
        log::info!(
            "generation={} day={} flow: {from:?} -> {to:?}",
            self.state.generation(), self.state.day()
        );
        self.record(GameEvent::ScreenChanged { from, to })
    }

    fn record_all(&mut self, events: Vec<GameEvent>) -> GameResult<()> {
        for event in events {
            self.record(event)?;
        }
        Ok(())
    }

    /// Persist one event to the log and queue it for take_events().
    fn record(&mut self, event: GameEvent) -> GameResult<()> {
        let entry = EventLogEntry {
            id:         None,
            session_id: self.session_id.clone(),
            generation: self.state.generation(),
            day:        self.state.day(),
            at_ms:      self.scheduler.now(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(&event)?,
        };
        self.store.append_event(&entry)?;
        self.pending.push(event);
        Ok(())
    }
}
