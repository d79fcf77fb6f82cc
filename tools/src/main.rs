//! salaryman-runner: headless runner for the salaryman game core.
//!
//! Usage:
//!   salaryman-runner --seed 12345 --days 10 --db save.db
//!   salaryman-runner --ipc-mode --db save.db

use anyhow::Result;
use salaryman_core::{
    command::PlayerCommand,
    config::GameConfig,
    economy::ShopEntry,
    engine::{GameEngine, NewspaperListing},
    event::GameEvent,
    generation::RebirthPreview,
    state::Screen,
    store::GameStore,
    task::TaskProgress,
};
use std::env;
use std::io::{self, BufRead, Write};

/// Safety net for the autopilot; a healthy run needs far fewer steps.
const MAX_AUTOPILOT_STEPS: u32 = 200_000;
const STAPLER_TICK_MS: u64 = 16;
const PEN_PACE_MS: u64 = 150;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Command { command: PlayerCommand },
    Save,
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    now_ms:          u64,
    screen:          Screen,
    generation:      u32,
    day:             u32,
    money:           u64,
    energy:          f64,
    max_energy:      f64,
    energy_segments: u32,
    job_title:       Option<String>,
    current_hour:    u32,
    task:            Option<TaskProgress>,
    newspapers:      Vec<NewspaperListing>,
    shop:            Vec<ShopEntry>,
    rebirth_preview: Option<RebirthPreview>,
    events:          Vec<GameEvent>,
    error:           Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 5u32);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    if !ipc_mode {
        println!("Salaryman headless runner");
        println!("  seed:      {seed}");
        println!("  days:      {days}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = match GameConfig::load(data_dir) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}; using built-in catalog");
            GameConfig::default()
        }
    };

    let store = if db == ":memory:" {
        GameStore::in_memory()?
    } else {
        GameStore::open(db)?
    };
    store.migrate()?;

    let session_id = format!("session-{}", uuid::Uuid::new_v4());
    store.insert_session(&session_id, seed, env!("CARGO_PKG_VERSION"))?;

    let mut engine = GameEngine::resume(session_id, seed, config, store)?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        run_autopilot(&mut engine, days)?;
        print_summary(&engine)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut GameEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let error = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => None,
            IpcCommand::Save => engine.save().err().map(|e| e.to_string()),
            IpcCommand::Command { command } => {
                log::debug!("ipc: {}", command.action_name());
                match engine.apply(command) {
                    Ok(()) => None,
                    // Player mistakes are reported, not fatal.
                    Err(e) if e.is_rejection() => Some(e.to_string()),
                    Err(e) => return Err(e.into()),
                }
            }
        };
        let state = build_ui_state(engine, error);
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(engine: &mut GameEngine, error: Option<String>) -> UiState {
    let events = engine.take_events();
    let state = engine.state();
    UiState {
        now_ms:          engine.now(),
        screen:          state.screen(),
        generation:      state.generation(),
        day:             state.day(),
        money:           state.money(),
        energy:          state.energy(),
        max_energy:      state.max_energy(),
        energy_segments: state.energy_segments(),
        job_title:       state.current_job().map(|j| j.title.clone()),
        current_hour:    state.current_hour(),
        task:            engine.task_progress(),
        newspapers:      engine.newspapers(),
        shop:            engine.shop_listing(),
        rebirth_preview: engine.rebirth_preview(),
        events,
        error,
    }
}

/// Plays competently: waits for the stapler to line up, fills pens quickly,
/// buys whatever it can afford and always takes the best paper on offer.
fn run_autopilot(engine: &mut GameEngine, days: u32) -> Result<()> {
    let mut days_played = 0;
    for _ in 0..MAX_AUTOPILOT_STEPS {
        if days_played >= days {
            break;
        }
        // Nobody renders the autopilot; the store keeps the full log.
        for event in engine.take_events() {
            log::trace!("autopilot: {}", event.type_name());
        }
        match engine.state().screen() {
            Screen::Newspaper => {
                let best = engine
                    .newspapers()
                    .into_iter()
                    .filter(|p| p.affordable && p.job.is_some())
                    .max_by_key(|p| p.cost);
                let Some(paper) = best else {
                    anyhow::bail!("no affordable newspaper on day {}", engine.state().day());
                };
                engine.select_newspaper(&paper.key)?;
            }
            Screen::Work => work_step(engine)?,
            Screen::Shop => {
                let wanted = engine.shop_listing().into_iter().find(|e| e.purchasable());
                match wanted {
                    Some(entry) => engine.purchase(entry.kind, &entry.key)?,
                    None => {
                        engine.continue_to_next_day()?;
                        days_played += 1;
                    }
                }
            }
            Screen::Death => {
                engine.advance_to_rebirth()?;
            }
            Screen::Rebirth => {
                engine.confirm_rebirth()?;
            }
        }
    }
    Ok(())
}

fn work_step(engine: &mut GameEngine) -> Result<()> {
    match engine.task_progress() {
        Some(TaskProgress::Stapling { position, target_position, tolerance, .. })
            if (position - target_position).abs() <= tolerance =>
        {
            engine.activate_target()?;
            engine.advance_time(STAPLER_TICK_MS)?;
        }
        Some(TaskProgress::Stapling { .. }) => engine.advance_time(STAPLER_TICK_MS)?,
        Some(TaskProgress::PenRefill { holders, pens_per_holder, .. }) => {
            if let Some(open) = holders.iter().position(|&n| n < pens_per_holder) {
                engine.place_pen(open)?;
            }
            engine.advance_time(PEN_PACE_MS)?;
        }
        None => engine.advance_time(STAPLER_TICK_MS)?,
    }
    Ok(())
}

fn print_summary(engine: &GameEngine) -> Result<()> {
    let session = &engine.session_id;
    let store = engine.store();
    let state = engine.state();
    let logged = store.events_for_session(session)?.len();
    let tasks = store.event_count(session, "task_completed")?;
    let deaths = store.event_count(session, "player_died")?;
    let purchases = store.event_count(session, "item_purchased")?;

    println!("=== RUN SUMMARY ===");
    println!("  session:        {session}");
    println!("  seed:           {}", engine.seed());
    println!("  virtual time:   {:.1}s", engine.now() as f64 / 1000.0);
    println!("  generation:     {}", state.generation());
    println!("  day:            {}", state.day());
    println!("  money:          ¥{}", state.money());
    println!("  energy:         {:.1}/{:.1}", state.energy(), state.max_energy());
    println!("  items:          {:?}", state.items());
    println!("  genes:          {:?}", state.gene_modifications());
    println!("  tasks done:     {tasks}");
    println!("  purchases:      {purchases}");
    println!("  deaths:         {deaths}");
    println!("  events logged:  {logged}");
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
