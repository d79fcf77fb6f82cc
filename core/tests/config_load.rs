//! The shipped catalog file and catalog validation.

use salaryman_core::{
    config::{DayConfig, GameConfig},
    error::GameError,
    task::TaskKind,
};

fn data_dir() -> String {
    format!("{}/../data", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn shipped_catalog_matches_builtin_defaults() {
    let loaded = GameConfig::load(&data_dir()).expect("catalog loads");
    assert_eq!(loaded, GameConfig::default());
}

#[test]
fn missing_data_dir_names_the_path() {
    let err = GameConfig::load("/nonexistent/salaryman").expect_err("no catalog");
    assert!(err.to_string().contains("/nonexistent/salaryman/catalog.json"), "{err}");
}

#[test]
fn day_without_progression_entry_uses_job_hours() {
    let config = GameConfig::default();
    let job = config.newspapers["free_tabloid"].featured_job().expect("job").clone();

    assert_eq!(config.day_config(1, &job), DayConfig { hours: 2, difficulty: 1.0 });
    assert_eq!(config.day_config(3, &job), DayConfig { hours: 7, difficulty: 1.5 });
    assert_eq!(config.day_config(4, &job), DayConfig { hours: job.hours, difficulty: 1.0 });
}

#[test]
fn typing_is_not_a_playable_task() {
    let config = GameConfig::default();
    let analyst = config.newspapers["business_times"].featured_job().expect("job");
    assert_eq!(analyst.tasks.len(), 3);
    assert_eq!(analyst.playable_tasks(), vec![TaskKind::Stapling, TaskKind::PenRefill]);
}

#[test]
fn validation_rejects_unplayable_catalogs() {
    let mut no_tasks = GameConfig::default();
    if let Some(paper) = no_tasks.newspapers.get_mut("free_tabloid") {
        paper.jobs[0].tasks = vec!["typing".into()];
    }

    let mut impossible_pens = GameConfig::default();
    impossible_pens.minigames.pen_refill.required_pens = 13;

    let mut dead_on_arrival = GameConfig::default();
    dead_on_arrival.energy.starting_energy = 0.0;

    let mut off_track = GameConfig::default();
    off_track.minigames.stapling.start_position = 400.0;

    let mut bad_day_key = GameConfig::default();
    bad_day_key
        .day_progression
        .insert("weekend".into(), DayConfig { hours: 1, difficulty: 1.0 });

    for (name, config) in [
        ("no playable tasks", no_tasks),
        ("pens beyond capacity", impossible_pens),
        ("zero energy", dead_on_arrival),
        ("stapler starts off the track", off_track),
        ("bad day key", bad_day_key),
    ] {
        match config.validate() {
            Err(GameError::InvalidCatalog(_)) => {}
            other => panic!("{name}: expected InvalidCatalog, got {other:?}"),
        }
    }
    assert!(GameConfig::default().validate().is_ok());
}

#[test]
fn task_info_reads_energy_costs_from_catalog() {
    let config = GameConfig::default();
    let stapling = TaskKind::Stapling.info(&config.minigames);
    let pens = TaskKind::PenRefill.info(&config.minigames);
    assert_eq!(stapling.name, "Staple Papers");
    assert_eq!(stapling.energy_cost, 1);
    assert_eq!(pens.energy_cost, 2);
    assert_eq!(TaskKind::from_id(TaskKind::PenRefill.id()), Some(TaskKind::PenRefill));
    assert_eq!(TaskKind::from_id("typing"), None);
}
