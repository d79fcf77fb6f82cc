//! Screen flow: which actions are accepted where, and the full
//! work → shop → death → rebirth loop.

use salaryman_core::{
    command::PlayerCommand,
    config::{GameConfig, PurchaseKind},
    engine::GameEngine,
    error::GameError,
    event::GameEvent,
    rng::ScriptedRandom,
    state::Screen,
    store::GameStore,
};

fn build_engine() -> GameEngine {
    let store = GameStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    GameEngine::new("flow-test".into(), 11, GameConfig::default(), store)
        .expect("engine")
        .with_random_source(Box::new(ScriptedRandom::new(vec![1])))
}

/// Play the free tabloid job through both hours of day one.
fn work_first_day(engine: &mut GameEngine) {
    engine.select_newspaper("free_tabloid").expect("select");
    for _ in 0..2 {
        for holder in 0..4 {
            for _ in 0..3 {
                engine.place_pen(holder).expect("place pen");
            }
        }
        engine.advance_time(3_000).expect("advance");
    }
    assert_eq!(engine.state().screen(), Screen::Shop);
}

fn screens(events: &[GameEvent]) -> Vec<Screen> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::ScreenChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

#[test]
fn new_game_starts_on_the_newspaper() {
    let engine = build_engine();
    let state = engine.state();
    assert_eq!(state.screen(), Screen::Newspaper);
    assert_eq!(state.generation(), 1);
    assert_eq!(state.day(), 1);
    assert_eq!(state.money(), 0);
    assert_eq!(state.energy(), 3.0);
    assert_eq!(state.max_energy(), 3.0);
    assert!(state.current_job().is_none());
}

#[test]
fn newspaper_listing_marks_locked_papers() {
    let engine = build_engine();
    let listing = engine.newspapers();
    assert_eq!(listing.len(), 2);

    let business = listing.iter().find(|p| p.key == "business_times").expect("business paper");
    assert!(!business.affordable);
    assert_eq!(business.locked_message.as_deref(), Some("Better jobs inside! (Need ¥200)"));
    assert_eq!(business.job.as_ref().map(|j| j.title.as_str()), Some("Junior Analyst"));

    let tabloid = listing.iter().find(|p| p.key == "free_tabloid").expect("tabloid");
    assert!(tabloid.affordable);
    assert_eq!(tabloid.cost, 0);
}

#[test]
fn unaffordable_newspaper_changes_nothing() {
    let mut engine = build_engine();
    let before = engine.state().clone();

    let err = engine.select_newspaper("business_times").expect_err("cannot afford");
    assert!(
        matches!(err, GameError::InsufficientFunds { cost: 200, money: 0 }),
        "unexpected error: {err}"
    );
    assert_eq!(engine.state(), &before);
    assert!(engine.work_phase().is_none());

    let err = engine.select_newspaper("evening_post").expect_err("no such paper");
    assert!(matches!(err, GameError::UnknownNewspaper { .. }));
}

#[test]
fn selecting_a_paper_starts_work_on_its_first_job() {
    let mut engine = build_engine();
    engine.select_newspaper("free_tabloid").expect("select");
    let state = engine.state();
    assert_eq!(state.screen(), Screen::Work);
    let job = state.current_job().expect("job assigned");
    assert_eq!(job.title, "Temp Office Worker");
    assert_eq!(job.company, "Yamada Logistics");
    assert_eq!(state.current_hour(), 1, "first hour starts straight away");
}

#[test]
fn actions_on_the_wrong_screen_are_rejected() {
    let mut engine = build_engine();
    let before = engine.state().clone();

    let rejected = [
        engine.purchase(PurchaseKind::Item, "pocket_protector").map(|_| ()),
        engine.continue_to_next_day(),
        engine.advance_to_rebirth().map(|_| ()),
        engine.confirm_rebirth().map(|_| ()),
    ];
    for result in rejected {
        let err = result.expect_err("wrong screen");
        assert!(
            matches!(err, GameError::InvalidAction { screen: Screen::Newspaper, .. }),
            "unexpected error: {err}"
        );
    }
    assert_eq!(engine.state(), &before);

    engine.select_newspaper("free_tabloid").expect("select");
    let err = engine.select_newspaper("free_tabloid").expect_err("already working");
    assert!(matches!(err, GameError::InvalidAction { screen: Screen::Work, .. }));
}

#[test]
fn shop_purchase_is_charged_once() {
    let mut engine = build_engine();
    work_first_day(&mut engine);
    assert_eq!(engine.state().money(), 100);

    engine.purchase(PurchaseKind::Item, "pocket_protector").expect("buy");
    assert_eq!(engine.state().money(), 75);
    assert!(engine.state().items().contains("pocket_protector"));

    let err = engine
        .purchase(PurchaseKind::Item, "pocket_protector")
        .expect_err("already owned");
    assert!(matches!(err, GameError::AlreadyOwned { .. }));
    assert_eq!(engine.state().money(), 75, "repeat purchase is free of charge");

    let err = engine.purchase(PurchaseKind::Gene, "gills").expect_err("unknown gene");
    assert!(matches!(err, GameError::UnknownItem { .. }));

    let listing = engine.shop_listing();
    assert!(listing.iter().any(|e| e.key == "pocket_protector" && e.owned));
    assert!(listing.iter().any(|e| e.key == "basic_stamina" && e.purchasable()));
}

#[test]
fn pocket_protector_shows_up_in_the_next_pen_task() {
    let mut engine = build_engine();
    work_first_day(&mut engine);
    engine.purchase(PurchaseKind::Item, "pocket_protector").expect("buy");
    engine.continue_to_next_day().expect("continue");

    engine.select_newspaper("free_tabloid").expect("select");
    match engine.task_progress() {
        Some(salaryman_core::task::TaskProgress::PenRefill { pens_filled, holders, .. }) => {
            assert_eq!(pens_filled, 1);
            assert_eq!(holders[0], 1);
        }
        other => panic!("expected pen task, got {other:?}"),
    }
}

#[test]
fn a_whole_generation_ends_in_rebirth() {
    let mut engine = build_engine();
    work_first_day(&mut engine);

    engine.purchase(PurchaseKind::Item, "pocket_protector").expect("item");
    engine.purchase(PurchaseKind::Gene, "basic_stamina").expect("gene");
    assert_eq!(engine.state().money(), 0);

    engine.continue_to_next_day().expect("continue");
    assert_eq!(engine.state().day(), 2);
    assert_eq!(engine.state().screen(), Screen::Newspaper);

    // Energy is not refilled between days; an idle second day runs it out.
    engine.select_newspaper("free_tabloid").expect("select");
    engine.advance_time(60_000).expect("advance");
    assert_eq!(engine.state().screen(), Screen::Death);

    let preview = engine.advance_to_rebirth().expect("to rebirth");
    assert_eq!(engine.state().screen(), Screen::Rebirth);
    assert_eq!(preview.next_generation, 2);
    assert_eq!(preview.energy_bonus, 1);
    assert_eq!(preview.starting_energy, 4.0);
    assert_eq!(engine.rebirth_preview(), Some(preview));
    assert_eq!(engine.state().generation(), 1, "preview only");

    engine.confirm_rebirth().expect("rebirth");
    let state = engine.state();
    assert_eq!(state.screen(), Screen::Newspaper);
    assert_eq!(state.generation(), 2);
    assert_eq!(state.energy(), 4.0);
    assert_eq!(state.max_energy(), 4.0);
    assert_eq!(state.money(), 0);
    assert_eq!(state.day(), 1);
    assert!(state.items().is_empty());
    assert!(state.gene_modifications().contains("basic_stamina"));
    assert!(engine.rebirth_preview().is_none());

    assert_eq!(
        screens(&engine.take_events()),
        vec![
            Screen::Work,
            Screen::Shop,
            Screen::Newspaper,
            Screen::Work,
            Screen::Death,
            Screen::Rebirth,
            Screen::Newspaper,
        ]
    );
}

#[test]
fn commands_drive_the_same_flow() {
    let mut engine = build_engine();
    let script = [
        PlayerCommand::SelectNewspaper { newspaper: "free_tabloid".into() },
        PlayerCommand::AdvanceTime { ms: 30_000 },
        PlayerCommand::AdvanceToRebirth,
        PlayerCommand::ConfirmRebirth,
    ];
    for command in script {
        engine.apply(command).expect("command accepted");
    }
    assert_eq!(engine.state().generation(), 2);
    assert_eq!(engine.state().screen(), Screen::Newspaper);

    let err = engine.apply(PlayerCommand::ConfirmRebirth).expect_err("not on rebirth");
    assert!(err.is_rejection());
}
