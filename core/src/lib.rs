//! salaryman-core: deterministic game core for a generational salaryman
//! life simulator. Front ends drive it through `engine::GameEngine`.

pub mod clock;
pub mod command;
pub mod config;
pub mod economy;
pub mod engine;
pub mod error;
pub mod event;
pub mod generation;
pub mod pen_refill_task;
pub mod rng;
pub mod snapshot;
pub mod stapling_task;
pub mod state;
pub mod store;
pub mod task;
pub mod types;
pub mod workday;
