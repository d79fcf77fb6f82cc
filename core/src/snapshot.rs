//! Save-game serialization: GameState to and from JSON.
//!
//! A save is a single JSON object. Restoring merges it over a fresh default
//! state one key at a time: a key that is missing or holds a value of the
//! wrong shape keeps its default, and the rest of the save still applies.
//! A save that is not a JSON object at all is replaced by defaults.
//! Neither case aborts startup.

use crate::{
    config::GameConfig,
    error::GameResult,
    state::GameState,
};
use serde_json::{Map, Value};

/// Bumped when the saved shape changes incompatibly.
pub const SAVE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct RestoredState {
    pub state:       GameState,
    /// Every fallback and invariant repair applied while restoring.
    pub corrections: Vec<String>,
}

pub fn to_json(state: &GameState) -> GameResult<String> {
    Ok(serde_json::to_string(state)?)
}

/// Merge `json` over `GameState::initial(config)`.
pub fn restore(json: &str, config: &GameConfig) -> GameResult<RestoredState> {
    let defaults = GameState::initial(config);
    let mut corrections = Vec::new();

    let saved = match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            log::warn!("save is not an object ({}); starting from defaults", kind_of(&other));
            corrections.push("save replaced by defaults".to_string());
            Map::new()
        }
        Err(e) => {
            log::warn!("save is not valid JSON ({e}); starting from defaults");
            corrections.push("save replaced by defaults".to_string());
            Map::new()
        }
    };

    let Value::Object(mut merged) = serde_json::to_value(&defaults)? else {
        return Ok(RestoredState { state: defaults, corrections });
    };

    let keys: Vec<String> = merged.keys().cloned().collect();
    for key in keys {
        let Some(value) = saved.get(&key) else {
            continue;
        };
        let previous = merged.insert(key.clone(), value.clone());
        if serde_json::from_value::<GameState>(Value::Object(merged.clone())).is_err() {
            log::warn!("save field '{key}' is corrupted; using default");
            corrections.push(format!("'{key}' reset to default"));
            if let Some(previous) = previous {
                merged.insert(key, previous);
            }
        }
    }

    let mut state: GameState = serde_json::from_value(Value::Object(merged))?;
    corrections.extend(state.normalize(config));
    Ok(RestoredState { state, corrections })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_)  => "array",
        Value::Object(_) => "object",
    }
}
