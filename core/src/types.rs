//! Shared primitive types used across the entire game core.

/// Virtual time in milliseconds since the engine was created.
pub type Millis = u64;

/// Catalog key of a shop item or gene modification.
pub type ItemKey = String;

/// Identifier of one play session, used to tag the event log.
pub type SessionId = String;

/// Convert a virtual duration to seconds.
pub fn millis_to_secs(ms: Millis) -> f64 {
    ms as f64 / 1000.0
}
