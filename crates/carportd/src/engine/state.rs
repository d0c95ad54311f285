use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// State of a switch entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwitchState {
    /// Whether the switch is on. A switch whose backing telemetry cannot be
    /// read reports off rather than a third state.
    pub on: bool,
}

/// Centralized snapshot of the entire engine state.
///
/// Buttons are stateless and never appear here; they exist only in the
/// entity registry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct State {
    pub switches: HashMap<String, SwitchState>,
}
