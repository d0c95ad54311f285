use serde::Serialize;
use strum::Display;

/// Entity kind, used for id prefixes and UI grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Switch,
    Button,
}

/// Description of an entity announced by an integration.
///
/// Sent once at discovery; the engine keeps it in its registry so API
/// consumers can enumerate what exists without knowing any integration.
#[derive(Debug, Clone, Serialize)]
pub struct EntityDescriptor {
    /// Engine-wide entity id, e.g. "switch.VSSZZZK1ZPF000001_climate".
    pub entity_id: String,

    /// Stable id from the integration, survives renames.
    pub unique_id: String,

    /// Human-readable name.
    pub name: String,

    pub platform: Platform,

    /// Id of the device this entity belongs to.
    pub device_id: String,
}
