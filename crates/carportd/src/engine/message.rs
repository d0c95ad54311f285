//! Type-safe message system for carportd
//!
//! Messages are split by direction to enforce correct usage at compile time:
//! - `FromIntegrationMessage`: Events from integrations to the engine
//! - `ToIntegrationMessage`: Commands from the engine to integrations

use super::device::Device;
use super::entity::EntityDescriptor;

/// Messages FROM integrations TO the engine (events/state updates)
#[derive(Debug)]
pub enum FromIntegrationMessage {
    /// An entity was discovered and registered.
    ///
    /// Carries the owning device too; the engine upserts the device registry
    /// keyed by device id, so several entities on the same device may each
    /// repeat it.
    EntityDiscovered {
        entity: EntityDescriptor,
        device: Device,
        integration_name: String,
    },

    /// An entity was removed (vehicle left the account, etc.)
    EntityRemoved { entity_id: String },

    /// A switch's displayed state changed
    SwitchStateChanged { entity_id: String, on: bool },
}

/// Messages FROM the engine TO integrations (commands)
#[derive(Debug, Clone)]
pub enum ToIntegrationMessage {
    /// Command to change a switch's state
    SwitchCommand { entity_id: String, on: bool },

    /// Command to press a stateless button
    ButtonPress { entity_id: String },
}
