use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::device::Device;
use super::entity::EntityDescriptor;
use super::integration::FromIntegrationReceiver;
use super::integration::FromIntegrationSender;
use super::integration::Integration;
use super::integration::IntegrationContext;
use super::integration::ToIntegrationSender;
use super::message::FromIntegrationMessage;
use super::message::ToIntegrationMessage;
use super::state::State;
use super::state::SwitchState;

/// carportd engine
///
/// This structure handles the flow of events, routing commands to the
/// correct integration, and maintaining a view of the world with State.
pub struct Engine {
    /// Centralized state snapshot (readers load the Arc, writer stores a new one)
    state: ArcSwap<State>,

    /// Map of entity_id -> integration name for routing messages
    entity_integration_map: std::sync::Mutex<HashMap<String, String>>,

    /// Registry of discovered entities, keyed by entity_id
    entities: std::sync::Mutex<HashMap<String, EntityDescriptor>>,

    /// Registry of discovered devices, keyed by device id
    devices: std::sync::Mutex<HashMap<String, Device>>,

    /// Communication channels to integrations (for commands)
    integration_channels: HashMap<String, ToIntegrationSender>,

    /// Receive messages from integrations (events)
    message_rx: Mutex<FromIntegrationReceiver>,

    /// Sender for integrations to report events back to the engine
    message_tx: FromIntegrationSender,

    /// Handles for integration tasks
    integration_handles: Vec<JoinHandle<()>>,
}

/// Capacity for the integration→engine message channel
/// Provides backpressure when integrations send faster than the engine can process
const FROM_INTEGRATION_CHANNEL_SIZE: usize = 1024;

impl Engine {
    /// Create a new Engine instance
    pub fn new() -> Self {
        let (message_tx, message_rx) = mpsc::channel(FROM_INTEGRATION_CHANNEL_SIZE);
        Self {
            state: ArcSwap::new(Arc::default()),
            entity_integration_map: std::sync::Mutex::new(HashMap::new()),
            entities: std::sync::Mutex::new(HashMap::new()),
            devices: std::sync::Mutex::new(HashMap::new()),
            integration_channels: HashMap::new(),
            message_rx: Mutex::new(message_rx),
            message_tx,
            integration_handles: Vec::new(),
        }
    }

    /// Register integrations from configuration
    ///
    /// This is a convenience method that checks the config and registers
    /// any enabled integrations.
    pub fn register_integrations_from_config(
        &mut self,
        cfg: &crate::config::Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let ctx = IntegrationContext { config: cfg };
        for constr in super::integration::REGISTRY {
            let integration = match constr(&ctx) {
                Ok(Some(i)) => i,
                Err(e) => {
                    error!("failed to setup integration: {}", e);
                    continue;
                }
                Ok(None) => continue,
            };
            let name = integration.name().to_string();
            self.register_integration(name, integration);
        }

        Ok(())
    }

    /// Register an integration with the engine
    ///
    /// This spawns the integration in a background task, wires up channels,
    /// and starts its setup process.
    pub fn register_integration(&mut self, name: String, mut integration: Box<dyn Integration>) {
        let (to_integration_tx, mut to_integration_rx) = mpsc::unbounded_channel();
        let from_integration_tx = self.message_tx.clone();

        self.integration_channels
            .insert(name.clone(), to_integration_tx);

        // Spawn integration task
        let handle = tokio::spawn(async move {
            // Setup integration (gives it the sender for events)
            if let Err(e) = integration.setup(from_integration_tx).await {
                warn!("Integration '{}' setup failed: {}", name, e);
                return;
            }

            // Process commands from engine
            while let Some(msg) = to_integration_rx.recv().await {
                if let Err(e) = integration.handle_message(msg).await {
                    warn!("Integration '{}' failed to handle message: {}", name, e);
                }
            }

            if let Err(e) = integration.shutdown().await {
                warn!("Integration '{}' shutdown failed: {}", name, e);
            }
        });

        self.integration_handles.push(handle);
    }

    /// Send a command to an integration
    ///
    /// Routes the command to the appropriate integration based on entity_id.
    pub fn send_command(&self, msg: ToIntegrationMessage) -> Result<(), Box<dyn Error + Send>> {
        // Extract entity_id from command for routing
        let entity_id = match &msg {
            ToIntegrationMessage::SwitchCommand { entity_id, .. } => entity_id.clone(),
            ToIntegrationMessage::ButtonPress { entity_id } => entity_id.clone(),
        };

        // Route to the integration that owns this entity
        let map = self
            .entity_integration_map
            .lock()
            .map_err(|e| -> Box<dyn Error + Send> {
                Box::new(std::io::Error::other(e.to_string()))
            })?;

        let integration_name = map
            .get(&entity_id)
            .ok_or_else(|| -> Box<dyn Error + Send> {
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("No integration found for entity: {}", entity_id),
                ))
            })?;

        let tx = self.integration_channels.get(integration_name).ok_or_else(
            || -> Box<dyn Error + Send> {
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Integration channel not found: {}", integration_name),
                ))
            },
        )?;

        tx.send(msg)
            .map_err(|e| -> Box<dyn Error + Send> { Box::new(e) })
    }

    /// Run the engine's main event loop
    ///
    /// Processes incoming events from integrations and updates state.
    pub async fn run(&self) -> Result<(), Box<dyn Error + Send>> {
        info!("Engine starting");

        // Main event loop - only receives FromIntegration messages
        let mut rx = self.message_rx.lock().await;
        while let Some(msg) = rx.recv().await {
            if let Err(e) = self.handle_event(msg).await {
                warn!("Error handling event: {}", e);
            }
        }

        info!("Engine shutting down");
        Ok(())
    }

    /// Get a snapshot of the current engine state.
    ///
    /// Clones the `Arc` (atomic refcount bump), essentially free.
    pub fn state_snapshot(&self) -> Arc<State> {
        self.state.load_full()
    }

    /// All discovered entities, sorted by entity_id.
    pub fn entity_list(&self) -> Vec<EntityDescriptor> {
        let mut entities: Vec<EntityDescriptor> = match self.entities.lock() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => Vec::new(),
        };
        entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        entities
    }

    /// All discovered devices, sorted by device id.
    pub fn device_list(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = match self.devices.lock() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => Vec::new(),
        };
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        devices
    }

    /// Send a switch command to control a switch entity
    pub fn send_switch_command(
        &self,
        entity_id: String,
        on: bool,
    ) -> Result<(), Box<dyn Error + Send>> {
        let cmd = ToIntegrationMessage::SwitchCommand { entity_id, on };
        self.send_command(cmd)
    }

    /// Press a stateless button entity
    pub fn press_button(&self, entity_id: String) -> Result<(), Box<dyn Error + Send>> {
        let cmd = ToIntegrationMessage::ButtonPress { entity_id };
        self.send_command(cmd)
    }

    /// Handle an event from an integration
    async fn handle_event(&self, msg: FromIntegrationMessage) -> Result<(), Box<dyn Error + Send>> {
        match msg {
            FromIntegrationMessage::EntityDiscovered {
                entity,
                device,
                integration_name,
            } => {
                info!(
                    "Entity discovered: {} (from {})",
                    entity.entity_id, integration_name
                );

                // Record which integration owns this entity for command routing.
                // State is not populated until the first state-change message arrives.
                if let Ok(mut map) = self.entity_integration_map.lock() {
                    map.insert(entity.entity_id.clone(), integration_name);
                }

                // Upsert the device registry; several entities on one device
                // each carry a copy, the first one wins.
                if let Ok(mut devices) = self.devices.lock() {
                    devices
                        .entry(device.id.clone())
                        .or_insert(device)
                        .add_entity(entity.entity_id.clone());
                }

                if let Ok(mut entities) = self.entities.lock() {
                    entities.insert(entity.entity_id.clone(), entity);
                }
            }
            FromIntegrationMessage::EntityRemoved { entity_id } => {
                info!("Entity removed: {}", entity_id);

                {
                    let mut state = State::clone(&self.state.load());
                    state.switches.remove(&entity_id);
                    self.state.store(Arc::new(state));
                }

                if let Ok(mut entities) = self.entities.lock() {
                    entities.remove(&entity_id);
                }

                // Detach from its device; drop devices left without entities
                if let Ok(mut devices) = self.devices.lock() {
                    for device in devices.values_mut() {
                        device.entity_ids.retain(|id| id != &entity_id);
                    }
                    devices.retain(|_, device| !device.entity_ids.is_empty());
                }

                // Remove from routing map
                if let Ok(mut map) = self.entity_integration_map.lock() {
                    map.remove(&entity_id);
                }
            }
            FromIntegrationMessage::SwitchStateChanged { entity_id, on } => {
                let switch_state = SwitchState { on };
                info!("Switch state changed: {} -> on={}", entity_id, on);

                {
                    let mut state = State::clone(&self.state.load());
                    state.switches.insert(entity_id, switch_state);
                    self.state.store(Arc::new(state));
                }
            }
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::super::entity::Platform;
    use super::*;

    /// Integration stub that forwards every command it receives to a channel
    /// the test holds.
    struct RecordingIntegration {
        seen: mpsc::UnboundedSender<ToIntegrationMessage>,
    }

    #[async_trait]
    impl Integration for RecordingIntegration {
        fn name(&self) -> &str {
            "recording"
        }

        async fn setup(
            &mut self,
            _tx: FromIntegrationSender,
        ) -> Result<(), Box<dyn Error + Send>> {
            Ok(())
        }

        async fn handle_message(
            &mut self,
            msg: ToIntegrationMessage,
        ) -> Result<(), Box<dyn Error + Send>> {
            self.seen
                .send(msg)
                .map_err(|e| -> Box<dyn Error + Send> {
                    Box::new(std::io::Error::other(e.to_string()))
                })
        }

        async fn shutdown(&mut self) -> Result<(), Box<dyn Error + Send>> {
            Ok(())
        }
    }

    fn switch_entity(entity_id: &str, device_id: &str) -> (EntityDescriptor, Device) {
        let entity = EntityDescriptor {
            entity_id: entity_id.to_string(),
            unique_id: format!("{}-unique", entity_id),
            name: "Test switch".to_string(),
            platform: Platform::Switch,
            device_id: device_id.to_string(),
        };
        let device = Device::new(device_id.to_string(), "Test device".to_string());
        (entity, device)
    }

    async fn discover(engine: &Engine, entity_id: &str, device_id: &str, integration: &str) {
        let (entity, device) = switch_entity(entity_id, device_id);
        engine
            .handle_event(FromIntegrationMessage::EntityDiscovered {
                entity,
                device,
                integration_name: integration.to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_switch_state_changed_updates_snapshot() {
        let engine = Engine::new();

        engine
            .handle_event(FromIntegrationMessage::SwitchStateChanged {
                entity_id: "switch.v1_climate".to_string(),
                on: true,
            })
            .await
            .unwrap();

        let snapshot = engine.state_snapshot();
        assert!(snapshot.switches.get("switch.v1_climate").unwrap().on);

        engine
            .handle_event(FromIntegrationMessage::SwitchStateChanged {
                entity_id: "switch.v1_climate".to_string(),
                on: false,
            })
            .await
            .unwrap();

        let snapshot = engine.state_snapshot();
        assert!(!snapshot.switches.get("switch.v1_climate").unwrap().on);
    }

    #[tokio::test]
    async fn test_discovery_registers_entity_and_device() {
        let engine = Engine::new();

        discover(&engine, "switch.v1_climate", "vwv1", "cupra").await;
        discover(&engine, "switch.v1_charging", "vwv1", "cupra").await;

        let entities = engine.entity_list();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].entity_id, "switch.v1_charging");
        assert_eq!(entities[1].entity_id, "switch.v1_climate");

        // Both entities share one device
        let devices = engine.device_list();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].entity_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_entity_removed_cleans_up() {
        let engine = Engine::new();

        discover(&engine, "switch.v1_climate", "vwv1", "cupra").await;
        engine
            .handle_event(FromIntegrationMessage::SwitchStateChanged {
                entity_id: "switch.v1_climate".to_string(),
                on: true,
            })
            .await
            .unwrap();

        engine
            .handle_event(FromIntegrationMessage::EntityRemoved {
                entity_id: "switch.v1_climate".to_string(),
            })
            .await
            .unwrap();

        assert!(engine.state_snapshot().switches.is_empty());
        assert!(engine.entity_list().is_empty());
        assert!(engine.device_list().is_empty());
        assert!(
            engine
                .send_switch_command("switch.v1_climate".to_string(), true)
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_send_command_routes_to_integration() {
        let mut engine = Engine::new();
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        engine.register_integration(
            "recording".to_string(),
            Box::new(RecordingIntegration { seen: seen_tx }),
        );

        discover(&engine, "switch.v1_climate", "vwv1", "recording").await;
        engine
            .send_switch_command("switch.v1_climate".to_string(), true)
            .unwrap();

        let msg = tokio::time::timeout(std::time::Duration::from_secs(1), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        match msg {
            ToIntegrationMessage::SwitchCommand { entity_id, on } => {
                assert_eq!(entity_id, "switch.v1_climate");
                assert!(on);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_command_unknown_entity_errors() {
        let engine = Engine::new();
        let err = engine
            .press_button("button.missing_start_climate".to_string())
            .unwrap_err();
        assert!(err.to_string().contains("button.missing_start_climate"));
    }
}
