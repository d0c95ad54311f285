use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use carportd_connect::GatewayError;
use carportd_connect::Vehicle;
use carportd_connect::VehicleGateway;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::CupraConfig;
use super::button::VehicleButton;
use super::capability::ButtonKind;
use super::capability::SwitchKind;
use super::capability::VehicleCommand;
use super::capability::device_id;
use super::status::ac_charge_speed_maximum;
use super::switch::VehicleSwitch;
use crate::engine::Device;
use crate::engine::EntityDescriptor;
use crate::engine::FromIntegrationMessage;
use crate::engine::FromIntegrationSender;
use crate::engine::Integration;
use crate::engine::ToIntegrationMessage;

/// Type alias for the shared switch map, keyed by entity_id
type SwitchesMap = Arc<Mutex<HashMap<String, VehicleSwitch>>>;

/// Type alias for the shared button map, keyed by entity_id
type ButtonsMap = Arc<Mutex<HashMap<String, VehicleButton>>>;

/// Type alias for the latest fleet snapshot, keyed by VIN
type FleetMap = Arc<Mutex<HashMap<String, Vehicle>>>;

/// CUPRA integration for carportd
///
/// Exposes every vehicle of a connected-car account as a set of switches
/// (climate, charging) and buttons (start/stop commands, charge speed
/// toggle). All gateway calls block, so they run on blocking threads off the
/// async runtime.
pub struct CupraIntegration<G: VehicleGateway> {
    gateway: Arc<G>,
    config: CupraConfig,
    switches: SwitchesMap,
    buttons: ButtonsMap,
    fleet: FleetMap,
    to_engine: Option<FromIntegrationSender>,
    /// Handle to the background fleet refresh task
    _refresh_task: Option<JoinHandle<()>>,
}

impl<G: VehicleGateway + 'static> CupraIntegration<G> {
    /// Create a new CUPRA integration.
    ///
    /// The gateway stays shared with the caller; tests keep a handle to
    /// inspect issued commands.
    pub fn new(gateway: Arc<G>, config: &CupraConfig) -> Self {
        Self {
            gateway,
            config: config.clone(),
            switches: Arc::new(Mutex::new(HashMap::new())),
            buttons: Arc::new(Mutex::new(HashMap::new())),
            fleet: Arc::new(Mutex::new(HashMap::new())),
            to_engine: None,
            _refresh_task: None,
        }
    }

    /// Fetch the fleet on a blocking thread.
    async fn fetch_fleet(gateway: Arc<G>) -> Result<Vec<Vehicle>, Box<dyn Error + Send>> {
        match tokio::task::spawn_blocking(move || gateway.vehicles()).await {
            Ok(Ok(vehicles)) => Ok(vehicles),
            Ok(Err(e)) => Err(Box::new(e) as Box<dyn Error + Send>),
            Err(e) => Err(Box::new(std::io::Error::other(e.to_string())) as Box<dyn Error + Send>),
        }
    }

    /// Run one command on a blocking thread.
    async fn dispatch_static(
        gateway: Arc<G>,
        vin: String,
        command: VehicleCommand,
    ) -> Result<bool, GatewayError> {
        match tokio::task::spawn_blocking(move || command.execute(gateway.as_ref(), &vin)).await {
            Ok(result) => result,
            Err(e) => Err(GatewayError::Transport(format!("command task failed: {}", e))),
        }
    }

    /// Periodically refresh the fleet in a background task
    ///
    /// This is spawned as a separate tokio task in setup() so that
    /// handle_message() can process commands concurrently.
    async fn refresh_task(
        gateway: Arc<G>,
        interval: Duration,
        fleet: FleetMap,
        switches: SwitchesMap,
        to_engine: FromIntegrationSender,
    ) {
        loop {
            tokio::time::sleep(interval).await;
            match Self::fetch_fleet(gateway.clone()).await {
                Ok(vehicles) => {
                    debug!("Fleet refresh returned {} vehicle(s)", vehicles.len());
                    Self::apply_fleet_static(vehicles, &fleet, &switches, &to_engine).await;
                }
                // Keep the last known states; telemetry catches up next round
                Err(e) => warn!("Fleet refresh failed: {}", e),
            }
        }
    }

    /// Replace the cached fleet and push switch-state changes to the engine
    /// (static version for background task)
    async fn apply_fleet_static(
        vehicles: Vec<Vehicle>,
        fleet: &FleetMap,
        switches: &SwitchesMap,
        to_engine: &FromIntegrationSender,
    ) {
        {
            let mut fleet_guard = fleet.lock().await;
            for vehicle in &vehicles {
                if !fleet_guard.is_empty() && !fleet_guard.contains_key(&vehicle.vin) {
                    debug!(
                        "Vehicle {} appeared after startup; entities are created at startup only",
                        vehicle.vin
                    );
                }
            }
            *fleet_guard = vehicles
                .into_iter()
                .map(|vehicle| (vehicle.vin.clone(), vehicle))
                .collect();
        }

        let mut changes = Vec::new();
        {
            let fleet_guard = fleet.lock().await;
            let mut switches_guard = switches.lock().await;
            for (entity_id, switch) in switches_guard.iter_mut() {
                if switch.refresh(fleet_guard.get(&switch.vin)) {
                    changes.push((entity_id.clone(), switch.on));
                }
            }
        }

        for (entity_id, on) in changes {
            Self::report_switch_state_static(&entity_id, on, to_engine).await;
        }
    }

    /// Register an entity with the engine (static version)
    async fn register_entity_static(
        entity: EntityDescriptor,
        device: Device,
        to_engine: &FromIntegrationSender,
    ) {
        let entity_id = entity.entity_id.clone();
        let msg = FromIntegrationMessage::EntityDiscovered {
            entity,
            device,
            integration_name: "cupra".to_string(),
        };
        if let Err(e) = to_engine.send(msg).await {
            warn!("Failed to send EntityDiscovered message: {}", e);
        } else {
            info!("Registered entity: {}", entity_id);
        }
    }

    /// Report a switch state change to the engine (static version)
    async fn report_switch_state_static(
        entity_id: &str,
        on: bool,
        to_engine: &FromIntegrationSender,
    ) {
        let msg = FromIntegrationMessage::SwitchStateChanged {
            entity_id: entity_id.to_string(),
            on,
        };
        if let Err(e) = to_engine.send(msg).await {
            warn!("Failed to send SwitchStateChanged message: {}", e);
        }
    }

    /// Handle a turn_on/turn_off command for a switch entity
    async fn handle_switch_command(&self, entity_id: &str, on: bool) {
        let (vin, kind) = {
            let switches = self.switches.lock().await;
            match switches.get(entity_id) {
                Some(switch) => (switch.vin.clone(), switch.kind),
                None => {
                    warn!("Switch command for unknown entity: {}", entity_id);
                    return;
                }
            }
        };

        let command = kind.command(on, self.config.target_temperature_c);
        info!("Dispatching {} for VIN {}", command, vin);

        match Self::dispatch_static(self.gateway.clone(), vin.clone(), command).await {
            Ok(true) => {
                // Vendor accepted: display the requested state now rather
                // than waiting a full refresh interval for telemetry.
                {
                    let mut switches = self.switches.lock().await;
                    if let Some(switch) = switches.get_mut(entity_id) {
                        switch.on = on;
                    }
                }
                if let Some(to_engine) = &self.to_engine {
                    Self::report_switch_state_static(entity_id, on, to_engine).await;
                }
            }
            Ok(false) => {
                error!("Vendor refused to {} for VIN {}", command, vin);
            }
            Err(e) => {
                error!("Failed to {} for VIN {}: {}", command, vin, e);
            }
        }
    }

    /// Handle a press for a button entity
    async fn handle_button_press(&self, entity_id: &str) {
        let (vin, kind) = {
            let buttons = self.buttons.lock().await;
            match buttons.get(entity_id) {
                Some(button) => (button.vin.clone(), button.kind),
                None => {
                    warn!("Button press for unknown entity: {}", entity_id);
                    return;
                }
            }
        };

        // The toggle needs the currently displayed charge speed; an
        // unreadable speed counts as not-maximum.
        let ac_speed_maximum = {
            let fleet = self.fleet.lock().await;
            fleet
                .get(&vin)
                .map(ac_charge_speed_maximum)
                .unwrap_or(false)
        };

        let command = kind.command(self.config.target_temperature_c, ac_speed_maximum);
        if let VehicleCommand::AcChargingSpeed { speed } = &command {
            debug!("Switching AC charge speed to {} for VIN {}", speed, vin);
        }
        info!("Dispatching {} for VIN {}", command, vin);

        match Self::dispatch_static(self.gateway.clone(), vin.clone(), command).await {
            // Buttons are stateless; telemetry reflects the outcome later
            Ok(true) => debug!("Vendor accepted {} for VIN {}", command, vin),
            Ok(false) => error!("Vendor refused to {} for VIN {}", command, vin),
            Err(e) => error!("Failed to {} for VIN {}: {}", command, vin, e),
        }
    }
}

#[async_trait]
impl<G: VehicleGateway + 'static> Integration for CupraIntegration<G> {
    fn name(&self) -> &str {
        "cupra"
    }

    async fn setup(&mut self, tx: FromIntegrationSender) -> Result<(), Box<dyn Error + Send>> {
        // Store sender for sending events to engine
        self.to_engine = Some(tx.clone());

        info!("Fetching vehicle fleet from account");
        let vehicles = Self::fetch_fleet(self.gateway.clone()).await?;
        info!("Account reports {} vehicle(s)", vehicles.len());

        // Build the entity set; it is fixed for the life of the process.
        {
            let mut switches = self.switches.lock().await;
            let mut buttons = self.buttons.lock().await;
            for vehicle in &vehicles {
                let device = vehicle_device(vehicle);
                info!(
                    "Discovered vehicle: {} (VIN {})",
                    vehicle.display_name(),
                    vehicle.vin
                );

                for kind in SwitchKind::ALL {
                    let switch = VehicleSwitch::new(kind, vehicle);
                    Self::register_entity_static(switch.descriptor(), device.clone(), &tx).await;
                    switches.insert(switch.entity_id(), switch);
                }
                for kind in ButtonKind::ALL {
                    let button = VehicleButton::new(kind, vehicle);
                    Self::register_entity_static(button.descriptor(), device.clone(), &tx).await;
                    buttons.insert(button.entity_id(), button);
                }
            }
        }

        // Push initial switch states so the engine snapshot starts populated
        {
            let switches = self.switches.lock().await;
            for (entity_id, switch) in switches.iter() {
                Self::report_switch_state_static(entity_id, switch.on, &tx).await;
            }
        }

        {
            let mut fleet = self.fleet.lock().await;
            *fleet = vehicles
                .into_iter()
                .map(|vehicle| (vehicle.vin.clone(), vehicle))
                .collect();
        }

        // Spawn background task to keep the fleet fresh
        let gateway = self.gateway.clone();
        let interval = Duration::from_secs(self.config.refresh_seconds);
        let fleet = self.fleet.clone();
        let switches = self.switches.clone();
        let task = tokio::spawn(async move {
            Self::refresh_task(gateway, interval, fleet, switches, tx).await;
        });
        self._refresh_task = Some(task);

        info!("CUPRA integration ready to handle commands");
        Ok(())
    }

    async fn handle_message(
        &mut self,
        msg: ToIntegrationMessage,
    ) -> Result<(), Box<dyn Error + Send>> {
        match msg {
            ToIntegrationMessage::SwitchCommand { entity_id, on } => {
                self.handle_switch_command(&entity_id, on).await;
            }
            ToIntegrationMessage::ButtonPress { entity_id } => {
                self.handle_button_press(&entity_id).await;
            }
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), Box<dyn Error + Send>> {
        info!("CUPRA integration shutting down");

        if let Some(handle) = self._refresh_task.take() {
            handle.abort();
            match handle.await {
                Ok(()) => info!("Fleet refresh task stopped"),
                Err(e) if e.is_cancelled() => info!("Fleet refresh task cancelled"),
                Err(e) => warn!("Fleet refresh task error: {}", e),
            }
        }

        Ok(())
    }
}

/// Device identity shared by every entity of one vehicle.
pub(super) fn vehicle_device(vehicle: &Vehicle) -> Device {
    Device {
        id: device_id(&vehicle.vin),
        identifiers: vec![("cupra".to_string(), format!("vw{}", vehicle.vin))],
        name: vehicle.display_name().to_string(),
        manufacturer: Some("CUPRA".to_string()),
        model: vehicle.model.clone(),
        entity_ids: Vec::new(),
    }
}
