//! An in-memory gateway for development and tests.
//!
//! Holds a mutable fleet behind a mutex, applies commands to it the way the
//! real vendor eventually would, and keeps a log of every command issued so
//! tests can assert on dispatch. Failure injection covers the three shapes
//! callers must survive: refresh errors, transport errors, and polite
//! vendor refusals.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::gateway::ChargeSpeed;
use crate::gateway::ControlOperation;
use crate::gateway::GatewayError;
use crate::gateway::VehicleGateway;
use crate::model::Vehicle;

/// Errors loading a fleet description from disk.
#[derive(Debug, Error)]
pub enum FleetFileError {
    #[error("failed to read fleet file {0}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse fleet file {0}")]
    Parse(PathBuf, #[source] serde_json::Error),
}

/// A command a gateway was asked to perform, as recorded by
/// [`SimulatedGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum IssuedCommand {
    Climatisation {
        vin: String,
        operation: ControlOperation,
        target_temperature_c: f64,
    },
    Charging {
        vin: String,
        operation: ControlOperation,
    },
    AcChargingSpeed {
        vin: String,
        speed: ChargeSpeed,
    },
}

/// A [`VehicleGateway`] backed by in-memory state instead of the vendor API.
pub struct SimulatedGateway {
    fleet: Mutex<Vec<Vehicle>>,
    issued: Mutex<Vec<IssuedCommand>>,
    reject_commands: Mutex<bool>,
    fail_next_command: Mutex<Option<GatewayError>>,
    fail_next_refresh: Mutex<Option<GatewayError>>,
}

impl SimulatedGateway {
    pub fn new(fleet: Vec<Vehicle>) -> Self {
        SimulatedGateway {
            fleet: Mutex::new(fleet),
            issued: Mutex::new(Vec::new()),
            reject_commands: Mutex::new(false),
            fail_next_command: Mutex::new(None),
            fail_next_refresh: Mutex::new(None),
        }
    }

    /// Load a fleet from a JSON file containing an array of vehicles.
    pub fn from_fleet_file(path: &Path) -> Result<Self, FleetFileError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FleetFileError::Io(path.to_path_buf(), e))?;
        let fleet: Vec<Vehicle> = serde_json::from_str(&raw)
            .map_err(|e| FleetFileError::Parse(path.to_path_buf(), e))?;
        Ok(Self::new(fleet))
    }

    /// Every command issued so far, oldest first. Rejected and failed
    /// commands are recorded too; the log tracks dispatch, not outcome.
    pub fn issued_commands(&self) -> Vec<IssuedCommand> {
        self.issued.lock().expect("issued mutex poisoned").clone()
    }

    /// While set, commands are delivered but refused (`Ok(false)`).
    pub fn set_reject_commands(&self, reject: bool) {
        *self.reject_commands.lock().expect("reject mutex poisoned") = reject;
    }

    /// Fail the next command with `error`, then return to normal.
    pub fn fail_next_command(&self, error: GatewayError) {
        *self.fail_next_command.lock().expect("fail mutex poisoned") = Some(error);
    }

    /// Fail the next [`VehicleGateway::vehicles`] call with `error`.
    pub fn fail_next_refresh(&self, error: GatewayError) {
        *self.fail_next_refresh.lock().expect("fail mutex poisoned") = Some(error);
    }

    fn record(&self, command: IssuedCommand) {
        self.issued
            .lock()
            .expect("issued mutex poisoned")
            .push(command);
    }

    /// Common outcome handling for every command: injected failure first,
    /// then the reject flag, then the mutation.
    fn apply<F>(&self, vin: &str, mutate: F) -> Result<bool, GatewayError>
    where
        F: FnOnce(&mut Vehicle),
    {
        if let Some(error) = self
            .fail_next_command
            .lock()
            .expect("fail mutex poisoned")
            .take()
        {
            return Err(error);
        }
        if *self.reject_commands.lock().expect("reject mutex poisoned") {
            return Ok(false);
        }

        let mut fleet = self.fleet.lock().expect("fleet mutex poisoned");
        match fleet.iter_mut().find(|v| v.vin == vin) {
            Some(vehicle) => {
                mutate(vehicle);
                Ok(true)
            }
            None => Err(GatewayError::UnknownVehicle(vin.to_string())),
        }
    }
}

impl VehicleGateway for SimulatedGateway {
    fn vehicles(&self) -> Result<Vec<Vehicle>, GatewayError> {
        if let Some(error) = self
            .fail_next_refresh
            .lock()
            .expect("fail mutex poisoned")
            .take()
        {
            return Err(error);
        }
        Ok(self.fleet.lock().expect("fleet mutex poisoned").clone())
    }

    fn set_climatisation(
        &self,
        vin: &str,
        operation: ControlOperation,
        target_temperature_c: f64,
    ) -> Result<bool, GatewayError> {
        self.record(IssuedCommand::Climatisation {
            vin: vin.to_string(),
            operation,
            target_temperature_c,
        });
        self.apply(vin, |vehicle| {
            let state = match operation {
                ControlOperation::Start => "heating",
                ControlOperation::Stop => "off",
            };
            set_status(
                vehicle,
                "climatisation",
                "climatisationStatus",
                "climatisationState",
                json!({"value": state}),
            );
            if target_temperature_c > 0.0 {
                set_status(
                    vehicle,
                    "climatisation",
                    "climatisationSettings",
                    "targetTemperature_C",
                    json!({"value": target_temperature_c}),
                );
            }
        })
    }

    fn start_stop_charging(
        &self,
        vin: &str,
        operation: ControlOperation,
    ) -> Result<bool, GatewayError> {
        self.record(IssuedCommand::Charging {
            vin: vin.to_string(),
            operation,
        });
        self.apply(vin, |vehicle| {
            let state = match operation {
                ControlOperation::Start => "charging",
                ControlOperation::Stop => "readyForCharging",
            };
            set_status(
                vehicle,
                "charging",
                "chargingStatus",
                "chargingState",
                json!({"value": state}),
            );
        })
    }

    fn set_ac_charging_speed(&self, vin: &str, speed: ChargeSpeed) -> Result<bool, GatewayError> {
        self.record(IssuedCommand::AcChargingSpeed {
            vin: vin.to_string(),
            speed,
        });
        self.apply(vin, |vehicle| {
            set_status(
                vehicle,
                "charging",
                "chargingSettings",
                "maxChargeCurrentAC",
                json!({"value": speed.to_string()}),
            );
        })
    }
}

/// Two vehicles in contrasting states, enough to drive a UI by hand.
pub fn demo_fleet() -> Vec<Vehicle> {
    vec![
        demo_vehicle(
            "VSSZZZK1ZPF000001",
            "Born",
            "Born",
            "off",
            "readyForCharging",
            "maximum",
        ),
        demo_vehicle(
            "VSSZZZKMZRF012345",
            "Tavascan",
            "Tavascan",
            "heating",
            "charging",
            "reduced",
        ),
    ]
}

fn demo_vehicle(
    vin: &str,
    nickname: &str,
    model: &str,
    climatisation_state: &str,
    charging_state: &str,
    max_charge_current_ac: &str,
) -> Vehicle {
    let mut vehicle = Vehicle {
        vin: vin.to_string(),
        nickname: Some(nickname.to_string()),
        model: Some(model.to_string()),
        domains: HashMap::new(),
        controls: HashMap::new(),
    };
    set_status(
        &mut vehicle,
        "climatisation",
        "climatisationStatus",
        "climatisationState",
        json!({"value": climatisation_state}),
    );
    set_status(
        &mut vehicle,
        "charging",
        "chargingStatus",
        "chargingState",
        json!({"value": charging_state}),
    );
    set_status(
        &mut vehicle,
        "charging",
        "chargingSettings",
        "maxChargeCurrentAC",
        json!({"value": max_charge_current_ac}),
    );
    vehicle
}

fn set_status(vehicle: &mut Vehicle, domain: &str, section: &str, field: &str, value: Value) {
    let section_obj = vehicle
        .domains
        .entry(domain.to_string())
        .or_default()
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(serde_json::Map::new()));
    if let Value::Object(map) = section_obj {
        map.insert(field.to_string(), value);
    }
}
