//! The gateway trait every vendor client implements.
//!
//! All methods are blocking; callers that live on an async runtime are
//! expected to move calls onto a blocking-capable thread themselves.

use strum::Display;
use thiserror::Error;

use crate::model::Vehicle;

/// Direction of a start/stop style command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ControlOperation {
    Start,
    Stop,
}

/// AC charging speed setting. The vendor knows exactly two levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChargeSpeed {
    Maximum,
    Reduced,
}

impl ChargeSpeed {
    /// The other of the two levels, used when toggling.
    pub fn opposite(self) -> Self {
        match self {
            ChargeSpeed::Maximum => ChargeSpeed::Reduced,
            ChargeSpeed::Reduced => ChargeSpeed::Maximum,
        }
    }
}

/// Errors surfaced by a vehicle gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The vendor session is missing, expired, or refused re-authentication.
    #[error("vendor session invalid or expired")]
    Session,

    /// The vendor API could not be reached.
    #[error("transport failure talking to vendor API: {0}")]
    Transport(String),

    /// The account does not contain a vehicle with this VIN.
    #[error("no vehicle with VIN {0} in this account")]
    UnknownVehicle(String),

    /// The vendor processed the request and rejected it.
    #[error("vendor rejected the request: {0}")]
    Vendor(String),
}

/// A connected-car account capable of reporting vehicles and accepting
/// remote commands.
///
/// Command methods return `Ok(true)` when the vendor accepted the command,
/// `Ok(false)` when it was delivered but refused. Acceptance does not mean
/// the vehicle has finished acting on it; telemetry catches up on the next
/// fetch.
pub trait VehicleGateway: Send + Sync {
    /// Fetch a fresh snapshot of every vehicle in the account.
    fn vehicles(&self) -> Result<Vec<Vehicle>, GatewayError>;

    /// Start or stop climatisation. A `target_temperature_c` of `0.0` keeps
    /// the temperature currently stored in the vehicle.
    fn set_climatisation(
        &self,
        vin: &str,
        operation: ControlOperation,
        target_temperature_c: f64,
    ) -> Result<bool, GatewayError>;

    /// Start or stop charging.
    fn start_stop_charging(
        &self,
        vin: &str,
        operation: ControlOperation,
    ) -> Result<bool, GatewayError>;

    /// Switch the AC charging speed between its two levels.
    fn set_ac_charging_speed(&self, vin: &str, speed: ChargeSpeed) -> Result<bool, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_operation_renders_lowercase() {
        assert_eq!(ControlOperation::Start.to_string(), "start");
        assert_eq!(ControlOperation::Stop.to_string(), "stop");
    }

    #[test]
    fn test_charge_speed_renders_lowercase() {
        assert_eq!(ChargeSpeed::Maximum.to_string(), "maximum");
        assert_eq!(ChargeSpeed::Reduced.to_string(), "reduced");
    }

    #[test]
    fn test_charge_speed_opposite() {
        assert_eq!(ChargeSpeed::Maximum.opposite(), ChargeSpeed::Reduced);
        assert_eq!(ChargeSpeed::Reduced.opposite(), ChargeSpeed::Maximum);
    }
}
