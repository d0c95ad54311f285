//! The capabilities each vehicle exposes, and how they map onto entities
//! and gateway commands.
//!
//! One vehicle yields two switches and five buttons. The kinds own all id
//! and name derivation so the formats live in exactly one place.

use std::fmt;

use carportd_connect::ChargeSpeed;
use carportd_connect::ControlOperation;
use carportd_connect::GatewayError;
use carportd_connect::VehicleGateway;
use strum::Display;

/// Device id shared by every entity of one vehicle.
pub fn device_id(vin: &str) -> String {
    format!("vw{}", vin)
}

/// Switched capabilities of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SwitchKind {
    Climate,
    Charging,
}

impl SwitchKind {
    pub const ALL: [SwitchKind; 2] = [SwitchKind::Climate, SwitchKind::Charging];

    pub fn unique_id(&self, vin: &str) -> String {
        format!("{}-{}_switch", vin, self)
    }

    pub fn entity_id(&self, vin: &str) -> String {
        format!("switch.{}_{}", vin, self)
    }

    pub fn name(&self, vehicle_name: &str) -> String {
        format!("{} {}", vehicle_name, self.label())
    }

    fn label(&self) -> &'static str {
        match self {
            SwitchKind::Climate => "Climate",
            SwitchKind::Charging => "Charging",
        }
    }

    /// The gateway command realizing a turn_on/turn_off request.
    pub fn command(&self, on: bool, target_temperature_c: f64) -> VehicleCommand {
        let operation = if on {
            ControlOperation::Start
        } else {
            ControlOperation::Stop
        };
        match self {
            SwitchKind::Climate => VehicleCommand::Climatisation {
                operation,
                target_temperature_c,
            },
            SwitchKind::Charging => VehicleCommand::Charging { operation },
        }
    }
}

/// Pressable capabilities of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ButtonKind {
    StartClimate,
    StopClimate,
    StartCharging,
    StopCharging,
    ToggleAcChargeSpeed,
}

impl ButtonKind {
    pub const ALL: [ButtonKind; 5] = [
        ButtonKind::StartClimate,
        ButtonKind::StopClimate,
        ButtonKind::StartCharging,
        ButtonKind::StopCharging,
        ButtonKind::ToggleAcChargeSpeed,
    ];

    pub fn unique_id(&self, vin: &str) -> String {
        format!("{}-{}", vin, self)
    }

    pub fn entity_id(&self, vin: &str) -> String {
        format!("button.{}_{}", vin, self)
    }

    pub fn name(&self, vehicle_name: &str) -> String {
        format!("{} {}", vehicle_name, self.label())
    }

    fn label(&self) -> &'static str {
        match self {
            ButtonKind::StartClimate => "Start Climate",
            ButtonKind::StopClimate => "Stop Climate",
            ButtonKind::StartCharging => "Start Charging",
            ButtonKind::StopCharging => "Stop Charging",
            ButtonKind::ToggleAcChargeSpeed => "Toggle AC Charge Speed",
        }
    }

    /// The gateway command for a press.
    ///
    /// `ac_speed_maximum` is the currently displayed charge speed reading;
    /// the toggle dispatches the other level. When the reading is unavailable
    /// it counts as not-maximum, so the toggle asks for maximum.
    pub fn command(&self, target_temperature_c: f64, ac_speed_maximum: bool) -> VehicleCommand {
        match self {
            ButtonKind::StartClimate => VehicleCommand::Climatisation {
                operation: ControlOperation::Start,
                target_temperature_c,
            },
            ButtonKind::StopClimate => VehicleCommand::Climatisation {
                operation: ControlOperation::Stop,
                target_temperature_c,
            },
            ButtonKind::StartCharging => VehicleCommand::Charging {
                operation: ControlOperation::Start,
            },
            ButtonKind::StopCharging => VehicleCommand::Charging {
                operation: ControlOperation::Stop,
            },
            ButtonKind::ToggleAcChargeSpeed => {
                let current = if ac_speed_maximum {
                    ChargeSpeed::Maximum
                } else {
                    ChargeSpeed::Reduced
                };
                VehicleCommand::AcChargingSpeed {
                    speed: current.opposite(),
                }
            }
        }
    }
}

/// A concrete command for a gateway, decoupled from which entity asked for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleCommand {
    Climatisation {
        operation: ControlOperation,
        target_temperature_c: f64,
    },
    Charging {
        operation: ControlOperation,
    },
    AcChargingSpeed {
        speed: ChargeSpeed,
    },
}

impl VehicleCommand {
    pub fn execute<G: VehicleGateway + ?Sized>(
        &self,
        gateway: &G,
        vin: &str,
    ) -> Result<bool, GatewayError> {
        match *self {
            VehicleCommand::Climatisation {
                operation,
                target_temperature_c,
            } => gateway.set_climatisation(vin, operation, target_temperature_c),
            VehicleCommand::Charging { operation } => gateway.start_stop_charging(vin, operation),
            VehicleCommand::AcChargingSpeed { speed } => gateway.set_ac_charging_speed(vin, speed),
        }
    }
}

impl fmt::Display for VehicleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleCommand::Climatisation { operation, .. } => {
                write!(f, "{} climatisation", operation)
            }
            VehicleCommand::Charging { operation } => write!(f, "{} charging", operation),
            VehicleCommand::AcChargingSpeed { speed } => {
                write!(f, "set ac charging speed to {}", speed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    const VIN: &str = "VSSZZZK1ZPF000001";

    #[test]
    fn test_switch_ids() {
        assert_snapshot!(SwitchKind::Climate.unique_id(VIN), @"VSSZZZK1ZPF000001-climate_switch");
        assert_snapshot!(SwitchKind::Climate.entity_id(VIN), @"switch.VSSZZZK1ZPF000001_climate");
        assert_snapshot!(SwitchKind::Charging.unique_id(VIN), @"VSSZZZK1ZPF000001-charging_switch");
        assert_snapshot!(SwitchKind::Charging.entity_id(VIN), @"switch.VSSZZZK1ZPF000001_charging");
    }

    #[test]
    fn test_button_ids() {
        assert_snapshot!(ButtonKind::StartClimate.unique_id(VIN), @"VSSZZZK1ZPF000001-start_climate");
        assert_snapshot!(ButtonKind::StopClimate.unique_id(VIN), @"VSSZZZK1ZPF000001-stop_climate");
        assert_snapshot!(ButtonKind::StartCharging.unique_id(VIN), @"VSSZZZK1ZPF000001-start_charging");
        assert_snapshot!(ButtonKind::StopCharging.unique_id(VIN), @"VSSZZZK1ZPF000001-stop_charging");
        assert_snapshot!(
            ButtonKind::ToggleAcChargeSpeed.unique_id(VIN),
            @"VSSZZZK1ZPF000001-toggle_ac_charge_speed"
        );
        assert_snapshot!(
            ButtonKind::ToggleAcChargeSpeed.entity_id(VIN),
            @"button.VSSZZZK1ZPF000001_toggle_ac_charge_speed"
        );
    }

    #[test]
    fn test_names_carry_vehicle_name() {
        assert_eq!(SwitchKind::Climate.name("Born"), "Born Climate");
        assert_eq!(
            ButtonKind::ToggleAcChargeSpeed.name("Born"),
            "Born Toggle AC Charge Speed"
        );
    }

    #[test]
    fn test_switch_commands() {
        assert_eq!(
            SwitchKind::Climate.command(true, 21.0),
            VehicleCommand::Climatisation {
                operation: ControlOperation::Start,
                target_temperature_c: 21.0,
            }
        );
        assert_eq!(
            SwitchKind::Charging.command(false, 0.0),
            VehicleCommand::Charging {
                operation: ControlOperation::Stop,
            }
        );
    }

    #[test]
    fn test_toggle_command_flips_speed() {
        assert_eq!(
            ButtonKind::ToggleAcChargeSpeed.command(0.0, true),
            VehicleCommand::AcChargingSpeed {
                speed: ChargeSpeed::Reduced,
            }
        );
        assert_eq!(
            ButtonKind::ToggleAcChargeSpeed.command(0.0, false),
            VehicleCommand::AcChargingSpeed {
                speed: ChargeSpeed::Maximum,
            }
        );
    }

    #[test]
    fn test_command_display() {
        let start = VehicleCommand::Climatisation {
            operation: ControlOperation::Start,
            target_temperature_c: 0.0,
        };
        assert_eq!(start.to_string(), "start climatisation");

        let speed = VehicleCommand::AcChargingSpeed {
            speed: ChargeSpeed::Reduced,
        };
        assert_eq!(speed.to_string(), "set ac charging speed to reduced");
    }
}
