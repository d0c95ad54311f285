//! Switch-state derivation from vehicle telemetry.
//!
//! The vendor reports free-form nested status objects; these functions
//! collapse them to the booleans the switches display. Reads distinguish
//! missing from malformed data for diagnostics, but every unreadable status
//! derives to off at the switch.

use carportd_connect::Vehicle;
use carportd_connect::scalar_str;
use carportd_connect::unwrap_value;
use serde_json::Value;
use thiserror::Error;

use super::capability::SwitchKind;

/// Spellings of `climatisationState` that mean the climate system is idle.
/// Anything else counts as running.
const CLIMATE_OFF_VALUES: [&str; 7] = ["off", "aus", "false", "inactive", "stopped", "0", ""];

/// Values of `chargingState` that mean energy is flowing.
const CHARGING_ON_VALUES: [&str; 4] = ["charging", "dc_charging", "ac_charging", "on"];

/// Why a status leaf could not be read.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    /// The domain, section or field is absent from the report.
    #[error("status {domain}/{section}/{field} not reported")]
    Missing {
        domain: &'static str,
        section: &'static str,
        field: &'static str,
    },

    /// The leaf exists but is not a scalar (null, object, or array).
    #[error("status {domain}/{section}/{field} has no scalar value")]
    Malformed {
        domain: &'static str,
        section: &'static str,
        field: &'static str,
    },
}

/// Read one status leaf as a lowercased string.
///
/// Accepts both raw scalars and the vendor's `{"value": ...}` wrapper.
pub fn status_value(
    vehicle: &Vehicle,
    domain: &'static str,
    section: &'static str,
    field: &'static str,
) -> Result<String, StatusError> {
    let section_value = vehicle.status(domain, section).ok_or(StatusError::Missing {
        domain,
        section,
        field,
    })?;

    let leaf = match section_value {
        Value::Object(map) => map.get(field).ok_or(StatusError::Missing {
            domain,
            section,
            field,
        })?,
        _ => {
            return Err(StatusError::Malformed {
                domain,
                section,
                field,
            });
        }
    };

    scalar_str(unwrap_value(leaf))
        .map(|s| s.to_lowercase())
        .ok_or(StatusError::Malformed {
            domain,
            section,
            field,
        })
}

/// Whether the climate system is running.
///
/// Primary source is `climatisationState`; when that is unreadable, a
/// pending `climatizationControl` start operation counts as on.
pub fn climate_on(vehicle: &Vehicle) -> bool {
    match status_value(
        vehicle,
        "climatisation",
        "climatisationStatus",
        "climatisationState",
    ) {
        Ok(state) => !CLIMATE_OFF_VALUES.contains(&state.as_str()),
        Err(_) => climatization_control_pending_start(vehicle),
    }
}

fn climatization_control_pending_start(vehicle: &Vehicle) -> bool {
    let Some(control) = vehicle.controls.get("climatizationControl") else {
        return false;
    };
    match scalar_str(unwrap_value(control)) {
        Some(operation) => operation.eq_ignore_ascii_case("start"),
        None => false,
    }
}

/// Whether the vehicle is currently charging.
pub fn charging_on(vehicle: &Vehicle) -> bool {
    status_value(vehicle, "charging", "chargingStatus", "chargingState")
        .map(|state| CHARGING_ON_VALUES.contains(&state.as_str()))
        .unwrap_or(false)
}

/// Whether AC charging is set to its maximum level.
pub fn ac_charge_speed_maximum(vehicle: &Vehicle) -> bool {
    status_value(vehicle, "charging", "chargingSettings", "maxChargeCurrentAC")
        .map(|speed| speed == "maximum")
        .unwrap_or(false)
}

/// Displayed state for one switch kind.
pub fn switch_on(vehicle: &Vehicle, kind: SwitchKind) -> bool {
    match kind {
        SwitchKind::Climate => climate_on(vehicle),
        SwitchKind::Charging => charging_on(vehicle),
    }
}
