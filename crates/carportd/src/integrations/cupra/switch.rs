use carportd_connect::Vehicle;

use super::capability::SwitchKind;
use super::capability::device_id;
use super::status::switch_on;
use crate::engine::EntityDescriptor;
use crate::engine::Platform;

/// Switch entity backed by one vehicle capability.
#[derive(Debug, Clone)]
pub struct VehicleSwitch {
    pub kind: SwitchKind,
    pub vin: String,

    /// Human-readable name, fixed at setup.
    pub name: String,

    /// Displayed state. Updated from telemetry on refresh, and optimistically
    /// after the vendor accepts a command.
    pub on: bool,
}

impl VehicleSwitch {
    pub fn new(kind: SwitchKind, vehicle: &Vehicle) -> Self {
        Self {
            kind,
            vin: vehicle.vin.clone(),
            name: kind.name(vehicle.display_name()),
            on: switch_on(vehicle, kind),
        }
    }

    pub fn entity_id(&self) -> String {
        self.kind.entity_id(&self.vin)
    }

    pub fn descriptor(&self) -> EntityDescriptor {
        EntityDescriptor {
            entity_id: self.entity_id(),
            unique_id: self.kind.unique_id(&self.vin),
            name: self.name.clone(),
            platform: Platform::Switch,
            device_id: device_id(&self.vin),
        }
    }

    /// Recompute the displayed state from a fresh snapshot. A vehicle absent
    /// from the snapshot derives to off. Returns whether the state changed.
    pub fn refresh(&mut self, vehicle: Option<&Vehicle>) -> bool {
        let on = vehicle.map(|v| switch_on(v, self.kind)).unwrap_or(false);
        let changed = on != self.on;
        self.on = on;
        changed
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn heating_vehicle() -> Vehicle {
        serde_json::from_value(json!({
            "vin": "VSSZZZK1ZPF000001",
            "nickname": "Born",
            "domains": {
                "climatisation": {
                    "climatisationStatus": {"climatisationState": {"value": "heating"}}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_new_derives_initial_state() {
        let vehicle = heating_vehicle();
        let climate = VehicleSwitch::new(SwitchKind::Climate, &vehicle);
        assert!(climate.on);
        assert_eq!(climate.entity_id(), "switch.VSSZZZK1ZPF000001_climate");
        assert_eq!(climate.name, "Born Climate");

        // No charging telemetry at all
        let charging = VehicleSwitch::new(SwitchKind::Charging, &vehicle);
        assert!(!charging.on);
    }

    #[test]
    fn test_descriptor() {
        let vehicle = heating_vehicle();
        let descriptor = VehicleSwitch::new(SwitchKind::Climate, &vehicle).descriptor();

        assert_eq!(descriptor.unique_id, "VSSZZZK1ZPF000001-climate_switch");
        assert_eq!(descriptor.platform, Platform::Switch);
        assert_eq!(descriptor.device_id, "vwVSSZZZK1ZPF000001");
    }

    #[test]
    fn test_refresh_reports_changes() {
        let vehicle = heating_vehicle();
        let mut switch = VehicleSwitch::new(SwitchKind::Climate, &vehicle);

        assert!(!switch.refresh(Some(&vehicle)), "unchanged state");

        let off: Vehicle = serde_json::from_value(json!({
            "vin": "VSSZZZK1ZPF000001",
            "domains": {
                "climatisation": {
                    "climatisationStatus": {"climatisationState": {"value": "off"}}
                }
            }
        }))
        .unwrap();
        assert!(switch.refresh(Some(&off)));
        assert!(!switch.on);
    }

    #[test]
    fn test_refresh_missing_vehicle_is_off() {
        let vehicle = heating_vehicle();
        let mut switch = VehicleSwitch::new(SwitchKind::Climate, &vehicle);
        assert!(switch.on);

        assert!(switch.refresh(None));
        assert!(!switch.on);
    }
}
