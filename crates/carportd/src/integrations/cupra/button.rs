use carportd_connect::Vehicle;

use super::capability::ButtonKind;
use super::capability::device_id;
use crate::engine::EntityDescriptor;
use crate::engine::Platform;

/// Stateless button entity bound to one vehicle.
#[derive(Debug, Clone)]
pub struct VehicleButton {
    pub kind: ButtonKind,
    pub vin: String,
    pub name: String,
}

impl VehicleButton {
    pub fn new(kind: ButtonKind, vehicle: &Vehicle) -> Self {
        Self {
            kind,
            vin: vehicle.vin.clone(),
            name: kind.name(vehicle.display_name()),
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
            platform: Platform::Button,
            device_id: device_id(&self.vin),
        }
    }
}
