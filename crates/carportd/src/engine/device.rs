use serde::Serialize;

/// A device in the carportd system.
///
/// A device represents a physical or logical device that contains one or
/// more entities; for vehicle integrations one device per vehicle, with the
/// vehicle's switches and buttons attached to it.
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    pub id: String,
    /// Stable (namespace, id) pairs identifying the device across restarts.
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub entity_ids: Vec<String>,
}

impl Device {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            identifiers: Vec::new(),
            name,
            manufacturer: None,
            model: None,
            entity_ids: Vec::new(),
        }
    }

    pub fn add_entity(&mut self, entity_id: String) {
        if !self.entity_ids.contains(&entity_id) {
            self.entity_ids.push(entity_id);
        }
    }
}
