//! Vehicle data model.
//!
//! Mirrors the shape the vendor account API reports: a flat list of vehicles,
//! each carrying nested telemetry "domains". Status leaves are kept opaque
//! (`serde_json::Value`) because their shape varies per vehicle generation;
//! the vendor frequently wraps scalars as `{"value": ...}`.

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// A single vehicle as reported by the vendor account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle identification number, the stable key for everything derived
    /// from this vehicle. Accepts both a raw string and the wrapped
    /// `{"value": "..."}` form on deserialization.
    #[serde(deserialize_with = "deserialize_wrapped_string")]
    pub vin: String,

    /// Display nickname chosen by the owner.
    #[serde(default)]
    pub nickname: Option<String>,

    /// Model name, if the account exposes it.
    #[serde(default)]
    pub model: Option<String>,

    /// Telemetry domains: domain name -> sub-domain name -> status object
    /// (e.g. `domains["charging"]["chargingStatus"]`).
    #[serde(default)]
    pub domains: HashMap<String, HashMap<String, Value>>,

    /// Pending control operations keyed by the vendor's control names
    /// (e.g. `climatizationControl`).
    #[serde(default)]
    pub controls: HashMap<String, Value>,
}

impl Vehicle {
    /// Name shown to users: the nickname when set, otherwise the VIN.
    pub fn display_name(&self) -> &str {
        match &self.nickname {
            Some(nickname) if !nickname.is_empty() => nickname,
            _ => &self.vin,
        }
    }

    /// Look up a status object, e.g. `status("charging", "chargingStatus")`.
    pub fn status(&self, domain: &str, section: &str) -> Option<&Value> {
        self.domains.get(domain)?.get(section)
    }
}

/// Strip one level of the vendor's value-wrapper convention.
///
/// Status leaves arrive either raw (`"charging"`) or wrapped
/// (`{"value": "charging"}`); both forms must read identically.
pub fn unwrap_value(value: &Value) -> &Value {
    match value.get("value") {
        Some(inner) => inner,
        None => value,
    }
}

/// Render a scalar leaf as a string the way the vendor's enums stringify.
///
/// Booleans become `"true"`/`"false"`, numbers their decimal form. Nulls,
/// objects and arrays have no scalar reading and yield `None`.
pub fn scalar_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Deserialize a string that may arrive wrapped as `{"value": "..."}`.
fn deserialize_wrapped_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct WrappedString;

    impl<'de> de::Visitor<'de> for WrappedString {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("string or {\"value\": string}")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v)
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            let mut value: Option<String> = None;
            while let Some(key) = map.next_key::<String>()? {
                if key == "value" {
                    value = Some(map.next_value()?);
                } else {
                    map.next_value::<de::IgnoredAny>()?;
                }
            }
            value.ok_or_else(|| serde::de::Error::missing_field("value"))
        }
    }

    deserializer.deserialize_any(WrappedString)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_raw_vin() {
        let vehicle: Vehicle = serde_json::from_str(
            r#"{"vin": "VSSZZZK1ZPF000001", "nickname": "Born"}"#,
        )
        .unwrap();

        assert_eq!(vehicle.vin, "VSSZZZK1ZPF000001");
        assert_eq!(vehicle.display_name(), "Born");
    }

    #[test]
    fn test_deserialize_wrapped_vin() {
        let vehicle: Vehicle = serde_json::from_str(
            r#"{"vin": {"value": "VSSZZZK1ZPF000002", "source": "account"}}"#,
        )
        .unwrap();

        assert_eq!(vehicle.vin, "VSSZZZK1ZPF000002");
    }

    #[test]
    fn test_display_name_falls_back_to_vin() {
        let vehicle: Vehicle =
            serde_json::from_str(r#"{"vin": "VSSZZZK1ZPF000003"}"#).unwrap();
        assert_eq!(vehicle.display_name(), "VSSZZZK1ZPF000003");

        let unnamed: Vehicle =
            serde_json::from_str(r#"{"vin": "VSSZZZK1ZPF000004", "nickname": ""}"#).unwrap();
        assert_eq!(unnamed.display_name(), "VSSZZZK1ZPF000004");
    }

    #[test]
    fn test_status_lookup() {
        let vehicle: Vehicle = serde_json::from_str(
            r#"{
                "vin": "VSSZZZK1ZPF000005",
                "domains": {
                    "charging": {
                        "chargingStatus": {"chargingState": {"value": "charging"}}
                    }
                }
            }"#,
        )
        .unwrap();

        let status = vehicle.status("charging", "chargingStatus").unwrap();
        assert_eq!(status["chargingState"]["value"], "charging");

        assert!(vehicle.status("charging", "chargingSettings").is_none());
        assert!(vehicle.status("climatisation", "climatisationStatus").is_none());
    }

    #[test]
    fn test_unwrap_value_accepts_both_forms() {
        let wrapped = serde_json::json!({"value": "maximum"});
        let raw = serde_json::json!("maximum");

        assert_eq!(unwrap_value(&wrapped), "maximum");
        assert_eq!(unwrap_value(&raw), "maximum");
    }

    #[test]
    fn test_scalar_str_stringifies_scalars() {
        assert_eq!(scalar_str(&serde_json::json!("off")), Some("off".to_string()));
        assert_eq!(scalar_str(&serde_json::json!(false)), Some("false".to_string()));
        assert_eq!(scalar_str(&serde_json::json!(0)), Some("0".to_string()));
        assert_eq!(scalar_str(&serde_json::Value::Null), None);
        assert_eq!(scalar_str(&serde_json::json!({"value": "off"})), None);
        assert_eq!(scalar_str(&serde_json::json!(["off"])), None);
    }
}
