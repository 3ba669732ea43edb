use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::FeatureId;

/// Attribute names used by OSM building tilesets
pub const LONGITUDE_PROPERTY: &str = "cesium#longitude";
pub const LATITUDE_PROPERTY: &str = "cesium#latitude";
pub const HEIGHT_PROPERTY: &str = "cesium#estimatedHeight";
pub const ID_PROPERTY: &str = "elementId";

/// Access to a building record owned by the tile dataset
///
/// The engine only reads geometry and writes derived properties; it never
/// controls the lifetime of the record.
pub trait FeatureAttributeAccessor {
    fn feature_id(&self) -> Option<FeatureId>;
    fn longitude(&self) -> Option<f64>;
    fn latitude(&self) -> Option<f64>;
    fn height(&self) -> Option<f64>;

    /// Write a derived property into the extension slot
    fn set_derived(&mut self, key: &str, value: Value);
    fn derived(&self, key: &str) -> Option<Value>;
}

/// Building record backed by a property map, as decoded from a tile batch table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyFeature {
    properties: Map<String, Value>,
    #[serde(default)]
    derived: Map<String, Value>,
}

impl PropertyFeature {
    pub fn new(properties: Map<String, Value>) -> Self {
        Self {
            properties,
            derived: Map::new(),
        }
    }

    /// Record with the standard geometry properties set
    pub fn building(id: u64, longitude: f64, latitude: f64, height: f64) -> Self {
        let mut properties = Map::new();
        properties.insert(ID_PROPERTY.to_string(), Value::from(id));
        properties.insert(LONGITUDE_PROPERTY.to_string(), Value::from(longitude));
        properties.insert(LATITUDE_PROPERTY.to_string(), Value::from(latitude));
        properties.insert(HEIGHT_PROPERTY.to_string(), Value::from(height));
        Self::new(properties)
    }

    pub fn with_property(mut self, key: &str, value: Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    pub fn without_property(mut self, key: &str) -> Self {
        self.properties.remove(key);
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    fn number(&self, key: &str) -> Option<f64> {
        // Batch tables sometimes carry numbers as strings
        let n = match self.properties.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        n.is_finite().then_some(n)
    }
}

impl FeatureAttributeAccessor for PropertyFeature {
    fn feature_id(&self) -> Option<FeatureId> {
        match self.properties.get(ID_PROPERTY)? {
            Value::Number(n) => n.as_u64().map(FeatureId),
            Value::String(s) => s.trim().parse::<u64>().ok().map(FeatureId),
            _ => None,
        }
    }

    fn longitude(&self) -> Option<f64> {
        self.number(LONGITUDE_PROPERTY)
    }

    fn latitude(&self) -> Option<f64> {
        self.number(LATITUDE_PROPERTY)
    }

    fn height(&self) -> Option<f64> {
        self.number(HEIGHT_PROPERTY)
    }

    fn set_derived(&mut self, key: &str, value: Value) {
        self.derived.insert(key.to_string(), value);
    }

    fn derived(&self, key: &str) -> Option<Value> {
        self.derived.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_building_accessors() {
        let f = PropertyFeature::building(7, -122.35, 47.6, 12.5);
        assert_eq!(f.feature_id(), Some(FeatureId(7)));
        assert_eq!(f.longitude(), Some(-122.35));
        assert_eq!(f.latitude(), Some(47.6));
        assert_eq!(f.height(), Some(12.5));
    }

    #[test]
    fn test_string_and_garbage_values() {
        let f = PropertyFeature::building(1, 0.0, 0.0, 0.0)
            .with_property(HEIGHT_PROPERTY, json!(" 8.25 "))
            .with_property(LATITUDE_PROPERTY, json!("n/a"))
            .with_property(ID_PROPERTY, json!("123"));

        assert_eq!(f.height(), Some(8.25));
        assert_eq!(f.latitude(), None);
        assert_eq!(f.feature_id(), Some(FeatureId(123)));
    }

    #[test]
    fn test_missing_property() {
        let f = PropertyFeature::building(1, 1.0, 2.0, 3.0).without_property(HEIGHT_PROPERTY);
        assert_eq!(f.height(), None);
        assert_eq!(f.longitude(), Some(1.0));
    }

    #[test]
    fn test_derived_slot() {
        let mut f = PropertyFeature::default();
        assert_eq!(f.derived("potential"), None);
        f.set_derived("potential", json!(12.0));
        f.set_derived("potential", json!(13.0));
        assert_eq!(f.derived("potential"), Some(json!(13.0)));
    }
}
