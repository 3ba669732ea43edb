//! Style rules for the render layer
//!
//! One rule set per dataset: ordered (predicate, color) conditions over the
//! derived potential property, in the 3D Tiles styling language.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::classifier::Classifier;
use super::scorer::POTENTIAL_PROPERTY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleCondition {
    pub predicate: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    pub property: String,
    pub conditions: Vec<StyleCondition>,
}

impl StyleRule {
    pub fn from_classifier(classifier: &Classifier) -> Self {
        let property = POTENTIAL_PROPERTY.to_string();
        let conditions = classifier
            .bands()
            .iter()
            .map(|band| StyleCondition {
                predicate: match band.threshold {
                    Some(t) => format!("${{{}}} >= {}", property, t),
                    None => "true".to_string(),
                },
                color: format!("color('{}')", band.color),
            })
            .collect();

        Self {
            property,
            conditions,
        }
    }

    /// `{"color": {"conditions": [[predicate, color], ...]}}`
    pub fn to_json(&self) -> Value {
        let conditions: Vec<Value> = self
            .conditions
            .iter()
            .map(|c| json!([c.predicate, c.color]))
            .collect();
        json!({ "color": { "conditions": conditions } })
    }
}
