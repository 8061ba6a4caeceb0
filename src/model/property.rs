use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field type of an external property field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Text,
    Select,
    Multiselect,
}

/// A selectable option of a select/multiselect field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyOption {
    pub id: String,
    pub name: String,
}

/// A property field definition, owned by the external property-field
/// subsystem. Conditions reference fields by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: PropertyType,
    /// Options for select/multiselect fields (empty for text fields)
    #[serde(default)]
    pub options: Vec<PropertyOption>,
}

impl PropertyField {
    pub fn text(id: impl Into<String>, name: impl Into<String>) -> Self {
        PropertyField {
            id: id.into(),
            name: name.into(),
            field_type: PropertyType::Text,
            options: Vec::new(),
        }
    }

    pub fn first_option_id(&self) -> Option<&str> {
        self.options.first().map(|o| o.id.as_str())
    }
}

/// Current value of a property field: a string for text and select fields,
/// a set of option ids for multiselect fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Options(Vec<String>),
}

/// The record the condition engine evaluates against: field definitions
/// plus current values, both supplied by the property-value provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyState {
    #[serde(default)]
    pub fields: Vec<PropertyField>,
    /// Current values keyed by field id
    #[serde(default)]
    pub values: IndexMap<String, PropertyValue>,
}

impl PropertyState {
    pub fn new(fields: Vec<PropertyField>) -> Self {
        PropertyState {
            fields,
            values: IndexMap::new(),
        }
    }

    pub fn field(&self, field_id: &str) -> Option<&PropertyField> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    pub fn value(&self, field_id: &str) -> Option<&PropertyValue> {
        self.values.get(field_id)
    }

    pub fn set_value(&mut self, field_id: impl Into<String>, value: PropertyValue) {
        self.values.insert(field_id.into(), value);
    }
}
