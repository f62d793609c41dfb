use crate::error::TickbreedError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), TickbreedError>;
    fn to_manifest(&self) -> ConfigManifest;
}

/// Explicit field listing of one section, used for settings reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigManifest {
    pub section: String,
    pub fields: Vec<FieldManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldManifest {
    pub name: String,
    pub value: serde_json::Value,
    pub description: String,
}

impl FieldManifest {
    pub fn new(name: &str, value: serde_json::Value, description: &str) -> Self {
        Self {
            name: name.to_string(),
            value,
            description: description.to_string(),
        }
    }
}

impl ConfigManifest {
    /// One "name value" line per field
    pub fn render(&self) -> String {
        let mut out = String::new();
        for field in &self.fields {
            out.push_str(&field.name);
            out.push(' ');
            match &field.value {
                serde_json::Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
            out.push('\n');
        }
        out
    }
}

pub(crate) fn ensure(condition: bool, message: impl Into<String>) -> Result<(), TickbreedError> {
    if condition {
        Ok(())
    } else {
        Err(TickbreedError::Configuration(message.into()))
    }
}

pub(crate) fn zero_to_one(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}
