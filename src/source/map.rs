use toml::Value;

use super::entry::{PropertyEntry, PropertySource};
use super::SourceError;

/// In-memory properties keyed by dotted names, e.g. defaults or command-line overrides.
#[derive(Debug, Clone)]
pub struct MapSource {
    name: String,
    properties: Vec<(String, String)>,
}

impl MapSource {
    pub fn new<I, K, V>(name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl PropertySource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> Result<Vec<PropertyEntry>, SourceError> {
        Ok(self
            .properties
            .iter()
            .map(|(key, value)| {
                let path = key.split('.').map(str::to_string).collect();
                PropertyEntry::at_path(path, Value::String(value.clone()))
            })
            .collect())
    }
}
