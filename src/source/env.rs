use toml::Value;

use super::entry::{PropertyEntry, PropertySource};
use super::SourceError;

/// Properties taken from environment variables.
///
/// `APP__SERVER__MAX_CONNECTIONS=10` with prefix `APP` and separator `__`
/// becomes `server.max-connections = "10"`. Values stay strings; the binder
/// converts them to the field type.
///
/// Keys won by this source are exempt from unknown-field checks, since the
/// environment routinely carries variables no target knows about.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
    vars: Option<Vec<(String, String)>>,
}

impl EnvSource {
    /// Reads the process environment on every snapshot.
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
            vars: None,
        }
    }

    /// Uses a fixed list of variables instead of the process environment.
    pub fn from_vars<I, K, V>(
        prefix: impl Into<String>,
        separator: impl Into<String>,
        vars: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut source = Self::new(prefix, separator);
        source.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        source
    }

    fn entry_for(&self, key: &str, value: &str) -> Option<PropertyEntry> {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let path_str = key.strip_prefix(&prefix_with_sep)?;
        if path_str.is_empty() {
            return None;
        }

        let path: Vec<String> = path_str
            .split(&self.separator)
            .map(|s| s.to_lowercase())
            .collect();

        Some(PropertyEntry::at_path(path, Value::String(value.to_string())))
    }
}

impl PropertySource for EnvSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn entries(&self) -> Result<Vec<PropertyEntry>, SourceError> {
        let entries = match &self.vars {
            Some(vars) => vars
                .iter()
                .filter_map(|(k, v)| self.entry_for(k, v))
                .collect(),
            None => std::env::vars()
                .filter_map(|(k, v)| self.entry_for(&k, &v))
                .collect(),
        };
        Ok(entries)
    }

    fn reports_unbound(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_maps_prefixed_vars_to_paths() {
        let source = EnvSource::from_vars(
            "APP",
            "__",
            [
                ("APP__SERVER__PORT", "8080"),
                ("APP__", "ignored"),
                ("OTHER__SERVER__PORT", "1"),
                ("APPSERVER__PORT", "2"),
            ],
        );
        let entries = source.entries().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, vec!["server", "port"]);
        assert_eq!(entries[0].value, Value::String("8080".into()));
    }

    #[test]
    fn test_env_is_exempt_from_unbound_checks() {
        assert!(!EnvSource::new("APP", "_").reports_unbound());
    }

    #[test]
    #[should_panic(expected = "separator must not be empty")]
    fn test_env_rejects_empty_separator() {
        let _ = EnvSource::new("APP", "");
    }
}
