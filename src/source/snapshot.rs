use std::collections::HashMap;

use toml::{Table, Value};
use tracing::debug;

use super::entry::merge_at_path;
use super::name::{canonical_key, canonical_path, canonicalize_table, canonicalize_value};
use super::sources::PropertySources;
use super::SourceError;

#[derive(Debug, Clone)]
struct SourceInfo {
    name: String,
    reports_unbound: bool,
}

/// Merged, canonicalized view of a set of property sources.
///
/// Captured once per bind and never mutated afterwards. Besides the merged
/// table it remembers which source last wrote each leaf key.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    root: Table,
    origins: HashMap<String, usize>,
    sources: Vec<SourceInfo>,
}

impl Snapshot {
    pub fn capture(sources: &PropertySources) -> Result<Self, SourceError> {
        let mut snapshot = Self::default();

        for (index, source) in sources.iter().enumerate() {
            snapshot.sources.push(SourceInfo {
                name: source.name().to_string(),
                reports_unbound: source.reports_unbound(),
            });

            for entry in source.entries()? {
                let path: Vec<String> = entry.path.iter().map(|s| canonical_key(s)).collect();
                if path.iter().any(String::is_empty) {
                    debug!(source = source.name(), path = ?entry.path, "skipping entry with empty key segment");
                    continue;
                }
                let value = canonicalize_value(entry.value);
                record_origins(&mut snapshot.origins, &path.join("."), &value, index);
                merge_at_path(&mut snapshot.root, &path, value);
            }
        }

        debug!(
            sources = snapshot.sources.len(),
            keys = snapshot.len(),
            "captured property snapshot"
        );
        Ok(snapshot)
    }

    /// Builds a snapshot from a single table with no source attribution.
    pub fn from_table(table: Table) -> Self {
        Self {
            root: canonicalize_table(table),
            ..Self::default()
        }
    }

    pub fn root(&self) -> &Table {
        &self.root
    }

    /// Looks up a dotted key, relaxed-name aware.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.get_path(&canonical_path(key)?)
    }

    /// Looks up already-canonical segments.
    pub fn get_path(&self, segments: &[String]) -> Option<&Value> {
        let (first, rest) = segments.split_first()?;
        let mut current = self.root.get(first)?;
        for part in rest {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    /// Name of the source that last wrote the canonical leaf `key`.
    pub fn origin(&self, key: &str) -> Option<&str> {
        self.origins
            .get(key)
            .map(|&index| self.sources[index].name.as_str())
    }

    /// Whether the canonical leaf `key` counts in unknown-field checks.
    pub fn reports_unbound(&self, key: &str) -> bool {
        self.origins
            .get(key)
            .map_or(true, |&index| self.sources[index].reports_unbound)
    }

    /// Number of leaf keys.
    pub fn len(&self) -> usize {
        count_leaves(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

fn record_origins(origins: &mut HashMap<String, usize>, key: &str, value: &Value, index: usize) {
    match value {
        Value::Table(table) if !table.is_empty() => {
            for (name, nested) in table {
                let nested_key = if key.is_empty() {
                    name.clone()
                } else {
                    format!("{key}.{name}")
                };
                record_origins(origins, &nested_key, nested, index);
            }
        }
        _ if key.is_empty() => {}
        _ => {
            origins.insert(key.to_string(), index);
        }
    }
}

fn count_leaves(table: &Table) -> usize {
    table
        .values()
        .map(|value| match value {
            Value::Table(nested) if !nested.is_empty() => count_leaves(nested),
            _ => 1,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::EnvSource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_later_sources_override_across_spellings() {
        let sources = PropertySources::new()
            .with_map("defaults", [("service.foo.max-connections", "5"), ("service.foo.host", "a")])
            .with_map("overrides", [("service.foo.maxConnections", "10")]);
        let snapshot = sources.snapshot().unwrap();

        assert_eq!(snapshot.get("service.foo.max_connections").and_then(Value::as_str), Some("10"));
        assert_eq!(snapshot.get("service.foo.host").and_then(Value::as_str), Some("a"));
        assert_eq!(snapshot.origin("service.foo.max-connections"), Some("overrides"));
        assert_eq!(snapshot.origin("service.foo.host"), Some("defaults"));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_file_and_env_layers() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[service.foo]\nport = 80\nname = \"svc\"").unwrap();

        let sources = PropertySources::new()
            .with_file(file.path(), true)
            .with_source(EnvSource::from_vars("APP", "__", [("APP__SERVICE__FOO__PORT", "9090")]));
        let snapshot = sources.snapshot().unwrap();

        assert_eq!(snapshot.get("service.foo.port").and_then(Value::as_str), Some("9090"));
        assert_eq!(snapshot.get("service.foo.name").and_then(Value::as_str), Some("svc"));
        assert!(!snapshot.reports_unbound("service.foo.port"));
        assert!(snapshot.reports_unbound("service.foo.name"));
    }

    #[test]
    fn test_source_error_propagates() {
        let sources = PropertySources::new().with_file("/nonexistent/app.toml", true);
        assert!(matches!(sources.snapshot(), Err(SourceError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let sources = PropertySources::new().with_map("defaults", [("a..b", "1"), ("c", "2")]);
        let snapshot = sources.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("c").is_some());
    }

    #[test]
    fn test_from_table_canonicalizes() {
        let table: Table = toml::from_str("[myGroup]\nsome_key = 1").unwrap();
        let snapshot = Snapshot::from_table(table);
        assert_eq!(snapshot.get("my-group.some-key").and_then(Value::as_integer), Some(1));
        assert!(snapshot.reports_unbound("my-group.some-key"));
        assert_eq!(snapshot.origin("my-group.some-key"), None);
    }
}
