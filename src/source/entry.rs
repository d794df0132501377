use toml::{Table, Value};

use super::SourceError;

/// A value contributed by a property source at a key path.
///
/// An empty path denotes a root table that is merged at the top level.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry {
    pub path: Vec<String>,
    pub value: Value,
}

impl PropertyEntry {
    pub fn root(table: Table) -> Self {
        Self {
            path: Vec::new(),
            value: Value::Table(table),
        }
    }

    pub fn at_path(path: Vec<String>, value: Value) -> Self {
        Self { path, value }
    }
}

/// One named layer of configuration.
pub trait PropertySource: Send + Sync + std::fmt::Debug {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    fn entries(&self) -> Result<Vec<PropertyEntry>, SourceError>;

    /// Whether keys won by this source take part in unknown-field checks.
    fn reports_unbound(&self) -> bool {
        true
    }
}

pub(crate) fn merge_at_path(table: &mut Table, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        if let Value::Table(overlay) = value {
            deep_merge(table, overlay);
        }
        return;
    };

    if rest.is_empty() {
        match (table.get_mut(first), value) {
            (Some(Value::Table(base)), Value::Table(overlay)) => {
                deep_merge(base, overlay);
            }
            (_, value) => {
                table.insert(first.clone(), value);
            }
        }
        return;
    }

    if !matches!(table.get(first), Some(Value::Table(_))) {
        table.insert(first.clone(), Value::Table(Table::new()));
    }

    if let Some(Value::Table(nested)) = table.get_mut(first) {
        merge_at_path(nested, rest, value);
    }
}

pub(crate) fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(base_table)), Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
