//! Relaxed key names.
//!
//! Every key segment is reduced to lower kebab-case before it is stored or
//! looked up, so `maxConnections`, `max_connections`, `MAX_CONNECTIONS` and
//! `max-connections` all address the same property.

use toml::{Table, Value};

/// Returns the canonical form of a single key segment.
///
/// A run of capitals is one word, except that its last capital starts a new
/// word when a lower-case letter follows: `maxHTTPConnections` becomes
/// `max-http-connections`.
pub fn canonical_key(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let mut out = String::with_capacity(segment.len() + 4);

    for (index, &ch) in chars.iter().enumerate() {
        match ch {
            '_' | '-' => {
                if !out.is_empty() && !out.ends_with('-') {
                    out.push('-');
                }
            }
            c if c.is_uppercase() => {
                let prev = index.checked_sub(1).map(|i| chars[i]);
                let next = chars.get(index + 1).copied();
                let after_word = matches!(prev, Some(p) if p.is_lowercase() || p.is_ascii_digit());
                let ends_run = matches!(prev, Some(p) if p.is_uppercase())
                    && matches!(next, Some(n) if n.is_lowercase());
                if (after_word || ends_run) && !out.is_empty() && !out.ends_with('-') {
                    out.push('-');
                }
                out.extend(c.to_lowercase());
            }
            c => out.push(c),
        }
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Splits a dotted key into canonical segments.
///
/// Returns `None` for an empty key or one with an empty segment (`a..b`).
pub fn canonical_path(key: &str) -> Option<Vec<String>> {
    let segments: Vec<String> = key.trim().split('.').map(canonical_key).collect();
    if segments.iter().any(String::is_empty) {
        return None;
    }
    Some(segments)
}

/// Rewrites every table key inside `value` to its canonical form.
///
/// Keys that collide after canonicalization are merged, later ones winning.
pub fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Table(table) => Value::Table(canonicalize_table(table)),
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize_value).collect()),
        other => other,
    }
}

pub fn canonicalize_table(table: Table) -> Table {
    let mut out = Table::new();
    for (key, value) in table {
        let key = canonical_key(&key);
        if key.is_empty() {
            continue;
        }
        let value = canonicalize_value(value);
        match (out.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(overlay)) => {
                super::entry::deep_merge(existing, overlay);
            }
            (_, value) => {
                out.insert(key, value);
            }
        }
    }
    out
}
