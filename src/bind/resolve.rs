//! Placeholder resolution for property values.
//!
//! Supports `${section.field}` references against a [`Snapshot`], with an
//! optional default after the first top-level colon: `${section.field:fallback}`.
//! Use `$${...}` to escape and produce a literal `${...}`.

use std::iter::Peekable;
use std::str::Chars;

use toml::Value;

use super::convert::scalar_to_string;
use super::PlaceholderError;
use crate::source::{canonical_path, Snapshot};

/// Resolves `${...}` references against one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderResolver<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> PlaceholderResolver<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }

    /// Resolves every reference in `text`.
    ///
    /// Referenced values are resolved recursively; a reference that leads back
    /// to itself is a [`PlaceholderError::CircularReference`].
    pub fn resolve(&self, text: &str) -> Result<String, PlaceholderError> {
        self.resolve_text(text, &mut Vec::new())
    }

    /// Resolves references in every string inside `value`.
    pub fn resolve_value(&self, value: &Value) -> Result<Value, PlaceholderError> {
        match value {
            Value::String(s) => Ok(Value::String(self.resolve(s)?)),
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(item))
                .collect::<Result<_, _>>()
                .map(Value::Array),
            Value::Table(table) => table
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.resolve_value(item)?)))
                .collect::<Result<_, _>>()
                .map(Value::Table),
            other => Ok(other.clone()),
        }
    }

    fn resolve_text(&self, text: &str, visiting: &mut Vec<String>) -> Result<String, PlaceholderError> {
        let mut result = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch != '$' {
                result.push(ch);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    // Escape sequence: $$ -> $
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let body = consume_placeholder(&mut chars)
                        .ok_or(PlaceholderError::UnclosedReference)?;
                    result.push_str(&self.resolve_placeholder(&body, visiting)?);
                }
                _ => result.push('$'),
            }
        }

        Ok(result)
    }

    fn resolve_placeholder(
        &self,
        body: &str,
        visiting: &mut Vec<String>,
    ) -> Result<String, PlaceholderError> {
        let (raw_key, default) = split_default(body);
        let key = self.resolve_text(raw_key, visiting)?;
        let segments = canonical_path(&key)
            .ok_or_else(|| PlaceholderError::InvalidReferencePath(key.clone()))?;
        let canonical = segments.join(".");

        let Some(value) = self.snapshot.get_path(&segments) else {
            return match default {
                Some(default) => self.resolve_text(default, visiting),
                None => Err(PlaceholderError::ReferenceNotFound(key)),
            };
        };

        if visiting.contains(&canonical) {
            return Err(PlaceholderError::CircularReference(canonical));
        }

        let raw = value_to_string(value, &key)?;
        visiting.push(canonical);
        let resolved = self.resolve_text(&raw, visiting);
        visiting.pop();
        resolved
    }
}

/// Consumes a placeholder body up to its matching `}`, keeping nested `${...}` intact.
fn consume_placeholder(chars: &mut Peekable<Chars>) -> Option<String> {
    let mut body = String::new();
    let mut depth = 0usize;

    while let Some(ch) = chars.next() {
        match ch {
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                depth += 1;
                body.push_str("${");
            }
            '}' if depth == 0 => return Some(body),
            '}' => {
                depth -= 1;
                body.push('}');
            }
            c => body.push(c),
        }
    }
    None
}

/// Splits `key:default` at the first colon outside nested placeholders.
fn split_default(body: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    let mut prev = '\0';

    for (index, ch) in body.char_indices() {
        match ch {
            '{' if prev == '$' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            ':' if depth == 0 => return (&body[..index], Some(&body[index + 1..])),
            _ => {}
        }
        prev = ch;
    }
    (body, None)
}

fn value_to_string(value: &Value, key: &str) -> Result<String, PlaceholderError> {
    scalar_to_string(value).ok_or_else(|| PlaceholderError::NonScalarReference(key.to_string()))
}
