use std::any::type_name;

use toml::{Table, Value};
use tracing::{debug, trace, warn};

use super::policy::{apply_policy, BindTolerance, Outcome};
use super::resolve::PlaceholderResolver;
use super::schema::{Bindable, FieldKind, Schema};
use super::{BindError, ConversionCause};
use crate::source::{canonical_path, PropertySourceProvider, PropertySources, Snapshot};

/// Binds prefixed property groups onto typed targets.
///
/// Every call captures a fresh [`Snapshot`] of the provider's sources, so a
/// binder can be shared and reused; the tolerance flags are fixed at
/// construction.
///
/// ```
/// use relaxed_bind::{Bindable, Binder, PropertySources, Schema};
///
/// #[derive(Default)]
/// struct Foo {
///     port: u16,
///     url: String,
/// }
///
/// impl Bindable for Foo {
///     fn schema() -> Schema<Self> {
///         Schema::new()
///             .field("port", |f: &mut Self, v: u16| f.port = v)
///             .field("url", |f: &mut Self, v: String| f.url = v)
///     }
/// }
///
/// let sources = PropertySources::new().with_map(
///     "defaults",
///     [
///         ("service.foo.port", "8080"),
///         ("service.foo.url", "http://localhost:${service.foo.port}"),
///     ],
/// );
///
/// let mut foo = Foo::default();
/// Binder::new(sources).bind("service.foo", &mut foo)?;
/// assert_eq!(foo.port, 8080);
/// assert_eq!(foo.url, "http://localhost:8080");
/// # Ok::<(), relaxed_bind::BindError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Binder<P = PropertySources> {
    provider: P,
    tolerance: BindTolerance,
}

impl<P: PropertySourceProvider> Binder<P> {
    /// Creates a binder with the default tolerance: invalid values abort,
    /// unknown keys are ignored.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            tolerance: BindTolerance::default(),
        }
    }

    /// Replaces both tolerance flags at once.
    pub fn with_tolerance(mut self, tolerance: BindTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Skip values that cannot be converted instead of failing.
    pub fn ignore_invalid_fields(mut self, ignore: bool) -> Self {
        self.tolerance.ignore_invalid_fields = ignore;
        self
    }

    /// Accept keys under the prefix that match no field.
    pub fn ignore_unknown_fields(mut self, ignore: bool) -> Self {
        self.tolerance.ignore_unknown_fields = ignore;
        self
    }

    /// The tolerance applied to every bind.
    pub fn tolerance(&self) -> BindTolerance {
        self.tolerance
    }

    /// The provider whose sources each bind snapshots.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Populates `target` from the properties under `prefix`.
    pub fn bind<T: Bindable>(&self, prefix: &str, target: &mut T) -> Result<(), BindError> {
        self.bind_with(prefix, target, &T::schema())
    }

    /// Binds into a fresh `T::default()`.
    pub fn bind_new<T: Bindable + Default>(&self, prefix: &str) -> Result<T, BindError> {
        let mut target = T::default();
        self.bind(prefix, &mut target)?;
        Ok(target)
    }

    /// Populates `target` using an explicit schema.
    ///
    /// Fields are assigned in schema order. On an aborting error the fields
    /// before the failing one keep their new values and the rest are untouched.
    /// Unknown keys are detected before any field is assigned.
    pub fn bind_with<T>(
        &self,
        prefix: &str,
        target: &mut T,
        schema: &Schema<T>,
    ) -> Result<(), BindError> {
        let segments =
            canonical_path(prefix).ok_or_else(|| BindError::InvalidPrefix(prefix.to_string()))?;
        let prefix = segments.join(".");

        let snapshot = Snapshot::capture(self.provider.property_sources())?;
        let ctx = BindContext::new(&snapshot, self.tolerance);

        debug!(prefix = %prefix, target_type = type_name::<T>(), "binding property group");

        let empty = Table::new();
        let table = match snapshot.get_path(&segments) {
            None => &empty,
            Some(Value::Table(table)) => table,
            Some(other) => {
                return ctx.handle(BindError::Conversion {
                    key: prefix,
                    source: ConversionCause::ExpectedGroup(other.type_str()),
                });
            }
        };

        if !self.tolerance.ignore_unknown_fields {
            let mut unknown = Vec::new();
            collect_unknown(&ctx, &prefix, table, schema, &mut unknown);
            if !unknown.is_empty() {
                ctx.handle(BindError::UnknownProperties {
                    prefix: prefix.clone(),
                    keys: unknown,
                })?;
            }
        }

        bind_fields(&ctx, &prefix, table, target, schema)?;

        debug!(prefix = %prefix, "property group bound");
        Ok(())
    }
}

/// State shared by one bind call.
pub(crate) struct BindContext<'a> {
    snapshot: &'a Snapshot,
    resolver: PlaceholderResolver<'a>,
    tolerance: BindTolerance,
}

impl<'a> BindContext<'a> {
    fn new(snapshot: &'a Snapshot, tolerance: BindTolerance) -> Self {
        Self {
            snapshot,
            resolver: PlaceholderResolver::new(snapshot),
            tolerance,
        }
    }

    fn handle(&self, error: BindError) -> Result<(), BindError> {
        match apply_policy(error, &self.tolerance) {
            Outcome::Abort(error) => Err(error),
            Outcome::Skip(error) => {
                warn!(error = %error, "ignoring property binding error");
                Ok(())
            }
        }
    }
}

pub(crate) fn bind_fields<T>(
    ctx: &BindContext<'_>,
    path: &str,
    table: &Table,
    target: &mut T,
    schema: &Schema<T>,
) -> Result<(), BindError> {
    for field in schema.fields() {
        let key = join_key(path, &field.name);

        let Some(value) = table.get(&field.name) else {
            if field.required {
                ctx.handle(BindError::UnboundField { key })?;
            }
            continue;
        };

        match &field.kind {
            FieldKind::Value(set) => {
                let result = ctx
                    .resolver
                    .resolve_value(value)
                    .map_err(ConversionCause::from)
                    .and_then(|resolved| set(target, resolved).map_err(ConversionCause::from));
                match result {
                    Ok(()) => trace!(key = %key, "bound property"),
                    Err(source) => ctx.handle(BindError::Conversion { key, source })?,
                }
            }
            FieldKind::Group { bind, .. } => match value {
                Value::Table(nested) => bind(target, ctx, &key, nested)?,
                other => ctx.handle(BindError::Conversion {
                    key,
                    source: ConversionCause::ExpectedGroup(other.type_str()),
                })?,
            },
        }
    }
    Ok(())
}

/// Collects keys under `path` that no field of `schema` accounts for.
///
/// Keys whose winning source is exempt from unbound checks are skipped.
pub(crate) fn collect_unknown<T>(
    ctx: &BindContext<'_>,
    path: &str,
    table: &Table,
    schema: &Schema<T>,
    out: &mut Vec<String>,
) {
    for (name, value) in table {
        let key = join_key(path, name);
        match schema.find(name).map(|field| &field.kind) {
            Some(FieldKind::Value(_)) => {}
            Some(FieldKind::Group {
                collect_unknown, ..
            }) => {
                if let Value::Table(nested) = value {
                    collect_unknown(ctx, &key, nested, out);
                }
            }
            None => collect_reported_leaves(ctx.snapshot, &key, value, out),
        }
    }
}

fn collect_reported_leaves(snapshot: &Snapshot, key: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Table(table) if !table.is_empty() => {
            for (name, nested) in table {
                collect_reported_leaves(snapshot, &join_key(key, name), nested, out);
            }
        }
        _ => {
            if snapshot.reports_unbound(key) {
                out.push(key.to_string());
            }
        }
    }
}

fn join_key(path: &str, name: &str) -> String {
    format!("{path}.{name}")
}
