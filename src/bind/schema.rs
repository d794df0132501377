//! Explicit field schemas for bind targets.

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use super::binder::{bind_fields, collect_unknown, BindContext};
use super::convert::convert;
use super::BindError;
use crate::source::canonical_key;

/// A type that can be populated from a property group.
///
/// ```
/// use relaxed_bind::{Bindable, Schema};
///
/// #[derive(Default)]
/// struct Pool {
///     max_size: u32,
/// }
///
/// #[derive(Default)]
/// struct Service {
///     host: String,
///     port: u16,
///     pool: Pool,
/// }
///
/// impl Bindable for Pool {
///     fn schema() -> Schema<Self> {
///         Schema::new().field("max-size", |p: &mut Self, v: u32| p.max_size = v)
///     }
/// }
///
/// impl Bindable for Service {
///     fn schema() -> Schema<Self> {
///         Schema::new()
///             .required("host", |s: &mut Self, v: String| s.host = v)
///             .field("port", |s: &mut Self, v: u16| s.port = v)
///             .group("pool", |s: &mut Self| &mut s.pool)
///     }
/// }
/// ```
pub trait Bindable: Sized + 'static {
    fn schema() -> Schema<Self>;
}

type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<(), toml::de::Error> + Send + Sync>;

type GroupBinder<T> =
    Box<dyn Fn(&mut T, &BindContext<'_>, &str, &Table) -> Result<(), BindError> + Send + Sync>;

type UnknownCollector = fn(&BindContext<'_>, &str, &Table, &mut Vec<String>);

pub(crate) enum FieldKind<T> {
    Value(Setter<T>),
    Group {
        bind: GroupBinder<T>,
        collect_unknown: UnknownCollector,
    },
}

pub(crate) struct Field<T> {
    pub(crate) name: String,
    pub(crate) required: bool,
    pub(crate) kind: FieldKind<T>,
}

/// Ordered field list for `T`: each entry maps a key name to a typed setter
/// or to a nested group. Fields are bound in declaration order.
pub struct Schema<T> {
    fields: Vec<Field<T>>,
}

impl<T: 'static> Schema<T> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds an optional field. A missing key leaves the field untouched.
    pub fn field<F, S>(self, name: &str, setter: S) -> Self
    where
        F: DeserializeOwned + 'static,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        self.push_value(name, false, setter)
    }

    /// Adds a field whose key must be present.
    pub fn required<F, S>(self, name: &str, setter: S) -> Self
    where
        F: DeserializeOwned + 'static,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        self.push_value(name, true, setter)
    }

    /// Adds a nested group bound with `N`'s own schema.
    pub fn group<N, A>(self, name: &str, accessor: A) -> Self
    where
        N: Bindable,
        A: Fn(&mut T) -> &mut N + Send + Sync + 'static,
    {
        self.push_group(name, false, accessor)
    }

    /// Adds a nested group whose key must be present.
    pub fn required_group<N, A>(self, name: &str, accessor: A) -> Self
    where
        N: Bindable,
        A: Fn(&mut T) -> &mut N + Send + Sync + 'static,
    {
        self.push_group(name, true, accessor)
    }

    fn push_value<F, S>(self, name: &str, required: bool, setter: S) -> Self
    where
        F: DeserializeOwned + 'static,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        let set: Setter<T> = Box::new(move |target: &mut T, value: Value| {
            setter(target, convert::<F>(value)?);
            Ok(())
        });
        self.push(name, required, FieldKind::Value(set))
    }

    fn push_group<N, A>(self, name: &str, required: bool, accessor: A) -> Self
    where
        N: Bindable,
        A: Fn(&mut T) -> &mut N + Send + Sync + 'static,
    {
        let bind: GroupBinder<T> = Box::new(
            move |target: &mut T, ctx: &BindContext<'_>, path: &str, table: &Table| {
                bind_fields(ctx, path, table, accessor(target), &N::schema())
            },
        );
        self.push(
            name,
            required,
            FieldKind::Group {
                bind,
                collect_unknown: collect_unknown_in::<N>,
            },
        )
    }

    fn push(mut self, name: &str, required: bool, kind: FieldKind<T>) -> Self {
        let name = canonical_key(name);
        self.fields.retain(|f| f.name != name);
        self.fields.push(Field {
            name,
            required,
            kind,
        });
        self
    }
}

impl<T> Schema<T> {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Canonical field names in bind order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub(crate) fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    pub(crate) fn find(&self, name: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl<T: 'static> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.fields.iter().map(|field| &field.name))
            .finish()
    }
}

fn collect_unknown_in<N: Bindable>(
    ctx: &BindContext<'_>,
    path: &str,
    table: &Table,
    out: &mut Vec<String>,
) {
    collect_unknown(ctx, path, table, &N::schema(), out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Inner {
        size: u8,
    }

    #[derive(Default)]
    struct Outer {
        name: String,
        inner: Inner,
    }

    impl Bindable for Inner {
        fn schema() -> Schema<Self> {
            Schema::new().field("size", |i: &mut Self, v: u8| i.size = v)
        }
    }

    #[test]
    fn test_field_names_are_canonical_and_ordered() {
        let schema = Schema::<Outer>::new()
            .required("display_name", |o: &mut Outer, v: String| o.name = v)
            .group("innerGroup", |o: &mut Outer| &mut o.inner);

        assert_eq!(
            schema.field_names().collect::<Vec<_>>(),
            vec!["display-name", "inner-group"]
        );
        assert!(schema.find("display-name").is_some_and(|f| f.required));
        assert!(schema.find("inner-group").is_some_and(|f| !f.required));
    }

    #[test]
    fn test_redeclared_field_replaces_previous() {
        let schema = Schema::<Outer>::new()
            .field("name", |o: &mut Outer, v: String| o.name = v)
            .field("inner", |o: &mut Outer, v: u8| o.inner.size = v)
            .required("NAME", |o: &mut Outer, v: String| o.name = v.to_uppercase());

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["inner", "name"]);
        assert!(schema.find("name").is_some_and(|f| f.required));
    }

    #[test]
    fn test_value_setter_converts() {
        let schema = Inner::schema();
        let mut inner = Inner::default();
        let FieldKind::Value(set) = &schema.fields()[0].kind else {
            panic!("expected value field");
        };

        set(&mut inner, Value::String("7".into())).unwrap();
        assert_eq!(inner.size, 7);
        assert!(set(&mut inner, Value::String("big".into())).is_err());
        assert_eq!(inner.size, 7);
    }
}
