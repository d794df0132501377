//! Relaxed binding of layered configuration properties onto typed targets.
//!
//! Properties come from ordered [`PropertySources`] (TOML files, environment
//! variables, in-memory maps), later sources overriding earlier ones. A
//! [`Binder`] takes a snapshot of them, resolves `${...}` placeholders, and
//! assigns the keys under a prefix to the fields a [`Schema`] declares.

pub mod bind;
pub mod source;

pub use bind::{
    BindError, BindTolerance, Bindable, Binder, ConversionCause, PlaceholderError,
    PlaceholderResolver, Schema,
};
pub use source::{
    EnvSource, FileSource, MapSource, PropertyEntry, PropertySource, PropertySourceProvider,
    PropertySources, Snapshot, SourceError,
};
