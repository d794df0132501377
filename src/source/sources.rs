use std::path::Path;
use std::sync::Arc;

use super::entry::PropertySource;
use super::env::EnvSource;
use super::file::FileSource;
use super::map::MapSource;
use super::snapshot::Snapshot;
use super::SourceError;

/// Supplies the ordered property sources a binder reads from.
pub trait PropertySourceProvider: Send + Sync {
    fn property_sources(&self) -> &PropertySources;
}

/// An ordered collection of property sources.
///
/// Sources are applied in registration order, so later sources override
/// earlier ones for the same key. Nested tables are merged recursively;
/// other values (including arrays) are replaced entirely.
///
/// ```no_run
/// use relaxed_bind::PropertySources;
///
/// // defaults -> file -> environment overrides
/// let sources = PropertySources::new()
///     .with_map("defaults", [("service.foo.port", "8080")])
///     .with_file("config/app.toml", false)
///     .with_env("APP", "__");
/// # let _ = sources;
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertySources {
    sources: Vec<Arc<dyn PropertySource>>,
}

impl PropertySources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a TOML file. Missing optional files contribute nothing.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Adds environment variables under `prefix`, split into path segments on `separator`.
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Adds in-memory properties keyed by dotted names.
    pub fn with_map<I, K, V>(self, name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with_source(MapSource::new(name, properties))
    }

    pub fn with_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.push(source);
        self
    }

    pub fn push(&mut self, source: impl PropertySource + 'static) {
        self.sources.push(Arc::new(source));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PropertySource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|s| s.name()).collect()
    }

    /// Loads every source and merges them into an immutable snapshot.
    pub fn snapshot(&self) -> Result<Snapshot, SourceError> {
        Snapshot::capture(self)
    }
}

impl PropertySourceProvider for PropertySources {
    fn property_sources(&self) -> &PropertySources {
        self
    }
}

impl<P: PropertySourceProvider + ?Sized> PropertySourceProvider for &P {
    fn property_sources(&self) -> &PropertySources {
        (**self).property_sources()
    }
}

impl<P: PropertySourceProvider + ?Sized> PropertySourceProvider for Arc<P> {
    fn property_sources(&self) -> &PropertySources {
        (**self).property_sources()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_keep_registration_order() {
        let sources = PropertySources::new()
            .with_map("defaults", [("a", "1")])
            .with_env("APP", "__")
            .with_file("/nonexistent/app.toml", false);

        assert_eq!(sources.len(), 3);
        assert_eq!(
            sources.names(),
            vec!["defaults", "environment", "/nonexistent/app.toml"]
        );
    }

    #[test]
    fn test_provider_through_arc() {
        let sources = Arc::new(PropertySources::new().with_map("defaults", [("a", "1")]));
        let provider: &dyn PropertySourceProvider = &sources;
        assert_eq!(provider.property_sources().len(), 1);
    }
}
