//! File-based property source.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::entry::{PropertyEntry, PropertySource};
use super::SourceError;

/// A property source that loads a TOML file.
///
/// Files can be marked as required or optional. Required files that don't exist
/// cause an error; optional files that don't exist contribute nothing.
/// The file is read again on every snapshot.
#[derive(Debug, Clone)]
pub struct FileSource {
    name: String,
    path: PathBuf,
    required: bool,
}

impl FileSource {
    /// Creates a new file source named after its path.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: path.display().to_string(),
            path,
            required,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PropertySource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> Result<Vec<PropertyEntry>, SourceError> {
        match load_property_file(&self.path, self.required)? {
            Some(table) => Ok(vec![PropertyEntry::root(table)]),
            None => Ok(vec![]),
        }
    }
}

/// Loads and parses a TOML property file.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn load_property_file(path: &Path, required: bool) -> Result<Option<toml::Table>, SourceError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = toml::from_str(&contents).map_err(|e| SourceError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(SourceError::FileNotFound(path.to_path_buf()))
            } else {
                debug!(path = %path.display(), "optional property file not found, skipping");
                Ok(None)
            }
        }
        Err(e) => Err(SourceError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_loads_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[service]\nport = 8080").unwrap();

        let source = FileSource::new(file.path(), true);
        let entries = source.entries().unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.is_empty());
        let table = entries[0].value.as_table().unwrap();
        assert_eq!(table["service"]["port"].as_integer(), Some(8080));
        assert_eq!(source.name(), file.path().display().to_string());
    }

    #[test]
    fn test_file_source_required_missing() {
        let source = FileSource::new("/nonexistent/path/app.toml", true);
        let result = source.entries();

        assert!(matches!(result, Err(SourceError::FileNotFound(_))));
    }

    #[test]
    fn test_file_source_optional_missing() {
        let source = FileSource::new("/nonexistent/path/app.toml", false);
        let entries = source.entries().unwrap();

        assert!(entries.is_empty());
    }

    #[test]
    fn test_file_source_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "port = = 1").unwrap();

        let source = FileSource::new(file.path(), false);
        assert!(matches!(
            source.entries(),
            Err(SourceError::ParseError { .. })
        ));
    }
}
