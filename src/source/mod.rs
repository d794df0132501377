//! Property sources and the snapshots merged from them.

mod entry;
mod env;
mod error;
mod file;
mod map;
pub(crate) mod name;
mod snapshot;
mod sources;

pub use entry::{PropertyEntry, PropertySource};
pub use env::EnvSource;
pub use error::SourceError;
pub use file::FileSource;
pub use map::MapSource;
pub use name::{canonical_key, canonical_path};
pub use snapshot::Snapshot;
pub use sources::{PropertySourceProvider, PropertySources};
