//! Binding property groups onto typed targets.

mod binder;
mod convert;
mod error;
mod policy;
mod resolve;
mod schema;

pub use binder::Binder;
pub use error::{BindError, ConversionCause, PlaceholderError};
pub use policy::{apply_policy, BindTolerance, Outcome};
pub use resolve::PlaceholderResolver;
pub use schema::{Bindable, Schema};
