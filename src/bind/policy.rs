//! Error tolerance applied to every bind.

use serde::Deserialize;

use super::BindError;

/// Binder-wide tolerance flags, fixed when the binder is built.
///
/// Can be loaded from TOML:
///
/// ```toml
/// [binder]
/// ignore-invalid-fields = true
/// ignore-unknown-fields = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BindTolerance {
    /// Skip values that cannot be converted and required fields that are unset.
    pub ignore_invalid_fields: bool,
    /// Skip keys under the prefix that match no field.
    pub ignore_unknown_fields: bool,
}

impl Default for BindTolerance {
    fn default() -> Self {
        Self {
            ignore_invalid_fields: false,
            ignore_unknown_fields: true,
        }
    }
}

impl BindTolerance {
    /// Rejects every invalid value and every unknown key.
    pub fn strict() -> Self {
        Self {
            ignore_invalid_fields: false,
            ignore_unknown_fields: false,
        }
    }
}

/// What the binder does with an error.
#[derive(Debug)]
pub enum Outcome {
    Abort(BindError),
    Skip(BindError),
}

/// Decides whether `error` aborts the bind under `tolerance`.
///
/// The two flags act on disjoint error kinds. Source and prefix errors always abort.
pub fn apply_policy(error: BindError, tolerance: &BindTolerance) -> Outcome {
    let skip = match &error {
        BindError::Conversion { .. } | BindError::UnboundField { .. } => {
            tolerance.ignore_invalid_fields
        }
        BindError::UnknownProperties { .. } => tolerance.ignore_unknown_fields,
        BindError::InvalidPrefix(_) | BindError::Source(_) => false,
    };

    if skip {
        Outcome::Skip(error)
    } else {
        Outcome::Abort(error)
    }
}
