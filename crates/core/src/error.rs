use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

/// Everything that can go wrong in the simulation core. Configuration
/// problems are always fatal to the call that tried to apply them, and the
/// previous state is left untouched.
#[derive(Debug, Error)]
pub enum SimError {
    /// One or more config fields are invalid. The wrapped errors are keyed by
    /// field name, so callers can find out exactly what was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ValidationErrors),

    /// A weather state name that isn't in the configured state table.
    #[error("unknown weather state `{0}`")]
    InvalidState(String),

    /// The weather system wanted to regenerate terrain, but no generator is
    /// attached. This is never returned from a tick, only logged.
    #[error("no terrain generator attached")]
    MissingCollaborator,
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// Build an [SimError::InvalidConfiguration] for a single field, for
    /// checks that can't be expressed with `#[validate]` attributes.
    pub fn invalid_field(field: &'static str, code: &'static str) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, ValidationError::new(code));
        Self::InvalidConfiguration(errors)
    }

    /// Names of the config fields that failed validation. Empty for any
    /// other kind of error.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidConfiguration(errors) => {
                let mut fields =
                    errors.errors().keys().copied().collect::<Vec<_>>();
                fields.sort_unstable();
                fields
            }
            _ => Vec::new(),
        }
    }
}
