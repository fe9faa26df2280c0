use thiserror::Error;

use crate::method::HttpMethod;

/// Result type for declaration-time metadata operations
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Validation failures raised while declaring controller metadata.
///
/// Everything here fires synchronously at declaration time; nothing is
/// deferred to the runtime readers.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Route path must start with '/': '{0}'")]
    InvalidPath(String),

    #[error("Mount prefix must start with '/': '{0}'")]
    InvalidPrefix(String),

    #[error("Duplicate route {method} {path} on controller '{controller}'")]
    DuplicateRoute {
        controller: String,
        method: HttpMethod,
        path: String,
    },

    #[error("Duplicate {stage} hook '{handler}' on controller '{controller}'")]
    DuplicateHook {
        controller: String,
        stage: &'static str,
        handler: String,
    },

    #[error("Duplicate {binding_source} binding '{name}' for handler '{handler}'")]
    DuplicateBinding {
        handler: String,
        binding_source: &'static str,
        name: String,
    },

    #[error("Duplicate job '{name}' on controller '{controller}'")]
    DuplicateJob { controller: String, name: String },

    #[error("Controller already registered: {0}")]
    ControllerAlreadyRegistered(String),

    #[error(transparent)]
    Cron(#[from] blueprint_cron::CronError),
}
