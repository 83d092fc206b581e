use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid format option, wrong number of formats, unknown strategy, bad width.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The catalog could not list the scope.
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Nothing found under scope '{0}'")]
    EmptyScope(String),

    /// One object's remote query failed.
    #[error("Query failed for '{key}': {reason}")]
    Query { key: String, reason: String },

    /// A transform hook rejected one object's payload.
    #[error("Transform hook failed for '{key}': {reason}")]
    Hook { key: String, reason: String },

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl Error {
    /// Errors scoped to a single object. Only these can be isolated.
    pub fn is_per_object(&self) -> bool {
        matches!(self, Error::Query { .. } | Error::Hook { .. })
    }

    /// Key of the object this error belongs to, if any.
    pub fn object_key(&self) -> Option<&str> {
        match self {
            Error::Query { key, .. } | Error::Hook { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Failure raised by a transform hook. Carries no key; the strategy adds it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(msg: impl Into<String>) -> Self {
        HookError(msg.into())
    }
}
