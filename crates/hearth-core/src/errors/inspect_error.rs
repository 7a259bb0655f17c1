/// Top-level error type for store and logbook inspection.
///
/// Storage and network failures carry their cause. Nothing in the crate
/// retries on these; retry policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    #[error("unknown table: {name}")]
    UnknownTable { name: String },

    #[error("query execution failed ({context}): {source}")]
    QueryExecutionFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("query timed out after {timeout_ms}ms ({context})")]
    QueryTimedOut { context: String, timeout_ms: u64 },

    #[error("remote API failed: {reason}")]
    RemoteApiFailed {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("malformed payload in column {column}: {reason}")]
    MalformedPayload { column: String, reason: String },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("config error: {0}")]
    Config(String),
}

impl InspectError {
    /// Wrap a storage-layer failure with a short description of what was running.
    pub fn query_failed<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::QueryExecutionFailed {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a transport failure from the remote event API.
    pub fn remote_failed<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::RemoteApiFailed {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<toml::de::Error> for InspectError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Convenience type alias.
pub type InspectResult<T> = Result<T, InspectError>;
