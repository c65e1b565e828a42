use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a snapshot could not be captured. No snapshot is produced in either case.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The connection could not be opened or the database could not be selected.
    #[error("could not connect to database {target}")]
    Connection {
        target: String,
        #[source]
        source: BoxError,
    },

    /// Connected, but listing tables or reading columns failed.
    #[error("could not read the schema of database {target}")]
    Introspection {
        target: String,
        #[source]
        source: BoxError,
    },
}

impl ExtractError {
    pub fn target(&self) -> &str {
        match self {
            ExtractError::Connection { target, .. } => target,
            ExtractError::Introspection { target, .. } => target,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, ExtractError::Connection { .. })
    }
}
