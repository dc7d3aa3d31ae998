use thiserror::Error;

/// Failures of the query pipeline, one variant per step.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot connect to '{endpoint}': {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("invalid private key: {0}")]
    KeyFormat(String),

    #[error("invalid contract ABI: {0}")]
    AbiParse(String),

    #[error("cannot encode arguments for '{function}': {reason}")]
    Encoding { function: String, reason: String },

    #[error("call to '{function}' failed: {reason}")]
    Rpc { function: String, reason: String },

    #[error("cannot decode result of '{function}': {reason}")]
    Decoding { function: String, reason: String },
}

impl QueryError {
    pub fn connection(endpoint: &str, reason: impl ToString) -> Self {
        Self::Connection {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn encoding(function: &str, reason: impl ToString) -> Self {
        Self::Encoding {
            function: function.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn rpc(function: &str, reason: impl ToString) -> Self {
        Self::Rpc {
            function: function.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn decoding(function: &str, reason: impl ToString) -> Self {
        Self::Decoding {
            function: function.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;
