//! Error types for sift operations.
//!
//! Provider and store failures are reported through [`SiftError`]. The matching
//! engine itself never surfaces these to its caller: every error on the
//! semantic path is logged and turned into "no match".

use thiserror::Error;

/// Result type alias for sift operations.
pub type SiftResult<T> = Result<T, SiftError>;

/// Main error type for all sift operations.
#[derive(Error, Debug)]
pub enum SiftError {
    /// Configuration error (bad file, invalid value).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The selected provider has no credentials configured.
    #[error("{provider} credentials not found. Set {variables} or provide them in config.")]
    MissingCredentials { provider: String, variables: String },

    /// Embedding generation failed.
    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Completion-based similarity scoring failed.
    #[error("Scorer error: {message}")]
    Scorer {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network error.
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A backend call exceeded its deadline.
    #[error("Timed out after {seconds}s: {message}")]
    Timeout { message: String, seconds: u64 },

    /// The semantic backend failed to initialize and stays unavailable.
    #[error("Semantic backend unavailable: {0}")]
    Unavailable(String),

    /// Subscription store failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (CFG_xxx)
    CfgInvalid,
    CfgMissingCredentials,

    // Embedding (EMB_xxx)
    EmbInitFailed,
    EmbGenerationFailed,

    // Scorer (SCR_xxx)
    ScrRequestFailed,
    ScrInvalidResponse,

    // Network (NET_xxx)
    NetTimeout,
    NetConnectionFailed,

    // Parse (PARSE_xxx)
    ParseInvalidJson,
    ParseInvalidScore,

    // Store (STORE_xxx)
    StoreFailed,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::CfgMissingCredentials => "CFG_002",
            ErrorCode::EmbInitFailed => "EMB_001",
            ErrorCode::EmbGenerationFailed => "EMB_002",
            ErrorCode::ScrRequestFailed => "SCR_001",
            ErrorCode::ScrInvalidResponse => "SCR_002",
            ErrorCode::NetTimeout => "NET_001",
            ErrorCode::NetConnectionFailed => "NET_002",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ParseInvalidScore => "PARSE_002",
            ErrorCode::StoreFailed => "STORE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl SiftError {
    /// Create a configuration error for a missing credential.
    pub fn missing_credentials(provider: impl Into<String>, variables: impl Into<String>) -> Self {
        Self::MissingCredentials {
            provider: provider.into(),
            variables: variables.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbGenerationFailed,
            source: None,
        }
    }

    /// Create an embedding model initialization error.
    pub fn embedding_init(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbInitFailed,
            source: None,
        }
    }

    /// Create a scorer error.
    pub fn scorer(message: impl Into<String>) -> Self {
        Self::Scorer {
            message: message.into(),
            code: ErrorCode::ScrRequestFailed,
            source: None,
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: ErrorCode::NetConnectionFailed,
            source: None,
        }
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            message: message.into(),
            seconds,
        }
    }

    /// Create a parse error for a malformed similarity score.
    pub fn invalid_score(raw: impl AsRef<str>) -> Self {
        Self::Parse {
            message: format!("Could not parse similarity score from '{}'", raw.as_ref()),
            code: ErrorCode::ParseInvalidScore,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create an unavailable-backend error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration(_) => ErrorCode::CfgInvalid,
            Self::MissingCredentials { .. } => ErrorCode::CfgMissingCredentials,
            Self::Embedding { code, .. } => *code,
            Self::Scorer { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Timeout { .. } => ErrorCode::NetTimeout,
            Self::Unavailable(_) => ErrorCode::EmbInitFailed,
            Self::Store(_) => ErrorCode::StoreFailed,
            Self::Parse { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether this error came from the transport or from a malformed response.
    ///
    /// Both are handled identically by the matcher: the call yields no match.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::Parse { .. } | Self::Scorer { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_code() {
        let err = SiftError::missing_credentials("OpenRouter", "OPENROUTER_API_KEY");
        assert_eq!(err.code(), ErrorCode::CfgMissingCredentials);
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn test_config_error_mentioning_credentials_is_invalid_config() {
        let err = SiftError::Configuration("unknown field `credentials` at line 3".to_string());
        assert_eq!(err.code(), ErrorCode::CfgInvalid);
    }

    #[test]
    fn test_invalid_score_is_transport_class() {
        let err = SiftError::invalid_score("about half");
        assert_eq!(err.code(), ErrorCode::ParseInvalidScore);
        assert!(err.is_transport());
        assert!(!SiftError::unavailable("model missing").is_transport());
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::CfgMissingCredentials.as_str(), "CFG_002");
        assert_eq!(ErrorCode::NetTimeout.as_str(), "NET_001");
        assert_eq!(SiftError::timeout("openai", 30).code().as_str(), "NET_001");
    }
}
