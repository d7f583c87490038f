use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackofficeError {
    // Loading errors
    #[error("navigation context error: {0}")]
    NavigationContext(String),

    #[error("network error: {message}")]
    Network {
        message: String,
        status: Option<u16>,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    // Bulk action errors
    #[error("invalid bulk action '{0}'")]
    InvalidAction(String),

    #[error("action '{action}' is not available on the {screen} screen")]
    ActionNotAllowed { action: String, screen: String },

    #[error("delete requires confirmation; request a delete token first")]
    ConfirmationRequired,

    #[error("no pending delete matches token {0}")]
    InvalidDeleteToken(String),

    #[error("no items selected")]
    EmptySelection,

    #[error("a {0} operation is already in progress")]
    Busy(&'static str),

    // Parsing errors
    #[error("invalid screen '{0}'")]
    InvalidScreen(String),

    #[error("invalid sort direction '{0}'")]
    InvalidSortDirection(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BackofficeError {
    pub fn network(message: impl Into<String>) -> Self {
        BackofficeError::Network {
            message: message.into(),
            status: None,
        }
    }

    /// Errors that should block the whole screen instead of showing a banner.
    pub fn is_blocking(&self) -> bool {
        matches!(self, BackofficeError::NavigationContext(_))
    }

    /// The human-readable part of the error, without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            BackofficeError::Network { message, .. } => message.clone(),
            BackofficeError::NavigationContext(message) => message.clone(),
            BackofficeError::MalformedResponse(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BackofficeError>;
