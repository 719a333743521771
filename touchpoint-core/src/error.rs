use thiserror::Error;

#[derive(Error, Debug)]
pub enum TouchpointError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid input for user {user_id}: {reason}")]
    InvalidInput { user_id: String, reason: String },
}

impl TouchpointError {
    pub fn invalid_input(user_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            user_id: user_id.into(),
            reason: reason.into(),
        }
    }
}
