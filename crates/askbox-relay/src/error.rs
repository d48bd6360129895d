use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid socket id '{0}'")]
    InvalidSocketId(String),

    #[error("invalid channel name '{0}'")]
    InvalidChannelName(String),

    #[error("invalid event name '{0}'")]
    InvalidEventName(String),

    #[error("presence channel '{0}' needs member data")]
    MissingPresenceMember(String),

    #[error("user data needs a non-empty string 'id'")]
    InvalidUserData,

    #[error("event payload is {0} bytes, over the relay limit")]
    PayloadTooLarge(usize),

    #[error("relay rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RelayError {
    /// Errors caused by what the caller sent, as opposed to relay trouble.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSocketId(_)
                | Self::InvalidChannelName(_)
                | Self::InvalidEventName(_)
                | Self::MissingPresenceMember(_)
                | Self::InvalidUserData
                | Self::PayloadTooLarge(_)
        )
    }
}
