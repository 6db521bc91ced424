use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("vision service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed vision response: {0}")]
    Malformed(String),

    #[error("no API key configured for the remote vision backend")]
    MissingApiKey,

    #[error("image could not be decoded: {0}")]
    Image(#[from] image::ImageError),

    #[error("captioning model failed: {0}")]
    Model(String),
}

impl VisionError {
    /// Transport failures, rate limiting and server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            VisionError::Transport(_) => true,
            VisionError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

impl From<candle_core::Error> for VisionError {
    fn from(e: candle_core::Error) -> Self { VisionError::Model(e.to_string()) }
}
