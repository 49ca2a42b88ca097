use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("x-request-id not found in message headers, skipping message")]
    MissingCorrelationId,

    #[error("json couldn't be unmarshalled, skipping invalid json: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("error marshaling content: {0}")]
    Encoding(#[source] serde_json::Error),
}

/// Failure to deliver to a single subscriber. Never escalated past the report.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("error notifying client: {0}")]
    Request(#[source] BoxError),

    #[error("error making http request: {0}")]
    Transport(#[source] BoxError),
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}
