use serde_json::{Map, Value};

use crate::models::{error::ValidationError, message::InboundMessage};

pub type Payload = Map<String, Value>;

/// Extracts the correlation id and the JSON object payload from a message.
///
/// The body is only parsed once a correlation id has been found.
pub fn validate_message(message: &InboundMessage) -> Result<(Payload, String), ValidationError> {
    let correlation_id = message
        .correlation_id()
        .ok_or(ValidationError::MissingCorrelationId)?
        .to_string();

    let payload = serde_json::from_slice::<Payload>(&message.body)
        .map_err(ValidationError::InvalidPayload)?;

    Ok((payload, correlation_id))
}
