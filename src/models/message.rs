use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const CORRELATION_ID_HEADER: &str = "X-Request-Id";

/// A raw message as delivered by the queue consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl InboundMessage {
    pub fn new(headers: HashMap<String, String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of the `X-Request-Id` header, if present and non-empty.
    pub fn correlation_id(&self) -> Option<&str> {
        self.headers
            .get(CORRELATION_ID_HEADER)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }
}
