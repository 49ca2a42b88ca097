use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(rename = "url")]
    pub endpoint_url: String,

    #[serde(rename = "authHeaderKey", default, skip_serializing_if = "String::is_empty")]
    pub auth_header_key: String,

    #[serde(rename = "authHeaderValue", default, skip_serializing_if = "String::is_empty")]
    pub auth_header_value: String,
}

impl Subscription {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            auth_header_key: String::new(),
            auth_header_value: String::new(),
        }
    }

    pub fn with_auth_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth_header_key = key.into();
        self.auth_header_value = value.into();
        self
    }

    /// The auth header to send, only when both key and value are set.
    pub fn auth_header(&self) -> Option<(&str, &str)> {
        if self.auth_header_key.is_empty() || self.auth_header_value.is_empty() {
            return None;
        }
        Some((&self.auth_header_key, &self.auth_header_value))
    }
}

impl Display for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint_url)
    }
}

// The auth header value is a credential and stays out of logs.
impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("endpoint_url", &self.endpoint_url)
            .field("auth_header_key", &self.auth_header_key)
            .field(
                "auth_header_value",
                &if self.auth_header_value.is_empty() { "" } else { "***" },
            )
            .finish()
    }
}

/// The subscription registry. Loaded once at startup and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subscriptions(Vec<Subscription>);

impl Subscriptions {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Subscription> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Subscription>> for Subscriptions {
    fn from(subscriptions: Vec<Subscription>) -> Self {
        Self(subscriptions)
    }
}

impl<'a> IntoIterator for &'a Subscriptions {
    type Item = &'a Subscription;
    type IntoIter = std::slice::Iter<'a, Subscription>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
