#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use push_webhooks::{
    clients::{http::HttpTransport, notifier::Notifier},
    models::{
        error::BoxError,
        message::{CORRELATION_ID_HEADER, InboundMessage},
        subscription::{Subscription, Subscriptions},
    },
};
use reqwest::{Request, Response};

/// What the transport saw for one request.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Records every request and answers with a fixed status, except for URLs
/// listed as unreachable which fail at the transport level.
#[derive(Default)]
pub struct RecordingTransport {
    status: u16,
    unreachable: HashSet<String>,
    requests: Mutex<Vec<CapturedRequest>>,
}

impl RecordingTransport {
    pub fn responding(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            ..Default::default()
        })
    }

    pub fn with_unreachable(status: u16, urls: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            status,
            unreachable: urls.iter().map(|url| url.to_string()).collect(),
            ..Default::default()
        })
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: Request) -> Result<Response, BoxError> {
        let url = request.url().to_string();

        self.requests.lock().unwrap().push(CapturedRequest {
            method: request.method().to_string(),
            url: url.clone(),
            headers: request
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
                .collect(),
            body: request
                .body()
                .and_then(|body| body.as_bytes())
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
        });

        if self.unreachable.contains(&url) {
            return Err(format!("dial tcp {}: connection refused", url).into());
        }

        let response = http::Response::builder()
            .status(self.status)
            .body("")
            .unwrap();
        Ok(Response::from(response))
    }
}

pub fn subscriptions(urls: &[&str]) -> Subscriptions {
    urls.iter()
        .map(|url| Subscription::new(*url))
        .collect::<Vec<_>>()
        .into()
}

pub fn notifier(transport: Arc<RecordingTransport>, subscriptions: Subscriptions) -> Notifier {
    Notifier::new(transport, subscriptions)
}

pub fn message(correlation_id: &str, body: &str) -> InboundMessage {
    InboundMessage::default()
        .with_header(CORRELATION_ID_HEADER, correlation_id)
        .with_header("Message-Timestamp", "2019-10-02T15:13:26.329Z")
        .with_body(body)
}
