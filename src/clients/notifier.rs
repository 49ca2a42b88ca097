use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::join_all;
use reqwest::{
    Body, Method, Request, Url,
    header::{CONTENT_TYPE, HeaderName, HeaderValue},
};
use tracing::{debug, info};

use crate::{
    clients::http::HttpTransport,
    models::{
        error::{BoxError, DeliveryError, NotifyError},
        notification::{Notification, NotificationReport},
        subscription::{Subscription, Subscriptions},
        validation::Payload,
    },
};

/// Fans a payload out to every subscription.
#[derive(Clone)]
pub struct Notifier {
    http_client: Arc<dyn HttpTransport>,
    subscriptions: Arc<Subscriptions>,
}

impl Notifier {
    pub fn new(http_client: Arc<dyn HttpTransport>, subscriptions: Subscriptions) -> Self {
        info!(subscriptions = subscriptions.len(), "Notifier initialized");

        Self {
            http_client,
            subscriptions: Arc::new(subscriptions),
        }
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    /// Posts `payload` to every subscription and reports one outcome per subscription.
    ///
    /// Requests go out concurrently; `join_all` yields results in input order so
    /// entry `i` of the report always belongs to subscription `i`. A failing
    /// subscriber only affects its own entry. The only error returned is a
    /// failure to encode the payload, which happens before anything is sent.
    pub async fn notify(
        &self,
        payload: Payload,
        transaction_id: &str,
    ) -> Result<NotificationReport, NotifyError> {
        let body = Bytes::from(serde_json::to_vec(&payload).map_err(NotifyError::Encoding)?);

        if self.subscriptions.is_empty() {
            return Ok(NotificationReport::default());
        }

        debug!(
            transaction_id,
            subscriptions = self.subscriptions.len(),
            body_size = body.len(),
            "Notifying subscriptions"
        );

        let deliveries = self
            .subscriptions
            .iter()
            .map(|subscription| self.deliver(subscription, body.clone(), transaction_id));

        Ok(NotificationReport::from(join_all(deliveries).await))
    }

    async fn deliver(
        &self,
        subscription: &Subscription,
        body: Bytes,
        transaction_id: &str,
    ) -> Notification {
        let request = match build_request(subscription, body) {
            Ok(request) => request,
            Err(e) => {
                return Notification::failed(
                    subscription.clone(),
                    transaction_id.to_string(),
                    DeliveryError::Request(e),
                );
            }
        };

        match self.http_client.send(request).await {
            Ok(response) => {
                let status = response.status();
                // Release the connection without reading the body.
                drop(response);

                debug!(
                    transaction_id,
                    subscription = %subscription,
                    status_code = status.as_u16(),
                    "Subscription notified"
                );
                Notification::delivered(subscription.clone(), transaction_id.to_string(), status)
            }
            Err(e) => Notification::failed(
                subscription.clone(),
                transaction_id.to_string(),
                DeliveryError::Transport(e),
            ),
        }
    }
}

fn build_request(subscription: &Subscription, body: Bytes) -> Result<Request, BoxError> {
    let url = Url::parse(&subscription.endpoint_url)?;
    let mut request = Request::new(Method::POST, url);

    let headers = request.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some((key, value)) = subscription.auth_header() {
        headers.insert(
            HeaderName::from_bytes(key.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
    }

    *request.body_mut() = Some(Body::from(body));

    Ok(request)
}
