use async_trait::async_trait;
use reqwest::{Client, Request, Response};

use crate::models::error::BoxError;

/// Sends a fully built request. Implemented by `reqwest::Client` and by test doubles.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, BoxError>;
}

#[async_trait]
impl HttpTransport for Client {
    async fn send(&self, request: Request) -> Result<Response, BoxError> {
        Ok(self.execute(request).await?)
    }
}
