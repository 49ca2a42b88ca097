use std::{sync::Arc, time::Duration};

use anyhow::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::models::health::{CheckResult, GtgStatus, HealthCheckResponse};

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Reports whether the message source can currently be reached.
#[async_trait]
pub trait ConnectivityCheck: Send + Sync {
    async fn connectivity_check(&self) -> Result<String, Error>;
}

pub struct HealthChecker {
    system_code: String,
    name: String,
    panic_guide: String,
    consumer: Arc<dyn ConnectivityCheck>,
}

impl HealthChecker {
    pub fn new(
        system_code: String,
        name: String,
        panic_guide: String,
        consumer: Arc<dyn ConnectivityCheck>,
    ) -> Self {
        Self {
            system_code,
            name,
            panic_guide,
            consumer,
        }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let checks = vec![self.read_check().await];
        let ok = checks.iter().all(|check| check.ok);

        HealthCheckResponse {
            schema_version: 1,
            system_code: self.system_code.clone(),
            name: self.name.clone(),
            description: "Checks if all the dependent services are reachable and healthy."
                .to_string(),
            checks,
            ok,
        }
    }

    pub async fn gtg(&self) -> GtgStatus {
        match self.check_consumer().await {
            Ok(_) => GtgStatus::good(),
            Err(e) => GtgStatus::not_good(e.to_string()),
        }
    }

    async fn read_check(&self) -> CheckResult {
        let (ok, check_output) = match self.check_consumer().await {
            Ok(output) => {
                debug!("Message queue connectivity check passed");
                (true, Some(output))
            }
            Err(e) => {
                warn!(error = %e, "Message queue connectivity check failed");
                (false, Some(e.to_string()))
            }
        };

        CheckResult {
            id: "read-message-queue-proxy-reachable".to_string(),
            name: "Read Message Queue Proxy Reachable".to_string(),
            ok,
            severity: 2,
            business_impact: "Notifications about newly modified/published content will not reach this app, nor will they reach its clients.".to_string(),
            technical_summary: "Message queue is not reachable/healthy".to_string(),
            panic_guide: self.panic_guide.clone(),
            check_output,
            last_updated: Utc::now(),
        }
    }

    async fn check_consumer(&self) -> Result<String, Error> {
        match timeout(CHECK_TIMEOUT, self.consumer.connectivity_check()).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "connectivity check timed out after {}s",
                CHECK_TIMEOUT.as_secs()
            )),
        }
    }
}
