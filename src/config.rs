use std::time::Duration;

use anyhow::{Context, Error, Result, anyhow};
use dotenvy::dotenv;
use reqwest::Client;
use serde::Deserialize;

use crate::models::subscription::Subscriptions;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub rabbitmq_url: String,
    pub queue_name: String,
    pub exchange_name: Option<String>,
    #[serde(default = "default_routing_key")]
    pub routing_key: String,
    #[serde(default = "default_prefetch_count")]
    pub prefetch_count: u16,
    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    #[serde(default = "default_subscriptions")]
    pub subscriptions: String,

    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
    #[serde(default = "default_http_timeout_seconds")]
    pub http_connect_timeout_seconds: u64,
    #[serde(default = "default_http_pool_max_idle_per_host")]
    pub http_pool_max_idle_per_host: usize,

    #[serde(default = "default_server_port")]
    pub server_port: u16,
    #[serde(default = "default_app_system_code")]
    pub app_system_code: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_panic_guide_url")]
    pub panic_guide_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_routing_key() -> String {
    "#".to_string()
}

fn default_prefetch_count() -> u16 {
    10
}

fn default_worker_concurrency() -> usize {
    1
}

fn default_subscriptions() -> String {
    "[]".to_string()
}

fn default_http_timeout_seconds() -> u64 {
    30
}

fn default_http_pool_max_idle_per_host() -> usize {
    20
}

fn default_server_port() -> u16 {
    8080
}

fn default_app_system_code() -> String {
    "notifications-push-webhooks-system-code".to_string()
}

fn default_app_name() -> String {
    "notifications-push-webhooks".to_string()
}

fn default_panic_guide_url() -> String {
    "https://dewey.ft.com/up-vm.html".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Self>(vars)
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.rabbitmq_url.trim().is_empty() {
            return Err(anyhow!("No queue address provided"));
        }
        if self.queue_name.trim().is_empty() {
            return Err(anyhow!("No queue name provided"));
        }
        if self.prefetch_count == 0 {
            return Err(anyhow!("PREFETCH_COUNT must be at least 1"));
        }
        if self.worker_concurrency == 0 {
            return Err(anyhow!("WORKER_CONCURRENCY must be at least 1"));
        }
        Ok(())
    }

    pub fn subscriptions(&self) -> Result<Subscriptions, Error> {
        Subscriptions::from_json(&self.subscriptions)
            .context("SUBSCRIPTIONS couldn't be unmarshalled")
    }

    pub fn http_client(&self) -> Result<Client, Error> {
        Client::builder()
            .timeout(Duration::from_secs(self.http_timeout_seconds))
            .connect_timeout(Duration::from_secs(self.http_connect_timeout_seconds))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(self.http_pool_max_idle_per_host)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))
    }
}
