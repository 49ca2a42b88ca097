use reqwest::StatusCode;

use crate::models::{error::DeliveryError, subscription::Subscription};

/// Outcome of one delivery attempt to one subscription.
#[derive(Debug)]
pub struct Notification {
    pub subscription: Subscription,
    pub transaction_id: String,
    pub outcome: Result<StatusCode, DeliveryError>,
}

impl Notification {
    pub fn delivered(
        subscription: Subscription,
        transaction_id: String,
        status: StatusCode,
    ) -> Self {
        Self {
            subscription,
            transaction_id,
            outcome: Ok(status),
        }
    }

    pub fn failed(
        subscription: Subscription,
        transaction_id: String,
        error: DeliveryError,
    ) -> Self {
        Self {
            subscription,
            transaction_id,
            outcome: Err(error),
        }
    }

    /// Response status, or `0` when no response was received.
    pub fn status_code(&self) -> u16 {
        self.outcome.as_ref().map(StatusCode::as_u16).unwrap_or(0)
    }

    pub fn error(&self) -> Option<&DeliveryError> {
        self.outcome.as_ref().err()
    }

    /// Anything other than a plain 200 needs to be looked at.
    pub fn is_issue(&self) -> bool {
        !matches!(&self.outcome, Ok(status) if *status == StatusCode::OK)
    }
}

/// One entry per subscription, in registry order.
#[derive(Debug, Default)]
pub struct NotificationReport {
    notifications: Vec<Notification>,
}

impl NotificationReport {
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn issues(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| n.is_issue())
    }
}

impl From<Vec<Notification>> for NotificationReport {
    fn from(notifications: Vec<Notification>) -> Self {
        Self { notifications }
    }
}
