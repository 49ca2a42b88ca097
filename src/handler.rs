use tracing::{debug, error, warn};

use crate::{
    clients::notifier::Notifier,
    models::{
        error::HandlerError, message::InboundMessage, notification::NotificationReport,
        validation::validate_message,
    },
};

/// Entry point the queue consumer calls once per message.
#[derive(Clone)]
pub struct MessageHandler {
    notifier: Notifier,
}

impl MessageHandler {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }

    /// Validates, notifies and logs. Failures drop the message; nothing is retried.
    pub async fn handle(&self, message: &InboundMessage) {
        let transaction_id = message.correlation_id().unwrap_or_default();

        let report = match self.process(message).await {
            Ok(report) => report,
            Err(HandlerError::Validation(e)) => {
                error!(transaction_id, error = %e, "error consuming message");
                return;
            }
            Err(HandlerError::Notify(e)) => {
                error!(transaction_id, error = %e, "error notifying client");
                return;
            }
        };

        log_report(&report);

        debug!(
            transaction_id,
            notified = report.len(),
            issues = report.issues().count(),
            "Message processed"
        );
    }

    pub async fn process(
        &self,
        message: &InboundMessage,
    ) -> Result<NotificationReport, HandlerError> {
        let (payload, transaction_id) = validate_message(message)?;
        let report = self.notifier.notify(payload, &transaction_id).await?;
        Ok(report)
    }
}

fn log_report(report: &NotificationReport) {
    for notification in report.issues() {
        match &notification.outcome {
            Err(e) => warn!(
                transaction_id = %notification.transaction_id,
                subscription = %notification.subscription,
                error = %e,
                "error notifying client"
            ),
            Ok(status) => warn!(
                transaction_id = %notification.transaction_id,
                subscription = %notification.subscription,
                status_code = status.as_u16(),
                "invalid status code from webhook"
            ),
        }
    }
}
