mod common;

use push_webhooks::{
    handler::MessageHandler,
    models::{
        error::{HandlerError, ValidationError},
        message::InboundMessage,
    },
};
use tokio_test::{assert_err, assert_ok};
use tracing_test::traced_test;

use common::{RecordingTransport, message, notifier, subscriptions};

const X_REQUEST_ID: &str = "tid_uhsqbhbjdg";
const ONE: &str = "http://one.example/hook";
const TWO: &str = "http://two.example/hook";

fn handler(transport: std::sync::Arc<RecordingTransport>, urls: &[&str]) -> MessageHandler {
    MessageHandler::new(notifier(transport, subscriptions(urls)))
}

/// Test: Valid message flows through to every subscriber
#[tokio::test]
async fn test_valid_message_notifies_subscribers() {
    let transport = RecordingTransport::responding(200);
    let handler = handler(transport.clone(), &[ONE, TWO]);

    let report = assert_ok!(
        handler
            .process(&message(X_REQUEST_ID, r#"{"id": "abc"}"#))
            .await
    );

    assert_eq!(report.len(), 2);
    assert_eq!(transport.calls(), 2);
    assert!(
        report
            .notifications()
            .iter()
            .all(|n| n.transaction_id == X_REQUEST_ID)
    );
}

/// Test: Missing correlation id drops the message before any HTTP call
#[tokio::test]
async fn test_missing_correlation_id_makes_no_requests() {
    let transport = RecordingTransport::responding(200);
    let handler = handler(transport.clone(), &["http://one.example/hook"]);
    let message = InboundMessage::default()
        .with_header("Message-Timestamp", "2019-10-02T15:13:26.329Z")
        .with_body("{}");

    let err = assert_err!(handler.process(&message).await);
    handler.handle(&message).await;

    assert!(matches!(
        err,
        HandlerError::Validation(ValidationError::MissingCorrelationId)
    ));
    assert_eq!(transport.calls(), 0);
}

/// Test: Invalid JSON drops the message before any HTTP call
#[tokio::test]
async fn test_invalid_json_makes_no_requests() {
    let transport = RecordingTransport::responding(200);
    let handler = handler(transport.clone(), &["http://one.example/hook"]);
    let message = message(X_REQUEST_ID, r#"{"lastModified":2019-10-02T15:13:19.520Z}"#);

    let err = assert_err!(handler.process(&message).await);
    handler.handle(&message).await;

    assert!(matches!(
        err,
        HandlerError::Validation(ValidationError::InvalidPayload(_))
    ));
    assert_eq!(transport.calls(), 0);
}

/// Test: Subscriber failures are reported without failing the message
#[tokio::test]
async fn test_subscriber_failures_do_not_fail_message() {
    let transport = RecordingTransport::with_unreachable(503, &["http://one.example/hook"]);
    let handler = handler(transport.clone(), &[ONE, TWO]);
    let message = message(X_REQUEST_ID, r#"{"id": "abc"}"#);

    let report = assert_ok!(handler.process(&message).await);

    let issues: Vec<_> = report.issues().map(|n| n.status_code()).collect();
    assert_eq!(issues, [0, 503]);

    handler.handle(&message).await;
    assert_eq!(transport.calls(), 4);
}

/// Test: Handler can be shared across concurrent messages
#[tokio::test]
async fn test_concurrent_messages_are_independent() {
    let transport = RecordingTransport::responding(200);
    let handler = std::sync::Arc::new(handler(
        transport.clone(),
        &["http://one.example/hook", "http://two.example/hook"],
    ));

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let handler = handler.clone();
            tokio::spawn(async move {
                let message = message(&format!("tid-{}", i), &format!(r#"{{"id": {}}}"#, i));
                handler.process(&message).await
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let report = task.await.unwrap().unwrap();
        assert_eq!(report.len(), 2);
        assert!(
            report
                .notifications()
                .iter()
                .all(|n| n.transaction_id == format!("tid-{}", i))
        );
    }
    assert_eq!(transport.calls(), 20);
}

fn find_line<'a>(lines: &[&'a str], message: &str) -> Result<&'a str, String> {
    lines
        .iter()
        .copied()
        .find(|line| line.contains(message))
        .ok_or_else(|| format!("no log line containing {:?}", message))
}

/// Test: A 503 is logged as a warning naming the status and subscription
#[tokio::test]
#[traced_test]
async fn test_error_status_logged_as_warning() {
    let transport = RecordingTransport::responding(503);
    let handler = handler(transport.clone(), &[ONE]);

    handler.handle(&message("tid-1", r#"{"id": "abc"}"#)).await;

    logs_assert(|lines: &[&str]| {
        let line = find_line(lines, "invalid status code from webhook")?;
        if !line.contains("WARN") {
            return Err(format!("expected a warning, got {}", line));
        }
        for expected in ["status_code=503", "subscription=http://one.example/hook", "tid-1"] {
            if !line.contains(expected) {
                return Err(format!("{:?} missing from {}", expected, line));
            }
        }
        if lines.iter().any(|l| l.contains("ERROR")) {
            return Err("a status code must not be logged as an error".to_string());
        }
        Ok(())
    });
}

/// Test: A transport failure is logged as a warning carrying the error
#[tokio::test]
#[traced_test]
async fn test_delivery_error_logged_as_warning() {
    let transport = RecordingTransport::with_unreachable(200, &[ONE]);
    let handler = handler(transport.clone(), &[ONE, TWO]);

    handler.handle(&message("tid-1", r#"{"id": "abc"}"#)).await;

    logs_assert(|lines: &[&str]| {
        let warnings: Vec<_> = lines.iter().filter(|l| l.contains("WARN")).collect();
        if warnings.len() != 1 {
            return Err(format!("expected exactly one warning, got {:?}", warnings));
        }
        let line = warnings[0];
        for expected in [
            "error notifying client",
            "error making http request",
            "connection refused",
            "subscription=http://one.example/hook",
            "tid-1",
        ] {
            if !line.contains(expected) {
                return Err(format!("{:?} missing from {}", expected, line));
            }
        }
        Ok(())
    });
}

/// Test: Successful deliveries are not logged individually
#[tokio::test]
#[traced_test]
async fn test_successful_delivery_not_logged() {
    let transport = RecordingTransport::responding(200);
    let handler = handler(transport.clone(), &[ONE, TWO]);

    handler.handle(&message("tid-1", r#"{"id": "abc"}"#)).await;

    assert_eq!(transport.calls(), 2);
    assert!(!logs_contain("WARN"));
    assert!(!logs_contain("ERROR"));
    assert!(!logs_contain("invalid status code from webhook"));
}

/// Test: Validation failures are logged at error level
#[tokio::test]
#[traced_test]
async fn test_validation_failure_logged_as_error() {
    let transport = RecordingTransport::responding(200);
    let handler = handler(transport.clone(), &[ONE]);

    handler.handle(&message("tid-1", "{{ not json")).await;

    assert_eq!(transport.calls(), 0);
    logs_assert(|lines: &[&str]| {
        let line = find_line(lines, "error consuming message")?;
        if !line.contains("ERROR") {
            return Err(format!("expected an error, got {}", line));
        }
        if !line.contains("tid-1") || !line.contains("json couldn't be unmarshalled") {
            return Err(format!("correlation id or cause missing from {}", line));
        }
        Ok(())
    });
}
