use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures_util::{Stream, StreamExt};
use lapin::message::Delivery;
use tracing::{error, info, warn};

use crate::{
    clients::rbmq::{DeliveryAcker, inbound_message},
    handler::MessageHandler,
};

/// Why the worker stopped consuming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The shutdown future resolved.
    Shutdown,
    /// The broker closed the delivery stream, usually after losing the connection.
    StreamEnded,
}

impl WorkerExit {
    /// A stream that ended on its own is an error so the process exits non-zero
    /// and gets restarted by its supervisor.
    pub fn into_result(self) -> anyhow::Result<()> {
        match self {
            WorkerExit::Shutdown => Ok(()),
            WorkerExit::StreamEnded => Err(anyhow::anyhow!("consumer stream ended")),
        }
    }
}

/// Consumes deliveries until `shutdown` resolves or the stream ends.
///
/// Up to `concurrency` messages are handled at once. Every delivery is
/// acknowledged after handling whatever the outcome, so failed messages are
/// never redelivered. Messages already being handled when `shutdown` fires run
/// to completion.
pub async fn run<D, A, S>(
    deliveries: D,
    acker: Arc<A>,
    handler: Arc<MessageHandler>,
    concurrency: usize,
    shutdown: S,
) -> WorkerExit
where
    D: Stream<Item = Result<Delivery, lapin::Error>>,
    A: DeliveryAcker + ?Sized,
    S: Future<Output = ()>,
{
    info!(concurrency, "Worker started, waiting for messages");

    let stopped = AtomicBool::new(false);
    let shutdown = async {
        shutdown.await;
        stopped.store(true, Ordering::SeqCst);
    };

    deliveries
        .take_until(shutdown)
        .for_each_concurrent(concurrency, |delivery| {
            let acker = Arc::clone(&acker);
            let handler = Arc::clone(&handler);

            async move {
                let delivery = match delivery {
                    Ok(delivery) => delivery,
                    Err(e) => {
                        error!(error = %e, "Failed to receive message from queue");
                        return;
                    }
                };

                let message = inbound_message(&delivery);
                handler.handle(&message).await;

                if let Err(e) = acker.acknowledge(delivery.delivery_tag).await {
                    warn!(
                        delivery_tag = delivery.delivery_tag,
                        error = %e,
                        "Failed to acknowledge message"
                    );
                }
            }
        })
        .await;

    if stopped.load(Ordering::SeqCst) {
        info!("Worker stopped consuming");
        WorkerExit::Shutdown
    } else {
        error!("Consumer stream ended without a shutdown signal");
        WorkerExit::StreamEnded
    }
}
