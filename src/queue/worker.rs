// Request handler worker pool
// Author: kelexine (https://github.com/kelexine)

use super::QueueConsumer;
use crate::pipeline::Pipeline;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Start `count` workers draining `consumer` through `pipeline`.
///
/// Workers stop once the queue is closed and empty, so dropping every
/// producer drains in-flight work and then lets the handles complete.
pub fn spawn_workers(consumer: QueueConsumer, pipeline: Arc<Pipeline>, count: usize) -> Vec<JoinHandle<()>> {
    info!("Starting {} request handler worker(s)", count);

    (0..count)
        .map(|id| {
            let consumer = consumer.clone();
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                while let Some(queued) = consumer.recv().await {
                    let exchange_id = queued.message.exchange_id.clone();
                    let response = pipeline.handle(queued.message).await;

                    if let Some(reply) = queued.reply {
                        if reply.send(response).is_err() {
                            debug!("Caller for exchange {} went away before the reply", exchange_id);
                        }
                    }
                }
                debug!("Worker {} stopped", id);
            })
        })
        .collect()
}
