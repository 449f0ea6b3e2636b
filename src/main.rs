// fhir2spine - FHIR Patient search to Spine PDS bridging gateway
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use fhir2spine::audit::{AuditSink, FileAuditSink, NoopAuditSink};
use fhir2spine::cli::Args;
use fhir2spine::config::AppConfig;
use fhir2spine::pipeline::Pipeline;
use fhir2spine::queue::{spawn_workers, ChannelQueue};
use fhir2spine::server::create_router;
use fhir2spine::spine::SpineClient;
use fhir2spine::utils::logging;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(workers) = args.workers {
        config.queue.workers = workers;
        config.validate()?;
    }

    if args.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting fhir2spine v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Build the TLS MA client for Spine
    info!("Spine PDS endpoint: {}", config.spine.pds_url);
    let backend = Arc::new(SpineClient::new(&config.spine, &config.tls)?);

    // Phase 4: Start the audit writer
    let (audit, audit_writer) = if config.audit.enabled {
        info!("Auditing Spine messages to {}", config.audit.directory);
        let (sink, handle) = FileAuditSink::spawn(&config.audit.directory);
        (Arc::new(sink) as Arc<dyn AuditSink>, Some(handle))
    } else {
        warn!("Audit trail disabled");
        (Arc::new(NoopAuditSink) as Arc<dyn AuditSink>, None)
    };

    // Phase 5: Queue and request handler workers
    let pipeline = Arc::new(Pipeline::new(&config, backend, audit));
    let (queue, consumer) = ChannelQueue::bounded(config.queue.capacity);
    let workers = spawn_workers(consumer, pipeline, config.queue.workers);

    // Phase 6: Build and start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_router(config, Arc::new(queue));

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Phase 7: Drain. The router (and with it the queue producer) is gone,
    // so workers finish what is queued and exit, releasing the audit sink.
    info!("Draining {} worker(s)", workers.len());
    futures::future::join_all(workers).await;
    if let Some(handle) = audit_writer {
        if let Err(e) = handle.await {
            warn!("Audit writer ended abnormally: {}", e);
        }
    }

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
