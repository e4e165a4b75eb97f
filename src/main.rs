// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use clap::Parser;
use doris_operator::{
    constants::{
        DEFAULT_FIELD_MANAGER, DEFAULT_METRICS_ADDR, ERROR_REQUEUE_DURATION_SECS,
        KIND_DORIS_CLUSTER, REQUEUE_WHEN_NOT_READY_SECS, REQUEUE_WHEN_READY_SECS,
        TOKIO_WORKER_THREADS,
    },
    context::Context,
    crd::DorisCluster,
    metrics,
    reconcilers::reconcile_doriscluster,
};
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

/// Apache Doris operator for Kubernetes
#[derive(Debug, Parser)]
#[command(name = "doris-operator", version, about)]
struct Cli {
    /// Namespace to watch; all namespaces when unset
    #[arg(long, env = "WATCH_NAMESPACE")]
    watch_namespace: Option<String>,

    /// Listen address of the metrics and health endpoints
    #[arg(long, env = "METRICS_ADDR", default_value = DEFAULT_METRICS_ADDR)]
    metrics_addr: SocketAddr,

    /// Field manager used for server-side apply
    #[arg(long, env = "FIELD_MANAGER", default_value = DEFAULT_FIELD_MANAGER)]
    field_manager: String,

    /// Log output format: text or json
    #[arg(long, env = "RUST_LOG_FORMAT", default_value = "text")]
    log_format: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("doris-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn init_logging(format: &str) {
    // RUST_LOG wins when set, otherwise INFO
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> Result<()> {
    init_logging(&cli.log_format);

    info!("Starting Doris Operator");
    debug!(?cli, "Parsed command line");

    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let context = Arc::new(Context::new(client.clone(), cli.field_manager.clone()));

    tokio::select! {
        result = run_doriscluster_controller(client, context, cli.watch_namespace.as_deref()) => {
            error!("CRITICAL: DorisCluster controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("DorisCluster controller exited unexpectedly without error")
        }
        result = run_metrics_server(cli.metrics_addr) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("metrics server exited unexpectedly without error")
        }
    }
}

/// Serve `/metrics` and `/healthz`
async fn run_metrics_server(addr: SocketAddr) -> Result<()> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(|| async { "ok" }));

    info!(%addr, "Metrics server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Run the `DorisCluster` controller
async fn run_doriscluster_controller(
    client: Client,
    context: Arc<Context>,
    namespace: Option<&str>,
) -> Result<()> {
    info!(namespace = ?namespace, "Starting DorisCluster controller");

    let api: Api<DorisCluster> = match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };

    Controller::new(api, Config::default())
        .run(reconcile_doriscluster_wrapper, error_policy, context)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `DorisCluster`
async fn reconcile_doriscluster_wrapper(
    cluster: Arc<DorisCluster>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    debug!(
        name = %cluster.name_any(),
        namespace = ?cluster.namespace(),
        "Reconcile wrapper called for DorisCluster"
    );

    match reconcile_doriscluster(ctx, (*cluster).clone()).await {
        Ok(ready) => {
            metrics::record_reconciliation_success(KIND_DORIS_CLUSTER, start.elapsed());
            info!("Successfully reconciled DorisCluster: {}", cluster.name_any());

            if ready {
                metrics::record_reconciliation_requeue(KIND_DORIS_CLUSTER, "ready");
                Ok(Action::requeue(Duration::from_secs(REQUEUE_WHEN_READY_SECS)))
            } else {
                debug!("Cluster not ready, requeueing in {}s", REQUEUE_WHEN_NOT_READY_SECS);
                metrics::record_reconciliation_requeue(KIND_DORIS_CLUSTER, "not_ready");
                Ok(Action::requeue(Duration::from_secs(
                    REQUEUE_WHEN_NOT_READY_SECS,
                )))
            }
        }
        Err(e) => {
            metrics::record_reconciliation_error(KIND_DORIS_CLUSTER, start.elapsed());
            error!("Failed to reconcile DorisCluster {}: {:#}", cluster.name_any(), e);
            Err(e.into())
        }
    }
}

/// Error policy for the `DorisCluster` controller
fn error_policy(_resource: Arc<DorisCluster>, _err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    metrics::record_reconciliation_requeue(KIND_DORIS_CLUSTER, "error");
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}
