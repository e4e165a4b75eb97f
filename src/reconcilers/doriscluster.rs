// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `DorisCluster` reconciliation entry point called by the controller.

use crate::constants::KIND_DORIS_CLUSTER;
use crate::context::Context;
use crate::crd::DorisCluster;
use crate::metrics;
use crate::reconcilers::cluster::ClusterReconciler;
use crate::reconcilers::status::DorisClusterStatusUpdater;
use crate::status_reasons::CONDITION_TYPE_READY;
use anyhow::Result;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reconcile one `DorisCluster`. Returns whether the cluster is ready.
///
/// One pass builds the full desired state, converges it, reads back the
/// `StatefulSet`s and writes the `Ready` condition. A paused cluster only gets
/// its status updated.
///
/// # Errors
///
/// Returns an error if desired state cannot be built, an object cannot be
/// applied or read, or the status patch fails.
pub async fn reconcile_doriscluster(ctx: Arc<Context>, cluster: DorisCluster) -> Result<bool> {
    let namespace = cluster.namespace().unwrap_or_default();
    let name = cluster.name_any();

    info!("Reconciling DorisCluster: {}/{}", namespace, name);
    debug!(
        namespace = %namespace,
        name = %name,
        generation = ?cluster.metadata.generation,
        "Starting DorisCluster reconciliation"
    );

    let reconciler = ClusterReconciler::new(&cluster);
    let mut status = DorisClusterStatusUpdater::new(&cluster);

    if reconciler.paused() {
        warn!(
            namespace = %namespace,
            name = %name,
            "Reconciliation paused, skipping convergence"
        );
        status.set_paused();
        status.apply(&ctx.client).await?;
        metrics::record_cluster_ready(&namespace, &name, false);
        return Ok(false);
    }

    let resources = ctx.resources(&namespace);

    let set = match reconciler.register_resources(&resources).await {
        Ok(set) => set,
        Err(e) => {
            error!(
                namespace = %namespace,
                name = %name,
                error = %e,
                "Failed to build desired state"
            );
            metrics::record_error(KIND_DORIS_CLUSTER, e.status_reason());
            status.set_condition(CONDITION_TYPE_READY, "False", e.status_reason(), &e.to_string());
            if let Err(status_err) = status.apply(&ctx.client).await {
                warn!(error = %status_err, "Failed to record build error in status");
            }
            metrics::record_cluster_ready(&namespace, &name, false);
            return Err(e.into());
        }
    };

    if let Err(e) = reconciler.reconcile(&resources, &set).await {
        metrics::record_error(KIND_DORIS_CLUSTER, "apply_error");
        return Err(e);
    }

    let children = reconciler.readiness(&resources, &set).await?;
    for child in &children {
        metrics::record_role_group_replicas(&namespace, &child.name, child.desired, child.ready);
    }
    let ready = status.set_readiness(&children, reconciler.stopped());
    status.set_observed_generation(cluster.metadata.generation);
    status.apply(&ctx.client).await?;

    metrics::record_cluster_ready(&namespace, &name, ready);
    debug!(
        namespace = %namespace,
        name = %name,
        ready,
        stateful_sets = children.len(),
        "Finished DorisCluster reconciliation"
    );
    Ok(ready)
}
