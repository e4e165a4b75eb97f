// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status conditions for `DorisCluster`.
//!
//! Conditions follow the standard Kubernetes shape:
//! - `type`: the aspect being reported (`Ready`, `StatefulSet-<name>`)
//! - `status`: `True`, `False` or `Unknown`
//! - `reason`: a `CamelCase` identifier from [`crate::status_reasons`]
//! - `message`: a human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp of the last status flip
//!
//! A reconcile pass collects every change in a [`DorisClusterStatusUpdater`] and
//! writes them with one merge patch on the status subresource. The patch is
//! skipped when nothing changed semantically, so status writes do not trigger
//! a fresh reconcile by themselves.
//!
//! # Example
//!
//! ```rust,no_run
//! use doris_operator::reconcilers::status::create_condition;
//!
//! let condition = create_condition("Ready", "True", "AllReady", "All 2 StatefulSets are ready");
//! assert_eq!(condition.status, "True");
//! ```

use crate::crd::{Condition, DorisCluster, DorisClusterStatus};
use crate::status_reasons::{
    stateful_set_condition_type, CONDITION_TYPE_READY, CONDITION_TYPE_STATEFULSET_PREFIX,
    REASON_ALL_READY, REASON_NOT_FOUND, REASON_NOT_READY, REASON_NO_CHILDREN,
    REASON_PARTIALLY_READY, REASON_PROGRESSING, REASON_READY, REASON_RECONCILIATION_PAUSED,
    REASON_STOPPED,
};
use anyhow::Result;
use chrono::Utc;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use std::collections::BTreeSet;
use tracing::debug;

/// Create a new condition stamped with the current time.
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in place (no API call).
///
/// `lastTransitionTime` is preserved when the status value does not change and
/// refreshed when it does.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Compare two condition lists, ignoring `lastTransitionTime` and ordering.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    current.len() == new.len()
        && new.iter().all(|new_cond| {
            find_condition(current, &new_cond.r#type).is_some_and(|curr| {
                curr.status == new_cond.status
                    && curr.reason == new_cond.reason
                    && curr.message == new_cond.message
            })
        })
}

/// Observed readiness of one registered `StatefulSet`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatefulSetReadiness {
    pub name: String,
    /// Replica count the operator asked for
    pub desired: i32,
    /// `status.readyReplicas` as last reported, 0 when absent
    pub ready: i32,
    /// Whether the object exists at all
    pub found: bool,
}

impl StatefulSetReadiness {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.found && self.ready >= self.desired
    }

    fn condition(&self) -> (&'static str, &'static str, String) {
        if !self.found {
            (
                "False",
                REASON_NOT_FOUND,
                format!("StatefulSet {} not found", self.name),
            )
        } else if self.is_ready() {
            (
                "True",
                REASON_READY,
                format!("{}/{} replicas ready", self.ready, self.desired),
            )
        } else {
            (
                "False",
                REASON_PROGRESSING,
                format!("{}/{} replicas ready", self.ready, self.desired),
            )
        }
    }
}

/// Collects status changes for one `DorisCluster` and applies them in one patch.
pub struct DorisClusterStatusUpdater {
    namespace: String,
    name: String,
    current_status: Option<DorisClusterStatus>,
    new_status: DorisClusterStatus,
}

impl DorisClusterStatusUpdater {
    /// Start from the cluster's current status, or an empty one.
    #[must_use]
    pub fn new(cluster: &DorisCluster) -> Self {
        let current_status = cluster.status.clone();
        let new_status = current_status.clone().unwrap_or_default();

        Self {
            namespace: cluster.namespace().unwrap_or_default(),
            name: cluster.name_any(),
            current_status,
            new_status,
        }
    }

    pub fn set_condition(
        &mut self,
        condition_type: &str,
        status: &str,
        reason: &str,
        message: &str,
    ) {
        update_condition_in_memory(
            &mut self.new_status.conditions,
            condition_type,
            status,
            reason,
            message,
        );
    }

    pub fn set_observed_generation(&mut self, generation: Option<i64>) {
        self.new_status.observed_generation = generation;
    }

    /// Record that reconciliation is paused. Child conditions are left untouched.
    pub fn set_paused(&mut self) {
        self.set_condition(
            CONDITION_TYPE_READY,
            "False",
            REASON_RECONCILIATION_PAUSED,
            "Reconciliation is paused by clusterOperation.reconciliationPaused",
        );
    }

    /// Derive the `Ready` condition, per-`StatefulSet` conditions and replica
    /// totals from observed readiness. Returns whether the cluster is ready.
    ///
    /// Conditions for `StatefulSet`s no longer registered are dropped.
    pub fn set_readiness(&mut self, children: &[StatefulSetReadiness], stopped: bool) -> bool {
        let current: BTreeSet<String> = children
            .iter()
            .map(|c| stateful_set_condition_type(&c.name))
            .collect();
        self.new_status.conditions.retain(|c| {
            !c.r#type.starts_with(CONDITION_TYPE_STATEFULSET_PREFIX) || current.contains(&c.r#type)
        });

        for child in children {
            let (status, reason, message) = child.condition();
            self.set_condition(
                &stateful_set_condition_type(&child.name),
                status,
                reason,
                &message,
            );
        }

        let total = children.len();
        let ready = children.iter().filter(|c| c.is_ready()).count();
        let cluster_ready = !stopped && total > 0 && ready == total;

        let (status, reason, message) = if stopped {
            (
                "False",
                REASON_STOPPED,
                "Cluster is stopped, all role groups are scaled to 0".to_string(),
            )
        } else if total == 0 {
            (
                "False",
                REASON_NO_CHILDREN,
                "No role groups are declared".to_string(),
            )
        } else if cluster_ready {
            (
                "True",
                REASON_ALL_READY,
                format!("All {total} StatefulSets are ready"),
            )
        } else if ready > 0 {
            (
                "False",
                REASON_PARTIALLY_READY,
                format!("{ready}/{total} StatefulSets are ready"),
            )
        } else {
            (
                "False",
                REASON_NOT_READY,
                format!("0/{total} StatefulSets are ready"),
            )
        };
        self.set_condition(CONDITION_TYPE_READY, status, reason, &message);

        self.new_status.replicas = Some(children.iter().map(|c| c.desired).sum());
        self.new_status.ready_replicas =
            Some(children.iter().filter(|c| c.found).map(|c| c.ready).sum());

        cluster_ready
    }

    /// Whether the collected status differs semantically from the current one.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => {
                current.observed_generation != self.new_status.observed_generation
                    || current.replicas != self.new_status.replicas
                    || current.ready_replicas != self.new_status.ready_replicas
                    || !conditions_equal(&current.conditions, &self.new_status.conditions)
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> &DorisClusterStatus {
        &self.new_status
    }

    /// Write the collected status with a single merge patch, if anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the Kubernetes API call fails.
    pub async fn apply(&self, client: &Client) -> Result<()> {
        if !self.has_changes() {
            debug!(
                namespace = %self.namespace,
                name = %self.name,
                "DorisCluster status unchanged, skipping update"
            );
            return Ok(());
        }

        let api: Api<DorisCluster> = Api::namespaced(client.clone(), &self.namespace);
        let patch = json!({ "status": self.new_status });
        api.patch_status(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        debug!(
            namespace = %self.namespace,
            name = %self.name,
            conditions = self.new_status.conditions.len(),
            "Updated DorisCluster status"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
