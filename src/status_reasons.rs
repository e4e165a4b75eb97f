// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition reasons for `DorisCluster` resources.
//!
//! Reasons are programmatic identifiers in CamelCase that explain why a condition has
//! a particular status.
//!
//! # Condition Hierarchy
//!
//! A `DorisCluster` carries a single encompassing `type: Ready` condition plus one
//! child condition per role-group `StatefulSet`, named `StatefulSet-{name}`.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       reason: PartiallyReady
//!       message: "1/2 StatefulSets are ready (6/8 replicas)"
//!     - type: StatefulSet-analytics-fe-default
//!       status: "True"
//!       reason: Ready
//!       message: "3/3 replicas ready"
//!     - type: StatefulSet-analytics-be-default
//!       status: "False"
//!       reason: Progressing
//!       message: "3/5 replicas ready"
//! ```

// ============================================================================
// Condition Types
// ============================================================================

/// Encompassing condition type.
pub const CONDITION_TYPE_READY: &str = "Ready";

/// Prefix of per-`StatefulSet` child condition types.
pub const CONDITION_TYPE_STATEFULSET_PREFIX: &str = "StatefulSet";

// ============================================================================
// Reasons
// ============================================================================

/// Every `StatefulSet` is ready. Use on the encompassing `Ready` condition.
pub const REASON_ALL_READY: &str = "AllReady";

/// A single `StatefulSet` is ready. Use on child conditions.
pub const REASON_READY: &str = "Ready";

/// Some but not all `StatefulSets` are ready.
pub const REASON_PARTIALLY_READY: &str = "PartiallyReady";

/// No `StatefulSet` is ready.
pub const REASON_NOT_READY: &str = "NotReady";

/// A `StatefulSet` exists but has not reached its desired replicas yet.
pub const REASON_PROGRESSING: &str = "Progressing";

/// A registered `StatefulSet` was not found after convergence.
pub const REASON_NOT_FOUND: &str = "NotFound";

/// The cluster is stopped and all role-groups are scaled to zero.
pub const REASON_STOPPED: &str = "Stopped";

/// Reconciliation is paused through `clusterOperation.reconciliationPaused`.
pub const REASON_RECONCILIATION_PAUSED: &str = "ReconciliationPaused";

/// No role-group is declared on any role.
pub const REASON_NO_CHILDREN: &str = "NoChildren";

/// Create a child condition type for a `StatefulSet`.
///
/// # Example
///
/// ```rust
/// use doris_operator::status_reasons::stateful_set_condition_type;
///
/// assert_eq!(
///     stateful_set_condition_type("analytics-fe-default"),
///     "StatefulSet-analytics-fe-default"
/// );
/// ```
#[must_use]
pub fn stateful_set_condition_type(name: &str) -> String {
    format!("{CONDITION_TYPE_STATEFULSET_PREFIX}-{name}")
}
