// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for Doris cluster management.
//!
//! This module defines the Kubernetes Custom Resource Definitions consumed by the
//! operator.
//!
//! # Resource Types
//!
//! - [`DorisCluster`] - A Doris analytical database cluster with a Frontend (FE)
//!   and a Backend (BE) role, each split into named role-groups
//! - [`AuthenticationClass`] - Shared authentication provider definition; only the
//!   LDAP provider is read by this operator
//!
//! # Configuration Layers
//!
//! Configuration flows cluster → role → role-group. A role's [`ConfigSpec`] and
//! [`OverridesSpec`] apply to every role-group; a role-group may layer its own
//! fragments on top, with role-group values winning field by field (see
//! [`crate::merge`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use doris_operator::crd::{DorisClusterSpec, RoleGroupSpec, RoleSpec};
//! use std::collections::BTreeMap;
//!
//! let mut groups = BTreeMap::new();
//! groups.insert(
//!     "default".to_string(),
//!     RoleGroupSpec {
//!         replicas: Some(3),
//!         ..Default::default()
//!     },
//! );
//!
//! let spec = DorisClusterSpec {
//!     front_end: Some(RoleSpec {
//!         role_groups: groups.clone(),
//!         ..Default::default()
//!     }),
//!     back_end: Some(RoleSpec {
//!         role_groups: groups,
//!         ..Default::default()
//!     }),
//!     ..Default::default()
//! };
//! ```

use k8s_openapi::api::core::v1::{Affinity, Toleration};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. `Ready` is the encompassing condition; child conditions
    /// are named after the `StatefulSet` they describe.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

// ============================================================================
// DorisCluster
// ============================================================================

/// `DorisCluster` defines a Doris cluster with one Frontend and one Backend role.
///
/// # Example
///
/// ```yaml
/// apiVersion: doris.kubedoop.dev/v1alpha1
/// kind: DorisCluster
/// metadata:
///   name: analytics
/// spec:
///   image:
///     productVersion: "2.1.8"
///   clusterConfig:
///     ingressHost: doris.example.com
///   frontEnd:
///     roleGroups:
///       default:
///         replicas: 3
///   backEnd:
///     config:
///       resources:
///         storage:
///           capacity: 100Gi
///     roleGroups:
///       default:
///         replicas: 5
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "doris.kubedoop.dev",
    version = "v1alpha1",
    kind = "DorisCluster",
    namespaced,
    shortname = "doris",
    doc = "DorisCluster describes an Apache Doris cluster made of a Frontend (FE) role for metadata and query coordination and a Backend (BE) role for storage and compute. Each role is split into independently sized role-groups.",
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "DorisClusterStatus")]
#[serde(rename_all = "camelCase")]
pub struct DorisClusterSpec {
    /// Container image selection shared by FE and BE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSpec>,

    /// Cluster-wide settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_config: Option<ClusterConfigSpec>,

    /// Operational switches (stop, pause reconciliation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_operation: Option<ClusterOperationSpec>,

    /// Frontend role. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_end: Option<RoleSpec>,

    /// Backend role. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_end: Option<RoleSpec>,
}

/// `DorisCluster` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DorisClusterStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Desired replicas summed over every `StatefulSet`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    /// Ready replicas summed over every `StatefulSet`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_replicas: Option<i32>,
}

/// Container image selection.
///
/// Precedence: `custom` > `repo` + `productVersion` > operator default.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    /// Full image reference used verbatim for both roles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,

    /// Image repository; the tag is derived as `{fe|be}-{productVersion}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Doris version used in the tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_version: Option<String>,

    /// Image pull policy (`Always`, `IfNotPresent`, `Never`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<String>,

    /// Name of an image pull secret in the cluster namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_secret_name: Option<String>,
}

/// Cluster-wide configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfigSpec {
    /// Kubernetes cluster domain used for service FQDNs. Defaults to `cluster.local`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_domain: Option<String>,

    /// Host name routed to the FE http port through an `Ingress`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_host: Option<String>,

    /// Name of the discovery `ConfigMap` of the Vector log aggregator.
    ///
    /// Required when any role-group enables the Vector agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_aggregator_config_map_name: Option<String>,

    /// Authentication providers. Only the first entry is consulted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<AuthenticationSpec>,
}

/// Reference to an `AuthenticationClass` in the cluster namespace.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationSpec {
    pub authentication_class: String,
}

/// Cluster operation switches.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOperationSpec {
    /// Scale every role-group to zero replicas. Reversible.
    #[serde(default)]
    pub stopped: bool,

    /// Skip convergence entirely while set.
    #[serde(default)]
    pub reconciliation_paused: bool,
}

/// Per-role settings (FE or BE).
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleSpec {
    /// Default configuration for every role-group of this role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigSpec>,

    /// Named role-groups.
    #[serde(default)]
    pub role_groups: BTreeMap<String, RoleGroupSpec>,

    /// Role-wide settings that do not apply per role-group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_config: Option<RoleConfigSpec>,

    /// Role-level overrides.
    #[serde(flatten)]
    pub overrides: OverridesSpec,
}

/// A named, independently sized subset of a role's replicas.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleGroupSpec {
    /// Desired replica count. Defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0, max = 2_147_483_647))]
    pub replicas: Option<i32>,

    /// Configuration layered over the role-level config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigSpec>,

    /// Overrides layered over the role-level overrides.
    #[serde(flatten)]
    pub overrides: OverridesSpec,
}

/// Role-wide settings.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleConfigSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_disruption_budget: Option<PodDisruptionBudgetSpec>,
}

/// `PodDisruptionBudget` generated per role.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodDisruptionBudgetSpec {
    #[serde(default)]
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<i32>,
}

/// Resource and runtime configuration of a role or role-group.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerations: Option<Vec<Toleration>>,

    /// Pod termination grace period, e.g. `30s`, `2m`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graceful_shutdown_timeout: Option<String>,
}

/// Compute and storage resources.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageResource>,
}

/// CPU request (`min`) and limit (`max`).
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CpuResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Quantity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Quantity>,
}

/// Memory limit, also used as the request.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemoryResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Quantity>,
}

/// Persistent volume settings for the FE metadata or BE storage claim.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Quantity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSpec {
    /// Ship logs to the cluster's Vector aggregator through a sidecar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_vector_agent: Option<bool>,

    /// Per-container log configuration keyed by container name (`fe`, `be`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub containers: BTreeMap<String, ContainerLoggingSpec>,
}

/// Log levels for one container.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerLoggingSpec {
    /// Logger name → level. The `ROOT` key sets the root logger level.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub loggers: BTreeMap<String, LogLevelSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub console: Option<LogLevelSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<LogLevelSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogLevelSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Overrides applied after the operator generated its objects.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverridesSpec {
    /// Config file name → full replacement content.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config_overrides: BTreeMap<String, String>,

    /// Environment variables set on the main container.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env_overrides: BTreeMap<String, String>,

    /// Replacement arguments for the main container.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cli_overrides: Vec<String>,

    /// Pod template fragment deep-merged into the generated pod template.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub pod_overrides: Option<serde_json::Value>,
}

fn preserve_unknown_fields(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "nullable": true,
        "x-kubernetes-preserve-unknown-fields": true
    })
}

// ============================================================================
// AuthenticationClass
// ============================================================================

/// `AuthenticationClass` describes an authentication provider shared by products.
///
/// The operator only reads the LDAP provider to configure FE LDAP login.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "authentication.kubedoop.dev",
    version = "v1alpha1",
    kind = "AuthenticationClass",
    namespaced,
    doc = "AuthenticationClass describes an authentication provider that products can reference by name."
)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationClassSpec {
    pub provider: AuthenticationProvider,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationProvider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldap: Option<LdapProvider>,
}

/// LDAP server settings.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LdapProvider {
    pub hostname: String,

    #[serde(default = "default_ldap_port")]
    #[schemars(range(min = 0, max = 65535))]
    pub port: i32,

    #[serde(default)]
    pub search_base: String,

    #[serde(default)]
    pub search_filter: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_credentials: Option<BindCredentials>,
}

fn default_ldap_port() -> i32 {
    389
}

/// Credentials used to bind to the LDAP server.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BindCredentials {
    /// Name of the secret holding the bind user under the `user` key.
    pub secret_class: String,
}
