// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Doris operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance. Port numbers are a fixed
//! contract with the Doris runtime images and must not drift.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `DorisCluster` CRD
pub const API_GROUP: &str = "doris.kubedoop.dev";

/// API version for the `DorisCluster` CRD
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "doris.kubedoop.dev/v1alpha1";

/// Kind name for `DorisCluster` resource
pub const KIND_DORIS_CLUSTER: &str = "DorisCluster";

/// API group for `AuthenticationClass` resources
pub const AUTHENTICATION_API_GROUP: &str = "authentication.kubedoop.dev";

/// Default field manager for server-side apply
pub const DEFAULT_FIELD_MANAGER: &str = "doris-operator";

// ============================================================================
// Image Constants
// ============================================================================

/// Default Doris product version
pub const DEFAULT_DORIS_VERSION: &str = "2.1.8";

/// Default Doris image repository
pub const DORIS_REPOSITORY: &str = "apache/doris";

/// Init container image used for kernel tuning on BE pods
pub const DEFAULT_INIT_IMAGE: &str = "selectdb/alpine:latest";

/// Vector log agent image
pub const DEFAULT_VECTOR_IMAGE: &str = "timberio/vector:0.38.0-alpine";

/// Default image pull policy
pub const DEFAULT_PULL_POLICY: &str = "IfNotPresent";

// ============================================================================
// Container Names
// ============================================================================

/// Name of the BE kernel tuning init container
pub const INIT_CONTAINER_NAME: &str = "default-init";

/// Name of the Vector sidecar container
pub const VECTOR_CONTAINER_NAME: &str = "vector";

// ============================================================================
// Paths
// ============================================================================

/// Doris installation root inside the images
pub const DORIS_ROOT: &str = "/opt/apache-doris";

/// FE entrypoint script
pub const FE_ENTRYPOINT: &str = "/opt/apache-doris/fe_entrypoint.sh";

/// BE entrypoint script
pub const BE_ENTRYPOINT: &str = "/opt/apache-doris/be_entrypoint.sh";

/// FE metadata directory (backed by a PVC)
pub const FE_METADATA_PATH: &str = "/opt/apache-doris/fe/doris-meta";

/// BE storage directory (backed by a PVC)
pub const BE_STORAGE_PATH: &str = "/opt/apache-doris/be/storage";

/// Mount path of the role-group `ConfigMap`
pub const CONFIG_MOUNT_PATH: &str = "/etc/doris/conf";

/// Mount path of the downward API pod info volume
pub const PODINFO_MOUNT_PATH: &str = "/etc/podinfo";

/// Log directory shared with the Vector agent
pub const LOG_MOUNT_PATH: &str = "/kubedoop/log";

/// Mount path of the Vector configuration inside the sidecar
pub const VECTOR_CONFIG_MOUNT_PATH: &str = "/kubedoop/config";

// ============================================================================
// Config File Names
// ============================================================================

/// FE runtime configuration file
pub const FE_CONFIG_FILENAME: &str = "fe.conf";

/// BE runtime configuration file
pub const BE_CONFIG_FILENAME: &str = "be.conf";

/// FE log4j2 configuration file (only written when FE logging is configured)
pub const FE_LOG4J2_CONFIG_FILENAME: &str = "log4j2.properties";

/// FE structured log file consumed by the Vector agent
pub const FE_LOG_FILENAME: &str = "fe.log4j2.xml";

/// Vector agent configuration file
pub const VECTOR_CONFIG_FILENAME: &str = "vector.yaml";

// ============================================================================
// FE Ports
// ============================================================================

/// FE HTTP port (web UI, health check, metrics)
pub const FE_HTTP_PORT: i32 = 8030;

/// FE thrift RPC port
pub const FE_RPC_PORT: i32 = 9020;

/// FE MySQL protocol query port
pub const FE_QUERY_PORT: i32 = 9030;

/// FE BDBJE edit log port
pub const FE_EDIT_LOG_PORT: i32 = 9010;

// ============================================================================
// BE Ports
// ============================================================================

/// BE thrift RPC port
pub const BE_RPC_PORT: i32 = 9060;

/// BE HTTP port (web server, health check, metrics)
pub const BE_HTTP_PORT: i32 = 8040;

/// BE heartbeat service port
pub const BE_HEARTBEAT_PORT: i32 = 9050;

/// BE bRPC port
pub const BE_BRPC_PORT: i32 = 8060;

// ============================================================================
// Port Names
// ============================================================================

pub const FE_HTTP_PORT_NAME: &str = "fe-http";
pub const FE_RPC_PORT_NAME: &str = "fe-rpc";
pub const FE_QUERY_PORT_NAME: &str = "fe-query";
pub const FE_EDIT_LOG_PORT_NAME: &str = "fe-edit-log";
pub const BE_RPC_PORT_NAME: &str = "be-rpc";
pub const BE_HTTP_PORT_NAME: &str = "be-http";
pub const BE_HEARTBEAT_PORT_NAME: &str = "be-heartbeat";
pub const BE_BRPC_PORT_NAME: &str = "be-brpc";

/// Port name on the per-role-group metrics service
pub const METRICS_PORT_NAME: &str = "metrics";

// ============================================================================
// Volume Names
// ============================================================================

/// FE metadata volume claim template
pub const FE_METADATA_VOLUME: &str = "fe-meta";

/// BE storage volume claim template
pub const BE_STORAGE_VOLUME: &str = "be-storage";

/// Downward API volume with pod labels and annotations
pub const PODINFO_VOLUME: &str = "podinfo";

/// Role-group `ConfigMap` volume
pub const CONFIG_VOLUME: &str = "doris-config";

/// Shared log volume (only present when the Vector agent is enabled)
pub const LOG_VOLUME: &str = "log";

// ============================================================================
// Resource Defaults
// ============================================================================

/// Default CPU request
pub const DEFAULT_CPU_REQUEST: &str = "2";

/// Default CPU limit
pub const DEFAULT_CPU_LIMIT: &str = "2";

/// Default FE memory limit
pub const FE_MEMORY_LIMIT: &str = "1Gi";

/// Default BE memory limit
pub const BE_MEMORY_LIMIT: &str = "2Gi";

/// Default FE metadata volume size
pub const FE_STORAGE_SIZE: &str = "10Gi";

/// Default BE storage volume size
pub const BE_STORAGE_SIZE: &str = "20Gi";

/// Default replica count for a role-group
pub const DEFAULT_REPLICAS: i32 = 1;

// ============================================================================
// Health Check Constants
// ============================================================================

/// HTTP path answered by both FE and BE when healthy
pub const HEALTH_CHECK_PATH: &str = "/api/health";

/// Initial delay before the first liveness/readiness probe
pub const PROBE_INITIAL_DELAY_SECS: i32 = 30;

/// Period between probes
pub const PROBE_PERIOD_SECS: i32 = 10;

// ============================================================================
// Environment
// ============================================================================

/// Number of FE followers that take part in master election
pub const DEFAULT_ELECT_NUMBER: &str = "3";

/// User the Doris entrypoints run as
pub const DEFAULT_USER: &str = "root";

/// Key in the aggregator discovery `ConfigMap` holding the Vector address
pub const VECTOR_AGGREGATOR_ADDRESS_KEY: &str = "ADDRESS";

/// Key in the LDAP bind credentials secret holding the admin user
pub const LDAP_ADMIN_USER_KEY: &str = "user";

/// Kernel tuning run by the BE init container
pub const BE_INIT_COMMAND: &str = "sysctl -w vm.max_map_count=2000000 && swapoff -a || true";

// ============================================================================
// Service Naming
// ============================================================================

/// Suffix of the headless per-role service
pub const SERVICE_INTERNAL_SUFFIX: &str = "-internal";

/// Suffix of the access per-role service
pub const SERVICE_ACCESS_SUFFIX: &str = "-service";

/// Suffix of the per-role-group metrics service
pub const SERVICE_METRICS_SUFFIX: &str = "-metrics";

/// Maximum length of a DNS-1123 label (Service names, pod hostnames)
pub const DNS1123_LABEL_MAX_LEN: usize = 63;

/// Default Kubernetes cluster domain
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

// ============================================================================
// Controller Timing
// ============================================================================

/// Requeue interval once the cluster reports ready (5 minutes)
pub const REQUEUE_WHEN_READY_SECS: u64 = 300;

/// Requeue interval while the cluster is converging (30 seconds)
pub const REQUEUE_WHEN_NOT_READY_SECS: u64 = 30;

/// Requeue interval after a failed reconciliation (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Tokio worker threads for the controller runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default bind address of the metrics and health HTTP server
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:8080";
