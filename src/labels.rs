// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all builders.
//!
//! This module defines standard Kubernetes labels and Doris-specific labels/annotations
//! to ensure consistency across all resources created by the controller.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the component within the architecture (`fe` or `be`)
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of the application (always `doris`)
pub const K8S_NAME: &str = "app.kubernetes.io/name";

/// Standard label for a unique name identifying the instance of an application
pub const K8S_INSTANCE: &str = "app.kubernetes.io/instance";

/// Role-group the pod belongs to
pub const K8S_ROLE_GROUP: &str = "app.kubernetes.io/role-group";

// ============================================================================
// Kubernetes Standard Label Values
// ============================================================================

/// Value for `app.kubernetes.io/name`
pub const APP_NAME_DORIS: &str = "doris";

/// Value for `app.kubernetes.io/managed-by`
pub const MANAGED_BY_DORIS_OPERATOR: &str = "doris-operator";

// ============================================================================
// Doris-Specific Labels
// ============================================================================

/// Ownership label keyed by cluster name, set on per-role services
pub const OWNER_REFERENCE_LABEL: &str = "app.doris.ownerreference/name";

/// Service role label (`internal` or `access`)
pub const SERVICE_ROLE_LABEL: &str = "app.doris.service/role";

/// Value of [`SERVICE_ROLE_LABEL`] on headless services
pub const SERVICE_ROLE_INTERNAL: &str = "internal";

/// Value of [`SERVICE_ROLE_LABEL`] on access services
pub const SERVICE_ROLE_ACCESS: &str = "access";

// ============================================================================
// Annotations
// ============================================================================

/// Hash of the service spec, used for change tracking
pub const HASH_ANNOTATION: &str = "app.doris.components/hash";

// ============================================================================
// Prometheus Scrape Labels/Annotations
// ============================================================================

pub const PROMETHEUS_SCRAPE: &str = "prometheus.io/scrape";
pub const PROMETHEUS_PATH: &str = "prometheus.io/path";
pub const PROMETHEUS_PORT: &str = "prometheus.io/port";
pub const PROMETHEUS_SCHEME: &str = "prometheus.io/scheme";

/// Path scraped on both FE and BE http ports
pub const PROMETHEUS_METRICS_PATH: &str = "/metrics";

/// Scheme used for scraping
pub const PROMETHEUS_HTTP_SCHEME: &str = "http";
