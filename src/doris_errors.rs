// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for desired-state construction.
//!
//! This module provides specialized error types for:
//! - Layered configuration merging (role → role-group)
//! - Cross-reference validation (e.g. log aggregator configuration)
//! - Wiring defects such as an unknown role name
//!
//! Every variant here is fatal to the resource being built and bubbles up through the
//! registrar, role reconciler and cluster reconciler to the controller, which requeues.
//! External lookup failures (LDAP) are not represented: they degrade locally.

use thiserror::Error;

/// Errors raised while merging role and role-group fragments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// A pod override fragment was not a JSON object
    #[error("pod overrides at {layer} level must be a JSON object, got {found}")]
    PodOverridesNotObject {
        /// Layer that supplied the fragment (`role` or `role-group`)
        layer: String,
        /// JSON type that was found instead
        found: String,
    },
}

/// Errors raised while building the desired state of a cluster.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DorisError {
    /// Role and role-group fragments could not be merged
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// The Vector agent is enabled but no aggregator `ConfigMap` is configured
    ///
    /// Shipped logs would be silently dropped, so the role-group is not built.
    #[error(
        "vector agent is enabled for role-group '{role_group}' but clusterConfig.vectorAggregatorConfigMapName is not set"
    )]
    MissingVectorAggregator {
        /// Full name of the role-group
        role_group: String,
    },

    /// A role name outside {fe, be} reached a role-keyed lookup
    #[error("unknown role to get metrics port: {role}")]
    UnknownRole {
        /// The role name that was passed
        role: String,
    },

    /// A required role (`frontEnd` or `backEnd`) is absent from the cluster spec
    #[error("cluster spec is missing the required '{role}' role")]
    MissingRole {
        /// Spec field of the missing role
        role: String,
    },

    /// A role-group name cannot be used in Kubernetes object names
    #[error("invalid role-group name '{role_group}': {reason}")]
    InvalidRoleGroupName {
        /// Role-group name as written in the cluster spec
        role_group: String,
        /// Which naming rule was violated
        reason: String,
    },

    /// `gracefulShutdownTimeout` could not be parsed
    #[error("invalid graceful shutdown timeout '{value}': expected e.g. 30s, 5m, 1h")]
    InvalidDuration {
        /// The raw value from the cluster spec
        value: String,
    },

    /// A generated file could not be rendered
    #[error("failed to render {file}: {reason}")]
    Render {
        /// File name being rendered
        file: String,
        /// Specific reason for the failure
        reason: String,
    },

    /// Pod overrides could not be applied to the generated pod template
    #[error("failed to apply pod overrides to '{name}': {reason}")]
    PodOverrides {
        /// Name of the `StatefulSet`
        name: String,
        /// Specific reason for the failure
        reason: String,
    },
}

impl DorisError {
    /// Returns the Kubernetes status reason code for this error.
    ///
    /// Used as the `reason` of the `Ready` condition when a reconcile fails while
    /// building desired state.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Merge(_) => "MergeFailed",
            Self::MissingVectorAggregator { .. } => "MissingVectorAggregator",
            Self::UnknownRole { .. } => "UnknownRole",
            Self::MissingRole { .. } => "MissingRole",
            Self::InvalidRoleGroupName { .. } => "InvalidRoleGroupName",
            Self::InvalidDuration { .. } => "InvalidConfiguration",
            Self::Render { .. } => "RenderFailed",
            Self::PodOverrides { .. } => "InvalidPodOverrides",
        }
    }
}
