// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Component builders for the Doris Frontend (FE) and Backend (BE) roles.
//!
//! Each role implements [`ComponentBuilder`], the capability set the generic resource
//! builders in [`crate::doris_resources`] are parametrized by. The variant is chosen
//! exactly once, in [`new_component`]; nothing downstream inspects role names.
//!
//! ## Module Structure
//!
//! - [`container`] - Shared container, probe, env and claim helpers
//! - [`fe`] - Frontend builder
//! - [`be`] - Backend builder
//! - [`ldap`] - LDAP resolution for FE authentication
//! - [`logging`] - log4j2 and Vector agent configuration generators

pub mod be;
pub mod container;
pub mod fe;
pub mod ldap;
pub mod logging;

use crate::constants::{
    BE_BRPC_PORT, BE_BRPC_PORT_NAME, BE_HEARTBEAT_PORT, BE_HEARTBEAT_PORT_NAME, BE_HTTP_PORT,
    BE_HTTP_PORT_NAME, BE_RPC_PORT, BE_RPC_PORT_NAME, DEFAULT_CLUSTER_DOMAIN,
    DEFAULT_DORIS_VERSION, DEFAULT_PULL_POLICY, DORIS_REPOSITORY, FE_EDIT_LOG_PORT,
    FE_EDIT_LOG_PORT_NAME, FE_HTTP_PORT, FE_HTTP_PORT_NAME, FE_QUERY_PORT, FE_QUERY_PORT_NAME,
    FE_RPC_PORT, FE_RPC_PORT_NAME, SERVICE_ACCESS_SUFFIX, SERVICE_INTERNAL_SUFFIX,
};
use crate::crd::{ConfigSpec, DorisCluster, ImageSpec, OverridesSpec};
use crate::doris_errors::DorisError;
use k8s_openapi::api::core::v1::{Container, ContainerPort, PersistentVolumeClaim, Volume};
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;

pub use ldap::LdapSettings;

/// The two Doris roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    /// Frontend: metadata and query coordination, JVM based
    Fe,
    /// Backend: storage and compute, native process
    Be,
}

impl ComponentKind {
    /// Role name as used in object names, labels and container names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fe => "fe",
            Self::Be => "be",
        }
    }

    /// Static port topology of the role.
    #[must_use]
    pub fn service_config(self) -> ComponentServiceConfig {
        match self {
            Self::Fe => ComponentServiceConfig {
                kind: self,
                internal_ports: vec![tcp_port(FE_QUERY_PORT_NAME, FE_QUERY_PORT)],
                access_ports: vec![
                    tcp_port(FE_HTTP_PORT_NAME, FE_HTTP_PORT),
                    tcp_port(FE_RPC_PORT_NAME, FE_RPC_PORT),
                    tcp_port(FE_QUERY_PORT_NAME, FE_QUERY_PORT),
                    tcp_port(FE_EDIT_LOG_PORT_NAME, FE_EDIT_LOG_PORT),
                ],
            },
            Self::Be => ComponentServiceConfig {
                kind: self,
                internal_ports: vec![tcp_port(BE_HEARTBEAT_PORT_NAME, BE_HEARTBEAT_PORT)],
                access_ports: vec![
                    tcp_port(BE_RPC_PORT_NAME, BE_RPC_PORT),
                    tcp_port(BE_HTTP_PORT_NAME, BE_HTTP_PORT),
                    tcp_port(BE_HEARTBEAT_PORT_NAME, BE_HEARTBEAT_PORT),
                    tcp_port(BE_BRPC_PORT_NAME, BE_BRPC_PORT),
                ],
            },
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics port of a role, looked up by role name.
///
/// # Errors
///
/// Returns [`DorisError::UnknownRole`] for anything other than `fe` or `be`.
pub fn metrics_port(role: &str) -> Result<i32, DorisError> {
    match role {
        "fe" => Ok(FE_HTTP_PORT),
        "be" => Ok(BE_HTTP_PORT),
        other => Err(DorisError::UnknownRole {
            role: other.to_string(),
        }),
    }
}

/// Which container ports a role exposes on its internal and access services.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentServiceConfig {
    pub kind: ComponentKind,
    /// Ports on the headless service: the minimum needed for heartbeats and elections
    pub internal_ports: Vec<ContainerPort>,
    /// Ports on the access service: the full set
    pub access_ports: Vec<ContainerPort>,
}

fn tcp_port(name: &str, port: i32) -> ContainerPort {
    ContainerPort {
        name: Some(name.to_string()),
        container_port: port,
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Identity of the `DorisCluster` being reconciled.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ClusterInfo {
    pub name: String,
    pub namespace: String,
    /// UID used for owner references; absent for objects not yet persisted
    pub uid: Option<String>,
    pub cluster_domain: String,
    /// Aggregator discovery `ConfigMap`, if log shipping is configured cluster-wide
    pub vector_aggregator_config_map: Option<String>,
}

impl ClusterInfo {
    #[must_use]
    pub fn from_cluster(cluster: &DorisCluster) -> Self {
        let config = cluster.spec.cluster_config.as_ref();
        Self {
            name: cluster.name_any(),
            namespace: cluster.namespace().unwrap_or_default(),
            uid: cluster.metadata.uid.clone(),
            cluster_domain: config
                .and_then(|c| c.cluster_domain.clone())
                .unwrap_or_else(|| DEFAULT_CLUSTER_DOMAIN.to_string()),
            vector_aggregator_config_map: config
                .and_then(|c| c.vector_aggregator_config_map_name.clone())
                .filter(|name| !name.is_empty()),
        }
    }

    /// Name of the headless per-role service.
    #[must_use]
    pub fn internal_service_name(&self, kind: ComponentKind) -> String {
        format!("{}-{}{SERVICE_INTERNAL_SUFFIX}", self.name, kind.as_str())
    }

    /// Name of the access per-role service.
    #[must_use]
    pub fn access_service_name(&self, kind: ComponentKind) -> String {
        format!("{}-{}{SERVICE_ACCESS_SUFFIX}", self.name, kind.as_str())
    }

    /// Fully qualified DNS name of the FE access service, used by every pod to find FE.
    #[must_use]
    pub fn fe_address(&self) -> String {
        let service = self.access_service_name(ComponentKind::Fe);
        if self.namespace.is_empty() {
            return service;
        }
        format!("{service}.{}.svc.{}", self.namespace, self.cluster_domain)
    }
}

/// Identity of one role-group: cluster + role + role-group name.
#[derive(Clone, Debug, PartialEq)]
pub struct RoleGroupInfo {
    pub cluster: ClusterInfo,
    pub kind: ComponentKind,
    pub role_group: String,
}

impl RoleGroupInfo {
    /// `{cluster}-{role}-{role_group}`, the name of the `StatefulSet` and `ConfigMap`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!(
            "{}-{}-{}",
            self.cluster.name,
            self.kind.as_str(),
            self.role_group
        )
    }
}

// ============================================================================
// Image
// ============================================================================

/// Container image after precedence resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedImage {
    pub reference: String,
    pub pull_policy: String,
    pub pull_secret: Option<String>,
}

/// Resolve the image of a role.
///
/// Precedence: custom image string > `{repo}:{role}-{version}` (either part may fall
/// back to its default) > `apache/doris:{role}-2.1.8`.
#[must_use]
pub fn resolve_image(spec: Option<&ImageSpec>, kind: ComponentKind) -> ResolvedImage {
    let custom = spec
        .and_then(|s| s.custom.as_deref())
        .filter(|c| !c.is_empty());
    let reference = match custom {
        Some(custom) => custom.to_string(),
        None => {
            let repo = spec
                .and_then(|s| s.repo.as_deref())
                .filter(|r| !r.is_empty())
                .unwrap_or(DORIS_REPOSITORY);
            let version = spec
                .and_then(|s| s.product_version.as_deref())
                .filter(|v| !v.is_empty())
                .unwrap_or(DEFAULT_DORIS_VERSION);
            format!("{repo}:{}-{version}", kind.as_str())
        }
    };

    ResolvedImage {
        reference,
        pull_policy: spec
            .and_then(|s| s.pull_policy.clone())
            .unwrap_or_else(|| DEFAULT_PULL_POLICY.to_string()),
        pull_secret: spec.and_then(|s| s.pull_secret_name.clone()),
    }
}

// ============================================================================
// Capability interface
// ============================================================================

/// Everything a component builder is derived from.
#[derive(Clone, Debug)]
pub struct ComponentParams {
    pub info: RoleGroupInfo,
    pub image: ResolvedImage,
    /// Effective (merged) role-group config
    pub config: ConfigSpec,
    /// Effective (merged) role-group overrides
    pub overrides: OverridesSpec,
}

impl ComponentParams {
    /// Whether the Vector log agent is enabled for this role-group.
    #[must_use]
    pub fn vector_enabled(&self) -> bool {
        self.config
            .logging
            .as_ref()
            .and_then(|l| l.enable_vector_agent)
            .unwrap_or(false)
    }
}

/// Capabilities every Doris role provides to the generic resource builders.
pub trait ComponentBuilder: Send + Sync {
    /// Identity and inputs of the role-group being built.
    fn params(&self) -> &ComponentParams;

    /// The principal process container.
    fn main_container(&self) -> Container;

    /// Containers run before the main container.
    fn init_containers(&self) -> Vec<Container>;

    /// Role-specific pod volumes beyond the shared config and pod-info volumes.
    fn volumes(&self) -> Vec<Volume>;

    /// Exactly one persistent volume claim template per role.
    fn volume_claim_templates(&self) -> Vec<PersistentVolumeClaim>;

    /// Runtime configuration files, filename → content.
    ///
    /// # Errors
    ///
    /// Returns an error if a generated file cannot be rendered.
    fn build_config(&self) -> Result<BTreeMap<String, String>, DorisError>;

    /// Port topology of the role.
    fn service_config(&self) -> ComponentServiceConfig {
        self.params().info.kind.service_config()
    }
}

/// Construct the builder for a role-group. This is the only place the role variant is
/// selected.
///
/// `ldap` is only consulted by the FE builder.
#[must_use]
pub fn new_component(
    params: ComponentParams,
    ldap: Option<LdapSettings>,
) -> Box<dyn ComponentBuilder> {
    match params.info.kind {
        ComponentKind::Fe => Box::new(fe::FeComponent::new(params, ldap)),
        ComponentKind::Be => Box::new(be::BeComponent::new(params)),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
