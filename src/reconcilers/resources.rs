// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Convergence of desired-state objects against the cluster.
//!
//! The reconcilers build a set of [`DesiredResource`]s and hand each one to a
//! [`ResourceApplier`]. [`KubeResources`] is the cluster-backed implementation: it
//! creates absent objects and server-side applies existing ones, so re-applying an
//! unchanged object is a no-op on the API server.
//!
//! Reads the builders need (the `AuthenticationClass` and its bind credentials
//! secret) go through [`ResourceLookup`], which tests replace with in-memory fakes.
//!
//! # Example
//!
//! ```rust,no_run
//! use doris_operator::reconcilers::resources::create_or_apply;
//! use k8s_openapi::api::core::v1::ConfigMap;
//! use kube::Client;
//! use anyhow::Result;
//!
//! async fn example(client: &Client, namespace: &str, cm: ConfigMap) -> Result<()> {
//!     create_or_apply(client, namespace, &cm, "doris-operator").await?;
//!     Ok(())
//! }
//! ```

use crate::crd::AuthenticationClass;
use crate::metrics;
use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use kube::api::{Patch, PatchParams, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use tracing::{debug, info};

/// Create or update a resource using server-side apply.
///
/// Checks whether the resource exists. If it does, it is patched with server-side
/// apply under `field_manager`; otherwise it is created.
///
/// # Errors
///
/// Returns an error if the resource has no name or an API call fails.
pub async fn create_or_apply<T>(
    client: &Client,
    namespace: &str,
    resource: &T,
    field_manager: &str,
) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let name = resource
        .meta()
        .name
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Resource must have a name"))?;

    let api: Api<T> = Api::namespaced(client.clone(), namespace);

    debug!(
        namespace = %namespace,
        name = %name,
        kind = %T::kind(&()),
        "Creating or updating resource with Apply strategy"
    );

    if api.get_opt(name).await?.is_some() {
        api.patch(
            name,
            &PatchParams::apply(field_manager).force(),
            &Patch::Apply(resource),
        )
        .await?;
        debug!("Applied {} {}/{}", T::kind(&()), namespace, name);
    } else {
        api.create(&PostParams::default(), resource).await?;
        info!("Created {} {}/{}", T::kind(&()), namespace, name);
    }

    metrics::record_resource_applied(&T::kind(&()));
    Ok(())
}

/// A desired-state object produced by the builders.
#[derive(Clone, Debug)]
pub enum DesiredResource {
    StatefulSet(StatefulSet),
    Service(Service),
    ConfigMap(ConfigMap),
    Ingress(Ingress),
    PodDisruptionBudget(PodDisruptionBudget),
}

impl DesiredResource {
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::StatefulSet(r) => r.name_any(),
            Self::Service(r) => r.name_any(),
            Self::ConfigMap(r) => r.name_any(),
            Self::Ingress(r) => r.name_any(),
            Self::PodDisruptionBudget(r) => r.name_any(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StatefulSet(_) => "StatefulSet",
            Self::Service(_) => "Service",
            Self::ConfigMap(_) => "ConfigMap",
            Self::Ingress(_) => "Ingress",
            Self::PodDisruptionBudget(_) => "PodDisruptionBudget",
        }
    }
}

/// Convergence collaborator: create-if-absent, patch-if-differs, read back state.
#[async_trait]
pub trait ResourceApplier: Send + Sync {
    /// Converge one object.
    async fn apply(&self, resource: &DesiredResource) -> Result<()>;

    /// Current state of a `StatefulSet`, `None` if it does not exist.
    async fn stateful_set(&self, name: &str) -> Result<Option<StatefulSet>>;
}

/// Cross-resource reads needed while building desired state.
#[async_trait]
pub trait ResourceLookup: Send + Sync {
    async fn authentication_class(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<AuthenticationClass>>;

    async fn secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;
}

/// Cluster-backed [`ResourceApplier`] and [`ResourceLookup`] scoped to one namespace.
#[derive(Clone)]
pub struct KubeResources {
    client: Client,
    namespace: String,
    field_manager: String,
}

impl KubeResources {
    #[must_use]
    pub fn new(client: Client, namespace: &str, field_manager: &str) -> Self {
        Self {
            client,
            namespace: namespace.to_string(),
            field_manager: field_manager.to_string(),
        }
    }
}

#[async_trait]
impl ResourceApplier for KubeResources {
    async fn apply(&self, resource: &DesiredResource) -> Result<()> {
        let (client, ns, fm) = (&self.client, self.namespace.as_str(), self.field_manager.as_str());
        match resource {
            DesiredResource::StatefulSet(r) => create_or_apply(client, ns, r, fm).await,
            DesiredResource::Service(r) => create_or_apply(client, ns, r, fm).await,
            DesiredResource::ConfigMap(r) => create_or_apply(client, ns, r, fm).await,
            DesiredResource::Ingress(r) => create_or_apply(client, ns, r, fm).await,
            DesiredResource::PodDisruptionBudget(r) => create_or_apply(client, ns, r, fm).await,
        }
    }

    async fn stateful_set(&self, name: &str) -> Result<Option<StatefulSet>> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), &self.namespace);
        Ok(api.get_opt(name).await?)
    }
}

#[async_trait]
impl ResourceLookup for KubeResources {
    async fn authentication_class(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<AuthenticationClass>> {
        let api: Api<AuthenticationClass> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
