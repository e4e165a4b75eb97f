// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Top-level reconciler for one `DorisCluster`.
//!
//! [`ClusterReconciler`] instantiates the FE and BE role reconcilers, aggregates
//! their role-group resources with the cluster-level extras (pod disruption
//! budgets, ingress) into a [`ResourceSet`], converges that set through a
//! [`ResourceApplier`] and reads back `StatefulSet` readiness.

use crate::components::ldap::resolve_ldap;
use crate::components::{ClusterInfo, ComponentKind, LdapSettings};
use crate::crd::{DorisCluster, DorisClusterSpec, RoleSpec};
use crate::doris_errors::DorisError;
use crate::doris_resources::build_ingress;
use crate::reconcilers::resources::{DesiredResource, ResourceApplier, ResourceLookup};
use crate::reconcilers::role::RoleReconciler;
use crate::reconcilers::status::StatefulSetReadiness;
use anyhow::{Context as _, Result};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use tracing::{debug, info};

/// A `StatefulSet` registered in a [`ResourceSet`] and the replica count it was given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredStatefulSet {
    pub name: String,
    pub replicas: i32,
}

/// Ordered, de-duplicated desired state of a cluster.
///
/// Role-level services are produced once per role-group; the first occurrence of a
/// `(kind, name)` pair wins.
#[derive(Clone, Debug, Default)]
pub struct ResourceSet {
    resources: Vec<DesiredResource>,
    stateful_sets: Vec<RegisteredStatefulSet>,
}

impl ResourceSet {
    pub fn push(&mut self, resource: DesiredResource) {
        let duplicate = self
            .resources
            .iter()
            .any(|r| r.kind() == resource.kind() && r.name() == resource.name());
        if !duplicate {
            self.resources.push(resource);
        }
    }

    #[must_use]
    pub fn resources(&self) -> &[DesiredResource] {
        &self.resources
    }

    #[must_use]
    pub fn registered_stateful_sets(&self) -> &[RegisteredStatefulSet] {
        &self.stateful_sets
    }

    pub fn stateful_sets(&self) -> impl Iterator<Item = &StatefulSet> {
        self.resources.iter().filter_map(|r| match r {
            DesiredResource::StatefulSet(s) => Some(s),
            _ => None,
        })
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.resources.iter().filter_map(|r| match r {
            DesiredResource::Service(s) => Some(s),
            _ => None,
        })
    }

    pub fn config_maps(&self) -> impl Iterator<Item = &ConfigMap> {
        self.resources.iter().filter_map(|r| match r {
            DesiredResource::ConfigMap(c) => Some(c),
            _ => None,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Reconciler bound to one `DorisCluster` for one pass.
pub struct ClusterReconciler {
    cluster: ClusterInfo,
    spec: DorisClusterSpec,
}

impl ClusterReconciler {
    #[must_use]
    pub fn new(cluster: &DorisCluster) -> Self {
        Self {
            cluster: ClusterInfo::from_cluster(cluster),
            spec: cluster.spec.clone(),
        }
    }

    #[must_use]
    pub fn info(&self) -> &ClusterInfo {
        &self.cluster
    }

    #[must_use]
    pub fn stopped(&self) -> bool {
        self.spec
            .cluster_operation
            .as_ref()
            .is_some_and(|op| op.stopped)
    }

    #[must_use]
    pub fn paused(&self) -> bool {
        self.spec
            .cluster_operation
            .as_ref()
            .is_some_and(|op| op.reconciliation_paused)
    }

    /// Resolve LDAP and build the desired state of the whole cluster.
    ///
    /// LDAP lookup failures degrade to LDAP disabled; they never fail registration.
    ///
    /// # Errors
    ///
    /// Returns the first builder error of any role-group.
    pub async fn register_resources(
        &self,
        lookup: &dyn ResourceLookup,
    ) -> Result<ResourceSet, DorisError> {
        let authentication = self
            .spec
            .cluster_config
            .as_ref()
            .map(|c| c.authentication.as_slice())
            .unwrap_or_default();
        let ldap = resolve_ldap(lookup, &self.cluster.namespace, authentication).await;
        self.build_resources(ldap)
    }

    /// Build the desired state with already-resolved LDAP settings.
    ///
    /// # Errors
    ///
    /// Returns [`DorisError::MissingRole`] if FE or BE is absent, or the first
    /// builder error of any role-group.
    pub fn build_resources(&self, ldap: Option<LdapSettings>) -> Result<ResourceSet, DorisError> {
        let roles = [
            self.role_reconciler(ComponentKind::Fe, self.spec.front_end.as_ref(), ldap)?,
            self.role_reconciler(ComponentKind::Be, self.spec.back_end.as_ref(), None)?,
        ];

        let mut set = ResourceSet::default();
        for role in &roles {
            for group in role.register_resources()? {
                set.stateful_sets.push(RegisteredStatefulSet {
                    name: group.info.full_name(),
                    replicas: group.replicas,
                });
                for resource in group.into_desired() {
                    set.push(resource);
                }
            }
        }

        for role in &roles {
            if let Some(pdb) = role.pod_disruption_budget() {
                set.push(DesiredResource::PodDisruptionBudget(pdb));
            }
        }

        self.register_ingress(&mut set);
        self.register_service_account(&set);

        debug!(
            namespace = %self.cluster.namespace,
            name = %self.cluster.name,
            resources = set.len(),
            "Registered cluster resources"
        );
        Ok(set)
    }

    fn role_reconciler(
        &self,
        kind: ComponentKind,
        spec: Option<&RoleSpec>,
        ldap: Option<LdapSettings>,
    ) -> Result<RoleReconciler, DorisError> {
        let spec = spec.ok_or_else(|| DorisError::MissingRole {
            role: match kind {
                ComponentKind::Fe => "frontEnd".to_string(),
                ComponentKind::Be => "backEnd".to_string(),
            },
        })?;
        Ok(RoleReconciler::new(
            kind,
            spec.clone(),
            self.spec.image.as_ref(),
            self.cluster.clone(),
            self.stopped(),
            ldap,
        ))
    }

    fn register_ingress(&self, set: &mut ResourceSet) {
        let host = self
            .spec
            .cluster_config
            .as_ref()
            .and_then(|c| c.ingress_host.as_deref())
            .filter(|h| !h.is_empty());
        if let Some(host) = host {
            set.push(DesiredResource::Ingress(build_ingress(&self.cluster, host)));
        }
    }

    /// Pods run under the namespace default service account.
    fn register_service_account(&self, _set: &ResourceSet) {
        debug!(
            namespace = %self.cluster.namespace,
            name = %self.cluster.name,
            "No service account registered"
        );
    }

    /// Converge every resource of the set, in order.
    ///
    /// # Errors
    ///
    /// Returns the first apply error, with the object's kind and name attached.
    pub async fn reconcile(&self, applier: &dyn ResourceApplier, set: &ResourceSet) -> Result<()> {
        for resource in set.resources() {
            applier
                .apply(resource)
                .await
                .with_context(|| format!("failed to apply {} {}", resource.kind(), resource.name()))?;
        }
        info!(
            namespace = %self.cluster.namespace,
            name = %self.cluster.name,
            resources = set.len(),
            "Converged cluster resources"
        );
        Ok(())
    }

    /// Read back every registered `StatefulSet`.
    ///
    /// # Errors
    ///
    /// Returns an error if a `StatefulSet` cannot be read.
    pub async fn readiness(
        &self,
        applier: &dyn ResourceApplier,
        set: &ResourceSet,
    ) -> Result<Vec<StatefulSetReadiness>> {
        let mut children = Vec::with_capacity(set.registered_stateful_sets().len());
        for registered in set.registered_stateful_sets() {
            let current = applier
                .stateful_set(&registered.name)
                .await
                .with_context(|| format!("failed to read StatefulSet {}", registered.name))?;
            children.push(StatefulSetReadiness {
                name: registered.name.clone(),
                desired: registered.replicas,
                ready: current
                    .as_ref()
                    .and_then(|s| s.status.as_ref())
                    .and_then(|s| s.ready_replicas)
                    .unwrap_or(0),
                found: current.is_some(),
            });
        }
        Ok(children)
    }
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod cluster_tests;
