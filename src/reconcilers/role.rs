// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-role reconciler for FE and BE.

use crate::components::{resolve_image, ClusterInfo, ComponentKind, LdapSettings, ResolvedImage};
use crate::crd::{ImageSpec, RoleSpec};
use crate::doris_errors::DorisError;
use crate::doris_resources::build_pod_disruption_budget;
use crate::reconcilers::registrar::{RoleGroupRegistrar, RoleGroupResources};
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use tracing::{debug, warn};

/// Role-wide state shared by every role-group of one role.
#[derive(Clone, Debug)]
pub struct RoleReconciler {
    pub kind: ComponentKind,
    pub spec: RoleSpec,
    pub image: ResolvedImage,
    pub cluster: ClusterInfo,
    pub stopped: bool,
    /// Only meaningful for FE
    pub ldap: Option<LdapSettings>,
}

impl RoleReconciler {
    #[must_use]
    pub fn new(
        kind: ComponentKind,
        spec: RoleSpec,
        image: Option<&ImageSpec>,
        cluster: ClusterInfo,
        stopped: bool,
        ldap: Option<LdapSettings>,
    ) -> Self {
        Self {
            kind,
            image: resolve_image(image, kind),
            spec,
            cluster,
            stopped,
            ldap: ldap.filter(|_| kind == ComponentKind::Fe),
        }
    }

    /// Produce the resources of every role-group.
    ///
    /// # Errors
    ///
    /// Fails fast on the first role-group that cannot be built.
    pub fn register_resources(&self) -> Result<Vec<RoleGroupResources>, DorisError> {
        if self.spec.role_groups.is_empty() {
            warn!(
                namespace = %self.cluster.namespace,
                name = %self.cluster.name,
                role = %self.kind,
                "Role declares no role groups"
            );
        }

        let registrar = RoleGroupRegistrar {
            kind: self.kind,
            role: &self.spec,
            image: &self.image,
            cluster: &self.cluster,
            stopped: self.stopped,
            ldap: self.ldap.as_ref(),
        };
        let groups = registrar.register_all()?;

        debug!(
            namespace = %self.cluster.namespace,
            name = %self.cluster.name,
            role = %self.kind,
            image = %self.image.reference,
            role_groups = groups.len(),
            "Registered role"
        );
        Ok(groups)
    }

    #[must_use]
    pub fn pod_disruption_budget(&self) -> Option<PodDisruptionBudget> {
        build_pod_disruption_budget(
            &self.cluster,
            self.kind,
            self.spec
                .role_config
                .as_ref()
                .and_then(|c| c.pod_disruption_budget.as_ref()),
        )
    }
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod role_tests;
