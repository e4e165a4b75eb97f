// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Role-group registration.
//!
//! For every named role-group of a role the registrar merges the role and
//! role-group fragments, builds the component, and asks the generic builders for
//! the role-group's services, `ConfigMap` and `StatefulSet`.

use crate::components::{
    new_component, ClusterInfo, ComponentKind, ComponentParams, LdapSettings, ResolvedImage,
    RoleGroupInfo,
};
use crate::constants::{DNS1123_LABEL_MAX_LEN, SERVICE_METRICS_SUFFIX};
use crate::crd::{RoleGroupSpec, RoleSpec};
use crate::doris_errors::DorisError;
use crate::doris_resources::{
    build_access_service, build_config_map, build_internal_service, build_metrics_service,
    build_stateful_set, effective_replicas,
};
use crate::merge::merge_layers;
use crate::reconcilers::resources::DesiredResource;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use tracing::debug;

/// Everything produced for one role-group.
#[derive(Clone, Debug)]
pub struct RoleGroupResources {
    pub info: RoleGroupInfo,
    /// Replica count written into the `StatefulSet`
    pub replicas: i32,
    pub internal_service: Service,
    pub access_service: Service,
    pub metrics_service: Service,
    pub config_map: ConfigMap,
    pub stateful_set: StatefulSet,
}

impl RoleGroupResources {
    /// Apply order: services first, then configuration, then the workload.
    #[must_use]
    pub fn into_desired(self) -> Vec<DesiredResource> {
        vec![
            DesiredResource::Service(self.internal_service),
            DesiredResource::Service(self.access_service),
            DesiredResource::Service(self.metrics_service),
            DesiredResource::ConfigMap(self.config_map),
            DesiredResource::StatefulSet(self.stateful_set),
        ]
    }
}

/// Registers the role-groups of one role.
pub struct RoleGroupRegistrar<'a> {
    pub kind: ComponentKind,
    pub role: &'a RoleSpec,
    pub image: &'a ResolvedImage,
    pub cluster: &'a ClusterInfo,
    pub stopped: bool,
    pub ldap: Option<&'a LdapSettings>,
}

impl RoleGroupRegistrar<'_> {
    /// Register every role-group, in name order.
    ///
    /// # Errors
    ///
    /// Returns the first role-group error; nothing is returned for the role then.
    pub fn register_all(&self) -> Result<Vec<RoleGroupResources>, DorisError> {
        self.role
            .role_groups
            .iter()
            .map(|(name, group)| self.register(name, group))
            .collect()
    }

    /// Register one role-group.
    ///
    /// # Errors
    ///
    /// Returns an error if the fragments cannot be merged or any builder fails.
    pub fn register(
        &self,
        role_group: &str,
        spec: &RoleGroupSpec,
    ) -> Result<RoleGroupResources, DorisError> {
        validate_role_group_name(self.cluster, self.kind, role_group)?;
        let config = merge_layers(self.role.config.as_ref(), spec.config.as_ref())?;
        let overrides = merge_layers(Some(&self.role.overrides), Some(&spec.overrides))?;

        let info = RoleGroupInfo {
            cluster: self.cluster.clone(),
            kind: self.kind,
            role_group: role_group.to_string(),
        };
        let replicas = effective_replicas(spec.replicas, self.stopped);
        debug!(
            role = %self.kind,
            role_group = %role_group,
            replicas,
            "Registering role group"
        );

        let component = new_component(
            ComponentParams {
                info: info.clone(),
                image: self.image.clone(),
                config,
                overrides,
            },
            self.ldap.cloned(),
        );
        let service_config = component.service_config();

        Ok(RoleGroupResources {
            internal_service: build_internal_service(self.cluster, &service_config),
            access_service: build_access_service(self.cluster, &service_config),
            metrics_service: build_metrics_service(&info)?,
            config_map: build_config_map(component.as_ref())?,
            stateful_set: build_stateful_set(component.as_ref(), spec.replicas, self.stopped)?,
            info,
            replicas,
        })
    }
}

/// Reject role-group names that would produce invalid object names.
///
/// The name must be a DNS-1123 label, and the longest derived name
/// (`{cluster}-{role}-{role_group}-metrics`) must fit in 63 characters.
///
/// # Errors
///
/// Returns [`DorisError::InvalidRoleGroupName`] naming the violated rule.
pub fn validate_role_group_name(
    cluster: &ClusterInfo,
    kind: ComponentKind,
    role_group: &str,
) -> Result<(), DorisError> {
    let invalid = |reason: &str| DorisError::InvalidRoleGroupName {
        role_group: role_group.to_string(),
        reason: reason.to_string(),
    };

    if role_group.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if !role_group
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            "must consist of lower case alphanumeric characters or '-'",
        ));
    }
    if role_group.starts_with('-') || role_group.ends_with('-') {
        return Err(invalid("must start and end with an alphanumeric character"));
    }

    let longest = format!(
        "{}-{}-{role_group}{SERVICE_METRICS_SUFFIX}",
        cluster.name,
        kind.as_str()
    );
    if longest.len() > DNS1123_LABEL_MAX_LEN {
        return Err(invalid(&format!(
            "derived name '{longest}' exceeds {DNS1123_LABEL_MAX_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "registrar_tests.rs"]
mod registrar_tests;
