// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Doris Kubernetes resource builders
//!
//! This module assembles `StatefulSet`, `Service`, `ConfigMap`, `Ingress` and
//! `PodDisruptionBudget` objects for a Doris cluster. Every builder is generic over
//! [`ComponentBuilder`]: the FE/BE differences live in the component, never here.
//! All functions are pure and easily testable.

use crate::components::logging::{vector_container, vector_yaml};
use crate::components::{
    metrics_port, ClusterInfo, ComponentBuilder, ComponentKind, ComponentServiceConfig,
    RoleGroupInfo,
};
use crate::constants::{
    API_GROUP_VERSION, CONFIG_VOLUME, DEFAULT_REPLICAS, FE_HTTP_PORT, KIND_DORIS_CLUSTER,
    LOG_VOLUME, METRICS_PORT_NAME, PODINFO_VOLUME, SERVICE_METRICS_SUFFIX,
    VECTOR_CONFIG_FILENAME,
};
use crate::crd::PodDisruptionBudgetSpec;
use crate::doris_errors::DorisError;
use crate::labels::{
    APP_NAME_DORIS, HASH_ANNOTATION, K8S_COMPONENT, K8S_INSTANCE, K8S_MANAGED_BY, K8S_NAME,
    K8S_ROLE_GROUP, MANAGED_BY_DORIS_OPERATOR, OWNER_REFERENCE_LABEL, PROMETHEUS_HTTP_SCHEME,
    PROMETHEUS_METRICS_PATH, PROMETHEUS_PATH, PROMETHEUS_PORT, PROMETHEUS_SCHEME,
    PROMETHEUS_SCRAPE, SERVICE_ROLE_ACCESS, SERVICE_ROLE_INTERNAL, SERVICE_ROLE_LABEL,
};
use crate::merge::merge_pod_template;
use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, ContainerPort, DownwardAPIVolumeFile,
    DownwardAPIVolumeSource, EmptyDirVolumeSource, EnvVar, LocalObjectReference,
    ObjectFieldSelector, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec, Volume,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::api::policy::v1::{PodDisruptionBudget, PodDisruptionBudgetSpec as PdbSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// Labels and ownership
// ============================================================================

/// Labels selecting every pod of a role across its role-groups.
#[must_use]
pub fn build_role_selector_labels(
    cluster_name: &str,
    kind: ComponentKind,
) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(K8S_NAME.into(), APP_NAME_DORIS.into());
    labels.insert(K8S_INSTANCE.into(), cluster_name.into());
    labels.insert(K8S_COMPONENT.into(), kind.as_str().into());
    labels
}

/// Labels identifying one role-group; also its pod selector.
#[must_use]
pub fn build_role_group_labels(info: &RoleGroupInfo) -> BTreeMap<String, String> {
    let mut labels = build_role_selector_labels(&info.cluster.name, info.kind);
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_DORIS_OPERATOR.into());
    labels.insert(K8S_ROLE_GROUP.into(), info.role_group.clone());
    labels
}

/// Builds owner references for a resource owned by a `DorisCluster`
///
/// Deleting the cluster cascades to every generated object.
#[must_use]
pub fn build_owner_references(cluster: &ClusterInfo) -> Option<Vec<OwnerReference>> {
    let uid = cluster.uid.clone()?;
    Some(vec![OwnerReference {
        api_version: API_GROUP_VERSION.to_string(),
        kind: KIND_DORIS_CLUSTER.to_string(),
        name: cluster.name.clone(),
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    }])
}

/// Calculate a SHA-256 hex digest of any serializable value.
///
/// Used for the change-tracking hash annotation on services.
#[must_use]
pub fn calculate_spec_hash<T: Serialize>(data: &T) -> String {
    let json = serde_json::to_string(data).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Replicas and durations
// ============================================================================

/// Replica count actually applied to a role-group.
///
/// `stopped` forces zero without touching the declared value, so clearing it restores
/// the declared count.
#[must_use]
pub fn effective_replicas(declared: Option<i32>, stopped: bool) -> i32 {
    if stopped {
        0
    } else {
        declared.unwrap_or(DEFAULT_REPLICAS)
    }
}

/// Parse a duration such as `30s`, `1m30s`, `500ms` or a bare number of seconds.
///
/// Sub-second remainders round up to the next whole second.
///
/// # Errors
///
/// Returns [`DorisError::InvalidDuration`] for anything else.
pub fn parse_duration_secs(value: &str) -> Result<i64, DorisError> {
    let invalid = || DorisError::InvalidDuration {
        value: value.to_string(),
    };
    let trimmed = value.trim();
    let secs = match trimmed.parse::<u64>() {
        Ok(secs) => secs,
        Err(_) => {
            let duration = humantime::parse_duration(trimmed).map_err(|_| invalid())?;
            duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
        }
    };
    i64::try_from(secs).map_err(|_| invalid())
}

// ============================================================================
// StatefulSet
// ============================================================================

fn common_volumes(info: &RoleGroupInfo) -> Vec<Volume> {
    vec![
        Volume {
            name: CONFIG_VOLUME.into(),
            config_map: Some(ConfigMapVolumeSource {
                name: info.full_name(),
                ..Default::default()
            }),
            ..Default::default()
        },
        Volume {
            name: PODINFO_VOLUME.into(),
            downward_api: Some(DownwardAPIVolumeSource {
                items: Some(vec![
                    DownwardAPIVolumeFile {
                        path: "labels".into(),
                        field_ref: Some(ObjectFieldSelector {
                            field_path: "metadata.labels".into(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                    DownwardAPIVolumeFile {
                        path: "annotations".into(),
                        field_ref: Some(ObjectFieldSelector {
                            field_path: "metadata.annotations".into(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        },
    ]
}

/// Apply env and CLI overrides to the main container.
fn apply_container_overrides(
    container: &mut Container,
    env_overrides: &BTreeMap<String, String>,
    cli_overrides: &[String],
) {
    if !env_overrides.is_empty() {
        let env = container.env.get_or_insert_with(Vec::new);
        for (name, value) in env_overrides {
            let var = EnvVar {
                name: name.clone(),
                value: Some(value.clone()),
                ..Default::default()
            };
            match env.iter_mut().find(|e| &e.name == name) {
                Some(existing) => *existing = var,
                None => env.push(var),
            }
        }
    }
    if !cli_overrides.is_empty() {
        container.args = Some(cli_overrides.to_vec());
    }
}

/// Merge a pod override fragment into the generated pod template.
///
/// Containers, init containers, volumes and env entries merge by `name`.
fn apply_pod_overrides(
    name: &str,
    template: PodTemplateSpec,
    overrides: &serde_json::Value,
) -> Result<PodTemplateSpec, DorisError> {
    let to_err = |e: serde_json::Error| DorisError::PodOverrides {
        name: name.to_string(),
        reason: e.to_string(),
    };
    let mut value = serde_json::to_value(&template).map_err(to_err)?;
    merge_pod_template(&mut value, overrides.clone());
    serde_json::from_value(value).map_err(to_err)
}

/// Builds the `StatefulSet` of a role-group.
///
/// The pod template carries the component's main and init containers, the shared
/// config and pod-info volumes plus the component's own volumes. Pods are managed in
/// parallel; FE/BE coordinate start-up through heartbeats and elections.
///
/// # Errors
///
/// Returns an error if the Vector agent is enabled without an aggregator, the
/// graceful shutdown timeout is malformed, or pod overrides do not fit a pod template.
pub fn build_stateful_set(
    component: &dyn ComponentBuilder,
    declared_replicas: Option<i32>,
    stopped: bool,
) -> Result<StatefulSet, DorisError> {
    let params = component.params();
    let info = &params.info;
    let name = info.full_name();
    let labels = build_role_group_labels(info);

    let mut main = component.main_container();
    apply_container_overrides(
        &mut main,
        &params.overrides.env_overrides,
        &params.overrides.cli_overrides,
    );

    let mut containers = vec![main];
    let mut volumes = common_volumes(info);
    volumes.extend(component.volumes());

    if params.vector_enabled() {
        let aggregator = info
            .cluster
            .vector_aggregator_config_map
            .as_deref()
            .ok_or_else(|| DorisError::MissingVectorAggregator {
                role_group: name.clone(),
            })?;
        containers.push(vector_container(aggregator, &params.image));
        volumes.push(Volume {
            name: LOG_VOLUME.into(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        });
    }

    let init_containers = component.init_containers();
    let termination_grace_period_seconds = params
        .config
        .graceful_shutdown_timeout
        .as_deref()
        .map(parse_duration_secs)
        .transpose()?;

    let mut template = PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(labels.clone()),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers,
            init_containers: (!init_containers.is_empty()).then_some(init_containers),
            volumes: Some(volumes),
            affinity: params.config.affinity.clone(),
            node_selector: params.config.node_selector.clone(),
            tolerations: params.config.tolerations.clone(),
            termination_grace_period_seconds,
            image_pull_secrets: params.image.pull_secret.as_ref().map(|secret| {
                vec![LocalObjectReference {
                    name: secret.clone(),
                }]
            }),
            ..Default::default()
        }),
    };

    if let Some(overrides) = &params.overrides.pod_overrides {
        template = apply_pod_overrides(&name, template, overrides)?;
    }

    let replicas = effective_replicas(declared_replicas, stopped);
    debug!(stateful_set = %name, replicas, stopped, "Built StatefulSet");

    Ok(StatefulSet {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(info.cluster.namespace.clone()),
            labels: Some(labels.clone()),
            owner_references: build_owner_references(&info.cluster),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(replicas),
            service_name: Some(info.cluster.internal_service_name(info.kind)),
            pod_management_policy: Some("Parallel".into()),
            selector: LabelSelector {
                match_labels: Some(labels),
                ..Default::default()
            },
            template,
            volume_claim_templates: Some(component.volume_claim_templates()),
            ..Default::default()
        }),
        ..Default::default()
    })
}

// ============================================================================
// Services
// ============================================================================

fn service_ports(ports: &[ContainerPort]) -> Vec<ServicePort> {
    ports
        .iter()
        .map(|p| ServicePort {
            name: p.name.clone(),
            port: p.container_port,
            target_port: Some(IntOrString::Int(p.container_port)),
            protocol: p.protocol.clone(),
            ..Default::default()
        })
        .collect()
}

fn role_service(
    cluster: &ClusterInfo,
    kind: ComponentKind,
    name: String,
    service_role: &str,
    spec: ServiceSpec,
) -> Service {
    let mut labels = BTreeMap::new();
    labels.insert(OWNER_REFERENCE_LABEL.into(), cluster.name.clone());
    labels.insert(SERVICE_ROLE_LABEL.into(), service_role.into());
    labels.insert(K8S_COMPONENT.into(), kind.as_str().into());
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_DORIS_OPERATOR.into());

    let annotations = BTreeMap::from([(HASH_ANNOTATION.to_string(), calculate_spec_hash(&spec))]);

    Service {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(cluster.namespace.clone()),
            labels: Some(labels),
            annotations: Some(annotations),
            owner_references: build_owner_references(cluster),
            ..Default::default()
        },
        spec: Some(spec),
        ..Default::default()
    }
}

/// Builds the headless internal service of a role.
///
/// Publishes not-ready addresses so peers can find each other during elections,
/// and exposes only the ports needed for that traffic.
#[must_use]
pub fn build_internal_service(cluster: &ClusterInfo, config: &ComponentServiceConfig) -> Service {
    let spec = ServiceSpec {
        cluster_ip: Some("None".into()),
        publish_not_ready_addresses: Some(true),
        selector: Some(build_role_selector_labels(&cluster.name, config.kind)),
        ports: Some(service_ports(&config.internal_ports)),
        ..Default::default()
    };
    role_service(
        cluster,
        config.kind,
        cluster.internal_service_name(config.kind),
        SERVICE_ROLE_INTERNAL,
        spec,
    )
}

/// Builds the access service of a role, exposing the full port set.
#[must_use]
pub fn build_access_service(cluster: &ClusterInfo, config: &ComponentServiceConfig) -> Service {
    let spec = ServiceSpec {
        type_: Some("ClusterIP".into()),
        selector: Some(build_role_selector_labels(&cluster.name, config.kind)),
        ports: Some(service_ports(&config.access_ports)),
        ..Default::default()
    };
    role_service(
        cluster,
        config.kind,
        cluster.access_service_name(config.kind),
        SERVICE_ROLE_ACCESS,
        spec,
    )
}

/// Builds the headless metrics service of a role-group with Prometheus scrape
/// annotations.
///
/// # Errors
///
/// Returns [`DorisError::UnknownRole`] if the role has no metrics port.
pub fn build_metrics_service(info: &RoleGroupInfo) -> Result<Service, DorisError> {
    let port = metrics_port(info.kind.as_str())?;
    let selector = build_role_group_labels(info);

    let mut labels = selector.clone();
    labels.insert(PROMETHEUS_SCRAPE.into(), "true".into());

    let mut annotations = BTreeMap::new();
    annotations.insert(PROMETHEUS_SCRAPE.into(), "true".into());
    annotations.insert(PROMETHEUS_PATH.into(), PROMETHEUS_METRICS_PATH.into());
    annotations.insert(PROMETHEUS_PORT.into(), port.to_string());
    annotations.insert(PROMETHEUS_SCHEME.into(), PROMETHEUS_HTTP_SCHEME.into());

    Ok(Service {
        metadata: ObjectMeta {
            name: Some(format!("{}{SERVICE_METRICS_SUFFIX}", info.full_name())),
            namespace: Some(info.cluster.namespace.clone()),
            labels: Some(labels),
            annotations: Some(annotations),
            owner_references: build_owner_references(&info.cluster),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            cluster_ip: Some("None".into()),
            selector: Some(selector),
            ports: Some(vec![ServicePort {
                name: Some(METRICS_PORT_NAME.into()),
                port,
                target_port: Some(IntOrString::Int(port)),
                protocol: Some("TCP".into()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    })
}

// ============================================================================
// ConfigMap
// ============================================================================

/// Builds the `ConfigMap` of a role-group.
///
/// Content is the component's generated files; a config override for a filename
/// replaces that file verbatim. When the Vector agent is enabled, `vector.yaml` is
/// added.
///
/// # Errors
///
/// Returns [`DorisError::MissingVectorAggregator`] if the agent is enabled but no
/// aggregator `ConfigMap` is configured, or any error from the component.
pub fn build_config_map(component: &dyn ComponentBuilder) -> Result<ConfigMap, DorisError> {
    let params = component.params();
    let info = &params.info;
    let name = info.full_name();

    let mut data = component.build_config()?;
    for (filename, content) in &params.overrides.config_overrides {
        data.insert(filename.clone(), content.clone());
    }

    if params.vector_enabled() {
        if info.cluster.vector_aggregator_config_map.is_none() {
            return Err(DorisError::MissingVectorAggregator { role_group: name });
        }
        data.insert(VECTOR_CONFIG_FILENAME.to_string(), vector_yaml(info)?);
    }

    Ok(ConfigMap {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(info.cluster.namespace.clone()),
            labels: Some(build_role_group_labels(info)),
            owner_references: build_owner_references(&info.cluster),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    })
}

// ============================================================================
// Cluster-level objects
// ============================================================================

/// Builds an `Ingress` routing `host` to the FE access service http port.
#[must_use]
pub fn build_ingress(cluster: &ClusterInfo, host: &str) -> Ingress {
    let mut labels = BTreeMap::new();
    labels.insert(K8S_NAME.into(), APP_NAME_DORIS.into());
    labels.insert(K8S_INSTANCE.into(), cluster.name.clone());
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_DORIS_OPERATOR.into());

    Ingress {
        metadata: ObjectMeta {
            name: Some(cluster.name.clone()),
            namespace: Some(cluster.namespace.clone()),
            labels: Some(labels),
            owner_references: build_owner_references(cluster),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(host.into()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/".into()),
                        path_type: "Prefix".into(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: cluster.access_service_name(ComponentKind::Fe),
                                port: Some(ServiceBackendPort {
                                    name: None,
                                    number: Some(FE_HTTP_PORT),
                                }),
                            }),
                            ..Default::default()
                        },
                    }],
                }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds the `PodDisruptionBudget` of a role, or `None` when not enabled.
///
/// `maxUnavailable` defaults to 1.
#[must_use]
pub fn build_pod_disruption_budget(
    cluster: &ClusterInfo,
    kind: ComponentKind,
    spec: Option<&PodDisruptionBudgetSpec>,
) -> Option<PodDisruptionBudget> {
    let spec = spec.filter(|s| s.enabled)?;
    let selector = build_role_selector_labels(&cluster.name, kind);

    let mut labels = selector.clone();
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_DORIS_OPERATOR.into());

    Some(PodDisruptionBudget {
        metadata: ObjectMeta {
            name: Some(format!("{}-{}", cluster.name, kind.as_str())),
            namespace: Some(cluster.namespace.clone()),
            labels: Some(labels),
            owner_references: build_owner_references(cluster),
            ..Default::default()
        },
        spec: Some(PdbSpec {
            max_unavailable: Some(IntOrString::Int(spec.max_unavailable.unwrap_or(1))),
            selector: Some(LabelSelector {
                match_labels: Some(selector),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    })
}

#[cfg(test)]
#[path = "doris_resources_tests.rs"]
mod doris_resources_tests;
