// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared building blocks for FE and BE containers.

use crate::components::ComponentParams;
use crate::constants::{
    CONFIG_MOUNT_PATH, CONFIG_VOLUME, DEFAULT_CPU_LIMIT, DEFAULT_CPU_REQUEST, DEFAULT_USER,
    DORIS_ROOT, FE_QUERY_PORT, HEALTH_CHECK_PATH, LOG_MOUNT_PATH, LOG_VOLUME, PODINFO_MOUNT_PATH,
    PODINFO_VOLUME, PROBE_INITIAL_DELAY_SECS, PROBE_PERIOD_SECS,
};
use crate::crd::{CpuResource, MemoryResource, ResourcesSpec, StorageResource};
use k8s_openapi::api::core::v1::{
    EnvVar, EnvVarSource, HTTPGetAction, ObjectFieldSelector, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, Probe, ResourceRequirements, TCPSocketAction, VolumeMount,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

/// Per-role resource defaults, overlaid with whatever the effective config sets.
pub struct ResourceDefaults {
    pub memory_limit: &'static str,
    pub storage_size: &'static str,
}

/// Effective resources: role defaults with every field the user sets taken instead.
#[must_use]
pub fn effective_resources(
    configured: Option<&ResourcesSpec>,
    defaults: &ResourceDefaults,
) -> ResourcesSpec {
    let cpu = configured.and_then(|r| r.cpu.as_ref());
    let memory = configured.and_then(|r| r.memory.as_ref());
    let storage = configured.and_then(|r| r.storage.as_ref());

    ResourcesSpec {
        cpu: Some(CpuResource {
            min: cpu
                .and_then(|c| c.min.clone())
                .or_else(|| Some(Quantity(DEFAULT_CPU_REQUEST.into()))),
            max: cpu
                .and_then(|c| c.max.clone())
                .or_else(|| Some(Quantity(DEFAULT_CPU_LIMIT.into()))),
        }),
        memory: Some(MemoryResource {
            limit: memory
                .and_then(|m| m.limit.clone())
                .or_else(|| Some(Quantity(defaults.memory_limit.into()))),
        }),
        storage: Some(StorageResource {
            capacity: storage
                .and_then(|s| s.capacity.clone())
                .or_else(|| Some(Quantity(defaults.storage_size.into()))),
            storage_class: storage.and_then(|s| s.storage_class.clone()),
        }),
    }
}

/// CPU `min` becomes the request and `max` the limit; memory `limit` is both.
#[must_use]
pub fn resource_requirements(resources: &ResourcesSpec) -> ResourceRequirements {
    let mut requests = BTreeMap::new();
    let mut limits = BTreeMap::new();

    if let Some(cpu) = &resources.cpu {
        if let Some(min) = &cpu.min {
            requests.insert("cpu".to_string(), min.clone());
        }
        if let Some(max) = &cpu.max {
            limits.insert("cpu".to_string(), max.clone());
        }
    }
    if let Some(limit) = resources.memory.as_ref().and_then(|m| m.limit.as_ref()) {
        requests.insert("memory".to_string(), limit.clone());
        limits.insert("memory".to_string(), limit.clone());
    }

    ResourceRequirements {
        requests: (!requests.is_empty()).then_some(requests),
        limits: (!limits.is_empty()).then_some(limits),
        ..Default::default()
    }
}

/// Single `ReadWriteOnce` filesystem claim sized from the effective storage block.
#[must_use]
pub fn volume_claim(name: &str, storage: Option<&StorageResource>) -> PersistentVolumeClaim {
    let capacity = storage.and_then(|s| s.capacity.clone());
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(name.into()),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".into()]),
            volume_mode: Some("Filesystem".into()),
            storage_class_name: storage.and_then(|s| s.storage_class.clone()),
            resources: Some(VolumeResourceRequirements {
                requests: capacity.map(|c| BTreeMap::from([("storage".to_string(), c)])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[must_use]
pub fn tcp_probe(port: i32) -> Probe {
    Probe {
        tcp_socket: Some(TCPSocketAction {
            port: IntOrString::Int(port),
            ..Default::default()
        }),
        initial_delay_seconds: Some(PROBE_INITIAL_DELAY_SECS),
        period_seconds: Some(PROBE_PERIOD_SECS),
        ..Default::default()
    }
}

#[must_use]
pub fn http_health_probe(port: i32) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(HEALTH_CHECK_PATH.into()),
            port: IntOrString::Int(port),
            ..Default::default()
        }),
        initial_delay_seconds: Some(PROBE_INITIAL_DELAY_SECS),
        period_seconds: Some(PROBE_PERIOD_SECS),
        ..Default::default()
    }
}

fn field_ref_env(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.into(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.into(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn plain_env(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.into(),
        value: Some(value.into()),
        ..Default::default()
    }
}

/// Environment shared by FE and BE main containers.
///
/// `ENV_FE_ADDR` points every pod at the FE access service; the entrypoints use it
/// to register with the FE master.
#[must_use]
pub fn common_env(params: &ComponentParams) -> Vec<EnvVar> {
    vec![
        field_ref_env("POD_NAME", "metadata.name"),
        field_ref_env("POD_IP", "status.podIP"),
        field_ref_env("HOST_IP", "status.hostIP"),
        field_ref_env("POD_NAMESPACE", "metadata.namespace"),
        plain_env("CONFIGMAP_MOUNT_PATH", CONFIG_MOUNT_PATH),
        plain_env("USER", DEFAULT_USER),
        plain_env("DORIS_ROOT", DORIS_ROOT),
        plain_env("ENV_FE_ADDR", params.info.cluster.fe_address()),
        plain_env("FE_QUERY_PORT", FE_QUERY_PORT.to_string()),
    ]
}

/// Mounts every main container carries: the config map, pod info and, when the
/// Vector agent runs, the shared log directory.
#[must_use]
pub fn common_volume_mounts(params: &ComponentParams) -> Vec<VolumeMount> {
    let mut mounts = vec![
        VolumeMount {
            name: PODINFO_VOLUME.into(),
            mount_path: PODINFO_MOUNT_PATH.into(),
            ..Default::default()
        },
        VolumeMount {
            name: CONFIG_VOLUME.into(),
            mount_path: CONFIG_MOUNT_PATH.into(),
            ..Default::default()
        },
    ];
    if params.vector_enabled() {
        mounts.push(VolumeMount {
            name: LOG_VOLUME.into(),
            mount_path: LOG_MOUNT_PATH.into(),
            ..Default::default()
        });
    }
    mounts
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod container_tests;
