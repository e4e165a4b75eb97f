// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `container.rs`

#[cfg(test)]
mod tests {
    use crate::components::container::{
        common_env, common_volume_mounts, effective_resources, http_health_probe,
        resource_requirements, tcp_probe, volume_claim, ResourceDefaults,
    };
    use crate::components::{resolve_image, ClusterInfo, ComponentKind, ComponentParams, RoleGroupInfo};
    use crate::crd::{
        ConfigSpec, CpuResource, LoggingSpec, MemoryResource, OverridesSpec, ResourcesSpec,
        StorageResource,
    };
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    const DEFAULTS: ResourceDefaults = ResourceDefaults {
        memory_limit: "1Gi",
        storage_size: "10Gi",
    };

    fn params(config: ConfigSpec) -> ComponentParams {
        ComponentParams {
            info: RoleGroupInfo {
                cluster: ClusterInfo {
                    name: "analytics".into(),
                    namespace: "data".into(),
                    uid: None,
                    cluster_domain: "cluster.local".into(),
                    vector_aggregator_config_map: None,
                },
                kind: ComponentKind::Fe,
                role_group: "default".into(),
            },
            image: resolve_image(None, ComponentKind::Fe),
            config,
            overrides: OverridesSpec::default(),
        }
    }

    fn q(value: &str) -> Quantity {
        Quantity(value.to_string())
    }

    #[test]
    fn test_effective_resources_defaults() {
        let resources = effective_resources(None, &DEFAULTS);
        let cpu = resources.cpu.unwrap();
        assert_eq!(cpu.min, Some(q("2")));
        assert_eq!(cpu.max, Some(q("2")));
        assert_eq!(resources.memory.unwrap().limit, Some(q("1Gi")));
        assert_eq!(resources.storage.unwrap().capacity, Some(q("10Gi")));
    }

    #[test]
    fn test_effective_resources_user_values_win() {
        let user = ResourcesSpec {
            cpu: Some(CpuResource {
                min: None,
                max: Some(q("4")),
            }),
            memory: Some(MemoryResource {
                limit: Some(q("8Gi")),
            }),
            storage: Some(StorageResource {
                capacity: None,
                storage_class: Some("fast".into()),
            }),
        };
        let resources = effective_resources(Some(&user), &DEFAULTS);
        let cpu = resources.cpu.unwrap();
        assert_eq!(cpu.min, Some(q("2")), "unset min keeps the default");
        assert_eq!(cpu.max, Some(q("4")));
        assert_eq!(resources.memory.unwrap().limit, Some(q("8Gi")));
        let storage = resources.storage.unwrap();
        assert_eq!(storage.capacity, Some(q("10Gi")));
        assert_eq!(storage.storage_class.as_deref(), Some("fast"));
    }

    #[test]
    fn test_effective_resources_partial_blocks_keep_defaults() {
        let user = ResourcesSpec {
            cpu: None,
            memory: Some(MemoryResource { limit: None }),
            storage: Some(StorageResource {
                capacity: Some(q("500Gi")),
                storage_class: None,
            }),
        };
        let resources = effective_resources(Some(&user), &DEFAULTS);
        let cpu = resources.cpu.unwrap();
        assert_eq!(cpu.min, Some(q("2")));
        assert_eq!(cpu.max, Some(q("2")));
        assert_eq!(resources.memory.unwrap().limit, Some(q("1Gi")));
        let storage = resources.storage.unwrap();
        assert_eq!(storage.capacity, Some(q("500Gi")));
        assert_eq!(storage.storage_class, None);
    }

    #[test]
    fn test_resource_requirements_mapping() {
        let requirements = resource_requirements(&effective_resources(None, &DEFAULTS));
        let requests = requirements.requests.unwrap();
        let limits = requirements.limits.unwrap();
        assert_eq!(requests.get("cpu"), Some(&q("2")));
        assert_eq!(limits.get("cpu"), Some(&q("2")));
        assert_eq!(requests.get("memory"), Some(&q("1Gi")));
        assert_eq!(limits.get("memory"), Some(&q("1Gi")));
        assert!(!requests.contains_key("storage"));
    }

    #[test]
    fn test_resource_requirements_empty() {
        let requirements = resource_requirements(&ResourcesSpec::default());
        assert!(requirements.requests.is_none());
        assert!(requirements.limits.is_none());
    }

    #[test]
    fn test_volume_claim() {
        let storage = StorageResource {
            capacity: Some(q("50Gi")),
            storage_class: Some("standard".into()),
        };
        let pvc = volume_claim("be-storage", Some(&storage));
        assert_eq!(pvc.metadata.name.as_deref(), Some("be-storage"));
        let spec = pvc.spec.unwrap();
        assert_eq!(spec.access_modes, Some(vec!["ReadWriteOnce".to_string()]));
        assert_eq!(spec.volume_mode.as_deref(), Some("Filesystem"));
        assert_eq!(spec.storage_class_name.as_deref(), Some("standard"));
        assert_eq!(
            spec.resources.unwrap().requests.unwrap().get("storage"),
            Some(&q("50Gi"))
        );
    }

    #[test]
    fn test_probes() {
        let tcp = tcp_probe(9030);
        assert_eq!(tcp.tcp_socket.unwrap().port, IntOrString::Int(9030));
        assert_eq!(tcp.initial_delay_seconds, Some(30));
        assert_eq!(tcp.period_seconds, Some(10));

        let http = http_health_probe(8040);
        let get = http.http_get.unwrap();
        assert_eq!(get.path.as_deref(), Some("/api/health"));
        assert_eq!(get.port, IntOrString::Int(8040));
    }

    #[test]
    fn test_common_env_points_at_fe() {
        let env = common_env(&params(ConfigSpec::default()));
        let fe_addr = env.iter().find(|e| e.name == "ENV_FE_ADDR").unwrap();
        assert_eq!(
            fe_addr.value.as_deref(),
            Some("analytics-fe-service.data.svc.cluster.local")
        );
        let pod_name = env.iter().find(|e| e.name == "POD_NAME").unwrap();
        assert_eq!(
            pod_name
                .value_from
                .as_ref()
                .and_then(|v| v.field_ref.as_ref())
                .map(|f| f.field_path.as_str()),
            Some("metadata.name")
        );
        assert!(env.iter().any(|e| e.name == "FE_QUERY_PORT" && e.value.as_deref() == Some("9030")));
    }

    #[test]
    fn test_common_volume_mounts_log_only_with_vector() {
        let names = |p: &ComponentParams| -> Vec<String> {
            common_volume_mounts(p).into_iter().map(|m| m.name).collect()
        };
        assert_eq!(names(&params(ConfigSpec::default())), vec!["podinfo", "doris-config"]);

        let with_vector = params(ConfigSpec {
            logging: Some(LoggingSpec {
                enable_vector_agent: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(names(&with_vector), vec!["podinfo", "doris-config", "log"]);
    }
}
