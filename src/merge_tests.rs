// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `merge.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{
        ConfigSpec, ContainerLoggingSpec, CpuResource, LogLevelSpec, LoggingSpec, MemoryResource,
        OverridesSpec, ResourcesSpec, StorageResource,
    };
    use crate::doris_errors::MergeError;
    use crate::merge::{deep_merge, merge_layers, merge_pod_template};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn storage(capacity: Option<&str>, class: Option<&str>) -> ConfigSpec {
        ConfigSpec {
            resources: Some(ResourcesSpec {
                storage: Some(StorageResource {
                    capacity: capacity.map(|c| Quantity(c.to_string())),
                    storage_class: class.map(str::to_string),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_none_none_returns_default() {
        let config: ConfigSpec = merge_layers(None, None).unwrap();
        assert_eq!(config, ConfigSpec::default());

        let overrides: OverridesSpec = merge_layers(None, None).unwrap();
        assert_eq!(overrides, OverridesSpec::default());
    }

    #[test]
    fn test_merge_role_only_is_role() {
        let role = storage(Some("50Gi"), Some("standard"));
        let merged = merge_layers(Some(&role), None).unwrap();
        assert_eq!(merged, role);
    }

    #[test]
    fn test_merge_group_only_is_group() {
        let group = storage(Some("5Gi"), None);
        let merged = merge_layers(None, Some(&group)).unwrap();
        assert_eq!(merged, group);
    }

    #[test]
    fn test_group_field_wins_when_set() {
        let role = ConfigSpec {
            graceful_shutdown_timeout: Some("30s".to_string()),
            ..storage(Some("50Gi"), Some("standard"))
        };
        let group = ConfigSpec {
            graceful_shutdown_timeout: Some("2m".to_string()),
            ..storage(Some("100Gi"), None)
        };

        let merged = merge_layers(Some(&role), Some(&group)).unwrap();
        let storage = merged.resources.unwrap().storage.unwrap();

        assert_eq!(merged.graceful_shutdown_timeout.as_deref(), Some("2m"));
        assert_eq!(storage.capacity, Some(Quantity("100Gi".to_string())));
        // storage class unset at group level falls back to the role value
        assert_eq!(storage.storage_class.as_deref(), Some("standard"));
    }

    #[test]
    fn test_nested_resources_merge_per_field() {
        let role = ConfigSpec {
            resources: Some(ResourcesSpec {
                cpu: Some(CpuResource {
                    min: Some(Quantity("1".to_string())),
                    max: Some(Quantity("4".to_string())),
                }),
                memory: Some(MemoryResource {
                    limit: Some(Quantity("8Gi".to_string())),
                }),
                storage: None,
            }),
            ..Default::default()
        };
        let group = ConfigSpec {
            resources: Some(ResourcesSpec {
                cpu: Some(CpuResource {
                    min: None,
                    max: Some(Quantity("8".to_string())),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let resources = merge_layers(Some(&role), Some(&group))
            .unwrap()
            .resources
            .unwrap();
        let cpu = resources.cpu.unwrap();

        assert_eq!(cpu.min, Some(Quantity("1".to_string())));
        assert_eq!(cpu.max, Some(Quantity("8".to_string())));
        assert_eq!(
            resources.memory.unwrap().limit,
            Some(Quantity("8Gi".to_string()))
        );
    }

    #[test]
    fn test_logging_containers_merge_per_logger() {
        let mut role_loggers = BTreeMap::new();
        role_loggers.insert(
            "ROOT".to_string(),
            LogLevelSpec {
                level: Some("INFO".to_string()),
            },
        );
        role_loggers.insert(
            "org.apache.doris".to_string(),
            LogLevelSpec {
                level: Some("WARN".to_string()),
            },
        );
        let mut group_loggers = BTreeMap::new();
        group_loggers.insert(
            "org.apache.doris".to_string(),
            LogLevelSpec {
                level: Some("DEBUG".to_string()),
            },
        );

        let role = ConfigSpec {
            logging: Some(LoggingSpec {
                enable_vector_agent: Some(true),
                containers: BTreeMap::from([(
                    "fe".to_string(),
                    ContainerLoggingSpec {
                        loggers: role_loggers,
                        ..Default::default()
                    },
                )]),
            }),
            ..Default::default()
        };
        let group = ConfigSpec {
            logging: Some(LoggingSpec {
                enable_vector_agent: None,
                containers: BTreeMap::from([(
                    "fe".to_string(),
                    ContainerLoggingSpec {
                        loggers: group_loggers,
                        ..Default::default()
                    },
                )]),
            }),
            ..Default::default()
        };

        let logging = merge_layers(Some(&role), Some(&group))
            .unwrap()
            .logging
            .unwrap();
        let fe = &logging.containers["fe"];

        assert_eq!(logging.enable_vector_agent, Some(true));
        assert_eq!(fe.loggers["ROOT"].level.as_deref(), Some("INFO"));
        assert_eq!(fe.loggers["org.apache.doris"].level.as_deref(), Some("DEBUG"));
    }

    #[test]
    fn test_overrides_merge_key_wise() {
        let role = OverridesSpec {
            config_overrides: BTreeMap::from([
                ("be.conf".to_string(), "role-be".to_string()),
                ("fe.conf".to_string(), "role-fe".to_string()),
            ]),
            env_overrides: BTreeMap::from([("A".to_string(), "1".to_string())]),
            cli_overrides: vec!["--role".to_string()],
            pod_overrides: None,
        };
        let group = OverridesSpec {
            config_overrides: BTreeMap::from([("be.conf".to_string(), "group-be".to_string())]),
            env_overrides: BTreeMap::from([("B".to_string(), "2".to_string())]),
            cli_overrides: vec![],
            pod_overrides: None,
        };

        let merged = merge_layers(Some(&role), Some(&group)).unwrap();

        assert_eq!(merged.config_overrides["be.conf"], "group-be");
        assert_eq!(merged.config_overrides["fe.conf"], "role-fe");
        assert_eq!(merged.env_overrides.len(), 2);
        assert_eq!(merged.cli_overrides, vec!["--role".to_string()]);
    }

    #[test]
    fn test_pod_overrides_deep_merge() {
        let role = OverridesSpec {
            pod_overrides: Some(json!({
                "metadata": {"labels": {"team": "data", "tier": "olap"}},
                "spec": {"priorityClassName": "low"}
            })),
            ..Default::default()
        };
        let group = OverridesSpec {
            pod_overrides: Some(json!({
                "metadata": {"labels": {"tier": "hot"}},
                "spec": {"priorityClassName": "high"}
            })),
            ..Default::default()
        };

        let merged = merge_layers(Some(&role), Some(&group))
            .unwrap()
            .pod_overrides
            .unwrap();

        assert_eq!(merged["metadata"]["labels"]["team"], "data");
        assert_eq!(merged["metadata"]["labels"]["tier"], "hot");
        assert_eq!(merged["spec"]["priorityClassName"], "high");
    }

    #[test]
    fn test_pod_overrides_must_be_object() {
        let role = OverridesSpec::default();
        let group = OverridesSpec {
            pod_overrides: Some(json!(["not", "an", "object"])),
            ..Default::default()
        };

        let err = merge_layers(Some(&role), Some(&group)).unwrap_err();
        assert_eq!(
            err,
            MergeError::PodOverridesNotObject {
                layer: "role-group".to_string(),
                found: "array".to_string(),
            }
        );
    }

    #[test]
    fn test_deep_merge_replaces_arrays_and_ignores_null() {
        let mut base = json!({"a": [1, 2], "b": {"c": 1}});
        deep_merge(&mut base, json!({"a": [3], "b": null}));
        assert_eq!(base, json!({"a": [3], "b": {"c": 1}}));
    }

    #[test]
    fn test_merge_pod_template_merges_containers_by_name() {
        let mut base = json!({
            "spec": {
                "containers": [
                    {"name": "be", "image": "apache/doris:be-2.1.8", "command": ["/entry.sh"]},
                    {"name": "vector", "image": "timberio/vector"}
                ],
                "volumes": [{"name": "doris-config", "configMap": {"name": "cm"}}]
            }
        });
        merge_pod_template(
            &mut base,
            json!({
                "spec": {
                    "containers": [
                        {"name": "be", "resources": {"limits": {"memory": "8Gi"}}},
                        {"name": "debug", "image": "busybox"}
                    ],
                    "volumes": [{"name": "scratch", "emptyDir": {}}]
                }
            }),
        );

        let containers = base["spec"]["containers"].as_array().unwrap();
        assert_eq!(containers.len(), 3);
        assert_eq!(containers[0]["image"], "apache/doris:be-2.1.8");
        assert_eq!(containers[0]["command"], json!(["/entry.sh"]));
        assert_eq!(containers[0]["resources"]["limits"]["memory"], "8Gi");
        assert_eq!(containers[1]["name"], "vector");
        assert_eq!(containers[2]["name"], "debug");
        assert_eq!(base["spec"]["volumes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_merge_pod_template_replaces_other_arrays() {
        let mut base = json!({"spec": {"tolerations": [{"key": "a"}], "containers": [{"name": "fe"}]}});
        merge_pod_template(
            &mut base,
            json!({"spec": {"tolerations": [{"key": "b"}], "containers": [{"args": ["x"]}]}}),
        );
        assert_eq!(base["spec"]["tolerations"], json!([{"key": "b"}]));
        // Entries without a name are appended
        assert_eq!(base["spec"]["containers"].as_array().unwrap().len(), 2);
    }
}
