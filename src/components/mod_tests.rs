// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `components/mod.rs`

#[cfg(test)]
mod tests {
    use crate::components::{
        metrics_port, new_component, resolve_image, ClusterInfo, ComponentKind, ComponentParams,
        RoleGroupInfo,
    };
    use crate::crd::{
        ClusterConfigSpec, ConfigSpec, DorisCluster, DorisClusterSpec, ImageSpec, LoggingSpec,
        OverridesSpec,
    };
    use crate::doris_errors::DorisError;

    fn port_names(ports: &[k8s_openapi::api::core::v1::ContainerPort]) -> Vec<String> {
        ports.iter().filter_map(|p| p.name.clone()).collect()
    }

    fn cluster_info() -> ClusterInfo {
        ClusterInfo {
            name: "analytics".into(),
            namespace: "data".into(),
            uid: Some("uid-1".into()),
            cluster_domain: "cluster.local".into(),
            vector_aggregator_config_map: None,
        }
    }

    #[test]
    fn test_metrics_port_by_role() {
        assert_eq!(metrics_port("fe").unwrap(), 8030);
        assert_eq!(metrics_port("be").unwrap(), 8040);
    }

    #[test]
    fn test_metrics_port_unknown_role_is_an_error() {
        let err = metrics_port("unknown-role").unwrap_err();
        assert_eq!(
            err,
            DorisError::UnknownRole {
                role: "unknown-role".into()
            }
        );
    }

    #[test]
    fn test_be_port_sets() {
        let config = ComponentKind::Be.service_config();
        assert_eq!(port_names(&config.internal_ports), vec!["be-heartbeat"]);
        assert_eq!(
            port_names(&config.access_ports),
            vec!["be-rpc", "be-http", "be-heartbeat", "be-brpc"]
        );
        let numbers: Vec<i32> = config.access_ports.iter().map(|p| p.container_port).collect();
        assert_eq!(numbers, vec![9060, 8040, 9050, 8060]);
    }

    #[test]
    fn test_fe_port_sets() {
        let config = ComponentKind::Fe.service_config();
        assert_eq!(port_names(&config.internal_ports), vec!["fe-query"]);
        assert_eq!(
            port_names(&config.access_ports),
            vec!["fe-http", "fe-rpc", "fe-query", "fe-edit-log"]
        );
        let numbers: Vec<i32> = config.access_ports.iter().map(|p| p.container_port).collect();
        assert_eq!(numbers, vec![8030, 9020, 9030, 9010]);
    }

    #[test]
    fn test_component_kind_display() {
        assert_eq!(ComponentKind::Fe.to_string(), "fe");
        assert_eq!(ComponentKind::Be.to_string(), "be");
    }

    #[test]
    fn test_resolve_image_default() {
        let image = resolve_image(None, ComponentKind::Fe);
        assert_eq!(image.reference, "apache/doris:fe-2.1.8");
        assert_eq!(image.pull_policy, "IfNotPresent");
        assert_eq!(image.pull_secret, None);
    }

    #[test]
    fn test_resolve_image_repo_and_version() {
        let spec = ImageSpec {
            repo: Some("registry.example.com/doris".into()),
            product_version: Some("2.1.7".into()),
            pull_policy: Some("Always".into()),
            pull_secret_name: Some("regcred".into()),
            ..Default::default()
        };
        let image = resolve_image(Some(&spec), ComponentKind::Be);
        assert_eq!(image.reference, "registry.example.com/doris:be-2.1.7");
        assert_eq!(image.pull_policy, "Always");
        assert_eq!(image.pull_secret.as_deref(), Some("regcred"));
    }

    #[test]
    fn test_resolve_image_custom_wins() {
        let spec = ImageSpec {
            custom: Some("my/doris:patched".into()),
            repo: Some("ignored".into()),
            product_version: Some("9.9.9".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_image(Some(&spec), ComponentKind::Fe).reference,
            "my/doris:patched"
        );
    }

    #[test]
    fn test_resolve_image_version_only_uses_default_repo() {
        let spec = ImageSpec {
            product_version: Some("2.0.0".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_image(Some(&spec), ComponentKind::Fe).reference,
            "apache/doris:fe-2.0.0"
        );
    }

    #[test]
    fn test_service_names_and_fe_address() {
        let info = cluster_info();
        assert_eq!(info.internal_service_name(ComponentKind::Be), "analytics-be-internal");
        assert_eq!(info.access_service_name(ComponentKind::Fe), "analytics-fe-service");
        assert_eq!(
            info.fe_address(),
            "analytics-fe-service.data.svc.cluster.local"
        );
    }

    #[test]
    fn test_role_group_full_name() {
        let info = RoleGroupInfo {
            cluster: cluster_info(),
            kind: ComponentKind::Be,
            role_group: "hot".into(),
        };
        assert_eq!(info.full_name(), "analytics-be-hot");
    }

    #[test]
    fn test_cluster_info_from_cluster_defaults() {
        let mut cluster = DorisCluster::new("analytics", DorisClusterSpec::default());
        cluster.metadata.namespace = Some("data".into());
        let info = ClusterInfo::from_cluster(&cluster);
        assert_eq!(info.cluster_domain, "cluster.local");
        assert_eq!(info.vector_aggregator_config_map, None);
        assert_eq!(info.uid, None);
    }

    #[test]
    fn test_cluster_info_ignores_empty_aggregator_name() {
        let mut cluster = DorisCluster::new(
            "analytics",
            DorisClusterSpec {
                cluster_config: Some(ClusterConfigSpec {
                    cluster_domain: Some("corp.internal".into()),
                    vector_aggregator_config_map_name: Some(String::new()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        cluster.metadata.namespace = Some("data".into());
        let info = ClusterInfo::from_cluster(&cluster);
        assert_eq!(info.cluster_domain, "corp.internal");
        assert_eq!(info.vector_aggregator_config_map, None);
    }

    #[test]
    fn test_vector_enabled_flag() {
        let mut params = ComponentParams {
            info: RoleGroupInfo {
                cluster: cluster_info(),
                kind: ComponentKind::Fe,
                role_group: "default".into(),
            },
            image: resolve_image(None, ComponentKind::Fe),
            config: ConfigSpec::default(),
            overrides: OverridesSpec::default(),
        };
        assert!(!params.vector_enabled());

        params.config.logging = Some(LoggingSpec {
            enable_vector_agent: Some(true),
            ..Default::default()
        });
        assert!(params.vector_enabled());
    }

    #[test]
    fn test_new_component_selects_variant() {
        for kind in [ComponentKind::Fe, ComponentKind::Be] {
            let params = ComponentParams {
                info: RoleGroupInfo {
                    cluster: cluster_info(),
                    kind,
                    role_group: "default".into(),
                },
                image: resolve_image(None, kind),
                config: ConfigSpec::default(),
                overrides: OverridesSpec::default(),
            };
            let component = new_component(params, None);
            assert_eq!(component.main_container().name, kind.as_str());
            assert_eq!(component.service_config().kind, kind);
        }
    }
}
