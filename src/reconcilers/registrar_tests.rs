// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `registrar.rs`

#[cfg(test)]
mod tests {
    use crate::components::{resolve_image, ClusterInfo, ComponentKind, LdapSettings};
    use crate::crd::{
        ConfigSpec, LoggingSpec, OverridesSpec, ResourcesSpec, RoleGroupSpec, RoleSpec,
        StorageResource,
    };
    use crate::doris_errors::DorisError;
    use crate::reconcilers::registrar::{validate_role_group_name, RoleGroupRegistrar};
    use crate::reconcilers::resources::DesiredResource;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use std::collections::BTreeMap;

    fn cluster() -> ClusterInfo {
        ClusterInfo {
            name: "analytics".into(),
            namespace: "data".into(),
            uid: Some("uid".into()),
            cluster_domain: "cluster.local".into(),
            vector_aggregator_config_map: None,
        }
    }

    fn storage(capacity: &str) -> Option<ConfigSpec> {
        Some(ConfigSpec {
            resources: Some(ResourcesSpec {
                storage: Some(StorageResource {
                    capacity: Some(Quantity(capacity.into())),
                    storage_class: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn group(replicas: Option<i32>) -> RoleGroupSpec {
        RoleGroupSpec {
            replicas,
            ..Default::default()
        }
    }

    fn claim_size(sts: &k8s_openapi::api::apps::v1::StatefulSet) -> Option<Quantity> {
        sts.spec
            .as_ref()
            .and_then(|s| s.volume_claim_templates.as_ref())
            .and_then(|t| t[0].spec.as_ref())
            .and_then(|s| s.resources.as_ref())
            .and_then(|r| r.requests.as_ref())
            .and_then(|r| r.get("storage").cloned())
    }

    #[test]
    fn test_register_role_group() {
        let role = RoleSpec::default();
        let image = resolve_image(None, ComponentKind::Be);
        let cluster = cluster();
        let registrar = RoleGroupRegistrar {
            kind: ComponentKind::Be,
            role: &role,
            image: &image,
            cluster: &cluster,
            stopped: false,
            ldap: None,
        };

        let resources = registrar.register("hot", &group(Some(4))).unwrap();
        assert_eq!(resources.info.full_name(), "analytics-be-hot");
        assert_eq!(resources.replicas, 4);
        assert_eq!(
            resources.internal_service.metadata.name.as_deref(),
            Some("analytics-be-internal")
        );
        assert_eq!(
            resources.access_service.metadata.name.as_deref(),
            Some("analytics-be-service")
        );
        assert_eq!(
            resources.metrics_service.metadata.name.as_deref(),
            Some("analytics-be-hot-metrics")
        );
        assert_eq!(resources.config_map.metadata.name.as_deref(), Some("analytics-be-hot"));
        assert_eq!(
            resources.stateful_set.spec.as_ref().and_then(|s| s.replicas),
            Some(4)
        );

        let kinds: Vec<&str> = resources.into_desired().iter().map(DesiredResource::kind).collect();
        assert_eq!(
            kinds,
            vec!["Service", "Service", "Service", "ConfigMap", "StatefulSet"]
        );
    }

    #[test]
    fn test_group_config_overrides_role_config() {
        let role = RoleSpec {
            config: storage("50Gi"),
            role_groups: BTreeMap::from([
                ("inherits".to_string(), group(None)),
                (
                    "custom".to_string(),
                    RoleGroupSpec {
                        config: storage("200Gi"),
                        ..Default::default()
                    },
                ),
            ]),
            ..Default::default()
        };
        let image = resolve_image(None, ComponentKind::Be);
        let cluster = cluster();
        let registrar = RoleGroupRegistrar {
            kind: ComponentKind::Be,
            role: &role,
            image: &image,
            cluster: &cluster,
            stopped: false,
            ldap: None,
        };

        let groups = registrar.register_all().unwrap();
        let by_name: BTreeMap<String, _> = groups
            .iter()
            .map(|g| (g.info.role_group.clone(), claim_size(&g.stateful_set)))
            .collect();
        assert_eq!(by_name["inherits"], Some(Quantity("50Gi".into())));
        assert_eq!(by_name["custom"], Some(Quantity("200Gi".into())));
    }

    #[test]
    fn test_overrides_merge_across_layers() {
        let role = RoleSpec {
            overrides: OverridesSpec {
                config_overrides: BTreeMap::from([("be.conf".to_string(), "role".to_string())]),
                ..Default::default()
            },
            ..Default::default()
        };
        let spec = RoleGroupSpec {
            overrides: OverridesSpec {
                config_overrides: BTreeMap::from([("be.conf".to_string(), "group".to_string())]),
                ..Default::default()
            },
            ..Default::default()
        };
        let image = resolve_image(None, ComponentKind::Be);
        let cluster = cluster();
        let registrar = RoleGroupRegistrar {
            kind: ComponentKind::Be,
            role: &role,
            image: &image,
            cluster: &cluster,
            stopped: false,
            ldap: None,
        };

        let resources = registrar.register("default", &spec).unwrap();
        assert_eq!(resources.config_map.data.unwrap()["be.conf"], "group");
    }

    #[test]
    fn test_stopped_role_group_scales_to_zero() {
        let role = RoleSpec::default();
        let image = resolve_image(None, ComponentKind::Fe);
        let cluster = cluster();
        let registrar = RoleGroupRegistrar {
            kind: ComponentKind::Fe,
            role: &role,
            image: &image,
            cluster: &cluster,
            stopped: true,
            ldap: None,
        };

        let resources = registrar.register("default", &group(Some(3))).unwrap();
        assert_eq!(resources.replicas, 0);
        assert_eq!(
            resources.stateful_set.spec.as_ref().and_then(|s| s.replicas),
            Some(0)
        );
    }

    #[test]
    fn test_ldap_reaches_fe_config() {
        let role = RoleSpec::default();
        let image = resolve_image(None, ComponentKind::Fe);
        let cluster = cluster();
        let ldap = LdapSettings {
            host: "ldap".into(),
            port: 389,
            admin_name: "admin".into(),
            base_dn: "dc=example".into(),
            search_filter: "(uid={login})".into(),
        };
        let registrar = RoleGroupRegistrar {
            kind: ComponentKind::Fe,
            role: &role,
            image: &image,
            cluster: &cluster,
            stopped: false,
            ldap: Some(&ldap),
        };

        let data = registrar
            .register("default", &group(None))
            .unwrap()
            .config_map
            .data
            .unwrap();
        assert!(data["fe.conf"].contains("ldap_host=ldap"));
    }

    #[test]
    fn test_one_bad_group_fails_the_role() {
        let bad = RoleGroupSpec {
            config: Some(ConfigSpec {
                logging: Some(LoggingSpec {
                    enable_vector_agent: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let role = RoleSpec {
            role_groups: BTreeMap::from([
                ("a-good".to_string(), group(Some(1))),
                ("b-bad".to_string(), bad),
            ]),
            ..Default::default()
        };
        let image = resolve_image(None, ComponentKind::Be);
        let cluster = cluster();
        let registrar = RoleGroupRegistrar {
            kind: ComponentKind::Be,
            role: &role,
            image: &image,
            cluster: &cluster,
            stopped: false,
            ldap: None,
        };

        assert_eq!(
            registrar.register_all().unwrap_err(),
            DorisError::MissingVectorAggregator {
                role_group: "analytics-be-b-bad".into()
            }
        );
    }

    #[test]
    fn test_role_group_name_must_be_dns_label() {
        let cluster = cluster();
        for good in ["default", "hot-1", "a", "2x"] {
            assert!(
                validate_role_group_name(&cluster, ComponentKind::Be, good).is_ok(),
                "{good:?} should be accepted"
            );
        }
        for bad in ["", "Default", "big_nodes", "-edge", "edge-", "a.b"] {
            assert!(
                matches!(
                    validate_role_group_name(&cluster, ComponentKind::Be, bad),
                    Err(DorisError::InvalidRoleGroupName { ref role_group, .. }) if role_group == bad
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_role_group_name_length_includes_derived_suffixes() {
        let cluster = cluster();
        // analytics-fe-<group>-metrics: 13 + 8 fixed characters
        let fits = "g".repeat(63 - 21);
        assert!(validate_role_group_name(&cluster, ComponentKind::Fe, &fits).is_ok());
        let too_long = "g".repeat(63 - 20);
        assert!(validate_role_group_name(&cluster, ComponentKind::Fe, &too_long).is_err());
    }

    #[test]
    fn test_invalid_role_group_name_fails_registration() {
        let role = RoleSpec {
            role_groups: BTreeMap::from([("big_nodes".to_string(), group(Some(2)))]),
            ..Default::default()
        };
        let image = resolve_image(None, ComponentKind::Be);
        let cluster = cluster();
        let registrar = RoleGroupRegistrar {
            kind: ComponentKind::Be,
            role: &role,
            image: &image,
            cluster: &cluster,
            stopped: false,
            ldap: None,
        };

        let err = registrar.register_all().unwrap_err();
        assert_eq!(err.status_reason(), "InvalidRoleGroupName");
        assert!(err.to_string().contains("big_nodes"));
    }
}
