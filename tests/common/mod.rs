// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use doris_operator::crd::{
    AuthenticationClass, AuthenticationClassSpec, AuthenticationProvider, BindCredentials,
    DorisCluster, DorisClusterSpec, LdapProvider, RoleGroupSpec, RoleSpec,
};
use doris_operator::reconcilers::resources::ResourceLookup;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::{
    api::{Api, DeleteParams, PostParams},
    client::Client,
};
use serde_json::json;
use std::collections::BTreeMap;

/// In-memory `AuthenticationClass` and `Secret` store.
#[derive(Default)]
pub struct FakeLookup {
    pub classes: BTreeMap<String, AuthenticationClass>,
    pub secrets: BTreeMap<String, Secret>,
}

impl FakeLookup {
    /// A lookup holding one LDAP class bound to a secret with admin user `user`.
    pub fn with_ldap(class: &str, secret: &str, user: &str) -> Self {
        let mut lookup = Self::default();
        lookup.classes.insert(
            class.to_string(),
            AuthenticationClass::new(
                class,
                AuthenticationClassSpec {
                    provider: AuthenticationProvider {
                        ldap: Some(LdapProvider {
                            hostname: "ldap.example.com".into(),
                            port: 389,
                            search_base: "ou=people,dc=example,dc=com".into(),
                            search_filter: "(uid={login})".into(),
                            bind_credentials: Some(BindCredentials {
                                secret_class: secret.into(),
                            }),
                        }),
                    },
                },
            ),
        );
        lookup.secrets.insert(
            secret.to_string(),
            Secret {
                data: Some(BTreeMap::from([(
                    "user".to_string(),
                    ByteString(user.as_bytes().to_vec()),
                )])),
                ..Default::default()
            },
        );
        lookup
    }
}

#[async_trait]
impl ResourceLookup for FakeLookup {
    async fn authentication_class(
        &self,
        _namespace: &str,
        name: &str,
    ) -> Result<Option<AuthenticationClass>> {
        Ok(self.classes.get(name).cloned())
    }

    async fn secret(&self, _namespace: &str, name: &str) -> Result<Option<Secret>> {
        Ok(self.secrets.get(name).cloned())
    }
}

/// A role with a single `default` role-group.
pub fn role(replicas: i32) -> RoleSpec {
    RoleSpec {
        role_groups: BTreeMap::from([(
            "default".to_string(),
            RoleGroupSpec {
                replicas: Some(replicas),
                ..Default::default()
            },
        )]),
        ..Default::default()
    }
}

/// A `DorisCluster` named `name` in `namespace`.
pub fn doris_cluster(name: &str, namespace: &str, spec: DorisClusterSpec) -> DorisCluster {
    let mut cluster = DorisCluster::new(name, spec);
    cluster.metadata.namespace = Some(namespace.to_string());
    cluster.metadata.uid = Some(format!("{name}-uid"));
    cluster
}

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

/// Create a test namespace
pub async fn create_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<k8s_openapi::api::core::v1::Namespace> = Api::all(client.clone());

    let ns = serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "labels": {
                "test": "integration",
                "managed-by": "doris-operator-test"
            }
        }
    }))?;

    match namespaces.create(&PostParams::default(), &ns).await {
        Ok(_) => {
            println!("Created test namespace: {name}");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            println!("Test namespace already exists: {name}");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Cleanup test namespace
pub async fn cleanup_test_namespace(client: &Client, name: &str) {
    let namespaces: Api<k8s_openapi::api::core::v1::Namespace> = Api::all(client.clone());
    match namespaces.delete(name, &DeleteParams::default()).await {
        Ok(_) => println!("Deleted test namespace: {name}"),
        Err(e) => eprintln!("Failed to delete test namespace {name}: {e}"),
    }
}
