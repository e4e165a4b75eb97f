// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `ldap.rs`

#[cfg(test)]
mod tests {
    use crate::components::ldap::resolve_ldap;
    use crate::crd::{
        AuthenticationClass, AuthenticationClassSpec, AuthenticationProvider, AuthenticationSpec,
        BindCredentials, LdapProvider,
    };
    use crate::reconcilers::resources::ResourceLookup;
    use anyhow::Result;
    use async_trait::async_trait;
    use k8s_openapi::api::core::v1::Secret;
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    /// In-memory lookup; `fail` makes every call return an API error.
    #[derive(Default)]
    struct FakeLookup {
        classes: BTreeMap<String, AuthenticationClass>,
        secrets: BTreeMap<String, Secret>,
        fail: bool,
    }

    #[async_trait]
    impl ResourceLookup for FakeLookup {
        async fn authentication_class(
            &self,
            _namespace: &str,
            name: &str,
        ) -> Result<Option<AuthenticationClass>> {
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(self.classes.get(name).cloned())
        }

        async fn secret(&self, _namespace: &str, name: &str) -> Result<Option<Secret>> {
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(self.secrets.get(name).cloned())
        }
    }

    fn ldap_class(name: &str, secret: Option<&str>) -> AuthenticationClass {
        AuthenticationClass::new(
            name,
            AuthenticationClassSpec {
                provider: AuthenticationProvider {
                    ldap: Some(LdapProvider {
                        hostname: "ldap.example.com".into(),
                        port: 636,
                        search_base: "ou=people,dc=example,dc=com".into(),
                        search_filter: "(uid={login})".into(),
                        bind_credentials: secret.map(|s| BindCredentials {
                            secret_class: s.into(),
                        }),
                    }),
                },
            },
        )
    }

    fn secret_with(key: &str, value: &str) -> Secret {
        Secret {
            data: Some(BTreeMap::from([(
                key.to_string(),
                ByteString(value.as_bytes().to_vec()),
            )])),
            ..Default::default()
        }
    }

    fn auth(class: &str) -> Vec<AuthenticationSpec> {
        vec![AuthenticationSpec {
            authentication_class: class.into(),
        }]
    }

    fn complete_lookup() -> FakeLookup {
        FakeLookup {
            classes: BTreeMap::from([("ldap".to_string(), ldap_class("ldap", Some("ldap-bind")))]),
            secrets: BTreeMap::from([(
                "ldap-bind".to_string(),
                secret_with("user", "cn=admin,dc=example,dc=com"),
            )]),
            fail: false,
        }
    }

    #[tokio::test]
    async fn test_resolve_ldap_success() {
        let settings = resolve_ldap(&complete_lookup(), "data", &auth("ldap"))
            .await
            .unwrap();

        assert_eq!(settings.host, "ldap.example.com");
        assert_eq!(settings.port, 636);
        assert_eq!(settings.admin_name, "cn=admin,dc=example,dc=com");
        assert_eq!(settings.base_dn, "ou=people,dc=example,dc=com");
        assert_eq!(settings.search_filter, "(uid={login})");
        assert_eq!(settings.config_lines().len(), 6);
    }

    #[tokio::test]
    async fn test_resolve_ldap_no_authentication() {
        assert!(resolve_ldap(&complete_lookup(), "data", &[]).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_ldap_missing_class() {
        assert!(resolve_ldap(&complete_lookup(), "data", &auth("absent"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_resolve_ldap_api_error_degrades() {
        let lookup = FakeLookup {
            fail: true,
            ..complete_lookup()
        };
        assert!(resolve_ldap(&lookup, "data", &auth("ldap")).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_ldap_without_ldap_provider() {
        let lookup = FakeLookup {
            classes: BTreeMap::from([(
                "oidc".to_string(),
                AuthenticationClass::new("oidc", AuthenticationClassSpec::default()),
            )]),
            ..Default::default()
        };
        assert!(resolve_ldap(&lookup, "data", &auth("oidc")).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_ldap_without_bind_credentials() {
        let lookup = FakeLookup {
            classes: BTreeMap::from([("ldap".to_string(), ldap_class("ldap", None))]),
            ..Default::default()
        };
        assert!(resolve_ldap(&lookup, "data", &auth("ldap")).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_ldap_secret_missing_user_key() {
        let lookup = FakeLookup {
            secrets: BTreeMap::from([("ldap-bind".to_string(), secret_with("password", "x"))]),
            ..complete_lookup()
        };
        assert!(resolve_ldap(&lookup, "data", &auth("ldap")).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_ldap_reads_string_data() {
        let lookup = FakeLookup {
            secrets: BTreeMap::from([(
                "ldap-bind".to_string(),
                Secret {
                    string_data: Some(BTreeMap::from([(
                        "user".to_string(),
                        "cn=reader".to_string(),
                    )])),
                    ..Default::default()
                },
            )]),
            ..complete_lookup()
        };
        let settings = resolve_ldap(&lookup, "data", &auth("ldap")).await.unwrap();
        assert_eq!(settings.admin_name, "cn=reader");
    }

    #[tokio::test]
    async fn test_resolve_ldap_only_first_entry_is_consulted() {
        let mut entries = auth("absent");
        entries.extend(auth("ldap"));
        assert!(resolve_ldap(&complete_lookup(), "data", &entries)
            .await
            .is_none());
    }
}
