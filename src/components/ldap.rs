// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! LDAP resolution for FE authentication.
//!
//! The cluster may reference an `AuthenticationClass`; when that class carries an LDAP
//! provider and the bind credentials secret holds an admin user, FE gets `ldap_*`
//! settings appended to `fe.conf`. Every lookup failure degrades to "LDAP disabled".

use crate::constants::LDAP_ADMIN_USER_KEY;
use crate::crd::{AuthenticationSpec, LdapProvider};
use crate::reconcilers::resources::ResourceLookup;
use k8s_openapi::api::core::v1::Secret;
use tracing::{debug, info, warn};

/// Resolved LDAP settings for `fe.conf`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LdapSettings {
    pub host: String,
    pub port: i32,
    pub admin_name: String,
    pub base_dn: String,
    pub search_filter: String,
}

impl LdapSettings {
    /// `fe.conf` lines. The search base doubles as the group base DN.
    #[must_use]
    pub fn config_lines(&self) -> Vec<String> {
        vec![
            format!("ldap_host={}", self.host),
            format!("ldap_port={}", self.port),
            format!("ldap_admin_name={}", self.admin_name),
            format!("ldap_user_basedn={}", self.base_dn),
            format!("ldap_user_filter={}", self.search_filter),
            format!("ldap_group_basedn={}", self.base_dn),
        ]
    }
}

/// Resolve LDAP settings from the cluster's authentication list.
///
/// Only the first entry is consulted. Returns `None` when no entry exists, the
/// `AuthenticationClass` cannot be read or has no LDAP provider, or the bind
/// credentials secret is missing or lacks the admin user key.
pub async fn resolve_ldap(
    lookup: &dyn ResourceLookup,
    namespace: &str,
    authentication: &[AuthenticationSpec],
) -> Option<LdapSettings> {
    let class_name = &authentication.first()?.authentication_class;

    let class = match lookup.authentication_class(namespace, class_name).await {
        Ok(Some(class)) => class,
        Ok(None) => {
            warn!(
                namespace = %namespace,
                authentication_class = %class_name,
                "AuthenticationClass not found, LDAP disabled"
            );
            return None;
        }
        Err(e) => {
            warn!(
                namespace = %namespace,
                authentication_class = %class_name,
                error = %e,
                "Failed to read AuthenticationClass, LDAP disabled"
            );
            return None;
        }
    };

    let Some(provider) = class.spec.provider.ldap else {
        info!(
            authentication_class = %class_name,
            "AuthenticationClass has no LDAP provider, LDAP disabled"
        );
        return None;
    };

    let admin_name = admin_user(lookup, namespace, &provider).await?;
    debug!(
        authentication_class = %class_name,
        host = %provider.hostname,
        "LDAP authentication enabled"
    );

    Some(LdapSettings {
        host: provider.hostname,
        port: provider.port,
        admin_name,
        base_dn: provider.search_base,
        search_filter: provider.search_filter,
    })
}

async fn admin_user(
    lookup: &dyn ResourceLookup,
    namespace: &str,
    provider: &LdapProvider,
) -> Option<String> {
    let Some(secret_name) = provider
        .bind_credentials
        .as_ref()
        .map(|c| c.secret_class.as_str())
        .filter(|name| !name.is_empty())
    else {
        warn!("LDAP bind credentials are not provided, LDAP disabled");
        return None;
    };

    let secret = match lookup.secret(namespace, secret_name).await {
        Ok(Some(secret)) => secret,
        Ok(None) => {
            warn!(
                namespace = %namespace,
                secret = %secret_name,
                "LDAP bind credentials secret not found, LDAP disabled"
            );
            return None;
        }
        Err(e) => {
            warn!(
                namespace = %namespace,
                secret = %secret_name,
                error = %e,
                "Failed to read LDAP bind credentials secret, LDAP disabled"
            );
            return None;
        }
    };

    let user = secret_value(&secret, LDAP_ADMIN_USER_KEY);
    if user.is_none() {
        warn!(
            namespace = %namespace,
            secret = %secret_name,
            key = LDAP_ADMIN_USER_KEY,
            "LDAP admin user not found in secret, LDAP disabled"
        );
    }
    user
}

/// Read a key from `data`, falling back to `stringData`.
fn secret_value(secret: &Secret, key: &str) -> Option<String> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .and_then(|bytes| String::from_utf8(bytes.0.clone()).ok())
        .or_else(|| {
            secret
                .string_data
                .as_ref()
                .and_then(|data| data.get(key).cloned())
        })
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[path = "ldap_tests.rs"]
mod ldap_tests;
