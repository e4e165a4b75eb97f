// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the `DorisCluster` controller.
//!
//! The controller receives an `Arc<Context>` holding the Kubernetes client and the
//! field manager used for server-side apply. Nothing in the context is mutated
//! between reconcile passes.

use crate::reconcilers::resources::KubeResources;
use kube::Client;

/// Shared context passed to the controller.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Field manager name for server-side apply
    pub field_manager: String,
}

impl Context {
    #[must_use]
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    /// Cluster-backed applier and lookup scoped to `namespace`.
    #[must_use]
    pub fn resources(&self, namespace: &str) -> KubeResources {
        KubeResources::new(self.client.clone(), namespace, &self.field_manager)
    }
}
