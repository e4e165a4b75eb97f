// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of `DorisCluster` resources.
//!
//! # Reconciliation Architecture
//!
//! One reconcile pass flows top-down and recomputes everything from the `DorisCluster` spec:
//!
//! 1. **Register** - [`cluster::ClusterReconciler`] creates one
//!    [`role::RoleReconciler`] per role; each hands its role-groups to the
//!    [`registrar::RoleGroupRegistrar`], which merges configuration and calls the
//!    component and resource builders
//! 2. **Converge** - every desired object goes through a
//!    [`resources::ResourceApplier`] (create if absent, server-side apply otherwise)
//! 3. **Status** - `StatefulSet` readiness is read back and summarized in the
//!    `Ready` condition by [`status::DorisClusterStatusUpdater`]
//!
//! Nothing is cached between passes.
//!
//! # Example
//!
//! ```rust,no_run
//! use doris_operator::context::Context;
//! use doris_operator::crd::DorisCluster;
//! use doris_operator::reconcilers::reconcile_doriscluster;
//! use std::sync::Arc;
//!
//! async fn run(ctx: Arc<Context>, cluster: DorisCluster) -> anyhow::Result<()> {
//!     let ready = reconcile_doriscluster(ctx, cluster).await?;
//!     println!("ready: {ready}");
//!     Ok(())
//! }
//! ```

pub mod cluster;
pub mod doriscluster;
pub mod registrar;
pub mod resources;
pub mod role;
pub mod status;

pub use doriscluster::reconcile_doriscluster;
