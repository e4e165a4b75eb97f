// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Doris Operator - Apache Doris on Kubernetes
//!
//! A Kubernetes operator written in Rust that turns a `DorisCluster` custom resource
//! into the `StatefulSet`s, `Service`s and `ConfigMap`s of an Apache Doris cluster
//! with a Frontend (FE) and a Backend (BE) role.
//!
//! ## Overview
//!
//! Each role is split into named role-groups. For every role-group the operator
//! merges the role and role-group configuration, asks the role's component builder
//! for containers, volumes and configuration files, and assembles the Kubernetes
//! objects with generic builders.
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definitions (`DorisCluster`, `AuthenticationClass`)
//! - [`merge`] - Role / role-group configuration merging
//! - [`components`] - FE and BE component builders
//! - [`doris_resources`] - Generic `StatefulSet`, `Service`, `ConfigMap` builders
//! - [`reconcilers`] - Registrar, role and cluster reconcilers, convergence, status
//! - [`context`] - Shared controller context
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use doris_operator::crd::{DorisClusterSpec, RoleGroupSpec, RoleSpec};
//! use std::collections::BTreeMap;
//!
//! let role = |replicas| RoleSpec {
//!     role_groups: BTreeMap::from([(
//!         "default".to_string(),
//!         RoleGroupSpec {
//!             replicas: Some(replicas),
//!             ..Default::default()
//!         },
//!     )]),
//!     ..Default::default()
//! };
//!
//! let spec = DorisClusterSpec {
//!     front_end: Some(role(3)),
//!     back_end: Some(role(5)),
//!     ..Default::default()
//! };
//! ```

pub mod components;
pub mod constants;
pub mod context;
pub mod crd;
pub mod doris_errors;
pub mod doris_resources;
pub mod labels;
pub mod merge;
pub mod metrics;
pub mod reconcilers;
pub mod status_reasons;
