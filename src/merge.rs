// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Layered configuration merging.
//!
//! A role carries default [`ConfigSpec`] and [`OverridesSpec`] fragments; each
//! role-group may carry its own. The effective fragment for a role-group is the role
//! fragment with every field the role-group sets taken from the role-group.
//!
//! Merging is explicit and per field: [`Merge`] is implemented by hand for every
//! config struct. Scalar and opaque fields follow "overlay wins when set"; nested
//! config blocks recurse; map-valued overrides merge key by key.
//!
//! # Example
//!
//! ```rust
//! use doris_operator::crd::{ConfigSpec, ResourcesSpec, StorageResource};
//! use doris_operator::merge::merge_layers;
//!
//! let role = ConfigSpec {
//!     graceful_shutdown_timeout: Some("30s".to_string()),
//!     ..Default::default()
//! };
//! let group = ConfigSpec {
//!     resources: Some(ResourcesSpec {
//!         storage: Some(StorageResource {
//!             storage_class: Some("fast".to_string()),
//!             ..Default::default()
//!         }),
//!         ..Default::default()
//!     }),
//!     ..Default::default()
//! };
//!
//! let effective = merge_layers(Some(&role), Some(&group)).unwrap();
//! assert_eq!(effective.graceful_shutdown_timeout.as_deref(), Some("30s"));
//! assert!(effective.resources.is_some());
//! ```

use crate::crd::{
    ConfigSpec, ContainerLoggingSpec, CpuResource, LoggingSpec, MemoryResource, OverridesSpec,
    ResourcesSpec, StorageResource,
};
use crate::doris_errors::MergeError;
use serde_json::Value;

/// Field-level merge of two fragments of the same shape.
pub trait Merge: Sized {
    /// Merge `overlay` on top of `self`.
    ///
    /// Every field set in `overlay` wins; unset fields fall back to `self`.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError`] when a fragment is malformed, such as pod overrides
    /// that are not a JSON object.
    fn merge(self, overlay: Self) -> Result<Self, MergeError>;
}

/// Merge an optional role-level fragment with an optional role-group-level fragment.
///
/// When both are absent the result is `T::default()`, never an absent value.
///
/// # Errors
///
/// Propagates [`MergeError`] from [`Merge::merge`].
pub fn merge_layers<T>(role: Option<&T>, role_group: Option<&T>) -> Result<T, MergeError>
where
    T: Merge + Clone + Default,
{
    let base = role.cloned().unwrap_or_default();
    match role_group {
        Some(overlay) => base.merge(overlay.clone()),
        None => Ok(base),
    }
}

/// Merge two optional nested blocks, recursing when both are present.
fn merge_nested<T: Merge>(base: Option<T>, overlay: Option<T>) -> Result<Option<T>, MergeError> {
    match (base, overlay) {
        (Some(b), Some(o)) => b.merge(o).map(Some),
        (b, o) => Ok(o.or(b)),
    }
}

impl Merge for ConfigSpec {
    fn merge(self, overlay: Self) -> Result<Self, MergeError> {
        Ok(Self {
            resources: merge_nested(self.resources, overlay.resources)?,
            logging: merge_nested(self.logging, overlay.logging)?,
            affinity: overlay.affinity.or(self.affinity),
            node_selector: overlay.node_selector.or(self.node_selector),
            tolerations: overlay.tolerations.or(self.tolerations),
            graceful_shutdown_timeout: overlay
                .graceful_shutdown_timeout
                .or(self.graceful_shutdown_timeout),
        })
    }
}

impl Merge for ResourcesSpec {
    fn merge(self, overlay: Self) -> Result<Self, MergeError> {
        Ok(Self {
            cpu: merge_nested(self.cpu, overlay.cpu)?,
            memory: merge_nested(self.memory, overlay.memory)?,
            storage: merge_nested(self.storage, overlay.storage)?,
        })
    }
}

impl Merge for CpuResource {
    fn merge(self, overlay: Self) -> Result<Self, MergeError> {
        Ok(Self {
            min: overlay.min.or(self.min),
            max: overlay.max.or(self.max),
        })
    }
}

impl Merge for MemoryResource {
    fn merge(self, overlay: Self) -> Result<Self, MergeError> {
        Ok(Self {
            limit: overlay.limit.or(self.limit),
        })
    }
}

impl Merge for StorageResource {
    fn merge(self, overlay: Self) -> Result<Self, MergeError> {
        Ok(Self {
            capacity: overlay.capacity.or(self.capacity),
            storage_class: overlay.storage_class.or(self.storage_class),
        })
    }
}

impl Merge for LoggingSpec {
    fn merge(self, overlay: Self) -> Result<Self, MergeError> {
        let mut containers = self.containers;
        for (name, spec) in overlay.containers {
            let merged = match containers.remove(&name) {
                Some(existing) => existing.merge(spec)?,
                None => spec,
            };
            containers.insert(name, merged);
        }
        Ok(Self {
            enable_vector_agent: overlay.enable_vector_agent.or(self.enable_vector_agent),
            containers,
        })
    }
}

impl Merge for ContainerLoggingSpec {
    fn merge(self, overlay: Self) -> Result<Self, MergeError> {
        let mut loggers = self.loggers;
        loggers.extend(overlay.loggers);
        Ok(Self {
            loggers,
            console: overlay.console.or(self.console),
            file: overlay.file.or(self.file),
        })
    }
}

impl Merge for OverridesSpec {
    fn merge(self, overlay: Self) -> Result<Self, MergeError> {
        let mut config_overrides = self.config_overrides;
        config_overrides.extend(overlay.config_overrides);

        let mut env_overrides = self.env_overrides;
        env_overrides.extend(overlay.env_overrides);

        let cli_overrides = if overlay.cli_overrides.is_empty() {
            self.cli_overrides
        } else {
            overlay.cli_overrides
        };

        let pod_overrides = match (self.pod_overrides, overlay.pod_overrides) {
            (Some(base), Some(top)) => {
                ensure_object(&base, "role")?;
                ensure_object(&top, "role-group")?;
                let mut merged = base;
                deep_merge(&mut merged, top);
                Some(merged)
            }
            (Some(base), None) => {
                ensure_object(&base, "role")?;
                Some(base)
            }
            (None, Some(top)) => {
                ensure_object(&top, "role-group")?;
                Some(top)
            }
            (None, None) => None,
        };

        Ok(Self {
            config_overrides,
            env_overrides,
            cli_overrides,
            pod_overrides,
        })
    }
}

fn ensure_object(value: &Value, layer: &str) -> Result<(), MergeError> {
    if value.is_object() {
        return Ok(());
    }
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    Err(MergeError::PodOverridesNotObject {
        layer: layer.to_string(),
        found: found.to_string(),
    })
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value replaces the base value.
/// A `null` in the overlay removes nothing and is ignored.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Pod template lists whose entries are identified by `name`.
const NAMED_LIST_KEYS: &[&str] = &["containers", "initContainers", "volumes", "env"];

/// Merge a pod template fragment into a generated pod template.
///
/// Behaves like [`deep_merge`], except that `containers`, `initContainers`,
/// `volumes` and `env` merge entry by entry on `name`: a matching entry is merged
/// recursively, an unmatched one is appended. Other arrays are replaced.
pub fn merge_pod_template(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(Value::Array(items))
                        if value.is_array() && NAMED_LIST_KEYS.contains(&key.as_str()) =>
                    {
                        merge_named_list(items, value);
                    }
                    Some(existing) => merge_pod_template(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn merge_named_list(items: &mut Vec<Value>, overlay: Value) {
    let Value::Array(entries) = overlay else {
        return;
    };
    for entry in entries {
        let position = entry.get("name").and_then(Value::as_str).and_then(|name| {
            items
                .iter()
                .position(|item| item.get("name").and_then(Value::as_str) == Some(name))
        });
        match position {
            Some(i) => merge_pod_template(&mut items[i], entry),
            None => items.push(entry),
        }
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod merge_tests;
