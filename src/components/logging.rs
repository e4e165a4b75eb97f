// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Log configuration generators.
//!
//! - [`log4j2_properties`] renders the FE `log4j2.properties` from a container's logger
//!   levels
//! - [`vector_yaml`] renders the Vector agent configuration that tails the shared log
//!   directory and forwards to the cluster's aggregator
//! - [`vector_container`] builds the sidecar that runs the agent

use crate::components::{ResolvedImage, RoleGroupInfo};
use crate::constants::{
    CONFIG_VOLUME, DEFAULT_VECTOR_IMAGE, LOG_MOUNT_PATH, LOG_VOLUME, VECTOR_AGGREGATOR_ADDRESS_KEY,
    VECTOR_CONFIG_FILENAME, VECTOR_CONFIG_MOUNT_PATH, VECTOR_CONTAINER_NAME,
};
use crate::crd::{ContainerLoggingSpec, LogLevelSpec};
use crate::doris_errors::DorisError;
use k8s_openapi::api::core::v1::{
    ConfigMapKeySelector, Container, EnvVar, EnvVarSource, ObjectFieldSelector, VolumeMount,
};
use serde_json::json;
use std::fmt::Write as _;

/// Root logger key in [`ContainerLoggingSpec::loggers`].
pub const ROOT_LOGGER: &str = "ROOT";

const DEFAULT_LEVEL: &str = "INFO";

/// Env var the sidecar reads the aggregator address into.
pub const VECTOR_AGGREGATOR_ENV: &str = "VECTOR_AGGREGATOR_ADDRESS";

/// Render a log4j2 properties file for a container.
///
/// Output goes to the console and to a rolling file `{container}/{log_file}` under
/// the shared log directory, where the Vector agent can pick it up.
#[must_use]
pub fn log4j2_properties(container: &str, log_file: &str, spec: &ContainerLoggingSpec) -> String {
    let level = |l: Option<&LogLevelSpec>| {
        l.and_then(|l| l.level.clone())
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
    };
    let root_level = level(spec.loggers.get(ROOT_LOGGER));
    let console_level = level(spec.console.as_ref());
    let file_level = level(spec.file.as_ref());
    let log_dir = format!("{LOG_MOUNT_PATH}/{container}");

    let mut out = String::new();
    // writeln! into a String cannot fail
    let _ = writeln!(out, "appenders = CONSOLE, FILE");
    let _ = writeln!(out);
    let _ = writeln!(out, "appender.CONSOLE.type = Console");
    let _ = writeln!(out, "appender.CONSOLE.name = CONSOLE");
    let _ = writeln!(out, "appender.CONSOLE.target = SYSTEM_ERR");
    let _ = writeln!(out, "appender.CONSOLE.layout.type = PatternLayout");
    let _ = writeln!(
        out,
        "appender.CONSOLE.layout.pattern = %d{{ISO8601}} %-5p [%t] %c{{2}}: %.1000m%n"
    );
    let _ = writeln!(out, "appender.CONSOLE.filter.threshold.type = ThresholdFilter");
    let _ = writeln!(out, "appender.CONSOLE.filter.threshold.level = {console_level}");
    let _ = writeln!(out);
    let _ = writeln!(out, "appender.FILE.type = RollingFile");
    let _ = writeln!(out, "appender.FILE.name = FILE");
    let _ = writeln!(out, "appender.FILE.fileName = {log_dir}/{log_file}");
    let _ = writeln!(out, "appender.FILE.filePattern = {log_dir}/{log_file}.%i");
    let _ = writeln!(out, "appender.FILE.layout.type = XMLLayout");
    let _ = writeln!(out, "appender.FILE.policies.type = Policies");
    let _ = writeln!(out, "appender.FILE.policies.size.type = SizeBasedTriggeringPolicy");
    let _ = writeln!(out, "appender.FILE.policies.size.size = 5MB");
    let _ = writeln!(out, "appender.FILE.strategy.type = DefaultRolloverStrategy");
    let _ = writeln!(out, "appender.FILE.strategy.max = 1");
    let _ = writeln!(out, "appender.FILE.filter.threshold.type = ThresholdFilter");
    let _ = writeln!(out, "appender.FILE.filter.threshold.level = {file_level}");
    let _ = writeln!(out);

    let named: Vec<_> = spec
        .loggers
        .iter()
        .filter(|(name, _)| name.as_str() != ROOT_LOGGER)
        .collect();
    if !named.is_empty() {
        let ids: Vec<String> = (0..named.len()).map(|i| format!("logger{i}")).collect();
        let _ = writeln!(out, "loggers = {}", ids.join(", "));
        for (id, (name, spec)) in ids.iter().zip(named) {
            let _ = writeln!(out, "logger.{id}.name = {name}");
            let _ = writeln!(out, "logger.{id}.level = {}", level(Some(spec)));
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "rootLogger.level = {root_level}");
    let _ = writeln!(out, "rootLogger.appenderRefs = CONSOLE, FILE");
    let _ = writeln!(out, "rootLogger.appenderRef.CONSOLE.ref = CONSOLE");
    let _ = write!(out, "rootLogger.appenderRef.FILE.ref = FILE");
    out
}

/// Render `vector.yaml` for a role-group.
///
/// # Errors
///
/// Returns [`DorisError::Render`] if the document cannot be serialized.
pub fn vector_yaml(info: &RoleGroupInfo) -> Result<String, DorisError> {
    let document = json!({
        "data_dir": format!("{LOG_MOUNT_PATH}/_vector"),
        "sources": {
            "files": {
                "type": "file",
                "include": [format!("{LOG_MOUNT_PATH}/*/*.xml"), format!("{LOG_MOUNT_PATH}/*/*.log")],
            }
        },
        "transforms": {
            "extended": {
                "type": "remap",
                "inputs": ["files"],
                "source": format!(
                    ".namespace = \"{}\"\n.cluster = \"{}\"\n.role = \"{}\"\n.roleGroup = \"{}\"\n.pod = get_env_var!(\"POD_NAME\")\n",
                    info.cluster.namespace,
                    info.cluster.name,
                    info.kind.as_str(),
                    info.role_group,
                ),
            }
        },
        "sinks": {
            "aggregator": {
                "type": "vector",
                "inputs": ["extended"],
                "address": format!("${{{VECTOR_AGGREGATOR_ENV}}}"),
            }
        }
    });

    serde_yaml::to_string(&document).map_err(|e| DorisError::Render {
        file: VECTOR_CONFIG_FILENAME.to_string(),
        reason: e.to_string(),
    })
}

/// Vector sidecar container.
///
/// The aggregator address is read from the `ADDRESS` key of the aggregator discovery
/// `ConfigMap`.
#[must_use]
pub fn vector_container(aggregator_config_map: &str, image: &ResolvedImage) -> Container {
    Container {
        name: VECTOR_CONTAINER_NAME.into(),
        image: Some(DEFAULT_VECTOR_IMAGE.into()),
        image_pull_policy: Some(image.pull_policy.clone()),
        args: Some(vec![
            "--config".into(),
            format!("{VECTOR_CONFIG_MOUNT_PATH}/{VECTOR_CONFIG_FILENAME}"),
        ]),
        env: Some(vec![
            EnvVar {
                name: VECTOR_AGGREGATOR_ENV.into(),
                value_from: Some(EnvVarSource {
                    config_map_key_ref: Some(ConfigMapKeySelector {
                        name: aggregator_config_map.into(),
                        key: VECTOR_AGGREGATOR_ADDRESS_KEY.into(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            EnvVar {
                name: "POD_NAME".into(),
                value_from: Some(EnvVarSource {
                    field_ref: Some(ObjectFieldSelector {
                        field_path: "metadata.name".into(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ]),
        volume_mounts: Some(vec![
            VolumeMount {
                name: CONFIG_VOLUME.into(),
                mount_path: VECTOR_CONFIG_MOUNT_PATH.into(),
                ..Default::default()
            },
            VolumeMount {
                name: LOG_VOLUME.into(),
                mount_path: LOG_MOUNT_PATH.into(),
                ..Default::default()
            },
        ]),
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod logging_tests;
