// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Frontend (FE) component builder.
//!
//! FE is a JVM process holding cluster metadata. It mounts its metadata volume,
//! takes part in master election (`ELECT_NUMBER`) and runs no init containers.

use crate::components::container::{
    common_env, common_volume_mounts, effective_resources, http_health_probe,
    resource_requirements, tcp_probe, volume_claim, ResourceDefaults,
};
use crate::components::ldap::LdapSettings;
use crate::components::logging::log4j2_properties;
use crate::components::{ComponentBuilder, ComponentKind, ComponentParams};
use crate::constants::{
    DEFAULT_ELECT_NUMBER, FE_CONFIG_FILENAME, FE_ENTRYPOINT, FE_HTTP_PORT, FE_LOG4J2_CONFIG_FILENAME,
    FE_LOG_FILENAME, FE_MEMORY_LIMIT, FE_METADATA_PATH, FE_METADATA_VOLUME, FE_QUERY_PORT,
    FE_STORAGE_SIZE,
};
use crate::doris_errors::DorisError;
use k8s_openapi::api::core::v1::{Container, EnvVar, PersistentVolumeClaim, Volume, VolumeMount};
use std::collections::BTreeMap;

const FE_RESOURCE_DEFAULTS: ResourceDefaults = ResourceDefaults {
    memory_limit: FE_MEMORY_LIMIT,
    storage_size: FE_STORAGE_SIZE,
};

/// Baseline `fe.conf`: ports, log settings and JVM options per JDK generation.
const FE_BASELINE: &[&str] = &[
    "CUR_DATE=`date +%Y%m%d-%H%M%S`",
    "LOG_DIR=/kubedoop/log",
    "http_port = 8030",
    "rpc_port = 9020",
    "query_port = 9030",
    "edit_log_port = 9010",
    "arrow_flight_sql_port = -1",
    "sys_log_level = INFO",
    "sys_log_mode = NORMAL",
    "enable_fqdn_mode = true",
    "JAVA_OPTS=\"-Dfile.encoding=UTF-8 -Djavax.security.auth.useSubjectCredsOnly=false -Xss4m -Xmx8192m -XX:+UnlockExperimentalVMOptions -XX:+UseG1GC -XX:MaxGCPauseMillis=200 -XX:+PrintGCDateStamps -XX:+PrintGCDetails -Xloggc:$LOG_DIR/fe.gc.log.$CUR_DATE -Dlog4j2.formatMsgNoLookups=true\"",
    "JAVA_OPTS_FOR_JDK_9=\"-Dfile.encoding=UTF-8 -Djavax.security.auth.useSubjectCredsOnly=false -Xss4m -Xmx8192m -XX:+UseG1GC -XX:MaxGCPauseMillis=200 -Xlog:gc*:$LOG_DIR/fe.gc.log.$CUR_DATE:time -Dlog4j2.formatMsgNoLookups=true\"",
    "JAVA_OPTS_FOR_JDK_17=\"-Dfile.encoding=UTF-8 -Djavax.security.auth.useSubjectCredsOnly=false -XX:+UseG1GC -Xmx8192m -Xms8192m -XX:+HeapDumpOnOutOfMemoryError -XX:HeapDumpPath=$LOG_DIR/ -Xlog:gc*:$LOG_DIR/fe.gc.log.$CUR_DATE:time\"",
];

pub struct FeComponent {
    params: ComponentParams,
    ldap: Option<LdapSettings>,
}

impl FeComponent {
    #[must_use]
    pub fn new(params: ComponentParams, ldap: Option<LdapSettings>) -> Self {
        Self { params, ldap }
    }

    fn fe_conf(&self) -> String {
        let mut lines: Vec<String> = FE_BASELINE.iter().map(|l| (*l).to_string()).collect();
        if let Some(ldap) = &self.ldap {
            lines.extend(ldap.config_lines());
        }
        lines.join("\n")
    }
}

impl ComponentBuilder for FeComponent {
    fn params(&self) -> &ComponentParams {
        &self.params
    }

    fn main_container(&self) -> Container {
        let resources =
            effective_resources(self.params.config.resources.as_ref(), &FE_RESOURCE_DEFAULTS);

        let mut env = common_env(&self.params);
        env.push(EnvVar {
            name: "ELECT_NUMBER".into(),
            value: Some(DEFAULT_ELECT_NUMBER.into()),
            ..Default::default()
        });

        let mut volume_mounts = common_volume_mounts(&self.params);
        volume_mounts.push(VolumeMount {
            name: FE_METADATA_VOLUME.into(),
            mount_path: FE_METADATA_PATH.into(),
            ..Default::default()
        });

        Container {
            name: ComponentKind::Fe.as_str().into(),
            image: Some(self.params.image.reference.clone()),
            image_pull_policy: Some(self.params.image.pull_policy.clone()),
            command: Some(vec![FE_ENTRYPOINT.into()]),
            args: Some(vec!["$(ENV_FE_ADDR)".into()]),
            ports: Some(self.service_config().access_ports),
            env: Some(env),
            resources: Some(resource_requirements(&resources)),
            liveness_probe: Some(tcp_probe(FE_QUERY_PORT)),
            readiness_probe: Some(http_health_probe(FE_HTTP_PORT)),
            volume_mounts: Some(volume_mounts),
            ..Default::default()
        }
    }

    fn init_containers(&self) -> Vec<Container> {
        Vec::new()
    }

    fn volumes(&self) -> Vec<Volume> {
        Vec::new()
    }

    fn volume_claim_templates(&self) -> Vec<PersistentVolumeClaim> {
        let resources =
            effective_resources(self.params.config.resources.as_ref(), &FE_RESOURCE_DEFAULTS);
        vec![volume_claim(FE_METADATA_VOLUME, resources.storage.as_ref())]
    }

    fn build_config(&self) -> Result<BTreeMap<String, String>, DorisError> {
        let mut files = BTreeMap::new();
        files.insert(FE_CONFIG_FILENAME.to_string(), self.fe_conf());

        let container_logging = self
            .params
            .config
            .logging
            .as_ref()
            .and_then(|l| l.containers.get(ComponentKind::Fe.as_str()));
        if let Some(logging) = container_logging {
            files.insert(
                FE_LOG4J2_CONFIG_FILENAME.to_string(),
                log4j2_properties(ComponentKind::Fe.as_str(), FE_LOG_FILENAME, logging),
            );
        }

        Ok(files)
    }
}

#[cfg(test)]
#[path = "fe_tests.rs"]
mod fe_tests;
