// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Backend (BE) component builder.
//!
//! BE is a native process with an embedded JVM for JNI. It mounts its storage
//! volume and needs the kernel tuned (`vm.max_map_count`, swap off) by a privileged
//! init container before it starts.

use crate::components::container::{
    common_env, common_volume_mounts, effective_resources, http_health_probe,
    resource_requirements, tcp_probe, volume_claim, ResourceDefaults,
};
use crate::components::{ComponentBuilder, ComponentKind, ComponentParams};
use crate::constants::{
    BE_CONFIG_FILENAME, BE_ENTRYPOINT, BE_HEARTBEAT_PORT, BE_HTTP_PORT, BE_INIT_COMMAND,
    BE_MEMORY_LIMIT, BE_STORAGE_PATH, BE_STORAGE_SIZE, BE_STORAGE_VOLUME, DEFAULT_INIT_IMAGE,
    DEFAULT_PULL_POLICY, INIT_CONTAINER_NAME,
};
use crate::doris_errors::DorisError;
use k8s_openapi::api::core::v1::{
    Container, PersistentVolumeClaim, SecurityContext, Volume, VolumeMount,
};
use std::collections::BTreeMap;

const BE_RESOURCE_DEFAULTS: ResourceDefaults = ResourceDefaults {
    memory_limit: BE_MEMORY_LIMIT,
    storage_size: BE_STORAGE_SIZE,
};

/// Baseline `be.conf`: JNI options, jemalloc tuning, ports and log levels.
const BE_BASELINE: &[&str] = &[
    "CUR_DATE=`date +%Y%m%d-%H%M%S`",
    "LOG_DIR=/kubedoop/log",
    "JAVA_OPTS=\"-Dfile.encoding=UTF-8 -Xmx2048m -DlogPath=$LOG_DIR/jni.log -Xloggc:$LOG_DIR/be.gc.log.$CUR_DATE -Djavax.security.auth.useSubjectCredsOnly=false -Dsun.security.krb5.debug=true -Dsun.java.command=DorisBE -XX:-CriticalJNINatives -Darrow.enable_null_check_for_get=false\"",
    "JAVA_OPTS_FOR_JDK_9=\"-Dfile.encoding=UTF-8 -Xmx2048m -DlogPath=$LOG_DIR/jni.log -Xlog:gc:$LOG_DIR/be.gc.log.$CUR_DATE -Djavax.security.auth.useSubjectCredsOnly=false -Dsun.security.krb5.debug=true -Dsun.java.command=DorisBE -XX:-CriticalJNINatives --add-opens=java.base/java.nio=ALL-UNNAMED -Darrow.enable_null_check_for_get=false\"",
    "JAVA_OPTS_FOR_JDK_17=\"-Dfile.encoding=UTF-8 -Xmx2048m -DlogPath=$LOG_DIR/jni.log -Xlog:gc:$LOG_DIR/be.gc.log.$CUR_DATE -Djavax.security.auth.useSubjectCredsOnly=false -Dsun.security.krb5.debug=true -Dsun.java.command=DorisBE -XX:-CriticalJNINatives --add-opens=java.base/java.net=ALL-UNNAMED --add-opens=java.base/java.nio=ALL-UNNAMED -Darrow.enable_null_check_for_get=false\"",
    "JEMALLOC_CONF=\"percpu_arena:percpu,background_thread:true,metadata_thp:auto,muzzy_decay_ms:5000,dirty_decay_ms:5000,oversize_threshold:0,prof:true,prof_active:false,lg_prof_interval:-1\"",
    "JEMALLOC_PROF_PRFIX=\"jemalloc_heap_profile_\"",
    "be_port=9060",
    "webserver_port=8040",
    "heartbeat_service_port=9050",
    "brpc_port=8060",
    "arrow_flight_sql_port=-1",
    "enable_https=false",
    "ssl_certificate_path=\"$DORIS_HOME/conf/cert.pem\"",
    "ssl_private_key_path=\"$DORIS_HOME/conf/key.pem\"",
    "sys_log_level=INFO",
    "aws_log_level=0",
    "AWS_EC2_METADATA_DISABLED=true",
];

pub struct BeComponent {
    params: ComponentParams,
}

impl BeComponent {
    #[must_use]
    pub fn new(params: ComponentParams) -> Self {
        Self { params }
    }
}

impl ComponentBuilder for BeComponent {
    fn params(&self) -> &ComponentParams {
        &self.params
    }

    fn main_container(&self) -> Container {
        let resources =
            effective_resources(self.params.config.resources.as_ref(), &BE_RESOURCE_DEFAULTS);

        let mut volume_mounts = common_volume_mounts(&self.params);
        volume_mounts.push(VolumeMount {
            name: BE_STORAGE_VOLUME.into(),
            mount_path: BE_STORAGE_PATH.into(),
            ..Default::default()
        });

        Container {
            name: ComponentKind::Be.as_str().into(),
            image: Some(self.params.image.reference.clone()),
            image_pull_policy: Some(self.params.image.pull_policy.clone()),
            command: Some(vec![BE_ENTRYPOINT.into()]),
            args: Some(vec!["$(ENV_FE_ADDR)".into()]),
            ports: Some(self.service_config().access_ports),
            env: Some(common_env(&self.params)),
            resources: Some(resource_requirements(&resources)),
            liveness_probe: Some(tcp_probe(BE_HEARTBEAT_PORT)),
            readiness_probe: Some(http_health_probe(BE_HTTP_PORT)),
            volume_mounts: Some(volume_mounts),
            ..Default::default()
        }
    }

    fn init_containers(&self) -> Vec<Container> {
        vec![Container {
            name: INIT_CONTAINER_NAME.into(),
            image: Some(DEFAULT_INIT_IMAGE.into()),
            image_pull_policy: Some(DEFAULT_PULL_POLICY.into()),
            command: Some(vec!["sh".into(), "-c".into(), BE_INIT_COMMAND.into()]),
            security_context: Some(SecurityContext {
                privileged: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        }]
    }

    fn volumes(&self) -> Vec<Volume> {
        Vec::new()
    }

    fn volume_claim_templates(&self) -> Vec<PersistentVolumeClaim> {
        let resources =
            effective_resources(self.params.config.resources.as_ref(), &BE_RESOURCE_DEFAULTS);
        vec![volume_claim(BE_STORAGE_VOLUME, resources.storage.as_ref())]
    }

    fn build_config(&self) -> Result<BTreeMap<String, String>, DorisError> {
        Ok(BTreeMap::from([(
            BE_CONFIG_FILENAME.to_string(),
            BE_BASELINE.join("\n"),
        )]))
    }
}

#[cfg(test)]
#[path = "be_tests.rs"]
mod be_tests;
