use crate::consts::{
    ENV_PROCESS_NAME, FUNCTION_LABEL, MIN_REPLICAS_LABEL, SECRETS_VOLUME_SUFFIX, TMP_MOUNT_PATH,
    TMP_VOLUME_NAME, UID_LABEL,
};
use crate::types::{FunctionDeployment, FunctionResources};
use itertools::Itertools;
use k8s_openapi::{
    api::core::v1::{EnvVar, PodSpec, ResourceRequirements, SecurityContext, Volume, VolumeMount},
    apimachinery::pkg::api::resource::Quantity,
};
use kube_quantity::ParsedQuantity;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug, PartialEq)]
pub enum ResourcesError {
    #[error("Invalid {kind} {resource} quantity {value:?}: {reason}")]
    Quantity {
        kind: &'static str,
        resource: &'static str,
        value: String,
        reason: String,
    },
}

impl FunctionDeployment {
    pub fn to_name(&self) -> String {
        self.service.clone()
    }

    /// Environment of the function container, sorted by name.
    /// A non-empty `envProcess` is injected as `fprocess` and wins over `envVars`.
    pub fn to_env_vars(&self) -> Option<Vec<EnvVar>> {
        let mut env: BTreeMap<String, String> = self
            .env_vars
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect();

        if let Some(env_process) = self.env_process.as_ref().filter(|p| !p.is_empty()) {
            env.insert(String::from(ENV_PROCESS_NAME), env_process.clone());
        }

        if env.is_empty() {
            return None;
        }

        Some(
            env.into_iter()
                .map(|(name, value)| EnvVar {
                    name,
                    value: Some(value),
                    ..Default::default()
                })
                .collect(),
        )
    }

    pub fn to_node_selector(&self) -> Option<BTreeMap<String, String>> {
        let selector = create_selector(self.constraints.as_deref().unwrap_or_default());

        if selector.is_empty() {
            None
        } else {
            Some(selector)
        }
    }

    /// Base labels merged with the caller's labels. Caller labels win on
    /// collision, `uid` and `faas_function` included.
    pub fn to_labels(&self, uid: &str) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::from([
            (String::from(FUNCTION_LABEL), self.to_name()),
            (String::from(UID_LABEL), uid.to_string()),
        ]);

        if let Some(caller_labels) = self.labels.clone() {
            labels.extend(caller_labels);
        }

        labels
    }

    pub fn to_min_replicas(&self) -> Option<i32> {
        self.labels.as_ref().and_then(get_min_replica_count)
    }

    pub fn to_annotations(&self) -> Option<BTreeMap<String, String>> {
        self.annotations
            .clone()
            .map(|annotations| annotations.into_iter().collect())
    }

    pub fn to_resources(&self) -> Result<ResourceRequirements, ResourcesError> {
        Ok(ResourceRequirements {
            limits: to_resource_list("limit", self.limits.as_ref())?,
            requests: to_resource_list("request", self.requests.as_ref())?,
        })
    }

    pub fn to_unique_secret_names(&self) -> Vec<String> {
        self.secrets
            .clone()
            .unwrap_or_default()
            .into_iter()
            .unique()
            .collect()
    }

    pub fn to_secrets_volume_name(&self) -> String {
        format!("{}{}", self.to_name(), SECRETS_VOLUME_SUFFIX)
    }

    fn read_only_root_filesystem(&self) -> bool {
        self.read_only_root_filesystem.unwrap_or(false)
    }

    fn to_tmp_volume(&self) -> Volume {
        Volume {
            name: String::from(TMP_VOLUME_NAME),
            empty_dir: Some(Default::default()),
            ..Default::default()
        }
    }

    fn to_tmp_volume_mount(&self) -> VolumeMount {
        VolumeMount {
            name: String::from(TMP_VOLUME_NAME),
            mount_path: String::from(TMP_MOUNT_PATH),
            ..Default::default()
        }
    }

    /// Sets the root filesystem mode of the first container and swaps the
    /// writable `/tmp` volume in or out accordingly.
    pub fn configure_read_only_root_filesystem(&self, pod_spec: &mut PodSpec) {
        let read_only = self.read_only_root_filesystem();

        remove_volume(&mut pod_spec.volumes, TMP_VOLUME_NAME);
        if read_only {
            pod_spec
                .volumes
                .get_or_insert_with(Vec::new)
                .push(self.to_tmp_volume());
        }

        let Some(container) = pod_spec.containers.first_mut() else {
            return;
        };

        container
            .security_context
            .get_or_insert_with(SecurityContext::default)
            .read_only_root_filesystem = Some(read_only);

        remove_volume_mount(&mut container.volume_mounts, TMP_VOLUME_NAME);
        if read_only {
            container
                .volume_mounts
                .get_or_insert_with(Vec::new)
                .push(self.to_tmp_volume_mount());
        }
    }
}

/// Translates `key=value` (or `key==value`) constraints into a node selector.
/// Malformed entries are skipped, the last duplicate key wins.
pub fn create_selector(constraints: &[String]) -> BTreeMap<String, String> {
    constraints
        .iter()
        .filter_map(|constraint| parse_constraint(constraint))
        .collect()
}

fn parse_constraint(constraint: &str) -> Option<(String, String)> {
    let (key, value) = constraint
        .split_once("==")
        .or_else(|| constraint.split_once('='))?;

    let key = key.trim();
    let value = value.trim();

    if key.is_empty() || value.contains('=') {
        tracing::warn!(%constraint, "Ignoring malformed constraint.");
        return None;
    }

    Some((key.to_string(), value.to_string()))
}

/// Reads the minimum replica hint. Only positive integers count.
pub fn get_min_replica_count(labels: &HashMap<String, String>) -> Option<i32> {
    let value = labels.get(MIN_REPLICAS_LABEL)?;

    match value.parse::<i32>() {
        Ok(min) if min > 0 => Some(min),
        Ok(min) => {
            tracing::warn!(min, "Ignoring non-positive minimum replica count.");
            None
        }
        Err(error) => {
            tracing::warn!(%error, %value, "Ignoring invalid minimum replica count.");
            None
        }
    }
}

fn to_resource_list(
    kind: &'static str,
    resources: Option<&FunctionResources>,
) -> Result<Option<BTreeMap<String, Quantity>>, ResourcesError> {
    let Some(resources) = resources else {
        return Ok(None);
    };

    let mut list = BTreeMap::new();

    for (resource, value) in [("memory", &resources.memory), ("cpu", &resources.cpu)] {
        let Some(value) = value.as_ref().filter(|v| !v.is_empty()) else {
            continue;
        };

        let quantity = Quantity(value.clone());
        if let Err(error) = ParsedQuantity::try_from(quantity.clone()) {
            return Err(ResourcesError::Quantity {
                kind,
                resource,
                value: value.clone(),
                reason: error.to_string(),
            });
        }

        list.insert(String::from(resource), quantity);
    }

    if list.is_empty() {
        Ok(None)
    } else {
        Ok(Some(list))
    }
}

pub(super) fn remove_volume(volumes: &mut Option<Vec<Volume>>, name: &str) {
    if let Some(volumes) = volumes {
        volumes.retain(|volume| volume.name != name);
    }
}

pub(super) fn remove_volume_mount(mounts: &mut Option<Vec<VolumeMount>>, name: &str) {
    if let Some(mounts) = mounts {
        mounts.retain(|mount| mount.name != name);
    }
}
