use super::impls::{remove_volume, remove_volume_mount};
use crate::accessor::{AccessorError, SecretsAccessor};
use crate::consts::{DOCKER_CFG_SECRET_TYPE, DOCKER_CONFIG_JSON_SECRET_TYPE, SECRETS_MOUNT_PATH};
use crate::types::FunctionDeployment;
use k8s_openapi::api::core::v1::{
    KeyToPath, LocalObjectReference, PodSpec, ProjectedVolumeSource, Secret, SecretProjection,
    Volume, VolumeMount, VolumeProjection,
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum GetSecretsError {
    #[error("Error listing secrets: {0}")]
    List(#[source] AccessorError),
    #[error("Secret(s) {} do(es) not exist", .0.join(", "))]
    NotFound(Vec<String>),
}

#[derive(ThisError, Debug, PartialEq)]
pub enum UpdateSecretsError {
    #[error("Required secret '{0}' was not found in the cluster")]
    Missing(String),
}

/// Resolves the requested secret names against the namespace.
/// Fails listing every name that does not exist.
pub async fn get_secrets<A>(
    accessor: &A,
    namespace: &str,
    names: &[String],
) -> Result<BTreeMap<String, Secret>, GetSecretsError>
where
    A: SecretsAccessor + ?Sized,
{
    if names.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut existing: BTreeMap<String, Secret> = accessor
        .list_secrets(namespace)
        .await
        .map_err(GetSecretsError::List)?
        .into_iter()
        .filter_map(|secret| secret.metadata.name.clone().map(|name| (name, secret)))
        .collect();

    let not_found: Vec<String> = names
        .iter()
        .filter(|name| !existing.contains_key(name.as_str()))
        .cloned()
        .collect();

    if !not_found.is_empty() {
        return Err(GetSecretsError::NotFound(not_found));
    }

    existing.retain(|name, _| names.contains(name));

    Ok(existing)
}

/// Secret volume, mount and pull secrets for a function, built before the
/// deployment is touched and applied afterwards.
#[derive(Debug, Default, PartialEq)]
pub struct SecretsMount {
    volume_name: String,
    volume: Option<Volume>,
    mount: Option<VolumeMount>,
    image_pull_secrets: Vec<LocalObjectReference>,
}

fn is_image_pull_secret(secret: &Secret) -> bool {
    matches!(
        secret.type_.as_deref(),
        Some(DOCKER_CFG_SECRET_TYPE) | Some(DOCKER_CONFIG_JSON_SECRET_TYPE)
    )
}

fn secret_keys(secret: &Secret) -> BTreeSet<String> {
    let data = secret.data.iter().flat_map(|data| data.keys());
    let string_data = secret.string_data.iter().flat_map(|data| data.keys());

    data.chain(string_data).cloned().collect()
}

impl SecretsMount {
    pub fn build(
        request: &FunctionDeployment,
        existing: &BTreeMap<String, Secret>,
    ) -> Result<Self, UpdateSecretsError> {
        let volume_name = request.to_secrets_volume_name();
        let mut sources = Vec::new();
        let mut image_pull_secrets = Vec::new();

        for name in request.to_unique_secret_names() {
            let secret = existing
                .get(&name)
                .ok_or_else(|| UpdateSecretsError::Missing(name.clone()))?;

            if is_image_pull_secret(secret) {
                image_pull_secrets.push(LocalObjectReference { name: Some(name) });
                continue;
            }

            let items = secret_keys(secret)
                .into_iter()
                .map(|key| KeyToPath {
                    key: key.clone(),
                    path: key,
                    ..Default::default()
                })
                .collect();

            sources.push(VolumeProjection {
                secret: Some(SecretProjection {
                    name: Some(name),
                    items: Some(items),
                    ..Default::default()
                }),
                ..Default::default()
            });
        }

        if sources.is_empty() {
            return Ok(Self {
                volume_name,
                image_pull_secrets,
                ..Default::default()
            });
        }

        Ok(Self {
            volume: Some(Volume {
                name: volume_name.clone(),
                projected: Some(ProjectedVolumeSource {
                    sources: Some(sources),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            mount: Some(VolumeMount {
                name: volume_name.clone(),
                mount_path: String::from(SECRETS_MOUNT_PATH),
                read_only: Some(true),
                ..Default::default()
            }),
            volume_name,
            image_pull_secrets,
        })
    }

    /// Replaces the previous secrets volume and mount of the first container.
    pub fn apply(self, pod_spec: &mut PodSpec) {
        remove_volume(&mut pod_spec.volumes, &self.volume_name);
        if let Some(volume) = self.volume {
            pod_spec.volumes.get_or_insert_with(Vec::new).push(volume);
        }

        if !self.image_pull_secrets.is_empty() {
            pod_spec.image_pull_secrets = Some(self.image_pull_secrets);
        }

        if let Some(container) = pod_spec.containers.first_mut() {
            remove_volume_mount(&mut container.volume_mounts, &self.volume_name);
            if let Some(mount) = self.mount {
                container
                    .volume_mounts
                    .get_or_insert_with(Vec::new)
                    .push(mount);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::memory::MemoryAccessor;
    use k8s_openapi::{api::core::v1::Container, ByteString};
    use kube::core::ObjectMeta;

    fn secret(name: &str, type_: Option<&str>, keys: &[&str]) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            type_: type_.map(str::to_string),
            data: Some(
                keys.iter()
                    .map(|key| (key.to_string(), ByteString(b"value".to_vec())))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn request(secrets: &[&str]) -> FunctionDeployment {
        FunctionDeployment {
            service: String::from("nodeinfo"),
            image: String::from("nodeinfo:latest"),
            secrets: Some(secrets.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn get_secrets_reports_all_missing_names() {
        let accessor = MemoryAccessor::new();
        accessor.insert_secret("openfaas-fn", secret("api-key", None, &["api-key"]));

        let names = vec![
            String::from("api-key"),
            String::from("db-password"),
            String::from("token"),
        ];
        let error = get_secrets(&accessor, "openfaas-fn", &names)
            .await
            .unwrap_err();

        match error {
            GetSecretsError::NotFound(missing) => {
                assert_eq!(missing, vec!["db-password", "token"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn get_secrets_only_returns_requested() {
        let accessor = MemoryAccessor::new();
        accessor.insert_secret("openfaas-fn", secret("api-key", None, &["api-key"]));
        accessor.insert_secret("openfaas-fn", secret("other", None, &["other"]));
        accessor.insert_secret("default", secret("token", None, &["token"]));

        let names = vec![String::from("api-key")];
        let secrets = get_secrets(&accessor, "openfaas-fn", &names).await.unwrap();

        assert_eq!(secrets.keys().collect::<Vec<_>>(), vec!["api-key"]);

        let names = vec![String::from("token")];
        assert!(get_secrets(&accessor, "openfaas-fn", &names).await.is_err());
    }

    #[test]
    fn build_projects_keys_and_splits_pull_secrets() {
        let existing = BTreeMap::from([
            (
                String::from("api-key"),
                secret("api-key", Some("Opaque"), &["key", "cert"]),
            ),
            (
                String::from("registry"),
                secret("registry", Some(DOCKER_CONFIG_JSON_SECRET_TYPE), &[".dockerconfigjson"]),
            ),
        ]);

        let mount = SecretsMount::build(&request(&["api-key", "registry", "api-key"]), &existing)
            .unwrap();

        let sources = mount
            .volume
            .as_ref()
            .and_then(|volume| volume.projected.as_ref())
            .and_then(|projected| projected.sources.clone())
            .unwrap();
        assert_eq!(sources.len(), 1);

        let paths: Vec<String> = sources[0]
            .secret
            .as_ref()
            .and_then(|projection| projection.items.clone())
            .unwrap()
            .into_iter()
            .map(|item| item.path)
            .collect();
        assert_eq!(paths, vec!["cert", "key"]);

        assert_eq!(
            mount.image_pull_secrets,
            vec![LocalObjectReference {
                name: Some(String::from("registry"))
            }]
        );
    }

    #[test]
    fn build_fails_on_unresolved_secret() {
        let error = SecretsMount::build(&request(&["missing"]), &BTreeMap::new()).unwrap_err();

        assert_eq!(error, UpdateSecretsError::Missing(String::from("missing")));
    }

    #[test]
    fn apply_replaces_previous_mount() {
        let existing = BTreeMap::from([(
            String::from("api-key"),
            secret("api-key", None, &["api-key"]),
        )]);

        let mut pod_spec = PodSpec {
            containers: vec![Container {
                name: String::from("nodeinfo"),
                ..Default::default()
            }],
            ..Default::default()
        };

        for _ in 0..2 {
            SecretsMount::build(&request(&["api-key"]), &existing)
                .unwrap()
                .apply(&mut pod_spec);
        }

        assert_eq!(pod_spec.volumes.as_ref().map(Vec::len), Some(1));
        let mounts = pod_spec.containers[0].volume_mounts.clone().unwrap();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].mount_path, SECRETS_MOUNT_PATH);

        SecretsMount::build(&request(&[]), &existing)
            .unwrap()
            .apply(&mut pod_spec);

        assert_eq!(pod_spec.volumes.as_ref().map(Vec::len), Some(0));
        assert_eq!(
            pod_spec.containers[0].volume_mounts.as_ref().map(Vec::len),
            Some(0)
        );
    }
}
