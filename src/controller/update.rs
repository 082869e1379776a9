use super::{has_containers, FunctionsController, UpdateError};
use crate::accessor::{AccessorError, DeploymentAccessor, SecretsAccessor};
use crate::function::{get_secrets, SecretsMount};
use crate::types::FunctionDeployment;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::ResourceRequirements};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{trace_span, Instrument};

/// Nanosecond component of the wall clock. Changes the pod template on
/// every update so the orchestrator rolls the pods.
fn generate_uid() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.subsec_nanos())
        .unwrap_or_default()
        .to_string()
}

impl<A> FunctionsController<A>
where
    A: DeploymentAccessor + SecretsAccessor,
{
    /// Rewrites the first container and pod template of an existing function
    /// deployment from the request and replaces it.
    ///
    /// Resources and secrets are validated before the fetched deployment is
    /// touched. A deployment without containers is written back unchanged.
    pub async fn update(&self, body: &[u8]) -> Result<(), UpdateError> {
        let request: FunctionDeployment = serde_json::from_slice(body).map_err(|error| {
            tracing::error!(%error, "Cannot parse update request.");
            UpdateError::Parse(error)
        })?;

        let name = request.to_name();
        let namespace = &self.functions_namespace;

        tracing::info!(%name, "Updating function.");

        if let Some(ref requested) = request.namespace {
            if requested != namespace {
                tracing::error!(
                    %requested,
                    "Function's namespace does not match functions namespace."
                );
                return Err(UpdateError::Namespace {
                    requested: requested.clone(),
                    expected: namespace.clone(),
                });
            }
        }

        let mut deployment = self
            .accessor
            .get(namespace, &name)
            .await
            .map_err(|error| {
                tracing::error!(%error, "Failed to get deployment.");
                UpdateError::Get {
                    name: name.clone(),
                    error,
                }
            })?
            .ok_or_else(|| {
                tracing::error!("Deployment does not exist.");
                UpdateError::NotFound(name.clone())
            })?;

        if has_containers(&deployment) {
            let resources = request.to_resources().map_err(|error| {
                tracing::error!(%error, "Invalid resources.");
                UpdateError::Resources(error)
            })?;

            let existing_secrets = get_secrets(
                &self.accessor,
                namespace,
                &request.to_unique_secret_names(),
            )
            .instrument(trace_span!("GetSecrets"))
            .await
            .map_err(|error| {
                tracing::error!(%error, "Failed to resolve secrets.");
                UpdateError::Secrets(error)
            })?;

            let secrets_mount =
                SecretsMount::build(&request, &existing_secrets).map_err(|error| {
                    tracing::error!(%error, "Failed to build secrets volume.");
                    UpdateError::SecretsMount(error)
                })?;

            apply_update(
                &request,
                &mut deployment,
                resources,
                secrets_mount,
                &generate_uid(),
            );
        } else {
            tracing::warn!("Deployment has no containers. Writing it back unchanged.");
        }

        self.accessor
            .replace(namespace, &name, &deployment)
            .await
            .map_err(|error| {
                tracing::error!(%error, "Failed to replace deployment.");
                match error {
                    AccessorError::NotFound { .. } => UpdateError::NotFound(name.clone()),
                    AccessorError::Conflict { .. } => UpdateError::Conflict(name.clone()),
                    error => UpdateError::Replace {
                        name: name.clone(),
                        error,
                    },
                }
            })?;

        tracing::info!(%name, "Function updated.");

        Ok(())
    }
}

fn apply_update(
    request: &FunctionDeployment,
    deployment: &mut Deployment,
    resources: ResourceRequirements,
    secrets_mount: SecretsMount,
    uid: &str,
) {
    let labels = request.to_labels(uid);
    let annotations = request.to_annotations();

    deployment.metadata.labels = Some(labels.clone());
    if annotations.is_some() {
        deployment.metadata.annotations = annotations.clone();
    }

    let Some(spec) = deployment.spec.as_mut() else {
        return;
    };

    if let Some(min_replicas) = request.to_min_replicas() {
        tracing::info!(min_replicas, "Applying minimum replica count from labels.");
        spec.replicas = Some(min_replicas);
    }

    let template_metadata = spec.template.metadata.get_or_insert_with(Default::default);
    template_metadata.labels = Some(labels);
    if annotations.is_some() {
        template_metadata.annotations = annotations;
    }

    let Some(pod_spec) = spec.template.spec.as_mut() else {
        return;
    };

    pod_spec.node_selector = request.to_node_selector();

    if let Some(container) = pod_spec.containers.first_mut() {
        container.image = Some(request.image.clone());
        container.env = request.to_env_vars();
        container.resources = Some(resources);
    }

    request.configure_read_only_root_filesystem(pod_spec);
    secrets_mount.apply(pod_spec);
}
