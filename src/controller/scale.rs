use super::{FunctionsController, ReadError, ScaleError};
use crate::accessor::{AccessorError, DeploymentAccessor, SecretsAccessor};
use crate::types::{FunctionStatus, ScaleServiceRequest};

impl<A> FunctionsController<A>
where
    A: DeploymentAccessor + SecretsAccessor,
{
    /// Sets the desired replica count of a function.
    ///
    /// An empty body asks for zero replicas. Labels are never consulted here.
    pub async fn set_replicas(&self, name: &str, body: &[u8]) -> Result<(), ScaleError> {
        tracing::info!("Updating replicas.");

        let request = if body.is_empty() {
            ScaleServiceRequest::default()
        } else {
            serde_json::from_slice::<ScaleServiceRequest>(body).map_err(|error| {
                tracing::error!(%error, "Cannot parse scale request.");
                ScaleError::Parse(error)
            })?
        };

        let replicas = i32::try_from(request.replicas)
            .ok()
            .filter(|replicas| *replicas >= 0)
            .ok_or(ScaleError::Replicas(request.replicas))?;

        let namespace = &self.functions_namespace;

        let mut deployment = self
            .accessor
            .get(namespace, name)
            .await
            .map_err(|error| {
                tracing::error!(%error, "Failed to get deployment.");
                ScaleError::Get {
                    name: name.to_string(),
                    error,
                }
            })?
            .ok_or_else(|| {
                tracing::error!("Deployment does not exist.");
                ScaleError::NotFound(name.to_string())
            })?;

        deployment.spec.get_or_insert_with(Default::default).replicas = Some(replicas);

        self.accessor
            .replace(namespace, name, &deployment)
            .await
            .map_err(|error| {
                tracing::error!(%error, "Failed to replace deployment.");
                match error {
                    AccessorError::NotFound { .. } => ScaleError::NotFound(name.to_string()),
                    AccessorError::Conflict { .. } => ScaleError::Conflict(name.to_string()),
                    error => ScaleError::Replace {
                        name: name.to_string(),
                        error,
                    },
                }
            })?;

        tracing::info!(replicas, "Replicas updated.");

        Ok(())
    }

    /// Reads the function summary, including the current replica count.
    pub async fn read_replicas(&self, name: &str) -> Result<FunctionStatus, ReadError> {
        tracing::info!("Reading replicas.");

        let deployment = self
            .accessor
            .get(&self.functions_namespace, name)
            .await
            .map_err(|error| {
                tracing::error!(%error, "Failed to get deployment.");
                ReadError::Get {
                    name: name.to_string(),
                    error,
                }
            })?;

        deployment
            .as_ref()
            .and_then(FunctionStatus::from_deployment)
            .ok_or_else(|| ReadError::NotFound(name.to_string()))
    }
}
