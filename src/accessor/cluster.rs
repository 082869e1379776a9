use super::{AccessorError, DeploymentAccessor, SecretsAccessor};
use async_trait::async_trait;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Secret};
use kube::{
    api::{ListParams, PostParams},
    Api, Client as KubeClient, Error as KubeError,
};

/// Accessor backed by the Kubernetes API server
#[derive(Clone)]
pub struct ClusterAccessor {
    client: KubeClient,
}

impl ClusterAccessor {
    pub fn new(client: KubeClient) -> Self {
        Self { client }
    }

    fn deployment_api(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn secrets_api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn replace_error(error: KubeError, namespace: &str, name: &str) -> AccessorError {
    match error {
        KubeError::Api(ref response) if response.code == 404 => AccessorError::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        KubeError::Api(ref response) if response.code == 409 => AccessorError::Conflict {
            name: name.to_string(),
        },
        error => AccessorError::Kube(error),
    }
}

#[async_trait]
impl DeploymentAccessor for ClusterAccessor {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Deployment>, AccessorError> {
        self.deployment_api(namespace)
            .get_opt(name)
            .await
            .map_err(AccessorError::Kube)
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        deployment: &Deployment,
    ) -> Result<(), AccessorError> {
        self.deployment_api(namespace)
            .replace(name, &PostParams::default(), deployment)
            .await
            .map_err(|error| replace_error(error, namespace, name))?;

        Ok(())
    }
}

#[async_trait]
impl SecretsAccessor for ClusterAccessor {
    async fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, AccessorError> {
        let secrets = self
            .secrets_api(namespace)
            .list(&ListParams::default())
            .await
            .map_err(AccessorError::Kube)?;

        Ok(secrets.items)
    }
}
