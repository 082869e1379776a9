mod cluster;
#[cfg(test)]
pub(crate) mod memory;

pub use cluster::ClusterAccessor;

use async_trait::async_trait;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Secret};
use kube::Error as KubeError;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AccessorError {
    #[error("Deployment {name} not found in namespace {namespace}")]
    NotFound { namespace: String, name: String },
    #[error("Deployment {name} was modified since it was read")]
    Conflict { name: String },
    #[error("Kubernetes error: {0}")]
    Kube(#[source] KubeError),
}

/// Get and full-object replace of function deployments.
///
/// `replace` overwrites the whole stored object. Anything not carried over
/// from the fetched deployment is lost. The `resourceVersion` of the fetched
/// object travels with it, so a write based on a stale read is rejected with
/// [`AccessorError::Conflict`].
#[async_trait]
pub trait DeploymentAccessor: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Deployment>, AccessorError>;

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        deployment: &Deployment,
    ) -> Result<(), AccessorError>;
}

#[async_trait]
pub trait SecretsAccessor: Send + Sync {
    async fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, AccessorError>;
}
