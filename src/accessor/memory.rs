use super::{AccessorError, DeploymentAccessor, SecretsAccessor};
use async_trait::async_trait;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Secret};
use std::collections::BTreeMap;
use kube::{core::ErrorResponse, Error as KubeError};
use std::sync::Mutex;

type Key = (String, String);

/// Failure injected into the next accessor calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Fault {
    /// `get` fails with an API server error.
    Get,
    /// `replace` fails with an API server error.
    Replace,
    /// Another writer replaces the deployment right after `get` returns.
    ConcurrentWrite,
}

/// In-memory store mimicking the API server's get/replace semantics,
/// including resource version checks.
#[derive(Default)]
pub(crate) struct MemoryAccessor {
    deployments: Mutex<BTreeMap<Key, Deployment>>,
    secrets: Mutex<BTreeMap<Key, Secret>>,
    replace_count: Mutex<usize>,
    fault: Mutex<Option<Fault>>,
}

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

impl MemoryAccessor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_deployment(&self, namespace: &str, mut deployment: Deployment) {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        deployment.metadata.namespace = Some(namespace.to_string());
        deployment
            .metadata
            .resource_version
            .get_or_insert_with(|| String::from("1"));

        self.deployments
            .lock()
            .unwrap()
            .insert(key(namespace, &name), deployment);
    }

    pub(crate) fn insert_secret(&self, namespace: &str, secret: Secret) {
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.secrets
            .lock()
            .unwrap()
            .insert(key(namespace, &name), secret);
    }

    pub(crate) fn stored(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.deployments
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
    }

    pub(crate) fn replace_count(&self) -> usize {
        *self.replace_count.lock().unwrap()
    }

    pub(crate) fn inject(&self, fault: Fault) {
        *self.fault.lock().unwrap() = Some(fault);
    }

    fn fault(&self) -> Option<Fault> {
        *self.fault.lock().unwrap()
    }
}

fn unavailable() -> AccessorError {
    AccessorError::Kube(KubeError::Api(ErrorResponse {
        status: String::from("Failure"),
        message: String::from("etcdserver: request timed out"),
        reason: String::from("InternalError"),
        code: 500,
    }))
}

fn next_version(version: Option<&String>) -> String {
    let current: u64 = version.and_then(|v| v.parse().ok()).unwrap_or(0);
    (current + 1).to_string()
}

#[async_trait]
impl DeploymentAccessor for MemoryAccessor {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Deployment>, AccessorError> {
        match self.fault() {
            Some(Fault::Get) => Err(unavailable()),
            Some(Fault::ConcurrentWrite) => {
                let deployment = self.stored(namespace, name);

                let mut deployments = self.deployments.lock().unwrap();
                if let Some(current) = deployments.get_mut(&key(namespace, name)) {
                    current.metadata.resource_version =
                        Some(next_version(current.metadata.resource_version.as_ref()));
                }

                Ok(deployment)
            }
            _ => Ok(self.stored(namespace, name)),
        }
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        deployment: &Deployment,
    ) -> Result<(), AccessorError> {
        if self.fault() == Some(Fault::Replace) {
            return Err(unavailable());
        }

        let mut deployments = self.deployments.lock().unwrap();

        let Some(current) = deployments.get(&key(namespace, name)) else {
            return Err(AccessorError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        };

        if deployment.metadata.resource_version.is_some()
            && deployment.metadata.resource_version != current.metadata.resource_version
        {
            return Err(AccessorError::Conflict {
                name: name.to_string(),
            });
        }

        let mut replaced = deployment.clone();
        replaced.metadata.resource_version =
            Some(next_version(current.metadata.resource_version.as_ref()));

        deployments.insert(key(namespace, name), replaced);
        *self.replace_count.lock().unwrap() += 1;

        Ok(())
    }
}

#[async_trait]
impl SecretsAccessor for MemoryAccessor {
    async fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, AccessorError> {
        Ok(self
            .secrets
            .lock()
            .unwrap()
            .iter()
            .filter(|((secret_namespace, _), _)| secret_namespace == namespace)
            .map(|(_, secret)| secret.clone())
            .collect())
    }
}
