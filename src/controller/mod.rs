mod errors;
mod scale;
mod update;

pub use errors::{ReadError, ScaleError, UpdateError};

use crate::accessor::{DeploymentAccessor, SecretsAccessor};
use k8s_openapi::api::apps::v1::Deployment;

/// Replica and update handling for the functions namespace.
///
/// Every operation reads the deployment fresh, mutates the owned copy and
/// writes it back with a full replace. Nothing is cached between requests.
pub struct FunctionsController<A> {
    accessor: A,
    functions_namespace: String,
}

impl<A> FunctionsController<A>
where
    A: DeploymentAccessor + SecretsAccessor,
{
    pub fn new(accessor: A, functions_namespace: String) -> Self {
        Self {
            accessor,
            functions_namespace,
        }
    }

    pub fn functions_namespace(&self) -> &str {
        &self.functions_namespace
    }

    #[cfg(test)]
    pub(crate) fn accessor(&self) -> &A {
        &self.accessor
    }
}

fn has_containers(deployment: &Deployment) -> bool {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .map(|pod_spec| !pod_spec.containers.is_empty())
        .unwrap_or(false)
}
