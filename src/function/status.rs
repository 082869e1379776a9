use crate::consts::{ENV_PROCESS_NAME, FUNCTION_LABEL};
use crate::types::FunctionStatus;
use k8s_openapi::api::apps::v1::Deployment;
use std::collections::HashMap;

impl FunctionStatus {
    /// Summary of a function deployment.
    /// Deployments without the function label are not functions.
    pub fn from_deployment(deployment: &Deployment) -> Option<Self> {
        let labels = deployment.metadata.labels.as_ref()?;
        if !labels.contains_key(FUNCTION_LABEL) {
            return None;
        }

        let spec = deployment.spec.as_ref();
        let template = spec.map(|spec| &spec.template);
        let container = template
            .and_then(|template| template.spec.as_ref())
            .and_then(|pod_spec| pod_spec.containers.first());

        let env_process = container
            .and_then(|container| container.env.as_ref())
            .and_then(|env| env.iter().find(|env| env.name == ENV_PROCESS_NAME))
            .and_then(|env| env.value.clone());

        let pod_labels = template
            .and_then(|template| template.metadata.as_ref())
            .and_then(|metadata| metadata.labels.clone())
            .map(|labels| labels.into_iter().collect::<HashMap<_, _>>());

        let annotations = deployment
            .metadata
            .annotations
            .clone()
            .map(|annotations| annotations.into_iter().collect::<HashMap<_, _>>());

        Some(Self {
            name: deployment.metadata.name.clone().unwrap_or_default(),
            image: container
                .and_then(|container| container.image.clone())
                .unwrap_or_default(),
            namespace: deployment.metadata.namespace.clone(),
            env_process,
            labels: pod_labels,
            annotations,
            replicas: spec.and_then(|spec| spec.replicas).unwrap_or_default(),
            available_replicas: deployment
                .status
                .as_ref()
                .and_then(|status| status.available_replicas)
                .unwrap_or_default(),
            invocation_count: 0,
        })
    }
}
