//! Mapping between function requests and Kubernetes deployment fields.

mod impls;
mod secrets;
mod status;

pub use impls::{create_selector, get_min_replica_count, ResourcesError};
pub use secrets::{get_secrets, GetSecretsError, SecretsMount, UpdateSecretsError};
