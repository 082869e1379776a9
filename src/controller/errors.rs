use crate::accessor::AccessorError;
use crate::function::{GetSecretsError, ResourcesError, UpdateSecretsError};
use thiserror::Error as ThisError;
use warp::http::StatusCode;

#[derive(ThisError, Debug)]
pub enum ScaleError {
    #[error("Cannot parse request. Please pass valid JSON.")]
    Parse(#[source] serde_json::Error),
    #[error("Invalid replica count {0}. Replicas must be between 0 and {max}.", max = i32::MAX)]
    Replicas(i64),
    #[error("Unable to lookup function deployment {0}")]
    NotFound(String),
    #[error("Unable to lookup function deployment {name}")]
    Get {
        name: String,
        #[source]
        error: AccessorError,
    },
    #[error("Function deployment {0} was modified concurrently. Please retry.")]
    Conflict(String),
    #[error("Unable to update function deployment {name}")]
    Replace {
        name: String,
        #[source]
        error: AccessorError,
    },
}

impl ScaleError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScaleError::Parse(_) | ScaleError::Replicas(_) => StatusCode::BAD_REQUEST,
            ScaleError::NotFound(_) => StatusCode::NOT_FOUND,
            ScaleError::Conflict(_) => StatusCode::CONFLICT,
            ScaleError::Get { .. } | ScaleError::Replace { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(ThisError, Debug)]
pub enum ReadError {
    #[error("Function {0} not found")]
    NotFound(String),
    #[error("Unable to lookup function deployment {name}: {error}")]
    Get {
        name: String,
        #[source]
        error: AccessorError,
    },
}

impl ReadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReadError::NotFound(_) => StatusCode::NOT_FOUND,
            ReadError::Get { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(ThisError, Debug)]
pub enum UpdateError {
    #[error("Cannot parse request: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Namespace {requested} is not valid. Functions live in {expected}.")]
    Namespace { requested: String, expected: String },
    #[error("Deployment {0} not found")]
    NotFound(String),
    #[error("Unable to lookup function deployment {name}: {error}")]
    Get {
        name: String,
        #[source]
        error: AccessorError,
    },
    #[error("{0}")]
    Resources(#[source] ResourcesError),
    #[error("{0}")]
    Secrets(#[source] GetSecretsError),
    #[error("{0}")]
    SecretsMount(#[source] UpdateSecretsError),
    #[error("Function deployment {0} was modified concurrently. Please retry.")]
    Conflict(String),
    #[error("Unable to update function deployment {name}: {error}")]
    Replace {
        name: String,
        #[source]
        error: AccessorError,
    },
}

impl UpdateError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpdateError::Parse(_)
            | UpdateError::Namespace { .. }
            | UpdateError::Resources(_)
            | UpdateError::SecretsMount(_)
            | UpdateError::Secrets(GetSecretsError::NotFound(_)) => StatusCode::BAD_REQUEST,
            UpdateError::NotFound(_) | UpdateError::Get { .. } => StatusCode::NOT_FOUND,
            UpdateError::Conflict(_) => StatusCode::CONFLICT,
            UpdateError::Secrets(GetSecretsError::List(_)) | UpdateError::Replace { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
