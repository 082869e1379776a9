use const_format::concatcp;

pub const FUNCTIONS_NAMESPACE_ENV_VAR: &str = "OPENFAAS_FUNCTIONS_NAMESPACE";
pub const FUNCTIONS_DEFAULT_NAMESPACE: &str = "openfaas-fn";

pub const LISTEN_ADDRESS_ENV_VAR: &str = "OPENFAAS_LISTEN_ADDRESS";
pub const LISTEN_DEFAULT_ADDRESS: &str = "0.0.0.0:8081";

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

pub const DEFAULT_LOG_FILTER: &str = concatcp!(PKG_NAME, "=info,warp=info,kube=off,hyper=off");

/// Label carrying the function name on deployments and pods
pub const FUNCTION_LABEL: &str = "faas_function";
/// Label regenerated on every update to force a new rollout
pub const UID_LABEL: &str = "uid";
/// Label holding the minimum replica count hint
pub const MIN_REPLICAS_LABEL: &str = "com.openfaas.scale.min";

/// Env var the watchdog forks
pub const ENV_PROCESS_NAME: &str = "fprocess";

pub const SECRETS_VOLUME_SUFFIX: &str = "-projected-secrets";
pub const SECRETS_MOUNT_PATH: &str = "/var/openfaas/secrets";

pub const TMP_VOLUME_NAME: &str = "tmp";
pub const TMP_MOUNT_PATH: &str = "/tmp";

pub const DOCKER_CFG_SECRET_TYPE: &str = "kubernetes.io/dockercfg";
pub const DOCKER_CONFIG_JSON_SECRET_TYPE: &str = "kubernetes.io/dockerconfigjson";
