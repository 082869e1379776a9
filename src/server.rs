use crate::accessor::{DeploymentAccessor, SecretsAccessor};
use crate::controller::{FunctionsController, ReadError};
use bytes::Bytes;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{trace_span, Instrument};
use warp::{
    http::StatusCode,
    reply::{self, Response},
    Filter, Reply,
};

fn empty(status: StatusCode) -> Response {
    reply::with_status(warp::reply(), status).into_response()
}

fn text(message: String, status: StatusCode) -> Response {
    reply::with_status(message, status).into_response()
}

fn with_controller<A>(
    controller: Arc<FunctionsController<A>>,
) -> impl Filter<Extract = (Arc<FunctionsController<A>>,), Error = Infallible> + Clone
where
    A: DeploymentAccessor + SecretsAccessor + 'static,
{
    warp::any().map(move || controller.clone())
}

async fn set_replicas_handler<A>(
    name: String,
    body: Bytes,
    controller: Arc<FunctionsController<A>>,
) -> Result<Response, Infallible>
where
    A: DeploymentAccessor + SecretsAccessor,
{
    let response = match controller
        .set_replicas(&name, &body)
        .instrument(trace_span!("SetReplicas", %name))
        .await
    {
        Ok(()) => empty(StatusCode::OK),
        Err(error) => text(error.to_string(), error.status_code()),
    };

    Ok(response)
}

async fn read_replicas_handler<A>(
    name: String,
    controller: Arc<FunctionsController<A>>,
) -> Result<Response, Infallible>
where
    A: DeploymentAccessor + SecretsAccessor,
{
    let response = match controller
        .read_replicas(&name)
        .instrument(trace_span!("ReadReplicas", %name))
        .await
    {
        Ok(status) => reply::json(&status).into_response(),
        Err(error) => {
            match &error {
                ReadError::NotFound(_) => tracing::info!(%error, "Replica read failed."),
                ReadError::Get { .. } => tracing::error!(%error, "Replica read failed."),
            }
            empty(error.status_code())
        }
    };

    Ok(response)
}

async fn update_handler<A>(
    body: Bytes,
    controller: Arc<FunctionsController<A>>,
) -> Result<Response, Infallible>
where
    A: DeploymentAccessor + SecretsAccessor,
{
    let response = match controller
        .update(&body)
        .instrument(trace_span!("UpdateFunction"))
        .await
    {
        Ok(()) => empty(StatusCode::OK),
        Err(error) => text(error.to_string(), error.status_code()),
    };

    Ok(response)
}

/// `PUT|GET /functions/{name}/scale`, `PUT /functions` and `GET /healthz`
pub fn routes<A>(
    controller: Arc<FunctionsController<A>>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone
where
    A: DeploymentAccessor + SecretsAccessor + 'static,
{
    let set_replicas = warp::put()
        .and(warp::path!("functions" / String / "scale"))
        .and(warp::body::bytes())
        .and(with_controller(controller.clone()))
        .and_then(set_replicas_handler::<A>);

    let read_replicas = warp::get()
        .and(warp::path!("functions" / String / "scale"))
        .and(with_controller(controller.clone()))
        .and_then(read_replicas_handler::<A>);

    let update = warp::put()
        .and(warp::path!("functions"))
        .and(warp::body::bytes())
        .and(with_controller(controller))
        .and_then(update_handler::<A>);

    let healthz = warp::get()
        .and(warp::path!("healthz"))
        .map(|| reply::with_status("OK", StatusCode::OK));

    set_replicas
        .or(read_replicas)
        .or(update)
        .or(healthz)
        .with(warp::trace::request())
}

/// Serves until `shutdown` resolves.
pub async fn serve<A>(
    controller: FunctionsController<A>,
    address: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), warp::Error>
where
    A: DeploymentAccessor + SecretsAccessor + 'static,
{
    let functions_namespace = controller.functions_namespace().to_string();
    let routes = routes(Arc::new(controller));

    let (address, server) =
        warp::serve(routes).try_bind_with_graceful_shutdown(address, shutdown)?;

    tracing::info!(%address, %functions_namespace, "Listening.");

    server.await;

    tracing::info!("Terminated.");

    Ok(())
}
