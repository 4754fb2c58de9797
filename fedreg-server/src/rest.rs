//! The HTTP API of the registry.

use std::convert::Infallible;

use serde::Deserialize;
use tracing::error;
use warp::{
    filters::BoxedFilter,
    http::{Response, StatusCode},
    Filter,
};

use crate::{
    services::{Requester, ServiceError, TrainingService},
    settings::ApiSettings,
    storage::TrainingStorage,
};
use fedreg_core::{TrainingRecord, UpdatePatch};

/// Name of the header that carries the requester's user identifier.
pub const USER_HEADER: &str = "x-fedreg-user";

#[derive(Debug, Deserialize)]
struct ListQuery {
    mine: Option<u8>,
}

/// Starts the HTTP server at the configured address.
///
/// * `api_settings`: address the server binds to.
/// * `service`: the training service handling the requests.
pub async fn serve<S>(api_settings: ApiSettings, service: TrainingService<S>)
where
    S: TrainingStorage,
{
    warp::serve(routes(service)).run(api_settings.bind_address).await;
}

/// Builds the filter tree for all training endpoints.
pub fn routes<S>(service: TrainingService<S>) -> BoxedFilter<(impl warp::Reply,)>
where
    S: TrainingStorage,
{
    let create = warp::path!("federated-trainings")
        .and(warp::post())
        .and(with_requester(service.clone()))
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(handle_create);

    let list = warp::path!("federated-trainings")
        .and(warp::get())
        .and(with_requester(service.clone()))
        .and(warp::query::<ListQuery>())
        .and(with_service(service.clone()))
        .and_then(handle_list);

    let get = warp::path!("federated-trainings" / u64)
        .and(warp::get())
        .and(with_requester(service.clone()))
        .and(with_service(service.clone()))
        .and_then(handle_get);

    let update = warp::path!("federated-trainings" / u64)
        .and(warp::put())
        .and(with_requester(service.clone()))
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(handle_update);

    let delete = warp::path!("federated-trainings" / u64)
        .and(warp::delete())
        .and(with_requester(service.clone()))
        .and(with_service(service.clone()))
        .and_then(handle_delete);

    create
        .or(list)
        .or(get)
        .or(update)
        .or(delete)
        .recover(handle_reject)
        .with(warp::log("http"))
        .boxed()
}

/// Handles and responds to a registration request.
async fn handle_create<S: TrainingStorage>(
    requester: Requester,
    draft: TrainingRecord,
    mut service: TrainingService<S>,
) -> Result<impl warp::Reply, Infallible> {
    Ok(match service.create(requester, draft).await {
        Ok(record) => json_response(StatusCode::CREATED, &record),
        Err(e) => error_response(e),
    })
}

/// Handles and responds to a list request, optionally restricted to the
/// requester's own records via `?mine=1`.
async fn handle_list<S: TrainingStorage>(
    requester: Requester,
    query: ListQuery,
    mut service: TrainingService<S>,
) -> Result<impl warp::Reply, Infallible> {
    let result = if let Some(1) = query.mine {
        service.list_mine(requester).await
    } else {
        service.list().await
    };
    Ok(match result {
        Ok(records) => json_response(StatusCode::OK, &records),
        Err(e) => error_response(e),
    })
}

/// Handles and responds to a request for a single record.
async fn handle_get<S: TrainingStorage>(
    id: u64,
    _requester: Requester,
    mut service: TrainingService<S>,
) -> Result<impl warp::Reply, Infallible> {
    Ok(match service.get(id).await {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(e) => error_response(e),
    })
}

/// Handles and responds to a partial update.
async fn handle_update<S: TrainingStorage>(
    id: u64,
    requester: Requester,
    patch: UpdatePatch,
    mut service: TrainingService<S>,
) -> Result<impl warp::Reply, Infallible> {
    Ok(match service.update(requester, id, patch).await {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(e) => error_response(e),
    })
}

/// Handles and responds to a delete request.
async fn handle_delete<S: TrainingStorage>(
    id: u64,
    requester: Requester,
    mut service: TrainingService<S>,
) -> Result<impl warp::Reply, Infallible> {
    Ok(match service.delete(requester, id).await {
        Ok(()) => empty_response(StatusCode::NO_CONTENT),
        Err(e) => error_response(e),
    })
}

/// Extracts the requester from the user header.
fn with_requester<S: TrainingStorage>(
    service: TrainingService<S>,
) -> impl Filter<Extract = (Requester,), Error = warp::Rejection> + Clone {
    warp::header::<u64>(USER_HEADER).map(move |id| service.requester(id))
}

/// Converts the training service into a `warp` filter.
fn with_service<S: TrainingStorage>(
    service: TrainingService<S>,
) -> impl Filter<Extract = (TrainingService<S>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

fn json_response<T: serde::Serialize>(status: StatusCode, value: &T) -> Response<Vec<u8>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(value).unwrap())
        .unwrap()
}

fn empty_response(status: StatusCode) -> Response<Vec<u8>> {
    Response::builder().status(status).body(Vec::new()).unwrap()
}

fn error_response(error: ServiceError) -> Response<Vec<u8>> {
    let status = match &error {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Forbidden => StatusCode::FORBIDDEN,
        ServiceError::DuplicatePending | ServiceError::Schema(_) | ServiceError::Update(_) => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::Storage(e) => {
            error!("storage failure: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    json_response(status, &serde_json::json!({ "detail": error.to_string() }))
}

/// Handles `warp` rejections of bad requests.
async fn handle_reject(err: warp::Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.find::<warp::reject::MissingHeader>().is_some()
        || err.find::<warp::reject::InvalidHeader>().is_some()
    {
        StatusCode::UNAUTHORIZED
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
        || err.find::<warp::reject::InvalidQuery>().is_some()
    {
        StatusCode::BAD_REQUEST
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        StatusCode::METHOD_NOT_ALLOWED
    } else {
        error!("unhandled rejection: {:?}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    // reply with empty body; the status code is the interesting part
    Ok(warp::reply::with_status(Vec::new(), code))
}
