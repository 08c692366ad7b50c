//! `DELETE /environments` (also served as `POST /environments/delete`).

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::{
    messages, parse_id, reject, require_caller,
    types::{DeleteEnvironmentRequest, MessageResponse},
};
use crate::{access::RESOURCE_ENVIRONMENT, api::AppState, store::StoreError};

#[utoipa::path(
    delete,
    path = "/environments",
    request_body = DeleteEnvironmentRequest,
    responses(
        (status = 201, description = "Environment and photo removed.", body = MessageResponse),
        (status = 200, description = "Environment not found or machines still assigned.", body = MessageResponse),
        (status = 400, description = "Store failure.", body = MessageResponse),
        (status = 401, description = "Missing caller role.", body = MessageResponse),
        (status = 403, description = "Role may not delete environments.", body = MessageResponse),
    ),
    tag = "environments"
)]
/// Deletes an environment that no machine references, then removes its photo.
pub async fn delete_environment(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Result<Json<DeleteEnvironmentRequest>, JsonRejection>,
) -> impl IntoResponse {
    let caller = match require_caller(&headers, &state) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    if !state
        .access()
        .can(caller.role())
        .delete_any(RESOURCE_ENVIRONMENT)
        .granted()
    {
        return reject(StatusCode::FORBIDDEN, messages::FORBIDDEN);
    }

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Unreadable delete body: {rejection}");
            DeleteEnvironmentRequest::default()
        }
    };

    let Some(id) = request.environment_id.as_deref().and_then(parse_id) else {
        return reject(StatusCode::OK, messages::RESOURCE_NOT_FOUND);
    };

    let environment = match state.environments().find_by_id(id).await {
        Ok(Some(environment)) => environment,
        Ok(None) => return reject(StatusCode::OK, messages::RESOURCE_NOT_FOUND),
        Err(err) => {
            error!("Failed to load environment {id}: {err}");
            return reject(StatusCode::BAD_REQUEST, messages::GENERIC_ERROR);
        }
    };

    match state.machines().any_for_environment(id).await {
        Ok(false) => {}
        Ok(true) => return reject(StatusCode::OK, messages::MACHINES_ASSIGNED),
        Err(err) => {
            error!("Failed to check machines of environment {id}: {err}");
            return reject(StatusCode::BAD_REQUEST, messages::GENERIC_ERROR);
        }
    }

    match state.environments().remove(id).await {
        Ok(true) => {}
        Ok(false) => return reject(StatusCode::OK, messages::RESOURCE_NOT_FOUND),
        Err(StoreError::InUse) => return reject(StatusCode::OK, messages::MACHINES_ASSIGNED),
        Err(err) => {
            error!("Failed to delete environment {id}: {err}");
            return reject(StatusCode::BAD_REQUEST, messages::GENERIC_ERROR);
        }
    }

    // The record is gone; a photo that cannot be removed is only logged.
    if !environment.environment_photo.filename.is_empty()
        && let Err(err) = state.photos().delete(&environment.environment_photo).await
    {
        error!(
            "Failed to remove photo {} of deleted environment {id}: {err}",
            environment.environment_photo.filename
        );
    }

    info!(environment_id = %id, "environment deleted");

    (
        StatusCode::CREATED,
        Json(MessageResponse::success(messages::DELETED)),
    )
        .into_response()
}
