//! `GET /environments/{id}`.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error};

use super::{
    messages, parse_id, reject, require_caller,
    types::{EnvironmentResponse, MessageResponse},
};
use crate::{access::RESOURCE_ENVIRONMENT, api::AppState};

#[utoipa::path(
    get,
    path = "/environments/{id}",
    params(
        ("id" = String, Path, description = "Environment id")
    ),
    responses(
        (status = 200, description = "Environment found, or `status: false` for a malformed id.", body = EnvironmentResponse),
        (status = 401, description = "Missing caller role.", body = MessageResponse),
        (status = 403, description = "Role may not read environments.", body = MessageResponse),
        (status = 404, description = "Environment not found.", body = MessageResponse),
    ),
    tag = "environments"
)]
/// Fetches one environment by id.
/// Blank or malformed ids and lookup failures all answer `200` with `status: false`.
pub async fn get_environment(
    Path(id): Path<String>,
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let caller = match require_caller(&headers, &state) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    if !state
        .access()
        .can(caller.role())
        .read_any(RESOURCE_ENVIRONMENT)
        .granted()
    {
        return reject(StatusCode::FORBIDDEN, messages::FORBIDDEN);
    }

    let Some(id) = parse_id(&id) else {
        debug!("Rejected environment id {id:?}");
        return reject(StatusCode::OK, messages::BAD_ID);
    };

    match state.environments().find_by_id(id).await {
        Ok(Some(environment)) => (
            StatusCode::OK,
            Json(EnvironmentResponse {
                status: true,
                environment,
                message: messages::FOUND.to_string(),
            }),
        )
            .into_response(),
        Ok(None) => reject(StatusCode::NOT_FOUND, messages::NOT_FOUND),
        Err(err) => {
            error!("Failed to fetch environment {id}: {err}");
            reject(StatusCode::OK, messages::BAD_ID)
        }
    }
}
