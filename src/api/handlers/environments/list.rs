//! `GET /environments`.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

use super::{
    messages, reject, require_caller,
    types::{EnvironmentListResponse, MessageResponse},
};
use crate::{access::RESOURCE_ENVIRONMENT, api::AppState};

#[utoipa::path(
    get,
    path = "/environments",
    responses(
        (status = 200, description = "All environments, newest first.", body = EnvironmentListResponse),
        (status = 400, description = "Store failure.", body = MessageResponse),
        (status = 401, description = "Missing caller role.", body = MessageResponse),
        (status = 403, description = "Role may not read environments.", body = MessageResponse),
    ),
    tag = "environments"
)]
/// Lists every environment in reverse storage order.
pub async fn list_environments(
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

    match state.environments().list().await {
        Ok(environments) => (
            StatusCode::OK,
            Json(EnvironmentListResponse {
                status: true,
                environments,
                message: messages::LIST_FOUND.to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to list environments: {err}");
            reject(StatusCode::BAD_REQUEST, messages::GENERIC_ERROR)
        }
    }
}
