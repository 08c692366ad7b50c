//! `POST /environments`.

use axum::{
    Json,
    extract::{Extension, Multipart, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{error, info};

use super::{
    discard_upload, messages, reject, require_caller,
    types::{CreateEnvironmentForm, CreatedEnvironmentResponse, MessageResponse},
    upload::read_form,
};
use crate::{
    access::RESOURCE_ENVIRONMENT,
    api::AppState,
    store::{NewEnvironment, StoreError},
};

#[utoipa::path(
    post,
    path = "/environments",
    request_body(content = CreateEnvironmentForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Environment created.", body = CreatedEnvironmentResponse),
        (status = 200, description = "Missing photo or fields, or duplicate code.", body = MessageResponse),
        (status = 400, description = "Upload or store failure.", body = MessageResponse),
        (status = 401, description = "Missing caller role.", body = MessageResponse),
        (status = 403, description = "Role may not create environments.", body = MessageResponse),
    ),
    tag = "environments"
)]
/// Creates an environment from a multipart form with a required photo.
/// The photo is stored first; any later rejection removes it again.
pub async fn create_environment(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> impl IntoResponse {
    let caller = match require_caller(&headers, &state) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    if !state
        .access()
        .can(caller.role())
        .create_any(RESOURCE_ENVIRONMENT)
        .granted()
    {
        return reject(StatusCode::FORBIDDEN, messages::FORBIDDEN);
    }

    let form = match read_form(multipart, state.photos()).await {
        Ok(form) => form,
        Err(err) => {
            error!("Failed to read environment form: {err}");
            return reject(StatusCode::BAD_REQUEST, messages::GENERIC_ERROR);
        }
    };

    let Some(photo) = form.photo.clone() else {
        return reject(StatusCode::OK, messages::PHOTO_REQUIRED);
    };

    let Some(fields) = form.required_fields() else {
        discard_upload(&state, Some(&photo)).await;
        return reject(StatusCode::OK, messages::FIELDS_REQUIRED);
    };

    match state
        .environments()
        .find_by_code(&fields.environment_code)
        .await
    {
        Ok(None) => {}
        Ok(Some(_)) => {
            discard_upload(&state, Some(&photo)).await;
            return reject(StatusCode::OK, messages::DUPLICATE_CODE);
        }
        Err(err) => {
            error!("Failed to check environment code: {err}");
            discard_upload(&state, Some(&photo)).await;
            return reject(StatusCode::BAD_REQUEST, messages::GENERIC_ERROR);
        }
    }

    let new = NewEnvironment {
        environment_code: fields.environment_code,
        name: fields.name,
        in_charge: fields.in_charge,
        photo: photo.clone(),
    };

    match state.environments().insert(new).await {
        Ok(environment) => {
            info!(
                environment_id = %environment.id,
                environment_code = %environment.environment_code,
                "environment created"
            );
            (
                StatusCode::CREATED,
                Json(CreatedEnvironmentResponse {
                    status: true,
                    environments: environment,
                    message: messages::CREATED.to_string(),
                }),
            )
                .into_response()
        }
        Err(StoreError::Duplicate) => {
            discard_upload(&state, Some(&photo)).await;
            reject(StatusCode::OK, messages::DUPLICATE_CODE)
        }
        Err(err) => {
            error!("Failed to insert environment: {err}");
            discard_upload(&state, Some(&photo)).await;
            reject(StatusCode::BAD_REQUEST, messages::GENERIC_ERROR)
        }
    }
}
