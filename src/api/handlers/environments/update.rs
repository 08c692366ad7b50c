//! `PUT /environments` (also served as `POST /environments/update`).

use axum::{
    Json,
    extract::{Extension, Multipart, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{error, info};

use super::{
    discard_upload, messages, parse_id, reject, require_caller,
    types::{MessageResponse, UpdateEnvironmentForm, UpdatedEnvironmentResponse},
    upload::read_form,
};
use crate::{
    access::RESOURCE_ENVIRONMENT,
    api::AppState,
    store::{EnvironmentChanges, StoreError},
};

#[utoipa::path(
    put,
    path = "/environments",
    request_body(content = UpdateEnvironmentForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Environment updated, or `status: false` on validation failure.", body = UpdatedEnvironmentResponse),
        (status = 400, description = "Upload or store failure.", body = MessageResponse),
        (status = 401, description = "Missing caller role.", body = MessageResponse),
        (status = 403, description = "Role may not update environments.", body = MessageResponse),
    ),
    tag = "environments"
)]
/// Updates code, name and person in charge; replaces the photo when one is uploaded.
/// The previous photo file is removed only after the record points at the new one.
pub async fn update_environment(
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
        .update_any(RESOURCE_ENVIRONMENT)
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
    let upload = form.photo.clone();

    let Some(fields) = form.required_fields() else {
        discard_upload(&state, upload.as_ref()).await;
        return reject(StatusCode::OK, messages::FIELDS_REQUIRED);
    };

    let Some(id) = form.environment_id.as_deref().and_then(parse_id) else {
        discard_upload(&state, upload.as_ref()).await;
        return reject(StatusCode::OK, messages::RESOURCE_NOT_FOUND);
    };

    let existing = match state.environments().find_by_id(id).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            discard_upload(&state, upload.as_ref()).await;
            return reject(StatusCode::OK, messages::RESOURCE_NOT_FOUND);
        }
        Err(err) => {
            error!("Failed to load environment {id}: {err}");
            discard_upload(&state, upload.as_ref()).await;
            return reject(StatusCode::BAD_REQUEST, messages::GENERIC_ERROR);
        }
    };

    if existing.environment_code != fields.environment_code {
        match state
            .environments()
            .find_by_code(&fields.environment_code)
            .await
        {
            Ok(None) => {}
            Ok(Some(_)) => {
                discard_upload(&state, upload.as_ref()).await;
                return reject(StatusCode::OK, messages::DUPLICATE_CODE);
            }
            Err(err) => {
                error!("Failed to check environment code: {err}");
                discard_upload(&state, upload.as_ref()).await;
                return reject(StatusCode::BAD_REQUEST, messages::GENERIC_ERROR);
            }
        }
    }

    let changes = EnvironmentChanges {
        environment_code: fields.environment_code,
        name: fields.name,
        in_charge: fields.in_charge,
        photo: upload.clone(),
    };

    let updated = match state.environments().update(id, changes).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            discard_upload(&state, upload.as_ref()).await;
            return reject(StatusCode::OK, messages::RESOURCE_NOT_FOUND);
        }
        Err(StoreError::Duplicate) => {
            discard_upload(&state, upload.as_ref()).await;
            return reject(StatusCode::OK, messages::DUPLICATE_CODE);
        }
        Err(err) => {
            error!("Failed to update environment {id}: {err}");
            discard_upload(&state, upload.as_ref()).await;
            return reject(StatusCode::BAD_REQUEST, messages::GENERIC_ERROR);
        }
    };

    if upload.is_some() && !existing.environment_photo.filename.is_empty() {
        // The record already points at the new photo; a stale file is only logged.
        if let Err(err) = state.photos().delete(&existing.environment_photo).await {
            error!(
                "Failed to remove previous photo {} of environment {id}: {err}",
                existing.environment_photo.filename
            );
        }
    }

    info!(environment_id = %id, "environment updated");

    (
        StatusCode::OK,
        Json(UpdatedEnvironmentResponse {
            status: true,
            updated_environment: updated,
            message: messages::UPDATED.to_string(),
        }),
    )
        .into_response()
}
