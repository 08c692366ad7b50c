//! Environment CRUD endpoints.
//!
//! Each handler is independent and follows the same flow:
//! 1) Resolve the caller role from the gateway header.
//! 2) Check the `environment` grant for the action; deny with `403` before
//!    touching the body or the stores.
//! 3) Validate input, run the existence checks, mutate, respond.
//!
//! Responses keep the status codes and Spanish messages existing clients rely
//! on: validation failures are `200` with `status: false`, delete success is
//! `201`, unexpected store errors are `400` with a generic retry message.
//!
//! Uploaded photos are already on disk by the time validation runs, so every
//! rejection after the multipart body was read discards the new file.

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod list;
pub(crate) mod show;
pub(crate) mod update;
mod types;
mod upload;

use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{api::AppState, photos::PhotoRef};
use types::MessageResponse;

pub(crate) mod messages {
    pub const UNAUTHENTICATED: &str = "Debes iniciar sesión para acceder a este recurso.";
    pub const FORBIDDEN: &str = "No tienes permisos para acceder a este recurso";
    pub const GENERIC_ERROR: &str = "Ha ocurrido un error, intentalo nuevamente.";
    pub const LIST_FOUND: &str = "Se han encontrado ambientes";
    pub const FOUND: &str = "Se han encontrado el ambiente";
    pub const NOT_FOUND: &str = "No se encontro el ambiente.";
    pub const BAD_ID: &str = "El ID suministrado es incorrecto.";
    pub const PHOTO_REQUIRED: &str = "La foto del ambiente es requerida.";
    pub const FIELDS_REQUIRED: &str = "Debes llenar los campos requeridos.";
    pub const DUPLICATE_CODE: &str = "El código del ambiente ya se encuentra en uso.";
    pub const CREATED: &str = "El ambiente ha sido creado correctamente.";
    pub const RESOURCE_NOT_FOUND: &str = "No se ha encontrado el recurso solicitado.";
    pub const UPDATED: &str = "Se ha actualizado el ambiente.";
    pub const MACHINES_ASSIGNED: &str = "Hay maquinas asignadas a este ambiente, debes eliminarlas o cambiar el ambiente asignado.";
    pub const DELETED: &str = "El ambiente ha sido eliminado correctamente.";
}

/// Authenticated caller as reported by the upstream gateway.
#[derive(Clone, Debug)]
pub struct Caller {
    role: String,
}

impl Caller {
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }
}

/// Read the caller role from the configured header, or answer `401`.
fn require_caller(headers: &HeaderMap, state: &AppState) -> Result<Caller, Response> {
    let role = headers
        .get(state.role_header())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|role| !role.is_empty());

    match role {
        Some(role) => Ok(Caller {
            role: role.to_string(),
        }),
        None => {
            warn!("Request without caller role header");
            Err(reject(StatusCode::UNAUTHORIZED, messages::UNAUTHENTICATED))
        }
    }
}

/// `{status: false, message}` with the given status code.
fn reject(status: StatusCode, message: &'static str) -> Response {
    (status, Json(MessageResponse::failure(message))).into_response()
}

/// Parse a client-supplied environment id; blank and malformed ids are `None`.
fn parse_id(raw: &str) -> Option<Uuid> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Uuid::parse_str(raw).ok()
}

/// Compensating cleanup for an upload whose request was rejected.
async fn discard_upload(state: &AppState, photo: Option<&PhotoRef>) {
    let Some(photo) = photo else {
        return;
    };
    if let Err(err) = state.photos().delete(photo).await {
        error!("Failed to discard rejected upload {}: {err}", photo.filename);
    }
}
