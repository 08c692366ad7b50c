//! Multipart form reading for create/update.
//!
//! The photo is persisted while the body is read, the same way an upload
//! middleware would, so handlers always get a stored `PhotoRef` back and own
//! its cleanup from then on. If reading fails after the photo was stored, the
//! photo is discarded here before the error is returned.

use axum::extract::{
    Multipart,
    multipart::{MultipartError, MultipartRejection},
};
use thiserror::Error;
use tracing::{debug, error};

use crate::photos::{PhotoError, PhotoRef, PhotoStorage};

const FIELD_ENVIRONMENT_ID: &str = "environmentID";
const FIELD_ENVIRONMENT_CODE: &str = "environmentCode";
const FIELD_NAME: &str = "name";
const FIELD_IN_CHARGE: &str = "in_charge";
const PHOTO_FIELDS: [&str; 2] = ["photo", "environmentPhoto"];

#[derive(Debug, Error)]
pub(super) enum UploadError {
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("failed to store photo: {0}")]
    Photo(#[from] PhotoError),
}

/// Text fields and stored photo of an environment form.
#[derive(Debug, Default)]
pub(super) struct EnvironmentForm {
    pub environment_id: Option<String>,
    pub environment_code: Option<String>,
    pub name: Option<String>,
    pub in_charge: Option<String>,
    pub photo: Option<PhotoRef>,
}

/// The three fields both create and update require.
#[derive(Debug)]
pub(super) struct RequiredFields {
    pub environment_code: String,
    pub name: String,
    pub in_charge: String,
}

impl EnvironmentForm {
    /// `None` unless `environmentCode`, `name` and `in_charge` are all present.
    pub fn required_fields(&self) -> Option<RequiredFields> {
        Some(RequiredFields {
            environment_code: self.environment_code.clone()?,
            name: self.name.clone()?,
            in_charge: self.in_charge.clone()?,
        })
    }
}

/// Read an environment form, storing the first non-empty photo part.
///
/// A body that is not multipart at all reads as an empty form.
pub(super) async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    photos: &dyn PhotoStorage,
) -> Result<EnvironmentForm, UploadError> {
    let mut form = EnvironmentForm::default();

    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!("Request body is not multipart: {rejection}");
            return Ok(form);
        }
    };

    if let Err(err) = read_fields(&mut multipart, photos, &mut form).await {
        if let Some(photo) = form.photo.take()
            && let Err(cleanup) = photos.delete(&photo).await
        {
            error!("Failed to discard photo after upload error: {cleanup}");
        }
        return Err(err);
    }

    Ok(form)
}

async fn read_fields(
    multipart: &mut Multipart,
    photos: &dyn PhotoStorage,
    form: &mut EnvironmentForm,
) -> Result<(), UploadError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if PHOTO_FIELDS.contains(&name.as_str()) {
            // Only file parts are photos; a plain text value is ignored.
            let Some(file_name) = field.file_name().map(ToString::to_string) else {
                debug!("Ignoring non-file part {name}");
                continue;
            };
            let bytes = field.bytes().await?;
            // Browsers send an empty part when no file was picked.
            if bytes.is_empty() || form.photo.is_some() {
                continue;
            }
            form.photo = Some(photos.save(Some(&file_name), &bytes).await?);
            continue;
        }

        let value = field.text().await?;
        let value = Some(value.trim().to_string()).filter(|value| !value.is_empty());
        match name.as_str() {
            FIELD_ENVIRONMENT_ID => form.environment_id = value,
            FIELD_ENVIRONMENT_CODE => form.environment_code = value,
            FIELD_NAME => form.name = value,
            FIELD_IN_CHARGE => form.in_charge = value,
            other => debug!("Ignoring unknown form field {other}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(code: Option<&str>, name: Option<&str>, in_charge: Option<&str>) -> EnvironmentForm {
        EnvironmentForm {
            environment_code: code.map(ToString::to_string),
            name: name.map(ToString::to_string),
            in_charge: in_charge.map(ToString::to_string),
            ..EnvironmentForm::default()
        }
    }

    #[test]
    fn required_fields_need_all_three() {
        assert!(form(Some("LAB-01"), Some("Lab"), Some("U1")).required_fields().is_some());
        assert!(form(None, Some("Lab"), Some("U1")).required_fields().is_none());
        assert!(form(Some("LAB-01"), None, Some("U1")).required_fields().is_none());
        assert!(form(Some("LAB-01"), Some("Lab"), None).required_fields().is_none());
    }
}
