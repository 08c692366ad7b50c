//! Request/response types for the environment API.
//!
//! Payload keys differ per endpoint (`environments` on create, for instance)
//! because clients already depend on them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::Environment;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub status: bool,
    pub message: String,
}

impl MessageResponse {
    pub(super) fn failure(message: &str) -> Self {
        Self {
            status: false,
            message: message.to_string(),
        }
    }

    pub(super) fn success(message: &str) -> Self {
        Self {
            status: true,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnvironmentListResponse {
    pub status: bool,
    pub environments: Vec<Environment>,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnvironmentResponse {
    pub status: bool,
    pub environment: Environment,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedEnvironmentResponse {
    pub status: bool,
    pub environments: Environment,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdatedEnvironmentResponse {
    pub status: bool,
    #[serde(rename = "updatedEnvironment")]
    pub updated_environment: Environment,
    pub message: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeleteEnvironmentRequest {
    #[serde(rename = "environmentID", default)]
    pub environment_id: Option<String>,
}

/// Multipart body of `POST /environments` (documentation only).
// Fields carry the schema only; multipart bodies are read in `upload`.
#[allow(dead_code)]
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEnvironmentForm {
    #[serde(rename = "environmentCode")]
    pub environment_code: String,
    pub name: String,
    pub in_charge: String,
    #[schema(value_type = String, format = Binary)]
    pub photo: Vec<u8>,
}

/// Multipart body of `PUT /environments` (documentation only).
// Fields carry the schema only; multipart bodies are read in `upload`.
#[allow(dead_code)]
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEnvironmentForm {
    #[serde(rename = "environmentID")]
    pub environment_id: String,
    #[serde(rename = "environmentCode")]
    pub environment_code: String,
    pub name: String,
    pub in_charge: String,
    #[schema(value_type = Option<String>, format = Binary)]
    pub photo: Option<Vec<u8>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use utoipa::PartialSchema;

    fn properties<T: PartialSchema>() -> Value {
        serde_json::to_value(T::schema()).unwrap()["properties"].clone()
    }

    #[test]
    fn create_form_schema_uses_client_field_names() {
        let properties = properties::<CreateEnvironmentForm>();
        assert!(properties.get("environmentCode").is_some());
        assert!(properties.get("in_charge").is_some());
        assert!(properties.get("environment_code").is_none());
        assert_eq!(properties["photo"]["format"], json!("binary"));
    }

    #[test]
    fn update_form_schema_carries_environment_id() {
        let properties = properties::<UpdateEnvironmentForm>();
        assert!(properties.get("environmentID").is_some());
        assert!(properties.get("environmentCode").is_some());
        assert!(properties.get("photo").is_some());
    }

    #[test]
    fn delete_request_reads_environment_id() {
        let request: DeleteEnvironmentRequest =
            serde_json::from_value(json!({ "environmentID": "abc" })).unwrap();
        assert_eq!(request.environment_id.as_deref(), Some("abc"));

        let empty: DeleteEnvironmentRequest = serde_json::from_value(json!({})).unwrap();
        assert!(empty.environment_id.is_none());
    }
}
