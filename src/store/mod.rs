//! Environment and machine record stores.
//!
//! Handlers talk to `EnvironmentStore` and `MachineStore` only. `postgres`
//! backs them with sqlx in production; `memory` keeps everything in a
//! `RwLock` for tests and local runs.
//!
//! The handlers still perform their own existence checks (code uniqueness,
//! machines still assigned) before writing. The stores repeat those checks at
//! write time and report `StoreError::Duplicate` / `StoreError::InUse`, so two
//! racing requests cannot both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::photos::PhotoRef;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Stored environment record, serialized with the field names clients expect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct Environment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "environmentCode")]
    pub environment_code: String,
    pub name: String,
    pub in_charge: String,
    #[serde(rename = "environmentPhoto")]
    pub environment_photo: PhotoRef,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewEnvironment {
    pub environment_code: String,
    pub name: String,
    pub in_charge: String,
    pub photo: PhotoRef,
}

/// Field updates applied by the update handler. `photo` is only replaced when
/// a new file was uploaded.
#[derive(Clone, Debug)]
pub struct EnvironmentChanges {
    pub environment_code: String,
    pub name: String,
    pub in_charge: String,
    pub photo: Option<PhotoRef>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("environment code already in use")]
    Duplicate,
    #[error("environment still referenced by machines")]
    InUse,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    /// All environments, most recently stored first.
    async fn list(&self) -> Result<Vec<Environment>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Environment>, StoreError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Environment>, StoreError>;

    async fn insert(&self, new: NewEnvironment) -> Result<Environment, StoreError>;

    /// Apply `changes` and return the refreshed record, or `None` if `id` is gone.
    async fn update(
        &self,
        id: Uuid,
        changes: EnvironmentChanges,
    ) -> Result<Option<Environment>, StoreError>;

    /// Remove the record; `false` if nothing was removed.
    async fn remove(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait MachineStore: Send + Sync {
    /// Whether at least one machine references `environment_id`.
    async fn any_for_environment(&self, environment_id: Uuid) -> Result<bool, StoreError>;
}
