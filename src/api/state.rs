//! Shared handler state.

use axum::http::HeaderName;
use std::sync::Arc;

use crate::{
    access::AccessControl,
    photos::PhotoStorage,
    store::{EnvironmentStore, MachineStore},
};

pub const DEFAULT_ROLE_HEADER: &str = "x-user-role";

/// Collaborators every environment handler needs. Handlers receive it as
/// `Extension<Arc<AppState>>`.
#[derive(Clone)]
pub struct AppState {
    environments: Arc<dyn EnvironmentStore>,
    machines: Arc<dyn MachineStore>,
    photos: Arc<dyn PhotoStorage>,
    access: Arc<dyn AccessControl>,
    role_header: HeaderName,
}

impl AppState {
    #[must_use]
    pub fn new(
        environments: Arc<dyn EnvironmentStore>,
        machines: Arc<dyn MachineStore>,
        photos: Arc<dyn PhotoStorage>,
        access: Arc<dyn AccessControl>,
    ) -> Self {
        Self {
            environments,
            machines,
            photos,
            access,
            role_header: HeaderName::from_static(DEFAULT_ROLE_HEADER),
        }
    }

    /// Header the upstream gateway uses to pass the authenticated role.
    #[must_use]
    pub fn with_role_header(mut self, role_header: HeaderName) -> Self {
        self.role_header = role_header;
        self
    }

    pub(crate) fn environments(&self) -> &dyn EnvironmentStore {
        self.environments.as_ref()
    }

    pub(crate) fn machines(&self) -> &dyn MachineStore {
        self.machines.as_ref()
    }

    pub(crate) fn photos(&self) -> &dyn PhotoStorage {
        self.photos.as_ref()
    }

    pub(crate) fn access(&self) -> &dyn AccessControl {
        self.access.as_ref()
    }

    pub(crate) fn role_header(&self) -> &HeaderName {
        &self.role_header
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("role_header", &self.role_header)
            .finish_non_exhaustive()
    }
}
