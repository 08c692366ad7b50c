//! Role-based access control for inventory resources.
//!
//! Handlers never look at roles directly. They ask
//! `access.can(role).read_any(RESOURCE_ENVIRONMENT)` and act on the returned
//! `Permission`. Grants are a plain role -> resource -> actions table, loaded
//! from JSON so operators can change them without a rebuild:
//!
//! ```json
//! { "admin": { "environment": ["create:any", "read:any", "update:any", "delete:any"] } }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};
use tracing::debug;

pub const RESOURCE_ENVIRONMENT: &str = "environment";

pub const ROLE_ADMIN: &str = "admin";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Action {
    #[serde(rename = "create:any")]
    CreateAny,
    #[serde(rename = "read:any")]
    ReadAny,
    #[serde(rename = "update:any")]
    UpdateAny,
    #[serde(rename = "delete:any")]
    DeleteAny,
}

impl Action {
    pub const ALL: [Self; 4] = [Self::CreateAny, Self::ReadAny, Self::UpdateAny, Self::DeleteAny];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateAny => "create:any",
            Self::ReadAny => "read:any",
            Self::UpdateAny => "update:any",
            Self::DeleteAny => "delete:any",
        }
    }
}

/// Outcome of a single policy lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Permission {
    granted: bool,
}

impl Permission {
    #[must_use]
    pub const fn granted(self) -> bool {
        self.granted
    }
}

/// Policy engine seam used by the handlers.
pub trait AccessControl: Send + Sync {
    fn is_granted(&self, role: &str, action: Action, resource: &str) -> bool;
}

impl<'c> dyn AccessControl + 'c {
    /// Start a permission query for `role`.
    #[must_use]
    pub fn can<'a>(&'a self, role: &'a str) -> Query<'a> {
        Query {
            control: self,
            role,
        }
    }
}

/// Pending permission lookup for one role.
pub struct Query<'a> {
    control: &'a dyn AccessControl,
    role: &'a str,
}

impl Query<'_> {
    #[must_use]
    pub fn create_any(&self, resource: &str) -> Permission {
        self.check(Action::CreateAny, resource)
    }

    #[must_use]
    pub fn read_any(&self, resource: &str) -> Permission {
        self.check(Action::ReadAny, resource)
    }

    #[must_use]
    pub fn update_any(&self, resource: &str) -> Permission {
        self.check(Action::UpdateAny, resource)
    }

    #[must_use]
    pub fn delete_any(&self, resource: &str) -> Permission {
        self.check(Action::DeleteAny, resource)
    }

    fn check(&self, action: Action, resource: &str) -> Permission {
        let granted = self.control.is_granted(self.role, action, resource);
        debug!(
            role = self.role,
            action = action.as_str(),
            resource,
            granted,
            "permission lookup"
        );
        Permission { granted }
    }
}

/// Static grants table: role -> resource -> allowed actions.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Grants {
    roles: HashMap<String, HashMap<String, HashSet<Action>>>,
}

impl Grants {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            roles: HashMap::new(),
        }
    }

    /// Grant every action in `actions` on `resource` to `role`.
    #[must_use]
    pub fn allow(mut self, role: &str, resource: &str, actions: &[Action]) -> Self {
        self.roles
            .entry(role.to_string())
            .or_default()
            .entry(resource.to_string())
            .or_default()
            .extend(actions.iter().copied());
        self
    }

    /// Parse a grants table from JSON.
    ///
    /// # Errors
    /// Returns an error if the document is not a valid grants table.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid grants JSON")
    }

    /// Load a grants table from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read grants file: {}", path.display()))?;
        Self::from_json(&json)
    }
}

impl Default for Grants {
    /// Only `admin` may manage environments.
    fn default() -> Self {
        Self::empty().allow(ROLE_ADMIN, RESOURCE_ENVIRONMENT, &Action::ALL)
    }
}

impl AccessControl for Grants {
    fn is_granted(&self, role: &str, action: Action, resource: &str) -> bool {
        self.roles
            .get(role)
            .and_then(|resources| resources.get(resource))
            .is_some_and(|actions| actions.contains(&action))
    }
}
