//! # Inventory (Environment registry)
//!
//! `inventory` serves the environment records of the asset-management
//! application: physical locations with a unique code, a name, a person in
//! charge and a photo.
//!
//! ## Request flow
//!
//! Every handler follows the same shape:
//!
//! 1. Resolve the caller role from the gateway header (`Caller`).
//! 2. Ask the access-control grants whether the role may perform the action
//!    on the `environment` resource. Denials return `403` before any write.
//! 3. Validate the body, query the store, mutate, respond.
//!
//! Responses always carry `{status, message}` plus an optional payload, with
//! user-facing messages in Spanish.
//!
//! ## Photos
//!
//! Photos are written to the public directory as soon as the multipart body is
//! read. Any later rejection deletes the just-written file again, since the
//! file system and the record store share no transaction.
//!
//! ## Machines
//!
//! Machines reference their environment by id. An environment cannot be
//! deleted while a machine still points at it; there is no cascade.

pub mod access;
pub mod api;
pub mod cli;
pub mod photos;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
