//! API handlers for the inventory service.

pub mod environments;
pub mod health;
pub mod root;
