use crate::{
    access::Grants,
    api::{self, ServerConfig},
    cli::telemetry,
};
use anyhow::Result;
use axum::http::HeaderName;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: SecretString,
    pub public_dir: PathBuf,
    pub grants: Grants,
    pub role_header: HeaderName,
    pub max_upload_bytes: usize,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!(
        port = args.port,
        public_dir = %args.public_dir.display(),
        role_header = %args.role_header,
        max_upload_bytes = args.max_upload_bytes,
        "starting server"
    );

    let result = api::new(ServerConfig {
        port: args.port,
        dsn: args.dsn,
        public_dir: args.public_dir,
        grants: args.grants,
        role_header: args.role_header,
        max_upload_bytes: args.max_upload_bytes,
    })
    .await;

    telemetry::shutdown_tracer();

    result
}
