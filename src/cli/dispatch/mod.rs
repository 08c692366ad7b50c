use crate::{
    access::Grants,
    cli::{
        actions::{Action, server::Args},
        commands::server::{
            ARG_DSN, ARG_GRANTS, ARG_MAX_UPLOAD_BYTES, ARG_PORT, ARG_PUBLIC_DIR, ARG_ROLE_HEADER,
        },
    },
};
use anyhow::{Context, Result, bail};
use axum::http::HeaderName;
use secrecy::SecretString;
use std::{path::PathBuf, str::FromStr};
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing, the DSN is not a
/// Postgres URL, the grants file cannot be loaded, or the role header is not a
/// valid header name.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let dsn_url = Url::parse(&dsn).context("invalid database DSN")?;
    if !matches!(dsn_url.scheme(), "postgres" | "postgresql") {
        bail!("unsupported database DSN scheme: {}", dsn_url.scheme());
    }

    let public_dir = matches
        .get_one::<String>(ARG_PUBLIC_DIR)
        .map_or_else(|| PathBuf::from("public"), PathBuf::from);

    let grants = match matches.get_one::<String>(ARG_GRANTS) {
        Some(path) => Grants::load(&PathBuf::from(path))
            .with_context(|| format!("Failed to load grants from {path}"))?,
        None => Grants::default(),
    };

    let role_header = matches
        .get_one::<String>(ARG_ROLE_HEADER)
        .map_or(crate::api::DEFAULT_ROLE_HEADER, String::as_str);
    let role_header = HeaderName::from_str(role_header)
        .with_context(|| format!("invalid role header name: {role_header}"))?;

    let max_upload_bytes = matches
        .get_one::<usize>(ARG_MAX_UPLOAD_BYTES)
        .copied()
        .unwrap_or(crate::api::DEFAULT_MAX_UPLOAD_BYTES);

    Ok(Action::Server(Args {
        port,
        dsn: SecretString::from(dsn),
        public_dir,
        grants,
        role_header,
        max_upload_bytes,
    }))
}
