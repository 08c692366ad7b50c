use clap::{Arg, Command};

use crate::api::DEFAULT_ROLE_HEADER;

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_PUBLIC_DIR: &str = "public-dir";
pub const ARG_GRANTS: &str = "grants";
pub const ARG_ROLE_HEADER: &str = "role-header";
pub const ARG_MAX_UPLOAD_BYTES: &str = "max-upload-bytes";

// 5 MiB, matches `api::DEFAULT_MAX_UPLOAD_BYTES`.
const DEFAULT_MAX_UPLOAD_BYTES: &str = "5242880";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("INVENTORY_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("INVENTORY_DSN")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_PUBLIC_DIR)
                .long("public-dir")
                .help("Directory served as public files; photos go to <dir>/img/environments/")
                .default_value("public")
                .env("INVENTORY_PUBLIC_DIR"),
        )
        .arg(
            Arg::new(ARG_GRANTS)
                .long("grants")
                .help("JSON file with role grants (default: admin manages environments)")
                .env("INVENTORY_GRANTS"),
        )
        .arg(
            Arg::new(ARG_ROLE_HEADER)
                .long("role-header")
                .help("Request header carrying the authenticated caller role")
                .default_value(DEFAULT_ROLE_HEADER)
                .env("INVENTORY_ROLE_HEADER"),
        )
        .arg(
            Arg::new(ARG_MAX_UPLOAD_BYTES)
                .long("max-upload-bytes")
                .help("Maximum request body size for photo uploads, in bytes")
                .default_value(DEFAULT_MAX_UPLOAD_BYTES)
                .env("INVENTORY_MAX_UPLOAD_BYTES")
                .value_parser(clap::value_parser!(usize)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_limit_default_matches_api() {
        assert_eq!(
            DEFAULT_MAX_UPLOAD_BYTES.parse::<usize>().ok(),
            Some(crate::api::DEFAULT_MAX_UPLOAD_BYTES)
        );
    }
}
