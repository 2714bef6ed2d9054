use std::{net::SocketAddr, path::PathBuf};

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Context {
    pub data_dir: PathBuf,
    pub api_listen: SocketAddr,
    pub api_prefix: String,
    pub log_file: Option<PathBuf>,
    pub reset: bool,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        Self {
            data_dir: PathBuf::from(&cli.data_dir),
            api_listen: cli.api_listen,
            api_prefix: normalize_prefix(&cli.api_prefix),
            log_file: cli.log_file.as_ref().map(PathBuf::from),
            reset: cli.reset,
        }
    }
}

/// Leading slash, no trailing slash. Empty means routes sit at the root.
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn normalize_prefix_variants() {
        assert_eq!(normalize_prefix("/v1"), "/v1");
        assert_eq!(normalize_prefix("v1"), "/v1");
        assert_eq!(normalize_prefix("/v1/"), "/v1");
        assert_eq!(normalize_prefix("/api/v2//"), "/api/v2");
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("/"), "");
    }

    #[test]
    fn from_cli_maps_fields() {
        let cli = crate::cli::Cli::try_parse_from([
            "ops-api",
            "--data-dir",
            "data",
            "--api-prefix",
            "api/",
            "--log-file",
            "logs/ops.log",
        ])
        .unwrap();
        let ctx = Context::from_cli(&cli);
        assert_eq!(ctx.data_dir, PathBuf::from("data"));
        assert_eq!(ctx.api_prefix, "/api");
        assert_eq!(ctx.log_file, Some(PathBuf::from("logs/ops.log")));
        assert!(!ctx.reset);
    }
}
