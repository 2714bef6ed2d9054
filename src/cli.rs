use clap::Parser;
use std::env;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Operations REST API for entitlements and organizations",
    long_about = "Serves the entitlements and organizations CRUD API backed by a local SQLite database."
)]
pub struct Cli {
    #[arg(
        long,
        env = "OPS_API_DATA_DIR",
        default_value = ".ops-api/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long = "api-listen",
        env = "OPS_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:8000",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[arg(
        long = "api-prefix",
        env = "OPS_API_PREFIX",
        value_name = "PATH",
        default_value = "/v1",
        help = "Path prefix every API route is mounted under"
    )]
    pub api_prefix: String,

    #[arg(
        long = "log-file",
        env = "OPS_API_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    dotenvy::from_filename(&dotenv_path).ok();

    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let cli = Cli::try_parse_from(["ops-api"]).unwrap();
        assert_eq!(cli.data_dir, ".ops-api/");
        assert_eq!(cli.api_listen.to_string(), "127.0.0.1:8000");
        assert_eq!(cli.api_prefix, "/v1");
        assert!(cli.log_file.is_none());
        assert!(!cli.reset);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "ops-api",
            "--data-dir",
            "/tmp/ops",
            "--api-listen",
            "0.0.0.0:9000",
            "--api-prefix",
            "/api/v2/",
            "--log-file",
            "ops.log",
            "--reset",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, "/tmp/ops");
        assert_eq!(cli.api_listen.port(), 9000);
        assert_eq!(cli.api_prefix, "/api/v2/");
        assert_eq!(cli.log_file.as_deref(), Some("ops.log"));
        assert!(cli.reset);
    }

    #[test]
    fn rejects_bad_listen_address() {
        assert!(Cli::try_parse_from(["ops-api", "--api-listen", "nope"]).is_err());
    }
}
