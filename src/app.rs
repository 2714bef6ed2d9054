use crate::{cli, context, rest, storage::SqliteStorage};
use anyhow::{Context as AnyhowContext, Result};
use std::path::Path;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The running service: validated configuration, storage and the shutdown
/// signal shared by every task.
pub struct App {
    config: context::Context,
    storage: SqliteStorage,
    shutdown: CancellationToken,
}

impl App {
    /// Parse the CLI, set up logging and open storage.
    pub fn from_cli() -> Result<Self> {
        let cli = cli::parse();
        let ctx = context::Context::from_cli(&cli);

        crate::tracing::init();
        if let Some(path) = ctx.log_file.as_deref() {
            crate::tracing::set_log_file(Some(path))
                .with_context(|| format!("opening log file {}", path.display()))?;
        }
        log_startup_info(&ctx);

        let storage = init_storage(&ctx.data_dir, ctx.reset)?;
        Ok(Self::new(ctx, storage))
    }

    fn new(config: context::Context, storage: SqliteStorage) -> Self {
        Self {
            config,
            storage,
            shutdown: CancellationToken::new(),
        }
    }

    /// Serve the API until Ctrl-C or until the server stops on its own.
    pub async fn run_daemon(&self) -> Result<()> {
        self.log_runtime_config();

        let mut rest_handle = self.spawn_rest_server();
        self.wait_for_shutdown(&mut rest_handle).await
    }

    fn spawn_rest_server(&self) -> JoinHandle<()> {
        let addr = self.config.api_listen;
        let prefix = self.config.api_prefix.clone();
        let store = self.storage.clone();
        let token = self.shutdown.clone();

        tokio::spawn(async move {
            if let Err(e) = rest::serve(addr, store, prefix, token).await {
                log::error!("REST server failed: {:#}", e);
            }
        })
    }

    async fn wait_for_shutdown(&self, rest_task: &mut JoinHandle<()>) -> Result<()> {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => log::info!("🧨 Ctrl-C received, shutting down..."),
            _ = &mut *rest_task => log::error!("REST task exited unexpectedly"),
        }

        self.shutdown.cancel();

        // Polling a completed JoinHandle again panics.
        if !rest_task.is_finished() {
            rest_task.await.context("joining REST task")?;
        }

        log::info!("✅ Shutdown complete");
        Ok(())
    }

    fn log_runtime_config(&self) {
        log::info!(
            "🌐 REST API: http://{}{}",
            self.config.api_listen,
            self.config.api_prefix
        );
        log::info!("🗄️ Database: {}", self.storage.path().display());
        if let Some(path) = self.config.log_file.as_deref() {
            log::info!("📝 Log file: {}", path.to_string_lossy());
        }
    }
}

fn log_startup_info(ctx: &context::Context) {
    log::info!("🚀 Starting ops-api");
    log::info!("📂 Data dir: {}", ctx.data_dir.to_string_lossy());
    if ctx.reset {
        log::info!("🧹 Reset requested, dropping existing database");
    }
}

fn init_storage(data_dir: &Path, reset: bool) -> Result<SqliteStorage> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let sqlite = SqliteStorage::in_dir(data_dir);
    if reset {
        sqlite.reset_all().context("resetting storage")?;
    }
    sqlite.init().context("initializing storage")?;

    Ok(sqlite)
}

pub async fn run() -> Result<()> {
    let app = App::from_cli()?;
    app.run_daemon().await
}
