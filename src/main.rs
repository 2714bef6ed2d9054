mod app;
mod cli;
mod collection;
mod context;
mod models;
mod repository;
mod rest;
mod storage;
mod tracing;
mod validation;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
