use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use flashcard_reviewer::config::ServerConfig;
use flashcard_reviewer::server::{router, serve, shutdown_on};
use flashcard_reviewer::{ReviewService, SqliteStore};
use shadow_rs::shadow;
use std::sync::Arc;
use tokio::net::TcpListener;

shadow!(build);

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    if config.version {
        println!("{}", build::VERSION); //print version const
        return Ok(());
    }
    if config.show_path {
        println!("card database             {:?}", config.db_path()?);
        println!("export dir                {:?}", config.export_dir()?);
        println!("log dir                   {:?}", flashcard_reviewer::log_dir()?);
        return Ok(());
    }

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info) // Set the minimum log level
        .init();

    let db_path = config.db_path()?;
    let store = Arc::new(
        SqliteStore::open(&db_path, config.acquire_timeout())
            .await
            .with_context(|| format!("open {:?}", db_path))?,
    );
    let service = ReviewService::new(Arc::clone(&store))
        .scheduler(config.scheduler())
        .due_order(config.due_order());
    let app = router(Arc::new(service), config.export_dir()?);

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("bind {}", config.addr))?;
    let served = serve(listener, app, shutdown_on(tokio::signal::ctrl_c())).await;

    store.conn.close().await;
    served.context("server error")
}
