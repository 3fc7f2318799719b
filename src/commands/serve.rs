use crate::cli::StoreArgs;
use crate::http::router;
use crate::service::Toolkit;
use crate::store::FileStore;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tracing::{info, warn};

pub struct ServeOptions {
    pub addr: SocketAddr,
    pub max_body_mb: usize,
    pub expire_after: Duration,
    pub sweep_interval: Duration,
}

pub async fn run(store: &StoreArgs, options: ServeOptions) -> Result<()> {
    let public_url = store
        .public_url
        .clone()
        .unwrap_or_else(|| format!("http://{}/files", options.addr));
    let file_store = FileStore::new(&store.store_dir, public_url);
    tokio::fs::create_dir_all(file_store.root()).await?;

    tokio::spawn(sweep(
        file_store.clone(),
        options.expire_after,
        options.sweep_interval,
    ));

    let files = ServeDir::new(file_store.root());
    let toolkit = Arc::new(Toolkit::new(file_store));
    let app = router(toolkit, options.max_body_mb * 1024 * 1024).nest_service("/files", files);

    info!("Listening on http://{}", options.addr);
    let listener = tokio::net::TcpListener::bind(options.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn sweep(store: FileStore, expire_after: Duration, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        if let Err(e) = store.purge_older_than(expire_after).await {
            warn!("Cleanup failed: {}", e);
        }
    }
}
