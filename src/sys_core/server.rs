//! Listener setup: bind, serve every connection with `handlers::route`.

use std::convert::Infallible;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use hyper::Server;
use hyper::service::{make_service_fn, service_fn};
use thiserror::Error;
use tracing::info;

use crate::sys_core::core::AppContext;
use crate::sys_core::handlers::route;
use crate::sys_share::core::{resolve_lan_address, share_url};

/// Startup and serve failures; these end the process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot create upload directory {path}: {source}")]
    UploadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("http server error: {0}")]
    Http(#[from] hyper::Error),
}

pub async fn run_server(ctx: Arc<AppContext>) -> Result<(), ServerError> {
    ctx.store
        .ensure_root()
        .await
        .map_err(|source| ServerError::UploadDir {
            path: ctx.store.root().to_path_buf(),
            source,
        })?;

    let addr = ctx.config.bind_addr();
    let url = share_url(resolve_lan_address(), ctx.config.port);
    let upload_dir = ctx.store.root().display().to_string();

    let make_svc = make_service_fn(move |_conn| {
        let ctx = ctx.clone();
        async move { Ok::<_, Infallible>(service_fn(move |req| route(req, ctx.clone()))) }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    info!("DropGo started on {addr}, open {url} (uploads in {upload_dir})");

    server.with_graceful_shutdown(shutdown_signal()).await?;
    info!("DropGo stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
