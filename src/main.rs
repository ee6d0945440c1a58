use std::sync::Arc;

use tracing::error;
use tracing_subscriber::EnvFilter;

use sys_config::core::Config;
use sys_core::core::AppContext;
use sys_core::server::{ServerError, run_server};

pub mod sys_config;
pub mod sys_core;
pub mod sys_fileapi;
pub mod sys_pages;
pub mod sys_share;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    init_logging();

    let ctx = Arc::new(AppContext::new(Config::from_env()));

    // Run until Ctrl-C; only startup failures end up here.
    if let Err(e) = run_server(ctx).await {
        error!("{e}");
        return Err(e);
    }
    Ok(())
}

// honors RUST_LOG if present
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dropgo=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
