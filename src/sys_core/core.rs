//! Shared, read-only state handed to every request.

use crate::sys_config::core::Config;
use crate::sys_fileapi::core::FileStore;
use crate::sys_pages::core::Pages;

#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    pub store: FileStore,
    pub pages: Pages,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        let store = FileStore::new(config.upload_dir.clone());
        Self {
            config,
            store,
            pages: Pages::new(),
        }
    }
}
