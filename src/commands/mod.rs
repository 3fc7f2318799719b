pub mod cleanup;
pub mod info;
pub mod merge;
pub mod serve;
pub mod split;

use crate::cli::StoreArgs;
use crate::store::FileStore;

impl StoreArgs {
    pub fn file_store(&self) -> FileStore {
        let public_url = self
            .public_url
            .clone()
            .unwrap_or_else(|| self.store_dir.display().to_string());
        FileStore::new(&self.store_dir, public_url)
    }
}
