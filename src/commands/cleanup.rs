use crate::cli::StoreArgs;
use anyhow::Result;
use std::time::Duration;

pub async fn run(store: &StoreArgs, older_than_minutes: u64) -> Result<()> {
    let store = store.file_store();
    let removed = store
        .purge_older_than(Duration::from_secs(older_than_minutes * 60))
        .await?;

    println!("Deleted {} file(s) from {}", removed, store.root().display());

    Ok(())
}
