//! Persistence for finished documents
//!
//! Outputs are written under opaque keys and addressed by URL. The store
//! is the only resource shared between concurrent requests; every write
//! goes to a distinct key.

use crate::error::SpliceError;
use crate::select::UnitLabel;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub trait BlobStore: Clone + Send + Sync + 'static {
    /// Store `bytes` under `key` and return the URL it can be fetched from.
    fn put(
        &self,
        key: String,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<String, SpliceError>> + Send;
}

/// Storage key for an output. Split outputs carry the original file name
/// and the unit label; merge outputs are anonymous.
pub fn object_key(original_name: Option<&str>, label: &UnitLabel) -> String {
    let token = Uuid::new_v4();
    match original_name {
        Some(name) => format!("{}-{}-{}.pdf", file_stem(name), label, token),
        None => format!("{}.pdf", token),
    }
}

fn file_stem(name: &str) -> String {
    let stem: String = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        "document".to_string()
    } else {
        stem
    }
}

/// A directory of PDFs served under `public_url`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    public_url: String,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        FileStore {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Delete stored files last modified more than `max_age` ago.
    /// Returns how many were removed.
    pub async fn purge_older_than(&self, max_age: Duration) -> Result<usize, SpliceError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(SpliceError::Persistence(format!(
                    "Failed to list {}: {}",
                    self.root.display(),
                    e
                )))
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SpliceError::Persistence(e.to_string()))?
        {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let expired = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > max_age);
            if !expired {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    debug!(path = %entry.path().display(), "Removed expired output");
                    removed += 1;
                }
                Err(e) => warn!(path = %entry.path().display(), "Failed to remove expired output: {}", e),
            }
        }

        if removed > 0 {
            info!(removed, "Purged expired outputs");
        }
        Ok(removed)
    }
}

impl BlobStore for FileStore {
    async fn put(&self, key: String, bytes: Vec<u8>) -> Result<String, SpliceError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            SpliceError::Persistence(format!(
                "Failed to create directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let path = self.root.join(&key);
        tokio::fs::write(&path, &bytes).await.map_err(|e| {
            SpliceError::Persistence(format!("Failed to write {}: {}", path.display(), e))
        })?;

        debug!(%key, size = bytes.len(), "Stored output");
        Ok(format!("{}/{}", self.public_url, key))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keys_carry_name_and_label() {
        let key = object_key(Some("report.pdf"), &UnitLabel::Range { from: 3, to: 7 });
        assert!(key.starts_with("report-range-3-7-"));
        assert!(key.ends_with(".pdf"));
    }

    #[test]
    fn test_merge_keys_are_anonymous() {
        let key = object_key(None, &UnitLabel::Merged);
        assert_eq!(key.len(), 36 + 4);
        assert!(Uuid::parse_str(key.trim_end_matches(".pdf")).is_ok());
    }

    #[test]
    fn test_keys_are_unique() {
        let a = object_key(Some("a.pdf"), &UnitLabel::Page(1));
        let b = object_key(Some("a.pdf"), &UnitLabel::Page(1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_stem_is_sanitized() {
        assert_eq!(file_stem("../../etc/pass wd.pdf"), "pass_wd");
        assert_eq!(file_stem("relatório.pdf"), "relat_rio");
        assert_eq!(file_stem(""), "document");
    }

    #[tokio::test]
    async fn test_file_store_writes_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("out"), "http://localhost:3000/files/");
        let url = store.put("a.pdf".to_string(), b"%PDF".to_vec()).await.unwrap();
        assert_eq!(url, "http://localhost:3000/files/a.pdf");
        assert_eq!(std::fs::read(dir.path().join("out/a.pdf")).unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn test_purge_respects_age() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), "file://");
        store.put("old.pdf".to_string(), vec![1]).await.unwrap();

        assert_eq!(store.purge_older_than(Duration::from_secs(3600)).await.unwrap(), 0);
        assert!(dir.path().join("old.pdf").exists());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.purge_older_than(Duration::ZERO).await.unwrap(), 1);
        assert!(!dir.path().join("old.pdf").exists());
    }

    #[tokio::test]
    async fn test_purge_of_missing_directory_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("never-created"), "file://");
        assert_eq!(store.purge_older_than(Duration::ZERO).await.unwrap(), 0);
    }
}
