// # File State Store
//
// Persists the last observed public IP as a plain-text file (`ip.txt`).
//
// ## File Format
//
// The bare textual IP, nothing else: no history, no version field. Trailing
// whitespace is stripped on read. Writes go through a temporary file and a
// rename so a crash mid-write never leaves a truncated IP behind.
//
// Unreadable content (an unparseable IP) is treated as absent state rather
// than an error: the agent re-learns the IP on its next lookup.

use async_trait::async_trait;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::StateStore;

/// File-based state store holding a single textual IP
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a file state store, creating parent directories if needed
    ///
    /// The file itself is not created until the first [`StateStore::store`];
    /// a missing file reads back as `None`.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::state_store(format!(
                    "failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self { path })
    }

    /// Path to the temporary file used for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<Option<IpAddr>, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no persisted IP yet");
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::state_store(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let trimmed = content.trim();
        match trimmed.parse::<IpAddr>() {
            Ok(ip) => Ok(Some(ip)),
            Err(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "persisted IP is unreadable, treating as absent"
                );
                Ok(None)
            }
        }
    }

    async fn store(&self, ip: IpAddr) -> Result<(), Error> {
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(ip.to_string().as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::state_store(format!(
                    "failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!(path = %self.path.display(), %ip, "persisted IP");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn ip_round_trips_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ip.txt");

        let store = FileStateStore::new(&path).await.unwrap();
        let ip: IpAddr = "203.0.113.5".parse().unwrap();
        store.store(ip).await.unwrap();

        // On-disk content is the bare address, no added whitespace.
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "203.0.113.5");

        assert_eq!(store.load().await.unwrap(), Some(ip));
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("ip.txt")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn trailing_newline_is_stripped_on_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ip.txt");
        std::fs::write(&path, "1.2.3.4\n").unwrap();

        let store = FileStateStore::new(&path).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some("1.2.3.4".parse().unwrap()));
    }

    #[tokio::test]
    async fn unreadable_content_loads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ip.txt");
        std::fs::write(&path, "not an address").unwrap();

        let store = FileStateStore::new(&path).await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn state_survives_a_new_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ip.txt");

        let store = FileStateStore::new(&path).await.unwrap();
        let ip: IpAddr = "5.6.7.8".parse().unwrap();
        store.store(ip).await.unwrap();

        let store2 = FileStateStore::new(&path).await.unwrap();
        assert_eq!(store2.load().await.unwrap(), Some(ip));
    }

    #[tokio::test]
    async fn parent_directory_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join("ip.txt");

        let store = FileStateStore::new(&path).await.unwrap();
        store.store("9.9.9.9".parse().unwrap()).await.unwrap();
        assert!(path.exists());
    }
}
