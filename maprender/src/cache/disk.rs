//! Disk tier: one file per tile in a flat cache directory.
//!
//! The directory is read in full once, at startup, and only written to
//! afterwards. Writes go to a uniquely named temp file in the same directory
//! and are then renamed over the final name, so two tasks storing the same key
//! at once can never leave a torn file behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tracing::{debug, warn};

use super::key::TileKey;
use super::CacheError;

/// Suffix of in-progress writes; such files are ignored when loading.
const TEMP_SUFFIX: &str = ".tmp";

/// Distinguishes temp files written by concurrent tasks in this process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A tile read from the cache directory at startup.
#[derive(Debug)]
pub struct LoadedTile {
    pub key: TileKey,
    pub data: Bytes,
}

/// Outcome of scanning the cache directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub tiles: Vec<LoadedTile>,
    /// Files that could not be read and were skipped
    pub skipped: usize,
}

/// Persistent tile storage in a single directory.
#[derive(Debug, Clone)]
pub struct DiskTier {
    directory: PathBuf,
}

impl DiskTier {
    /// Creates a disk tier rooted at `directory`.
    ///
    /// The directory is not created here; it must exist before
    /// [`DiskTier::load_all`] or [`DiskTier::write`] is called.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns the cache directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the file path for `key`.
    pub fn path_for(&self, key: &TileKey) -> PathBuf {
        self.directory.join(key.as_str())
    }

    /// Reads every tile file in the directory.
    ///
    /// A file that cannot be read is logged and skipped; only a failure to
    /// list the directory itself is an error.
    pub fn load_all(&self) -> Result<LoadReport, CacheError> {
        let entries = fs::read_dir(&self.directory).map_err(|e| CacheError::DirectoryUnreadable {
            path: self.directory.clone(),
            source: e,
        })?;

        let mut report = LoadReport::default();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %self.directory.display(), error = %e, "Skipping unreadable cache entry");
                    report.skipped += 1;
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                debug!(path = %path.display(), "Skipping cache file with non UTF-8 name");
                continue;
            };
            if name.ends_with(TEMP_SUFFIX) {
                debug!(path = %path.display(), "Skipping leftover temp file");
                continue;
            }

            match fs::read(&path) {
                Ok(data) => report.tiles.push(LoadedTile {
                    key: TileKey::from_file_name(name),
                    data: Bytes::from(data),
                }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable cache file");
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    /// Durably writes `data` as the file for `key`.
    ///
    /// Runs on the blocking thread pool.
    pub async fn write(&self, key: &TileKey, data: Bytes) -> Result<(), CacheError> {
        let final_path = self.path_for(key);
        let temp_path = self.directory.join(format!(
            ".{}.{}-{}{}",
            key.as_str(),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
            TEMP_SUFFIX
        ));

        let result = tokio::task::spawn_blocking(move || {
            write_atomic(&temp_path, &final_path, &data)
        })
        .await
        .map_err(|e| CacheError::Io {
            key: key.clone(),
            source: io::Error::other(e),
        })?;

        result.map_err(|e| CacheError::Io {
            key: key.clone(),
            source: e,
        })
    }
}

/// Writes to `temp_path`, syncs, then renames onto `final_path`.
fn write_atomic(temp_path: &Path, final_path: &Path, data: &[u8]) -> io::Result<()> {
    let written = (|| {
        let mut file = fs::File::create(temp_path)?;
        io::Write::write_all(&mut file, data)?;
        file.sync_all()?;
        fs::rename(temp_path, final_path)
    })();

    if written.is_err() {
        let _ = fs::remove_file(temp_path);
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_all_reads_every_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1_2_3.png"), b"one").unwrap();
        fs::write(dir.path().join("4_5_6.png"), b"two").unwrap();

        let report = DiskTier::new(dir.path()).load_all().unwrap();

        assert_eq!(report.tiles.len(), 2);
        assert_eq!(report.skipped, 0);
        let tile = report
            .tiles
            .iter()
            .find(|t| t.key.as_str() == "1_2_3.png")
            .unwrap();
        assert_eq!(tile.data, Bytes::from_static(b"one"));
    }

    #[test]
    fn test_load_all_ignores_temp_files_and_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1_2_3.png"), b"one").unwrap();
        fs::write(dir.path().join(".1_2_3.png.99-0.tmp"), b"partial").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let report = DiskTier::new(dir.path()).load_all().unwrap();

        assert_eq!(report.tiles.len(), 1);
        assert_eq!(report.tiles[0].key.as_str(), "1_2_3.png");
    }

    #[test]
    fn test_load_all_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");

        let result = DiskTier::new(missing).load_all();
        assert!(matches!(
            result,
            Err(CacheError::DirectoryUnreadable { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let tier = DiskTier::new(dir.path());
        let key = TileKey::from_file_name("7_8_9.png");

        tier.write(&key, Bytes::from_static(b"tile")).await.unwrap();

        assert_eq!(fs::read(dir.path().join("7_8_9.png")).unwrap(), b"tile");
        // No temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_writes_same_key_do_not_corrupt() {
        let dir = TempDir::new().unwrap();
        let tier = DiskTier::new(dir.path());
        let key = TileKey::from_file_name("1_1_1.png");
        let payload = Bytes::from(vec![0xAB; 64 * 1024]);

        let writes = (0..16).map(|_| tier.write(&key, payload.clone()));
        for result in futures::future::join_all(writes).await {
            result.unwrap();
        }

        assert_eq!(fs::read(tier.path_for(&key)).unwrap(), payload.to_vec());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let tier = DiskTier::new(dir.path().join("gone"));
        let key = TileKey::from_file_name("1_1_1.png");

        let result = tier.write(&key, Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(CacheError::Io { .. })));
    }
}
