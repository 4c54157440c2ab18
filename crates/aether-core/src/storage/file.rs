use std::fs;
use std::io::{Read as _, Seek, SeekFrom, Write as _};
use std::path::{Path, PathBuf};

use super::kv::{KeyValueStore, StoreLock};
use crate::error::CoreError;

const LOCK_FILE: &str = ".lock";

/// One file per key inside a home directory.
///
/// Per-key reads take a shared `fs2` lock and writes an exclusive one;
/// `lock()` takes an exclusive lock on `<home>/.lock` so read-modify-write
/// sequences are serialized across processes.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if missing) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, CoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(CoreError::Config(format!("Invalid store key: {key:?}")));
        }
        Ok(self.root.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let path = self.key_path(key)?;
        let file = match fs::OpenOptions::new().read(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoreError::Io(e)),
        };
        fs2::FileExt::lock_shared(&file).map_err(|e| CoreError::Lock(e.to_string()))?;
        let mut data = String::new();
        let read = (&file).read_to_string(&mut data);
        fs2::FileExt::unlock(&file).ok();
        read?;
        Ok(Some(data))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let path = self.key_path(key)?;
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        fs2::FileExt::lock_exclusive(&file).map_err(|e| CoreError::Lock(e.to_string()))?;

        // Truncate only once the lock is held
        let written = (|| -> std::io::Result<()> {
            file.set_len(0)?;
            (&file).seek(SeekFrom::Start(0))?;
            (&file).write_all(value.as_bytes())?;
            file.sync_data()
        })();
        fs2::FileExt::unlock(&file).ok();
        written?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let path = self.key_path(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Io(e)),
        }
    }

    fn lock(&self) -> Result<StoreLock, CoreError> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.root.join(LOCK_FILE))?;
        fs2::FileExt::lock_exclusive(&file).map_err(|e| CoreError::Lock(e.to_string()))?;
        Ok(StoreLock::file(file))
    }
}
