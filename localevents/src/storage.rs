//! File-backed session storage: one JSON file per key in a directory.

use localevents_core::session_storage::{SessionKey, SessionStorage, StorageError};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Session entries kept as `<dir>/active.json` and `<dir>/users.json`
///
/// The directory is created on first write. Writes go to a temporary file
/// that is renamed over the entry, so a crash never leaves half a file.
#[derive(Clone, Debug)]
pub struct FileSessionStorage {
    dir: PathBuf,
}

impl FileSessionStorage {
    /// Store entries under `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding `key`
    #[must_use]
    pub fn path(&self, key: SessionKey) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SessionStorage for FileSessionStorage {
    fn read(&self, key: SessionKey) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                key,
                message: e.to_string(),
            }),
        }
    }

    fn write(&self, key: SessionKey, value: &str) -> Result<(), StorageError> {
        let write_error = |e: std::io::Error| StorageError::Write {
            key,
            message: e.to_string(),
        };

        fs::create_dir_all(&self.dir).map_err(write_error)?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(write_error)?;
        fs::rename(&tmp, self.path(key)).map_err(write_error)?;

        tracing::trace!(%key, dir = %self.dir.display(), "Session entry written");
        Ok(())
    }
}
