//! Directory-backed slot storage built on `cap_std`.
//!
//! Every slot is a file named after its key inside one capability-scoped
//! directory. Writes go to a sibling temporary file first and are renamed
//! into place, so a reader never sees a half-written slot.

use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};

use crate::domain::ports::{SlotStorage, SlotStorageError};

/// Slots persisted as files under a directory.
#[derive(Debug)]
pub struct DirectorySlotStorage {
    dir: Dir,
    root: PathBuf,
}

impl DirectorySlotStorage {
    /// Open `path`, creating it (and its parents) when missing.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the directory cannot be created
    /// or opened.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self {
            dir,
            root: path.to_path_buf(),
        })
    }

    /// Directory holding the slots.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn backend_error(&self, action: &str, key: &str, error: &io::Error) -> SlotStorageError {
        SlotStorageError::backend(format!(
            "failed to {action} slot `{key}` in {}: {error}",
            self.root.display()
        ))
    }
}

fn validate_key(key: &str) -> Result<&Path, SlotStorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        Ok(Path::new(key))
    } else {
        Err(SlotStorageError::backend(format!(
            "slot name `{key}` must be alphanumeric"
        )))
    }
}

impl SlotStorage for DirectorySlotStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SlotStorageError> {
        let file = validate_key(key)?;
        match self.dir.read_to_string(file) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.backend_error("read", key, &err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SlotStorageError> {
        let file = validate_key(key)?;
        let staging = PathBuf::from(format!(".{key}.tmp"));
        self.dir
            .write(&staging, value.as_bytes())
            .map_err(|err| self.backend_error("stage", key, &err))?;
        self.dir
            .rename(&staging, &self.dir, file)
            .map_err(|err| self.backend_error("write", key, &err))
    }

    fn remove(&self, key: &str) -> Result<(), SlotStorageError> {
        let file = validate_key(key)?;
        match self.dir.remove_file(file) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.backend_error("remove", key, &err)),
        }
    }
}
