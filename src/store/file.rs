use super::{StoreError, VerboseStore, decode_flag, encode_flag};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Verbose flag stored as the literal text `true`/`false` in a single file.
#[derive(Debug, Clone)]
pub struct FileVerboseStore {
    path: PathBuf,
}

impl FileVerboseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VerboseStore for FileVerboseStore {
    fn read(&self) -> bool {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode_flag(&raw),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "verbose flag unreadable, assuming false");
                false
            }
        }
    }

    fn write(&self, verbose: bool) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, encode_flag(verbose))?;
        Ok(())
    }
}
