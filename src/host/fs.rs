//! Filesystem-backed host capabilities.

use super::{FileExchange, ImportedFile, SessionStore};
use crate::error::Result;
use parking_lot::Mutex;
use std::fs;
use std::path::PathBuf;

/// File exchange rooted at a directory.
///
/// Exports land as `<name>.json` under the root. Imports read whatever
/// path was last staged, standing in for the host's file picker.
pub struct FsFileExchange {
    root: PathBuf,
    staged: Mutex<Option<PathBuf>>,
}

impl FsFileExchange {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            staged: Mutex::new(None),
        })
    }

    /// Choose the file the next import reads.
    pub fn stage_import(&self, path: impl Into<PathBuf>) {
        *self.staged.lock() = Some(path.into());
    }
}

impl FileExchange for FsFileExchange {
    fn export_file(&self, default_name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root.join(format!("{default_name}.json"));
        fs::write(&path, contents)?;
        Ok(path)
    }

    fn import_file(&self) -> Result<Option<ImportedFile>> {
        let path = match self.staged.lock().take() {
            Some(path) => path,
            None => return Ok(None),
        };
        let contents = fs::read_to_string(&path)?;
        Ok(Some(ImportedFile { path, contents }))
    }
}

/// Session persistence as a single JSON file.
pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for JsonSessionStore {
    fn save(&self, serialized: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serialized)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path)?))
    }
}
