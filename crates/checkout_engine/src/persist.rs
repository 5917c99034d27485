use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {path:?} is unusable: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Directory that receives result files. Every write lands through a temp
/// file in the same directory followed by a rename, so readers never see a
/// half-written file.
#[derive(Debug, Clone)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the directory if missing and probes that it is writable.
    pub fn prepare(&self) -> Result<(), PersistError> {
        let unusable = |reason: String| PersistError::OutputDir {
            path: self.path.clone(),
            reason,
        };
        match fs::metadata(&self.path) {
            Ok(meta) if !meta.is_dir() => return Err(unusable("not a directory".into())),
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.path).map_err(|e| unusable(e.to_string()))?;
            }
            Err(err) => return Err(unusable(err.to_string())),
        }
        NamedTempFile::new_in(&self.path).map_err(|e| unusable(e.to_string()))?;
        Ok(())
    }

    /// Writes `contents` to `{dir}/{filename}`, replacing any existing file.
    pub fn write_atomic(&self, filename: &str, contents: &[u8]) -> Result<PathBuf, PersistError> {
        self.prepare()?;

        let target = self.path.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.path)?;
        tmp.write_all(contents)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Rename does not overwrite on every platform.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
