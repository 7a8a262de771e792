//! Persistence of completed artifacts.

use directories::UserDirs;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while saving an artifact.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Failed to create the output directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write the artifact.
    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The filename has no usable final component.
    #[error("Invalid artifact filename: {0:?}")]
    InvalidFilename(String),
}

/// Receives completed artifacts.
pub trait ArtifactSink {
    /// Persists a payload under the given filename and returns where it
    /// ended up.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be stored.
    fn save(&self, filename: &str, payload: &[u8]) -> Result<PathBuf, SinkError>;
}

/// Writes artifacts into a directory without overwriting existing files.
///
/// A name that is already taken gets a ` (n)` counter before its
/// extension, the way browsers name repeated downloads.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates a sink writing into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: PathBuf) -> Result<Self, SinkError> {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| SinkError::CreateDir {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(Self { dir })
    }

    /// Returns the user's download directory.
    ///
    /// Falls back to the current directory if it cannot be determined.
    #[must_use]
    pub fn default_dir() -> PathBuf {
        UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Creates a sink writing into the default directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_default_dir() -> Result<Self, SinkError> {
        Self::new(Self::default_dir())
    }

    /// Returns the output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidate(&self, stem: &str, extension: Option<&str>, attempt: u32) -> PathBuf {
        let name = match (attempt, extension) {
            (0, Some(ext)) => format!("{stem}.{ext}"),
            (0, None) => stem.to_string(),
            (n, Some(ext)) => format!("{stem} ({n}).{ext}"),
            (n, None) => format!("{stem} ({n})"),
        };
        self.dir.join(name)
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, filename: &str, payload: &[u8]) -> Result<PathBuf, SinkError> {
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| SinkError::InvalidFilename(filename.to_string()))?;
        let name = Path::new(name);
        let stem = name
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| SinkError::InvalidFilename(filename.to_string()))?;
        let extension = name.extension().and_then(|e| e.to_str());

        let mut attempt = 0;
        loop {
            let path = self.candidate(stem, extension, attempt);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(payload)
                        .map_err(|e| SinkError::WriteFile {
                            path: path.clone(),
                            source: e,
                        })?;
                    tracing::info!(path = %path.display(), bytes = payload.len(), "Saved artifact");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(SinkError::WriteFile { path, source: e }),
            }
        }
    }
}
