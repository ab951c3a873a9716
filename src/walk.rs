//! Directory walking and extension filtering.
//!
//! Every directory under the root is entered, hidden and build directories
//! included. Entries are sorted by file name within a directory so runs are
//! reproducible.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Root directory does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("Root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Lazily yields every regular file under `root` whose name ends with `extension`.
pub struct SourceFiles {
    inner: walkdir::IntoIter,
    extension: String,
}

impl SourceFiles {
    pub fn new(root: impl AsRef<Path>, extension: impl Into<String>) -> Result<Self, WalkError> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(WalkError::MissingRoot(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(WalkError::NotADirectory(root.to_path_buf()));
        }

        Ok(Self {
            inner: WalkDir::new(root).sort_by_file_name().into_iter(),
            extension: extension.into(),
        })
    }
}

impl fmt::Debug for SourceFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFiles")
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

/// Whether the final path component ends with `extension`.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(extension))
        .unwrap_or(false)
}

impl Iterator for SourceFiles {
    type Item = Result<PathBuf, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_default();
                    return Some(Err(WalkError::Walk { path, source }));
                }
            };

            if entry.file_type().is_file() && has_extension(entry.path(), &self.extension) {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}
