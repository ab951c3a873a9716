use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// A whole-file replacement, guarded by the hash of the text it was computed from.
///
/// The rewriter reads a file, computes new text, and only then writes. The
/// hash taken at read time lets [`FileRewrite::apply`] refuse to overwrite a
/// file that changed in between.
///
/// The write goes to a temporary sibling that is renamed over the target.
/// Permission bits are carried over, but hard links to the old file are
/// broken and ownership becomes that of the writing process.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileRewrite does nothing until apply() is called"]
pub struct FileRewrite {
    /// File to overwrite
    pub file: PathBuf,
    /// xxh3 of the content the new text was derived from
    pub before_hash: u64,
    /// Complete replacement content
    pub new_text: String,
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("File changed on disk since it was read: {file}")]
    ContentChanged { file: PathBuf },

    #[error("Path has no parent directory: {0}")]
    NoParent(PathBuf),

    #[error("File I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EditError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| EditError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of applying a [`FileRewrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditResult should be checked for written/unchanged"]
pub enum EditResult {
    /// New content was written
    Written { file: PathBuf, bytes: usize },
    /// Disk content already equals the new text
    Unchanged { file: PathBuf },
}

impl FileRewrite {
    pub fn new(file: impl Into<PathBuf>, before: &str, new_text: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            before_hash: xxh3_64(before.as_bytes()),
            new_text: new_text.into(),
        }
    }

    /// Overwrite the file with `new_text`.
    ///
    /// The file is re-read first: if it already holds `new_text` nothing is
    /// written; if it no longer hashes to `before_hash` the write is refused.
    pub fn apply(&self) -> Result<EditResult, EditError> {
        let current = fs::read(&self.file).map_err(EditError::io(&self.file))?;

        if current == self.new_text.as_bytes() {
            return Ok(EditResult::Unchanged {
                file: self.file.clone(),
            });
        }

        if xxh3_64(&current) != self.before_hash {
            return Err(EditError::ContentChanged {
                file: self.file.clone(),
            });
        }

        atomic_write(&self.file, self.new_text.as_bytes())?;

        Ok(EditResult::Written {
            file: self.file.clone(),
            bytes: self.new_text.len(),
        })
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The temp file takes over the permission bits of the file it replaces.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !parent.is_dir() {
        return Err(EditError::NoParent(path.to_path_buf()));
    }

    let permissions = fs::metadata(path)
        .map_err(EditError::io(path))?
        .permissions();

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(EditError::io(parent))?;
    temp.write_all(content).map_err(EditError::io(path))?;
    temp.as_file().sync_all().map_err(EditError::io(path))?;
    fs::set_permissions(temp.path(), permissions).map_err(EditError::io(path))?;

    temp.persist(path).map_err(|e| EditError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}
