//! Tree runner - reads, rewrites and writes back every matching file
//!
//! Files are processed one at a time in walk order. The first error stops the
//! run; files already written stay written.

use crate::edit::{EditError, EditResult, FileRewrite};
use crate::rewrite::Rewriter;
use crate::walk::{SourceFiles, WalkError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Whether changed files are written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Write,
    DryRun,
}

/// A file whose content the rules changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedFile {
    pub path: PathBuf,
    pub original: String,
    pub fixed: String,
    pub changed_by: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub scanned: usize,
    pub fixed: Vec<PathBuf>,
}

/// Rewrite a single file's text. `None` means the rules left it unchanged.
pub fn rewrite_file(rewriter: &Rewriter, path: &Path) -> Result<Option<FixedFile>, RunError> {
    let original = fs::read_to_string(path).map_err(|source| RunError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let rewrite = rewriter.rewrite(&original);
    if !rewrite.is_changed() {
        return Ok(None);
    }

    let changed_by = rewrite.changed_by;
    let fixed = rewrite.text.into_owned();
    Ok(Some(FixedFile {
        path: path.to_path_buf(),
        original,
        fixed,
        changed_by,
    }))
}

/// Walk `root`, rewrite every file ending in `extension`, and call `on_fixed`
/// for each changed file once it has been written (or would be, in dry-run).
pub fn run<F>(
    rewriter: &Rewriter,
    root: &Path,
    extension: &str,
    mode: WriteMode,
    mut on_fixed: F,
) -> Result<RunSummary, RunError>
where
    F: FnMut(&FixedFile),
{
    let mut summary = RunSummary::default();

    for path in SourceFiles::new(root, extension)? {
        let path = path?;
        summary.scanned += 1;
        tracing::debug!(path = %path.display(), "scanning");

        let Some(fixed) = rewrite_file(rewriter, &path)? else {
            continue;
        };

        if mode == WriteMode::Write {
            let edit = FileRewrite::new(&fixed.path, &fixed.original, fixed.fixed.as_str());
            match edit.apply()? {
                EditResult::Written { bytes, .. } => {
                    tracing::info!(
                        path = %fixed.path.display(),
                        bytes,
                        passes = ?fixed.changed_by,
                        "fixed"
                    );
                }
                EditResult::Unchanged { .. } => continue,
            }
        }

        on_fixed(&fixed);
        summary.fixed.push(fixed.path);
    }

    Ok(summary)
}
