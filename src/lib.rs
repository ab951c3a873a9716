//! Reminder Fixer: batch source rewriting for field renames and argument injection
//!
//! Walks a source tree and, for every file with the configured extension,
//! runs an ordered list of text passes:
//!
//! 1. rename a field wherever it is used bare (`r.remindAt`)
//! 2. rename it where it is used as a key (`remindAt: t`)
//! 3. add a missing named argument to constructor calls that carry a sibling
//!    argument (`Reminder(patientId: p)` gains `caregiverId: ''`)
//!
//! A file is written back only when its text changed, and every written file
//! is reported.
//!
//! # Architecture
//!
//! - [`config`] describes rules as TOML and validates them
//! - [`rewrite`] compiles rules into [`rewrite::Pass`]es and runs them on text
//! - [`walk`] finds the files to process
//! - [`edit`] writes results back atomically, guarded by a content hash
//! - [`runner`] ties them together one file at a time
//!
//! # Example
//!
//! ```no_run
//! use reminder_fixer::{run, RuleSet, Rewriter, WriteMode};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rules = RuleSet::builtin();
//! let rewriter = Rewriter::new(&rules)?;
//! run(&rewriter, Path::new("lib"), ".dart", WriteMode::Write, |fixed| {
//!     println!("Fixed {}", fixed.path.display());
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod edit;
pub mod rewrite;
pub mod runner;
pub mod walk;

// Re-exports
pub use config::{
    discover, load_from_path, load_from_str, ConfigError, RuleDefinition, RuleSet, ScanMode,
};
pub use edit::{EditError, EditResult, FileRewrite};
pub use rewrite::{Rewrite, RewriteError, Rewriter};
pub use runner::{rewrite_file, run, FixedFile, RunError, RunSummary, WriteMode};
pub use walk::{SourceFiles, WalkError};
