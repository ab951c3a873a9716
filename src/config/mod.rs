pub mod loader;
pub mod schema;

pub use loader::{discover, load_from_path, load_from_str, ConfigError, DEFAULT_RULES_FILE};
pub use schema::{
    is_identifier, Metadata, RuleDefinition, RuleSet, ScanMode, ValidationError, ValidationIssue,
    DEFAULT_EXTENSION,
};
