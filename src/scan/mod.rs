//! Scope candidate discovery: ignore rules plus full and diff scans

pub mod builder;
pub mod matcher;

pub use builder::ScopeBuilder;
pub use matcher::{normalize_extension, parse_ignore_file, PathMatcher, DEFAULT_IGNORE_RULES};
