//! Small shared helpers.

pub mod binary;
pub mod fs;
pub mod paths;
pub mod tokens;

pub use binary::is_binary_content;
pub use fs::write_atomic;
pub use paths::{last_component, normalize_path};
pub use tokens::estimate_tokens;
