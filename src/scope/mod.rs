//! Scopes: named, commit-keyed selections of repository files

pub mod model;
pub mod store;
pub mod tree;

pub use model::Scope;
pub use store::{validate_scope_name, CommitContext, ScopeStore, CONTEXT_NAME};
pub use tree::{Node, ScopeTree};
