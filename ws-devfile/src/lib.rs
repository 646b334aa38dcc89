//! Devfile processing library.
//!
//! Takes the raw devfile YAML found in a project repository through to the
//! flat, self-contained document a workspace is provisioned from.
//!
//! ## Main Features
//! - YAML parsing into an untyped document ([`parse`])
//! - Structural checks before merging ([`validate::PreFlattenValidator`])
//! - Parent and plugin resolution with override-by-key merging ([`flatten`])
//! - Typed, schema-checked devfile model ([`model`])
//! - Workspace-specific checks on the merged result ([`validate::PostFlattenValidator`])

pub mod error;
pub mod flatten;
pub mod import;
pub mod merge;
pub mod model;
pub mod parse;
pub mod validate;

pub use error::DevfileError;
pub use flatten::flatten;
pub use import::{ImportReference, ImportResolver, ResolvedImport, StaticImportResolver};
pub use model::{Component, Container, Devfile};
pub use parse::{parse_devfile_yaml, to_yaml};
