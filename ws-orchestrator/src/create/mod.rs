//! Workspace creation.
//!
//! [`CreateWorkspace`] chains the stages below over a [`Context`]. Fallible
//! stages end the run with a [`Message`]; transformer stages only reshape the
//! processed devfile.

pub mod authorizer;
pub mod context;
pub mod creator;
pub mod devfile_fetcher;
pub mod devfile_flattener;
pub mod main;
pub mod messages;
pub mod personal_access_token_creator;
pub mod post_flatten_devfile_validator;
pub mod pre_flatten_devfile_validator;
pub mod project_cloner_component_injector;
pub mod tools_component_injector;
pub mod volume_component_injector;
pub mod volume_definer;
pub mod workspace_creator;
pub mod workspace_variables;
pub mod workspace_variables_creator;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{Context, CreateParams, VariableParams};
pub use creator::{NameSuffixGenerator, RandomNameSuffix};
pub use main::CreateWorkspace;
pub use messages::{Message, Reason, Response, ResponseStatus, UnmatchedResultError};
