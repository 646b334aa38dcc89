use super::context::{Context, CreateParams};
use crate::inventory::{Agent, AgentConfig, Project, User};
use crate::settings::Settings;
use crate::workspace::WorkspaceState;
use ws_devfile::{flatten, parse_devfile_yaml, StaticImportResolver};

pub(crate) fn params() -> CreateParams {
    CreateParams {
        agent: Agent {
            id: 7,
            name: "007".to_string(),
            project_id: 2,
            root_namespace: "acme".to_string(),
            config: Some(AgentConfig {
                enabled: true,
                dns_zone: "workspaces.localdev.me".to_string(),
                max_hours_before_termination_limit: 120,
            }),
        },
        project: Project {
            id: 1,
            name: "Storefront".to_string(),
            path: "storefront".to_string(),
            path_with_namespace: "acme/shop/storefront".to_string(),
            root_namespace: "acme".to_string(),
            http_url_to_repo: "https://git.example.com/acme/shop/storefront.git".to_string(),
            repository_path: "/nonexistent".to_string(),
        },
        editor: "webide".to_string(),
        desired_state: WorkspaceState::Running,
        max_hours_before_termination: 24,
        devfile_ref: "main".to_string(),
        devfile_path: ".devfile.yaml".to_string(),
        variables: Vec::new(),
    }
}

pub(crate) fn context() -> Context {
    Context::new(
        params(),
        User {
            id: 3,
            username: "ada".to_string(),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        },
        Settings::default(),
    )
}

/// Context positioned right after flattening `yaml`.
pub(crate) fn processed_context(yaml: &str) -> Context {
    let document = parse_devfile_yaml(yaml).expect("devfile should parse");
    let mut context = context();
    context.processed_devfile =
        Some(flatten(&document, &StaticImportResolver::new()).expect("devfile should flatten"));
    context.devfile_yaml = Some(yaml.to_string());
    context.devfile = Some(document);
    context
}
