//! Variables every workspace is created with.

use super::context::VariableParams;
use crate::settings::Settings;
use crate::workspace::VariableType;

pub const FILE_VARIABLES_DIR: &str = "/.workspace-data/variables/file";
pub const TOKEN_FILE_NAME: &str = "ws_token";
pub const GIT_CREDENTIAL_STORE_FILE_NAME: &str = "ws_git_credential_store.sh";

const GIT_CREDENTIAL_STORE_SCRIPT: &str = r#"#!/bin/sh
# Read-only store: git's store and erase requests are ignored.
if [ "$1" != "get" ]; then
  exit 0
fi

if [ -z "${WS_TOKEN_FILE_PATH}" ]; then
  echo "WS_TOKEN_FILE_PATH is not set" >&2
  exit 1
fi

echo "username=oauth2"
echo "password=$(cat "${WS_TOKEN_FILE_PATH}")"
exit 0
"#;

pub struct StandardVariables<'a> {
    pub workspace_name: &'a str,
    pub dns_zone: &'a str,
    pub personal_access_token: &'a str,
    pub user_name: &'a str,
    pub user_email: &'a str,
    pub settings: &'a Settings,
}

fn variable(key: &str, value: impl Into<String>, variable_type: VariableType) -> VariableParams {
    VariableParams {
        key: key.to_string(),
        value: value.into(),
        variable_type,
    }
}

impl StandardVariables<'_> {
    pub fn build(&self) -> Vec<VariableParams> {
        use VariableType::{Environment, File};

        let token_path = format!("{}/{}", FILE_VARIABLES_DIR, TOKEN_FILE_NAME);
        let credential_store_path =
            format!("{}/{}", FILE_VARIABLES_DIR, GIT_CREDENTIAL_STORE_FILE_NAME);

        let mut variables = vec![
            variable(TOKEN_FILE_NAME, self.personal_access_token, File),
            variable(GIT_CREDENTIAL_STORE_FILE_NAME, GIT_CREDENTIAL_STORE_SCRIPT, File),
            variable("GIT_CONFIG_COUNT", "3", Environment),
            variable("GIT_CONFIG_KEY_0", "credential.helper", Environment),
            variable("GIT_CONFIG_VALUE_0", credential_store_path.as_str(), Environment),
            variable("GIT_CONFIG_KEY_1", "user.name", Environment),
            variable("GIT_CONFIG_VALUE_1", self.user_name, Environment),
            variable("GIT_CONFIG_KEY_2", "user.email", Environment),
            variable("GIT_CONFIG_VALUE_2", self.user_email, Environment),
            variable("WS_GIT_CREDENTIAL_STORE_FILE_PATH", credential_store_path.as_str(), Environment),
            variable("WS_TOKEN_FILE_PATH", token_path, Environment),
            variable(
                "WS_WORKSPACE_DOMAIN_TEMPLATE",
                format!("${{PORT}}-{}.{}", self.workspace_name, self.dns_zone),
                Environment,
            ),
        ];

        if self.settings.allow_extensions_marketplace {
            let gallery = &self.settings.extensions_gallery;
            variables.extend([
                variable(
                    "WS_EDITOR_EXTENSIONS_GALLERY_SERVICE_URL",
                    gallery.service_url.as_str(),
                    Environment,
                ),
                variable(
                    "WS_EDITOR_EXTENSIONS_GALLERY_ITEM_URL",
                    gallery.item_url.as_str(),
                    Environment,
                ),
                variable(
                    "WS_EDITOR_EXTENSIONS_GALLERY_RESOURCE_URL_TEMPLATE",
                    gallery.resource_url_template.as_str(),
                    Environment,
                ),
            ]);
        }

        variables
    }
}
