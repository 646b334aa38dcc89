use serde::{Deserialize, Serialize};

pub const DEFAULT_PROJECT_CLONER_IMAGE: &str = "alpine/git:2.45.2";
pub const DEFAULT_TOOLS_INJECTOR_IMAGE: &str =
    "registry.gitlab.com/gitlab-org/gitlab-web-ide-vscode-fork/web-ide-injector:6";

/// Extension gallery endpoints handed to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionsGallery {
    pub service_url: String,
    pub item_url: String,
    pub resource_url_template: String,
}

impl Default for ExtensionsGallery {
    fn default() -> Self {
        Self {
            service_url: "https://open-vsx.org/vscode/gallery".to_string(),
            item_url: "https://open-vsx.org/vscode/item".to_string(),
            resource_url_template:
                "https://open-vsx.org/vscode/unpkg/{publisher}/{name}/{version}/{path}".to_string(),
        }
    }
}

/// Process-wide settings for workspace creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub project_cloner_image: String,
    pub tools_injector_image: String,
    /// Used instead of `tools_injector_image` when the marketplace is disabled.
    pub tools_injector_image_override: Option<String>,
    pub allow_extensions_marketplace: bool,
    pub extensions_gallery: ExtensionsGallery,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_cloner_image: DEFAULT_PROJECT_CLONER_IMAGE.to_string(),
            tools_injector_image: DEFAULT_TOOLS_INJECTOR_IMAGE.to_string(),
            tools_injector_image_override: None,
            allow_extensions_marketplace: true,
            extensions_gallery: ExtensionsGallery::default(),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let gallery = defaults.extensions_gallery;

        Self {
            project_cloner_image: env_or("WS_PROJECT_CLONER_IMAGE", defaults.project_cloner_image),
            tools_injector_image: env_or("WS_TOOLS_INJECTOR_IMAGE", defaults.tools_injector_image),
            tools_injector_image_override: std::env::var("WS_TOOLS_INJECTOR_IMAGE_OVERRIDE")
                .ok()
                .filter(|value| !value.is_empty()),
            allow_extensions_marketplace: std::env::var("WS_ALLOW_EXTENSIONS_MARKETPLACE")
                .ok()
                .and_then(|value| parse_bool(&value))
                .unwrap_or(defaults.allow_extensions_marketplace),
            extensions_gallery: ExtensionsGallery {
                service_url: env_or("WS_VSCODE_EXTENSIONS_GALLERY_SERVICE_URL", gallery.service_url),
                item_url: env_or("WS_VSCODE_EXTENSIONS_GALLERY_ITEM_URL", gallery.item_url),
                resource_url_template: env_or(
                    "WS_VSCODE_EXTENSIONS_GALLERY_RESOURCE_URL_TEMPLATE",
                    gallery.resource_url_template,
                ),
            },
        }
    }

    /// Image for the tools injector component.
    pub fn tools_injector_image(&self) -> &str {
        match &self.tools_injector_image_override {
            Some(image) if !self.allow_extensions_marketplace => image,
            _ => &self.tools_injector_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.project_cloner_image, "alpine/git:2.45.2");
        assert!(settings.allow_extensions_marketplace);
        assert_eq!(settings.tools_injector_image(), DEFAULT_TOOLS_INJECTOR_IMAGE);
    }

    #[test]
    fn test_override_image_only_without_marketplace() {
        let mut settings = Settings {
            tools_injector_image_override: Some("registry.example.com/injector:patched".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.tools_injector_image(), DEFAULT_TOOLS_INJECTOR_IMAGE);

        settings.allow_extensions_marketplace = false;
        assert_eq!(
            settings.tools_injector_image(),
            "registry.example.com/injector:patched"
        );
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
