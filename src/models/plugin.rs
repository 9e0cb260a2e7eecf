use serde::{Deserialize, Serialize};

/// A route a plugin registers with the shell once it has loaded.
/// The `link` is unique across all registered plugins.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PluginRoute {
    pub section: String,
    pub link: String,
    pub plugin: String,
    pub display_name: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}
