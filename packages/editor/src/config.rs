use serde::{Deserialize, Serialize};

/// Editor configuration, deserializable from host-provided JSON.
/// Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Number of heading levels commands and `#` prefixes reach
    /// (`heading1`..`heading<n>`).
    pub heading_levels: u8,
    /// Register the inline delimiters (`**`, `*`, `~`, `` ` ``).
    pub inline_formatting: bool,
    /// Register the block prefixes (`# `, `- `, `> `, ...).
    pub block_formatting: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            heading_levels: 3,
            inline_formatting: true,
            block_formatting: true,
        }
    }
}
