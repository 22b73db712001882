use overmark_model::CommandParams;

/// What a marker looks like in typed text.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    /// Paired delimiter around inline content (`**bold**`). Typing the
    /// last character of the closing delimiter triggers the conversion.
    Inline { marker: String },
    /// Prefix at the start of a plain paragraph (`# `, `- `, ` ``` `).
    /// Typing the last character of the prefix triggers the conversion.
    Block { prefix: String },
}

/// A marker plus the command the conversion executes.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDefinition {
    pub kind: MarkerKind,
    pub command: String,
    pub params: CommandParams,
}

impl MarkerDefinition {
    pub fn inline(marker: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            kind: MarkerKind::Inline {
                marker: marker.into(),
            },
            command: command.into(),
            params: CommandParams::new(),
        }
    }

    pub fn block(prefix: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            kind: MarkerKind::Block {
                prefix: prefix.into(),
            },
            command: command.into(),
            params: CommandParams::new(),
        }
    }

    pub fn with_params(mut self, params: CommandParams) -> Self {
        self.params = params;
        self
    }
}
