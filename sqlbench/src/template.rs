//! Query templates with per-execution `%guid%` substitution.
use sqlbench_core::GUID_MARKER;
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct QueryTemplate {
    text: Arc<str>,
    has_marker: bool,
}

impl QueryTemplate {
    pub fn new(text: &str) -> Self {
        Self {
            text: Arc::from(text),
            has_marker: text.contains(GUID_MARKER),
        }
    }

    /// Use the contents of `query_or_path` if it names an existing file, otherwise the value
    /// itself.
    pub fn load(query_or_path: &str) -> std::io::Result<Self> {
        let path = Path::new(query_or_path);
        if path.is_file() {
            let text = std::fs::read_to_string(path)?;
            info!("Loaded query from file: {query_or_path}");
            Ok(Self::new(&text))
        } else {
            Ok(Self::new(query_or_path))
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Render one execution instance. Every marker is replaced by the same freshly generated
    /// UUID; a new UUID is generated on each call.
    pub fn render(&self) -> Cow<'_, str> {
        if self.has_marker {
            Cow::Owned(self.render_with(&Uuid::new_v4()))
        } else {
            Cow::Borrowed(&self.text)
        }
    }

    pub fn render_with(&self, token: &Uuid) -> String {
        self.text.replace(GUID_MARKER, &token.hyphenated().to_string())
    }
}
