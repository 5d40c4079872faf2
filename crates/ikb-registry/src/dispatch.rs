//! Tag-to-handler dispatch table.

use indexmap::IndexMap;
use serde::Serialize;

use crate::types::ComponentSpec;

/// Handler used for tags without a registered handler.
pub const DEFAULT_HANDLER: &str = "container";

/// Explicit map from tag name to render handler name, built when a registry
/// is loaded. Renderers use it instead of deriving method names from tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagDispatch {
    handlers: IndexMap<String, String>,
}

impl TagDispatch {
    pub fn from_components<'a>(components: impl IntoIterator<Item = &'a ComponentSpec>) -> Self {
        let handlers = components
            .into_iter()
            .map(|c| {
                let handler = c.handler.clone().unwrap_or_else(|| c.name.clone());
                (c.name.clone(), handler)
            })
            .collect();
        Self { handlers }
    }

    /// Handler for a canonical tag name; total, falling back to [`DEFAULT_HANDLER`].
    pub fn handler_for(&self, tag: &str) -> &str {
        self.handlers
            .get(tag)
            .map_or(DEFAULT_HANDLER, String::as_str)
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.handlers
            .iter()
            .map(|(tag, handler)| (tag.as_str(), handler.as_str()))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_defaults_to_tag_name() {
        let mut image = ComponentSpec::new("ikb_image", "media");
        image.handler = Some("wp_image".to_string());
        let text = ComponentSpec::new("ikb_text", "basic");
        let dispatch = TagDispatch::from_components([&image, &text]);

        assert_eq!(dispatch.handler_for("ikb_image"), "wp_image");
        assert_eq!(dispatch.handler_for("ikb_text"), "ikb_text");
        assert_eq!(dispatch.handler_for("made_up"), DEFAULT_HANDLER);
        assert!(!dispatch.is_registered("made_up"));
        assert_eq!(dispatch.len(), 2);
    }
}
