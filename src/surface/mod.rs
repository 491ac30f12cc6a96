/*!
UI automation surface.

The runner never talks to a concrete toolkit. It consumes two narrow seams:
- `UiSurface`: enumerate elements, trigger interactions, and settle pending UI work.
- `AppBootstrap`: start the application under test and hand back a ready surface.

`SnapshotSurface` is an in-memory implementation backed by a JSON element tree. The CLI
uses it for headless runs and the test suites use it everywhere.
*/

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod snapshot;

pub use snapshot::{Interaction, SnapshotBootstrap, SnapshotSurface};

/// Identifier of an element within a surface. Stable for the element's lifetime.
pub type ElementId = u64;

/// Errors reported by a surface while interacting with an element.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("element #{0} is no longer present")]
    StaleElement(ElementId),

    #[error("element #{0} does not accept text input")]
    NotEditable(ElementId),

    #[error("surface error: {0}")]
    Other(String),
}

/// Concrete UI element categories a `type:` selector can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Text,
    RichText,
    TextInput,
    Button,
    IconButton,
    Checkbox,
    Switch,
    Radio,
    Image,
    Icon,
    List,
    Container,
    #[default]
    #[serde(other)]
    Other,
}

impl ElementKind {
    /// Map a friendly widget-type name to a category (case-insensitive).
    /// Names outside the allow-list return `None`.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "richtext" => Self::RichText,
            "textfield" | "textformfield" | "input" | "textinput" => Self::TextInput,
            "button" | "elevatedbutton" | "textbutton" | "outlinedbutton" | "filledbutton" => {
                Self::Button
            }
            "iconbutton" => Self::IconButton,
            "checkbox" => Self::Checkbox,
            "switch" => Self::Switch,
            "radio" => Self::Radio,
            "image" => Self::Image,
            "icon" => Self::Icon,
            "listview" | "list" => Self::List,
            "container" => Self::Container,
            _ => return None,
        };
        Some(kind)
    }

    pub fn accepts_text_input(self) -> bool {
        matches!(self, Self::TextInput)
    }
}

/// One element of the UI tree as reported by a surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    /// Assigned by the surface when left as 0.
    #[serde(default)]
    pub id: ElementId,

    #[serde(default)]
    pub kind: ElementKind,

    /// Developer-assigned key / id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Semantic (accessibility) label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Direct text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Composed text, one entry per span.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rich_text: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Convenience constructor for a plain text element.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Text,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_rich_text<I, S>(mut self, spans: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rich_text = spans.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// The element's own text: direct text content, else its composed text flattened.
    pub fn own_text(&self) -> Option<String> {
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            return Some(text.to_string());
        }
        let flattened: String = self.rich_text.concat();
        (!flattened.is_empty()).then_some(flattened)
    }

    /// Text used for assertions: the element's own text, else the first non-empty text
    /// found among its descendants (pre-order).
    pub fn extract_text(&self) -> Option<String> {
        self.own_text().or_else(|| {
            self.children
                .iter()
                .find_map(|child| child.extract_text())
        })
    }
}

/// Walk a forest in document (pre-order) order.
pub fn walk<'a>(roots: &'a [ElementNode], visit: &mut dyn FnMut(&'a ElementNode)) {
    for node in roots {
        visit(node);
        walk(&node.children, visit);
    }
}

/// Find an element by id anywhere in a forest.
pub fn find_by_id(roots: &[ElementNode], id: ElementId) -> Option<&ElementNode> {
    roots.iter().find_map(|node| {
        if node.id == id {
            Some(node)
        } else {
            find_by_id(&node.children, id)
        }
    })
}

/// The external capability that can enumerate elements, trigger interactions, and report
/// when the UI has stabilized after an action.
#[async_trait]
pub trait UiSurface: Send + Sync {
    /// Current element forest in document order.
    fn snapshot(&self) -> Vec<ElementNode>;

    /// Trigger the primary interaction (tap/click) on an element.
    async fn tap(&self, id: ElementId) -> Result<(), SurfaceError>;

    /// Enter text into an element.
    async fn enter_text(&self, id: ElementId, text: &str) -> Result<(), SurfaceError>;

    /// Run pending interaction/render cycles until the UI is stable.
    async fn settle(&self);
}

/// Starts the application under test and returns once it is ready for interaction.
#[async_trait]
pub trait AppBootstrap: Send + Sync {
    async fn launch(&self) -> anyhow::Result<Arc<dyn UiSurface>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_are_case_insensitive() {
        assert_eq!(
            ElementKind::from_type_name("TextField"),
            Some(ElementKind::TextInput)
        );
        assert_eq!(
            ElementKind::from_type_name("elevatedbutton"),
            Some(ElementKind::Button)
        );
        assert_eq!(ElementKind::from_type_name("UnknownWidget"), None);
    }

    #[test]
    fn extract_text_prefers_direct_then_rich_then_descendants() {
        let direct = ElementNode::text("Hello").with_rich_text(["ignored"]);
        assert_eq!(direct.extract_text().as_deref(), Some("Hello"));

        let rich = ElementNode::new(ElementKind::RichText).with_rich_text(["Thank ", "you"]);
        assert_eq!(rich.extract_text().as_deref(), Some("Thank you"));

        let nested = ElementNode::new(ElementKind::Button)
            .with_child(ElementNode::new(ElementKind::Icon))
            .with_child(ElementNode::text("Submit"));
        assert_eq!(nested.extract_text().as_deref(), Some("Submit"));

        assert_eq!(ElementNode::new(ElementKind::Container).extract_text(), None);
    }

    #[test]
    fn walk_is_preorder() {
        let roots = vec![
            ElementNode::text("a").with_child(ElementNode::text("b")),
            ElementNode::text("c"),
        ];
        let mut seen = Vec::new();
        walk(&roots, &mut |n: &ElementNode| seen.push(n.text.clone().unwrap_or_default()));
        assert_eq!(seen, ["a", "b", "c"]);
    }

    #[test]
    fn unknown_kind_deserializes_as_other() {
        let node: ElementNode =
            serde_json::from_str(r#"{"kind":"slider","text":"x"}"#).unwrap();
        assert_eq!(node.kind, ElementKind::Other);
    }
}
