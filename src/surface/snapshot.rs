//! In-memory UI surface backed by an element tree.
//!
//! Behavior:
//! - Elements with id 0 get a fresh id (pre-order) when added.
//! - Taps and text entry are recorded as `Interaction`s; entered text replaces the field's text.
//! - Nodes can be scheduled to appear after a number of settle cycles, which lets tests
//!   exercise the cooperative waits.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace};

use super::{AppBootstrap, ElementId, ElementNode, SurfaceError, UiSurface, find_by_id};

/// An interaction performed against the snapshot surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Tap(ElementId),
    EnterText(ElementId, String),
}

#[derive(Debug, Default)]
struct State {
    roots: Vec<ElementNode>,
    pending: Vec<(usize, ElementNode)>,
    settles: usize,
    next_id: ElementId,
    interactions: Vec<Interaction>,
}

impl State {
    fn assign_ids(&mut self, node: &mut ElementNode) {
        if node.id == 0 {
            self.next_id += 1;
            node.id = self.next_id;
        } else {
            self.next_id = self.next_id.max(node.id);
        }
        for child in &mut node.children {
            self.assign_ids(child);
        }
    }

    fn push_root(&mut self, mut node: ElementNode) {
        self.assign_ids(&mut node);
        self.roots.push(node);
    }
}

/// Surface over a mutable, in-memory element forest.
#[derive(Debug, Default)]
pub struct SnapshotSurface {
    state: Mutex<State>,
}

impl SnapshotSurface {
    pub fn new(roots: Vec<ElementNode>) -> Self {
        let mut state = State::default();
        for root in roots {
            state.push_root(root);
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// Parse a JSON tree: either a single element object or a list of root elements.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let roots = match serde_json::from_str::<Value>(s)? {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<ElementNode>, _>>()?,
            other => vec![serde_json::from_value(other)?],
        };
        Ok(Self::new(roots))
    }

    /// Make `node` appear as a new root once `after_settles` more settle cycles have run.
    pub fn schedule(&self, after_settles: usize, node: ElementNode) {
        let mut state = self.lock();
        let due = state.settles + after_settles;
        state.pending.push((due, node));
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.lock().interactions.clone()
    }

    pub fn settle_count(&self) -> usize {
        self.lock().settles
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn find_by_id_mut(roots: &mut [ElementNode], id: ElementId) -> Option<&mut ElementNode> {
    for node in roots.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_by_id_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

#[async_trait]
impl UiSurface for SnapshotSurface {
    fn snapshot(&self) -> Vec<ElementNode> {
        self.lock().roots.clone()
    }

    async fn tap(&self, id: ElementId) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        if find_by_id(&state.roots, id).is_none() {
            return Err(SurfaceError::StaleElement(id));
        }
        trace!(target: "uidsl::surface", id, "tap");
        state.interactions.push(Interaction::Tap(id));
        Ok(())
    }

    async fn enter_text(&self, id: ElementId, text: &str) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        let node = find_by_id_mut(&mut state.roots, id).ok_or(SurfaceError::StaleElement(id))?;
        if !node.kind.accepts_text_input() {
            return Err(SurfaceError::NotEditable(id));
        }
        node.text = Some(text.to_string());
        trace!(target: "uidsl::surface", id, %text, "enter_text");
        state
            .interactions
            .push(Interaction::EnterText(id, text.to_string()));
        Ok(())
    }

    async fn settle(&self) {
        {
            let mut state = self.lock();
            state.settles += 1;
            let now = state.settles;
            let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut state.pending)
                .into_iter()
                .partition(|(at, _)| *at <= now);
            state.pending = waiting;
            for (_, node) in due {
                state.push_root(node);
            }
        }
        tokio::task::yield_now().await;
    }
}

/// Bootstrap hook that loads a `SnapshotSurface` from a JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotBootstrap {
    path: PathBuf,
}

impl SnapshotBootstrap {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl AppBootstrap for SnapshotBootstrap {
    async fn launch(&self) -> Result<Arc<dyn UiSurface>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read app tree {}", self.path.display()))?;
        let surface = SnapshotSurface::from_json_str(&raw)
            .with_context(|| format!("Failed to parse app tree {}", self.path.display()))?;
        debug!(target: "uidsl::surface", path = %self.path.display(), "Snapshot app ready");
        Ok(Arc::new(surface))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ElementKind;

    #[test]
    fn ids_are_assigned_in_preorder() {
        let surface = SnapshotSurface::new(vec![
            ElementNode::text("a").with_child(ElementNode::text("b")),
            ElementNode::text("c"),
        ]);
        let roots = surface.snapshot();
        assert_eq!(roots[0].id, 1);
        assert_eq!(roots[0].children[0].id, 2);
        assert_eq!(roots[1].id, 3);
    }

    #[test]
    fn parses_single_object_or_list() {
        let one = SnapshotSurface::from_json_str(r#"{"kind":"text","text":"x"}"#).unwrap();
        assert_eq!(one.snapshot().len(), 1);
        let many =
            SnapshotSurface::from_json_str(r#"[{"text":"x"},{"kind":"button","key":"go"}]"#)
                .unwrap();
        assert_eq!(many.snapshot()[1].kind, ElementKind::Button);
    }

    #[tokio::test]
    async fn scheduled_nodes_appear_after_settles() {
        let surface = SnapshotSurface::new(vec![]);
        surface.schedule(2, ElementNode::text("late"));
        surface.settle().await;
        assert!(surface.snapshot().is_empty());
        surface.settle().await;
        assert_eq!(surface.snapshot().len(), 1);
        assert_eq!(surface.settle_count(), 2);
    }

    #[tokio::test]
    async fn enter_text_updates_field_and_rejects_non_inputs() {
        let surface = SnapshotSurface::new(vec![
            ElementNode::new(ElementKind::TextInput),
            ElementNode::text("label"),
        ]);
        surface.enter_text(1, "hello").await.unwrap();
        assert_eq!(surface.snapshot()[0].text.as_deref(), Some("hello"));
        assert_eq!(
            surface.enter_text(2, "nope").await,
            Err(SurfaceError::NotEditable(2))
        );
        assert_eq!(surface.tap(99).await, Err(SurfaceError::StaleElement(99)));
        assert_eq!(
            surface.interactions(),
            vec![Interaction::EnterText(1, "hello".into())]
        );
    }
}
