/// Presentation patch commands emitted by the view layer.
///
/// The core never touches a widget toolkit. It emits `Patch` values into a
/// `PatchSink`, and whatever front end is in use binds to those commands.
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::ImageId;

static NEXT_NODE: AtomicU64 = AtomicU64::new(1);

/// Handle of one materialized image element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        NodeId(NEXT_NODE.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// One image per row, metadata beside it
    List,
    /// Images wrap into rows
    #[default]
    Grid,
}

/// Materialized state of one image as last rendered
#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    pub node: NodeId,
    pub image: ImageId,
    pub path: String,
    pub title: String,
    pub caption: String,
    pub date_text: String,
    /// Number of filled stars currently shown (may be a hover preview)
    pub filled: u8,
    pub layout: LayoutMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Drop every element and lay the root out in `layout`
    Clear { layout: LayoutMode },
    /// Append an element as the last child of the root
    Attach(ImageElement),
    Detach(NodeId),
    UpdateStars { node: NodeId, filled: u8 },
    UpdateCaption { node: NodeId, caption: String },
    UpdateDate { node: NodeId, text: String },
    /// Enlarged view of one image over the gallery
    ShowOverlay { path: String },
    HideOverlay,
}

impl Patch {
    /// Node this patch targets, if any
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Patch::Attach(element) => Some(element.node),
            Patch::Detach(node)
            | Patch::UpdateStars { node, .. }
            | Patch::UpdateCaption { node, .. }
            | Patch::UpdateDate { node, .. } => Some(*node),
            Patch::Clear { .. } | Patch::ShowOverlay { .. } | Patch::HideOverlay => None,
        }
    }
}

/// Consumer of presentation patches
pub trait PatchSink {
    fn apply(&mut self, patch: &Patch);
}

/// A plain journal: hosts that replay patches drain it.
impl PatchSink for Vec<Patch> {
    fn apply(&mut self, patch: &Patch) {
        self.push(patch.clone());
    }
}
