/// Headless retained presentation tree.
///
/// Applies patches to an in-memory model of what is on screen. The iced
/// front end draws straight from it, and tests inspect it without a window.
use super::patch::{ImageElement, LayoutMode, NodeId, Patch, PatchSink};
use crate::state::ImageId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresentationTree {
    layout: LayoutMode,
    elements: Vec<ImageElement>,
    overlay: Option<String>,
}

impl PresentationTree {
    pub fn new(layout: LayoutMode) -> Self {
        Self {
            layout,
            elements: Vec::new(),
            overlay: None,
        }
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    /// Root children in display order
    pub fn elements(&self) -> &[ImageElement] {
        &self.elements
    }

    pub fn element(&self, node: NodeId) -> Option<&ImageElement> {
        self.elements.iter().find(|element| element.node == node)
    }

    pub fn element_for(&self, image: ImageId) -> Option<&ImageElement> {
        self.elements.iter().find(|element| element.image == image)
    }

    /// Path of the enlarged image, if the overlay is open
    pub fn overlay(&self) -> Option<&str> {
        self.overlay.as_deref()
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ImageElement> {
        let found = self.elements.iter_mut().find(|element| element.node == node);
        if found.is_none() {
            tracing::warn!(?node, "patch targets a node that is not attached");
        }
        found
    }
}

impl PatchSink for PresentationTree {
    fn apply(&mut self, patch: &Patch) {
        match patch {
            Patch::Clear { layout } => {
                self.elements.clear();
                self.layout = *layout;
            }
            Patch::Attach(element) => self.elements.push(element.clone()),
            Patch::Detach(node) => self.elements.retain(|element| element.node != *node),
            Patch::UpdateStars { node, filled } => {
                if let Some(element) = self.element_mut(*node) {
                    element.filled = *filled;
                }
            }
            Patch::UpdateCaption { node, caption } => {
                if let Some(element) = self.element_mut(*node) {
                    element.caption = caption.clone();
                }
            }
            Patch::UpdateDate { node, text } => {
                if let Some(element) = self.element_mut(*node) {
                    element.date_text = text.clone();
                }
            }
            Patch::ShowOverlay { path } => self.overlay = Some(path.clone()),
            Patch::HideOverlay => self.overlay = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(title: &str) -> ImageElement {
        ImageElement {
            node: NodeId::next(),
            image: crate::state::Image::new(title, chrono::Utc::now(), "", 0).id(),
            path: title.to_string(),
            title: title.to_string(),
            caption: String::new(),
            date_text: "1/1/2020".to_string(),
            filled: 0,
            layout: LayoutMode::Grid,
        }
    }

    #[test]
    fn test_attach_update_detach() {
        let mut tree = PresentationTree::new(LayoutMode::Grid);
        let a = element("a.jpg");
        let b = element("b.jpg");
        tree.apply(&Patch::Attach(a.clone()));
        tree.apply(&Patch::Attach(b.clone()));

        tree.apply(&Patch::UpdateStars { node: a.node, filled: 4 });
        assert_eq!(tree.element(a.node).map(|e| e.filled), Some(4));

        tree.apply(&Patch::Detach(a.node));
        assert_eq!(tree.elements(), &[b]);
    }

    #[test]
    fn test_clear_switches_layout() {
        let mut tree = PresentationTree::new(LayoutMode::Grid);
        tree.apply(&Patch::Attach(element("a.jpg")));

        tree.apply(&Patch::Clear { layout: LayoutMode::List });

        assert!(tree.elements().is_empty());
        assert_eq!(tree.layout(), LayoutMode::List);
    }

    #[test]
    fn test_update_unknown_node_is_ignored() {
        let mut tree = PresentationTree::new(LayoutMode::Grid);
        let before = tree.clone();
        tree.apply(&Patch::UpdateDate { node: NodeId::next(), text: "x".into() });
        assert_eq!(tree, before);
    }

    #[test]
    fn test_overlay() {
        let mut tree = PresentationTree::default();
        tree.apply(&Patch::ShowOverlay { path: "a.jpg".into() });
        assert_eq!(tree.overlay(), Some("a.jpg"));
        tree.apply(&Patch::HideOverlay);
        assert_eq!(tree.overlay(), None);
    }
}
