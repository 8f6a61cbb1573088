/// Per-image presentation wrapper.
///
/// A renderer knows how to materialize one image into an `ImageElement` and
/// how to patch that element in place. It is not bound live to the image:
/// the collection view tells it when to refresh.
use super::patch::{ImageElement, LayoutMode, NodeId, Patch};
use crate::state::{Image, MAX_RATING};

/// Day/month/year, calendar month
pub const DEFAULT_DATE_FORMAT: &str = "%-d/%-m/%Y";

/// Input affordances an image element exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    /// 1-based star index
    Star(u8),
    Unrate,
    Delete,
    Enlarge,
}

/// Model mutation requested by an affordance.
///
/// Returned instead of performed so the caller can release any borrow on
/// the view before the mutation's events come back to it.
#[derive(Debug, Clone)]
pub enum ModelChange {
    SetRating(Image, u8),
    Die(Image),
}

impl ModelChange {
    pub fn apply(self) {
        match self {
            ModelChange::SetRating(image, rating) => image.set_rating(rating),
            ModelChange::Die(image) => image.die(),
        }
    }
}

#[derive(Debug)]
pub struct ImageRenderer {
    image: Image,
    layout: LayoutMode,
    date_format: String,
    element: Option<NodeId>,
    /// Star count shown while the pointer hovers a star
    preview: Option<u8>,
}

impl ImageRenderer {
    pub fn new(image: Image, layout: LayoutMode, date_format: impl Into<String>) -> Self {
        Self {
            image,
            layout,
            date_format: date_format.into(),
            element: None,
            preview: None,
        }
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Rebind to another image. The element is stale until the next `materialize`.
    pub fn set_image(&mut self, image: Image) {
        self.image = image;
        self.preview = None;
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn set_layout_mode(&mut self, layout: LayoutMode) {
        self.layout = layout;
    }

    pub fn element(&self) -> Option<NodeId> {
        self.element
    }

    pub fn date_text(&self) -> String {
        self.image
            .modification_date()
            .format(&self.date_format)
            .to_string()
    }

    /// Stars currently shown: the hover preview if any, else the stored rating
    pub fn displayed_stars(&self) -> u8 {
        self.preview.unwrap_or_else(|| self.image.rating())
    }

    /// Produce a fresh element for the image's current state.
    pub fn materialize(&mut self) -> ImageElement {
        let node = NodeId::next();
        self.element = Some(node);
        self.preview = None;

        ImageElement {
            node,
            image: self.image.id(),
            path: self.image.path().to_string(),
            title: self.image.file_name(),
            caption: self.image.caption(),
            date_text: self.date_text(),
            filled: self.image.rating(),
            layout: self.layout,
        }
    }

    /// In-place update of the stars, caption and date. No re-materialization.
    pub fn refresh(&mut self) -> Vec<Patch> {
        let Some(node) = self.element else {
            return Vec::new();
        };
        self.preview = None;

        vec![
            Patch::UpdateStars {
                node,
                filled: self.image.rating(),
            },
            Patch::UpdateCaption {
                node,
                caption: self.image.caption(),
            },
            Patch::UpdateDate {
                node,
                text: self.date_text(),
            },
        ]
    }

    /// Forget the element and return the patch removing it from the tree
    pub fn detach(&mut self) -> Option<Patch> {
        self.preview = None;
        self.element.take().map(Patch::Detach)
    }

    pub fn hover_star(&mut self, star: u8) -> Option<Patch> {
        let node = self.element?;
        let star = star.clamp(1, MAX_RATING);
        self.preview = Some(star);
        Some(Patch::UpdateStars { node, filled: star })
    }

    /// Pointer left the stars: show the stored rating again, not the preview.
    pub fn hover_end(&mut self) -> Option<Patch> {
        let node = self.element?;
        self.preview = None;
        Some(Patch::UpdateStars {
            node,
            filled: self.image.rating(),
        })
    }

    pub fn activate(&mut self, affordance: Affordance) -> (Vec<Patch>, Option<ModelChange>) {
        match affordance {
            Affordance::Star(star) => {
                let star = star.clamp(1, MAX_RATING);
                self.preview = None;
                let patches = self
                    .element
                    .map(|node| Patch::UpdateStars { node, filled: star })
                    .into_iter()
                    .collect();
                (patches, Some(ModelChange::SetRating(self.image.clone(), star)))
            }
            Affordance::Unrate => {
                self.preview = None;
                (Vec::new(), Some(ModelChange::SetRating(self.image.clone(), 0)))
            }
            Affordance::Delete => (Vec::new(), Some(ModelChange::Die(self.image.clone()))),
            Affordance::Enlarge => (
                vec![Patch::ShowOverlay {
                    path: self.image.path().to_string(),
                }],
                None,
            ),
        }
    }
}

/// Creates renderers for a collection view
pub trait RendererFactory {
    fn create_renderer(&self, image: Image) -> ImageRenderer;
}

#[derive(Debug, Clone)]
pub struct DefaultRendererFactory {
    pub layout: LayoutMode,
    pub date_format: String,
}

impl DefaultRendererFactory {
    pub fn new(layout: LayoutMode) -> Self {
        Self {
            layout,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl Default for DefaultRendererFactory {
    fn default() -> Self {
        Self::new(LayoutMode::default())
    }
}

impl RendererFactory for DefaultRendererFactory {
    fn create_renderer(&self, image: Image) -> ImageRenderer {
        ImageRenderer::new(image, self.layout, self.date_format.clone())
    }
}
