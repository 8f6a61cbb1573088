/// Reconciling view over one image collection.
///
/// Keeps one renderer per collection member, in member order, and turns each
/// collection event into the smallest set of patches that brings the
/// presentation tree back in line: `Added` attaches one element, `Removed`
/// detaches one, `MetaChanged` patches stars, caption and date in place.
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use super::patch::{LayoutMode, Patch, PatchSink};
use super::renderer::{
    Affordance, DefaultRendererFactory, ImageRenderer, ModelChange, RendererFactory,
};
use super::tree::PresentationTree;
use crate::state::{
    CollectionEvent, CollectionEventKind, Image, ImageCollection, ImageId, Subscription,
};

struct ViewInner {
    collection: Option<(ImageCollection, Subscription)>,
    renderers: Vec<ImageRenderer>,
    layout: LayoutMode,
    factory: Box<dyn RendererFactory>,
    tree: PresentationTree,
    journal: Option<Vec<Patch>>,
}

impl ViewInner {
    fn emit(&mut self, patch: Patch) {
        self.tree.apply(&patch);
        if let Some(journal) = self.journal.as_mut() {
            journal.apply(&patch);
        }
    }

    fn create_renderer(&self, image: Image) -> ImageRenderer {
        let mut renderer = self.factory.create_renderer(image);
        renderer.set_layout_mode(self.layout);
        renderer
    }

    fn position_of(&self, image: &Image) -> Option<usize> {
        self.renderers
            .iter()
            .position(|renderer| renderer.image().ptr_eq(image))
    }

    fn renderers_for(&self, image: &Image) -> usize {
        self.renderers
            .iter()
            .filter(|renderer| renderer.image().ptr_eq(image))
            .count()
    }

    fn position_of_id(&self, id: ImageId) -> Option<usize> {
        self.renderers
            .iter()
            .position(|renderer| renderer.image().id() == id)
    }

    /// Re-materialize every renderer into a cleared tree, in order
    fn rebuild(&mut self) {
        let layout = self.layout;
        self.emit(Patch::Clear { layout });

        let elements: Vec<_> = self
            .renderers
            .iter_mut()
            .map(|renderer| renderer.materialize())
            .collect();
        for element in elements {
            self.emit(Patch::Attach(element));
        }
    }

    /// Events can arrive out of order when a listener mutates the collection
    /// mid-dispatch, so each one is checked against the collection's current
    /// membership before it is applied.
    fn handle_event(&mut self, event: &CollectionEvent) {
        let members = event.collection.occurrences(&event.image);
        let shown = self.renderers_for(&event.image);

        match event.kind {
            CollectionEventKind::Added => {
                if shown >= members {
                    tracing::debug!(image = %event.image.id(), "stale add, image already shown or gone");
                    return;
                }
                let mut renderer = self.create_renderer(event.image.clone());
                let element = renderer.materialize();
                self.renderers.push(renderer);
                self.emit(Patch::Attach(element));
            }
            CollectionEventKind::Removed => {
                if shown <= members {
                    tracing::debug!(image = %event.image.id(), "stale remove, image still a member");
                    return;
                }
                let Some(index) = self.position_of(&event.image) else {
                    tracing::debug!(image = %event.image.id(), "no renderer for removed image");
                    return;
                };
                let mut renderer = self.renderers.remove(index);
                if let Some(patch) = renderer.detach() {
                    self.emit(patch);
                }
            }
            CollectionEventKind::MetaChanged => {
                let Some(index) = self.position_of(&event.image) else {
                    tracing::debug!(image = %event.image.id(), "no renderer for changed image");
                    return;
                };
                for patch in self.renderers[index].refresh() {
                    self.emit(patch);
                }
            }
        }
    }
}

impl Drop for ViewInner {
    fn drop(&mut self) {
        if let Some((collection, subscription)) = self.collection.take() {
            collection.unsubscribe(&subscription);
        }
    }
}

/// Cheap-to-clone handle; clones drive the same view
#[derive(Clone)]
pub struct CollectionView {
    inner: Rc<RefCell<ViewInner>>,
}

impl CollectionView {
    pub fn new(factory: impl RendererFactory + 'static) -> Self {
        let layout = LayoutMode::default();
        CollectionView {
            inner: Rc::new(RefCell::new(ViewInner {
                collection: None,
                renderers: Vec::new(),
                layout,
                factory: Box::new(factory),
                tree: PresentationTree::new(layout),
                journal: None,
            })),
        }
    }

    /// Point the view at `collection`: drop the old subscription, rebuild
    /// one renderer per member and subscribe to the new collection.
    pub fn set_collection(&self, collection: &ImageCollection) {
        let previous = self.inner.borrow_mut().collection.take();
        if let Some((old, subscription)) = previous {
            old.unsubscribe(&subscription);
        }

        // Renderers are built before subscribing and without a mutable borrow,
        // so a factory that touches an image cannot collide with the handler.
        // The rebuild below materializes whatever state that leaves behind.
        let renderers: Vec<_> = {
            let inner = self.inner.borrow();
            collection
                .images()
                .into_iter()
                .map(|image| inner.create_renderer(image))
                .collect()
        };

        let weak = Rc::downgrade(&self.inner);
        let subscription = collection.subscribe(move |event| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let Ok(mut view) = inner.try_borrow_mut() else {
                tracing::warn!(kind = ?event.kind, "view busy, collection event skipped");
                return;
            };
            view.handle_event(event);
        });

        let mut inner = self.inner.borrow_mut();
        inner.renderers = renderers;
        inner.collection = Some((collection.clone(), subscription));
        inner.rebuild();

        tracing::debug!(renderers = inner.renderers.len(), "view bound to collection");
    }

    pub fn collection(&self) -> Option<ImageCollection> {
        self.inner
            .borrow()
            .collection
            .as_ref()
            .map(|(collection, _)| collection.clone())
    }

    pub fn layout(&self) -> LayoutMode {
        self.inner.borrow().layout
    }

    /// Switch every renderer to `layout`. Call `rebuild` to re-insert the elements.
    pub fn set_to_view(&self, layout: LayoutMode) {
        let mut inner = self.inner.borrow_mut();
        inner.layout = layout;
        for renderer in inner.renderers.iter_mut() {
            renderer.set_layout_mode(layout);
        }
    }

    /// Re-materialize the whole presentation from the current renderers
    pub fn rebuild(&self) {
        self.inner.borrow_mut().rebuild();
    }

    /// Replace the factory and recreate every renderer for the same images.
    pub fn set_renderer_factory(&self, factory: impl RendererFactory + 'static) {
        let factory: Box<dyn RendererFactory> = Box::new(factory);
        let renderers: Vec<_> = self
            .images()
            .into_iter()
            .map(|image| factory.create_renderer(image))
            .collect();

        let mut inner = self.inner.borrow_mut();
        let layout = inner.layout;
        inner.factory = factory;
        inner.renderers = renderers;
        for renderer in inner.renderers.iter_mut() {
            renderer.set_layout_mode(layout);
        }
        inner.rebuild();
    }

    pub fn renderer_count(&self) -> usize {
        self.inner.borrow().renderers.len()
    }

    pub fn renderers(&self) -> Ref<'_, [ImageRenderer]> {
        Ref::map(self.inner.borrow(), |inner| inner.renderers.as_slice())
    }

    /// Images in renderer order
    pub fn images(&self) -> Vec<Image> {
        self.renderers()
            .iter()
            .map(|renderer| renderer.image().clone())
            .collect()
    }

    pub fn tree(&self) -> Ref<'_, PresentationTree> {
        Ref::map(self.inner.borrow(), |inner| &inner.tree)
    }

    /// Start or stop recording emitted patches for `drain_patches`
    pub fn set_journaling(&self, enabled: bool) {
        let mut inner = self.inner.borrow_mut();
        inner.journal = if enabled { Some(Vec::new()) } else { None };
    }

    pub fn drain_patches(&self) -> Vec<Patch> {
        self.inner
            .borrow_mut()
            .journal
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn hover_star(&self, image: ImageId, star: u8) {
        let mut inner = self.inner.borrow_mut();
        let Some(index) = inner.position_of_id(image) else {
            return;
        };
        if let Some(patch) = inner.renderers[index].hover_star(star) {
            inner.emit(patch);
        }
    }

    pub fn hover_end(&self, image: ImageId) {
        let mut inner = self.inner.borrow_mut();
        let Some(index) = inner.position_of_id(image) else {
            return;
        };
        if let Some(patch) = inner.renderers[index].hover_end() {
            inner.emit(patch);
        }
    }

    /// Forward a click to the image's renderer and apply the model change it asks for.
    ///
    /// Returns false if no renderer shows that image.
    pub fn activate(&self, image: ImageId, affordance: Affordance) -> bool {
        let change: Option<ModelChange> = {
            let mut inner = self.inner.borrow_mut();
            let Some(index) = inner.position_of_id(image) else {
                return false;
            };
            let (patches, change) = inner.renderers[index].activate(affordance);
            for patch in patches {
                inner.emit(patch);
            }
            change
        };

        // The view is no longer borrowed, so the events this triggers can reach it
        if let Some(change) = change {
            change.apply();
        }
        true
    }

    pub fn close_overlay(&self) {
        self.inner.borrow_mut().emit(Patch::HideOverlay);
    }
}

impl Default for CollectionView {
    fn default() -> Self {
        Self::new(DefaultRendererFactory::default())
    }
}

impl fmt::Debug for CollectionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("CollectionView")
            .field("layout", &inner.layout)
            .field("renderers", &inner.renderers.len())
            .field("bound", &inner.collection.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn image(name: &str, rating: u8) -> Image {
        Image::new(format!("images/{name}"), Utc::now(), "", rating)
    }

    fn collection_of(images: &[Image]) -> ImageCollection {
        let collection = ImageCollection::new();
        for image in images {
            collection.add_image(image.clone());
        }
        collection
    }

    fn assert_in_sync(view: &CollectionView, collection: &ImageCollection) {
        assert_eq!(view.images(), collection.images());
        let tree_ids: Vec<_> = view.tree().elements().iter().map(|e| e.image).collect();
        let member_ids: Vec<_> = collection.images().iter().map(|i| i.id()).collect();
        assert_eq!(tree_ids, member_ids);
    }

    #[test]
    fn test_set_collection_builds_renderers_in_order() {
        let images = [image("a.jpg", 1), image("b.jpg", 2), image("c.jpg", 3)];
        let collection = collection_of(&images);
        let view = CollectionView::default();

        view.set_collection(&collection);

        assert_eq!(view.renderer_count(), 3);
        assert_in_sync(&view, &collection);
    }

    #[test]
    fn test_added_appends_one_element() {
        let collection = collection_of(&[image("a.jpg", 0)]);
        let view = CollectionView::default();
        view.set_collection(&collection);
        view.set_journaling(true);

        let photo = image("b.jpg", 0);
        collection.add_image(photo.clone());

        let patches = view.drain_patches();
        assert_eq!(patches.len(), 1);
        assert!(matches!(&patches[0], Patch::Attach(element) if element.image == photo.id()));
        assert_in_sync(&view, &collection);
    }

    #[test]
    fn test_removed_detaches_matching_element() {
        let images = [image("a.jpg", 0), image("b.jpg", 0), image("c.jpg", 0)];
        let collection = collection_of(&images);
        let view = CollectionView::default();
        view.set_collection(&collection);
        let node = view.renderers()[1].element().unwrap();
        view.set_journaling(true);

        collection.remove_image(&images[1]);

        assert_eq!(view.drain_patches(), vec![Patch::Detach(node)]);
        assert_eq!(view.renderer_count(), 2);
        assert_in_sync(&view, &collection);
    }

    #[test]
    fn test_meta_changed_patches_in_place() {
        let photo = image("a.jpg", 1);
        let collection = collection_of(&[photo.clone()]);
        let view = CollectionView::default();
        view.set_collection(&collection);
        let node = view.renderers()[0].element().unwrap();
        view.set_journaling(true);

        photo.set_rating(4);

        let patches = view.drain_patches();
        assert!(patches.iter().all(|patch| patch.node() == Some(node)));
        assert!(patches.contains(&Patch::UpdateStars { node, filled: 4 }));
        assert!(!patches.iter().any(|patch| matches!(patch, Patch::Attach(_))));
        assert_eq!(view.tree().element(node).map(|e| e.filled), Some(4));
    }

    #[test]
    fn test_rebinding_drops_old_subscription() {
        let old_photo = image("old.jpg", 0);
        let old = collection_of(&[old_photo.clone()]);
        let new = collection_of(&[image("new.jpg", 0)]);
        let view = CollectionView::default();

        view.set_collection(&old);
        view.set_collection(&new);
        old.add_image(image("late.jpg", 0));
        old_photo.set_rating(5);

        assert!(view.collection().is_some_and(|c| c.ptr_eq(&new)));
        assert_in_sync(&view, &new);
    }

    #[test]
    fn test_layout_switch_leaves_model_alone() {
        let photo = image("a.jpg", 3);
        photo.set_caption("kept");
        let collection = collection_of(&[photo.clone()]);
        let view = CollectionView::default();
        view.set_collection(&collection);
        let before = collection.to_snapshot();

        view.set_to_view(LayoutMode::List);

        assert_eq!(collection.to_snapshot(), before);
        assert!(view.renderers().iter().all(|r| r.layout() == LayoutMode::List));
        // Elements keep the old layout until re-inserted
        assert_eq!(view.tree().elements()[0].layout, LayoutMode::Grid);

        view.rebuild();
        assert_eq!(view.tree().layout(), LayoutMode::List);
        assert_eq!(view.tree().elements()[0].layout, LayoutMode::List);
        assert_eq!(collection.to_snapshot(), before);
    }

    #[test]
    fn test_new_factory_recreates_renderers_for_same_images() {
        let images = [image("a.jpg", 0), image("b.jpg", 0)];
        let collection = collection_of(&images);
        let view = CollectionView::default();
        view.set_collection(&collection);
        let old_nodes: Vec<_> = view.renderers().iter().map(|r| r.element()).collect();

        view.set_renderer_factory(DefaultRendererFactory {
            layout: LayoutMode::List,
            date_format: "%Y-%m-%d".to_string(),
        });

        assert_in_sync(&view, &collection);
        let new_nodes: Vec<_> = view.renderers().iter().map(|r| r.element()).collect();
        assert_ne!(old_nodes, new_nodes);
        // The view's own layout wins over the factory default
        assert!(view.renderers().iter().all(|r| r.layout() == LayoutMode::Grid));
        assert_eq!(images[0].listener_count(), 1);
    }

    #[test]
    fn test_star_click_flows_back_through_collection() {
        let photo = image("a.jpg", 0);
        let collection = collection_of(&[photo.clone()]);
        let view = CollectionView::default();
        view.set_collection(&collection);

        assert!(view.activate(photo.id(), Affordance::Star(3)));

        assert_eq!(photo.rating(), 3);
        assert_eq!(view.tree().element_for(photo.id()).map(|e| e.filled), Some(3));
    }

    #[test]
    fn test_delete_removes_element() {
        let photo = image("a.jpg", 0);
        let keep = image("b.jpg", 0);
        let collection = collection_of(&[photo.clone(), keep]);
        let view = CollectionView::default();
        view.set_collection(&collection);

        view.activate(photo.id(), Affordance::Delete);

        assert!(photo.is_dead());
        assert!(!collection.contains(&photo));
        assert_in_sync(&view, &collection);
    }

    #[test]
    fn test_hover_then_leave_restores_rating() {
        let photo = image("a.jpg", 2);
        let collection = collection_of(&[photo.clone()]);
        let view = CollectionView::default();
        view.set_collection(&collection);

        view.hover_star(photo.id(), 5);
        assert_eq!(view.tree().element_for(photo.id()).map(|e| e.filled), Some(5));

        view.hover_end(photo.id());
        assert_eq!(view.tree().element_for(photo.id()).map(|e| e.filled), Some(2));
        assert_eq!(photo.rating(), 2);
    }

    #[test]
    fn test_unknown_image_is_ignored() {
        let view = CollectionView::default();
        view.set_collection(&ImageCollection::new());
        let stranger = image("x.jpg", 0);

        assert!(!view.activate(stranger.id(), Affordance::Delete));
        assert!(!stranger.is_dead());
    }

    #[test]
    fn test_enlarge_and_close_overlay() {
        let photo = image("a.jpg", 0);
        let view = CollectionView::default();
        view.set_collection(&collection_of(&[photo.clone()]));

        view.activate(photo.id(), Affordance::Enlarge);
        assert_eq!(view.tree().overlay(), Some("images/a.jpg"));

        view.close_overlay();
        assert_eq!(view.tree().overlay(), None);
    }

    #[test]
    fn test_listener_removing_on_add_leaves_no_orphan() {
        let collection = ImageCollection::new();
        collection.subscribe(|event| {
            if event.kind == CollectionEventKind::Added {
                event.collection.remove_image(&event.image);
            }
        });
        let view = CollectionView::default();
        view.set_collection(&collection);

        collection.add_image(image("a.jpg", 0));

        assert!(collection.is_empty());
        assert_eq!(view.renderer_count(), collection.len());
        assert!(view.tree().elements().is_empty());
    }

    #[test]
    fn test_listener_readding_on_remove_keeps_image_shown() {
        let photo = image("a.jpg", 0);
        let collection = collection_of(&[photo.clone()]);
        let readded = Rc::new(std::cell::Cell::new(false));
        let once = Rc::clone(&readded);
        collection.subscribe(move |event| {
            if event.kind == CollectionEventKind::Removed && !once.replace(true) {
                event.collection.add_image(event.image.clone());
            }
        });
        let view = CollectionView::default();
        view.set_collection(&collection);

        collection.remove_image(&photo);

        assert!(readded.get());
        assert_eq!(collection.len(), 1);
        assert_in_sync(&view, &collection);
    }

    struct CaptioningFactory;

    impl RendererFactory for CaptioningFactory {
        fn create_renderer(&self, image: Image) -> ImageRenderer {
            image.set_caption("seen by factory");
            DefaultRendererFactory::default().create_renderer(image)
        }
    }

    #[test]
    fn test_factory_may_mutate_images_while_binding() {
        let photo = image("a.jpg", 0);
        let collection = collection_of(&[photo.clone()]);
        let view = CollectionView::new(CaptioningFactory);

        view.set_collection(&collection);

        assert_eq!(photo.caption(), "seen by factory");
        assert_eq!(
            view.tree().element_for(photo.id()).map(|e| e.caption.clone()),
            Some("seen by factory".to_string())
        );
        assert_in_sync(&view, &collection);

        // Swapping factories runs the new one outside the view borrow too
        photo.set_caption("");
        view.set_renderer_factory(CaptioningFactory);
        assert_eq!(
            view.tree().element_for(photo.id()).map(|e| e.caption.clone()),
            Some("seen by factory".to_string())
        );
    }

    #[test]
    fn test_dropping_view_unsubscribes() {
        let collection = collection_of(&[image("a.jpg", 0)]);
        {
            let view = CollectionView::default();
            view.set_collection(&collection);
        }
        // Would panic on a dangling view if the handler were still installed
        collection.add_image(image("b.jpg", 0));
        assert_eq!(collection.len(), 2);
    }
}
