/// Ordered collection of images with aggregate change notification.
///
/// Each member carries a relay subscription that turns image-level events
/// into collection-level `MetaChanged` events, so subscribers of the
/// collection see nested mutations without polling.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use super::emitter::{Emitter, Subscription};
use super::image::{Image, ImageEvent, ImageEventKind, ImageId, Rating};
use crate::error::{GalleryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEventKind {
    Added,
    Removed,
    /// A member's rating, caption or lifecycle changed
    MetaChanged,
}

#[derive(Debug, Clone)]
pub struct CollectionEvent {
    pub kind: CollectionEventKind,
    pub collection: ImageCollection,
    pub image: Image,
    pub timestamp: DateTime<Utc>,
}

struct Member {
    image: Image,
    relay: Subscription,
}

struct CollectionInner {
    members: RefCell<Vec<Member>>,
    listeners: Emitter<CollectionEvent>,
}

impl Drop for CollectionInner {
    fn drop(&mut self) {
        // Relays only hold a weak reference back to us; detach them so
        // images that outlive this collection stop carrying dead listeners.
        for member in self.members.get_mut().drain(..) {
            member.image.unsubscribe(&member.relay);
        }
    }
}

#[derive(Clone)]
pub struct ImageCollection {
    inner: Rc<CollectionInner>,
}

impl ImageCollection {
    pub fn new() -> Self {
        ImageCollection {
            inner: Rc::new(CollectionInner {
                members: RefCell::new(Vec::new()),
                listeners: Emitter::new(),
            }),
        }
    }

    /// Append an image and start relaying its events.
    ///
    /// Duplicates are not rejected here; callers must not add the same image twice.
    pub fn add_image(&self, image: Image) {
        let weak = Rc::downgrade(&self.inner);
        let relay = image.subscribe(move |event| relay_image_event(&weak, event));

        self.inner.members.borrow_mut().push(Member {
            image: image.clone(),
            relay,
        });

        tracing::debug!(image = %image.id(), "image added to collection");
        self.notify(CollectionEventKind::Added, image);
    }

    /// Remove an image by identity and detach its relay. Removing a non-member does nothing.
    pub fn remove_image(&self, image: &Image) {
        let removed = {
            let mut members = self.inner.members.borrow_mut();
            members
                .iter()
                .position(|member| member.image.ptr_eq(image))
                .map(|index| members.remove(index))
        };

        let Some(member) = removed else {
            tracing::debug!(image = %image.id(), "remove ignored, image is not a member");
            return;
        };

        member.image.unsubscribe(&member.relay);
        tracing::debug!(image = %image.id(), "image removed from collection");
        self.notify(CollectionEventKind::Removed, member.image);
    }

    /// Snapshot of the current members in insertion order
    pub fn images(&self) -> Vec<Image> {
        self.inner
            .members
            .borrow()
            .iter()
            .map(|member| member.image.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, image: &Image) -> bool {
        self.inner
            .members
            .borrow()
            .iter()
            .any(|member| member.image.ptr_eq(image))
    }

    /// How many times `image` appears among the members
    pub fn occurrences(&self, image: &Image) -> usize {
        self.inner
            .members
            .borrow()
            .iter()
            .filter(|member| member.image.ptr_eq(image))
            .count()
    }

    pub fn find(&self, id: ImageId) -> Option<Image> {
        self.inner
            .members
            .borrow()
            .iter()
            .find(|member| member.image.id() == id)
            .map(|member| member.image.clone())
    }

    /// Build a new collection holding the members rated at least `min_rating`, order preserved.
    ///
    /// The images are shared, not copied: mutations show up in both collections.
    pub fn filtered(&self, min_rating: u8) -> ImageCollection {
        let filtered = ImageCollection::new();
        for image in self.images() {
            if image.rating() >= min_rating {
                filtered.add_image(image);
            }
        }
        tracing::debug!(
            min_rating,
            kept = filtered.len(),
            total = self.len(),
            "built filtered collection"
        );
        filtered
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CollectionEvent) + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.inner.listeners.unsubscribe(subscription)
    }

    pub fn ptr_eq(&self, other: &ImageCollection) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Serializable copy of every member's attributes, in order
    pub fn to_snapshot(&self) -> CollectionSnapshot {
        CollectionSnapshot {
            images: self
                .images()
                .iter()
                .map(|image| ImageRecord {
                    id: image.id(),
                    path: image.path().to_string(),
                    modification_date: image.modification_date(),
                    caption: image.caption(),
                    rating: image.rating(),
                })
                .collect(),
        }
    }

    /// Rebuild a collection from a snapshot, keeping every stored id.
    ///
    /// Fails on out-of-range ratings or repeated ids rather than guessing.
    pub fn from_snapshot(snapshot: CollectionSnapshot) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut images = Vec::with_capacity(snapshot.images.len());

        for record in snapshot.images {
            if !seen.insert(record.id) {
                return Err(GalleryError::DuplicateImageId(record.id));
            }
            let rating = Rating::new(record.rating)?;
            images.push(Image::with_id(
                ImageId::reserve(record.id.get())?,
                record.path,
                record.modification_date,
                record.caption,
                rating,
            ));
        }

        let collection = ImageCollection::new();
        for image in images {
            collection.add_image(image);
        }
        Ok(collection)
    }

    fn notify(&self, kind: CollectionEventKind, image: Image) {
        let event = CollectionEvent {
            kind,
            collection: self.clone(),
            image,
            timestamp: Utc::now(),
        };
        self.inner.listeners.emit(&event);
    }
}

fn relay_image_event(collection: &Weak<CollectionInner>, event: &ImageEvent) {
    let Some(inner) = collection.upgrade() else {
        return;
    };
    let collection = ImageCollection { inner };

    collection.notify(CollectionEventKind::MetaChanged, event.image.clone());

    if event.kind == ImageEventKind::Died {
        collection.remove_image(&event.image);
    }
}

impl Default for ImageCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ImageCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCollection")
            .field("len", &self.len())
            .field("listeners", &self.inner.listeners)
            .finish()
    }
}

/// Persisted form of one image
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub id: ImageId,
    pub path: String,
    pub modification_date: DateTime<Utc>,
    pub caption: String,
    pub rating: u8,
}

/// Persisted form of a whole collection, member order preserved
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CollectionSnapshot {
    pub images: Vec<ImageRecord>,
}

impl CollectionSnapshot {
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
