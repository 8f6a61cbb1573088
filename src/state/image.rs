/// A single rateable, captioned image in the gallery.
///
/// `Image` is a cheap-to-clone handle; clones share the same underlying
/// state, and identity (not attribute equality) decides whether two handles
/// refer to the same image.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::emitter::{Emitter, Subscription};
use crate::error::{GalleryError, Result};

/// Highest rating an image can carry
pub const MAX_RATING: u8 = 5;

/// Largest id a stored snapshot may carry. The allocator hands out ids above
/// it by counting, so it stays 2^63 allocations away from wrapping.
pub const MAX_STORED_ID: u64 = u64::MAX >> 1;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique image identifier. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(u64);

impl ImageId {
    fn allocate() -> Self {
        // `reserve` keeps the counter at or below MAX_STORED_ID + 1
        ImageId(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Adopt an id read back from storage and make sure the allocator never hands it out again.
    pub(crate) fn reserve(raw: u64) -> Result<Self> {
        if raw > MAX_STORED_ID {
            return Err(GalleryError::ImageIdOutOfRange(raw));
        }
        NEXT_IMAGE_ID.fetch_max(raw + 1, Ordering::Relaxed);
        Ok(ImageId(raw))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strictly validated star rating (0 = unrated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_RATING {
            return Err(GalleryError::InvalidRating(value));
        }
        Ok(Rating(value))
    }

    /// Clamp any value into the valid range
    pub fn clamped(value: u8) -> Self {
        Rating(value.min(MAX_RATING))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEventKind {
    RatingChanged,
    CaptionChanged,
    /// The image is being retired; its owning collection drops it in response
    Died,
}

/// Delivered to image listeners after every mutation
#[derive(Debug, Clone)]
pub struct ImageEvent {
    pub kind: ImageEventKind,
    pub image: Image,
}

struct ImageInner {
    id: ImageId,
    path: String,
    modification_date: DateTime<Utc>,
    caption: RefCell<String>,
    rating: Cell<Rating>,
    dead: Cell<bool>,
    listeners: Emitter<ImageEvent>,
}

#[derive(Clone)]
pub struct Image {
    inner: Rc<ImageInner>,
}

impl Image {
    /// Create a new image with a freshly allocated id. Out-of-range ratings are clamped.
    pub fn new(
        path: impl Into<String>,
        modification_date: DateTime<Utc>,
        caption: impl Into<String>,
        rating: u8,
    ) -> Self {
        Self::with_id(
            ImageId::allocate(),
            path.into(),
            modification_date,
            caption.into(),
            Rating::clamped(rating),
        )
    }

    pub(crate) fn with_id(
        id: ImageId,
        path: String,
        modification_date: DateTime<Utc>,
        caption: String,
        rating: Rating,
    ) -> Self {
        Image {
            inner: Rc::new(ImageInner {
                id,
                path,
                modification_date,
                caption: RefCell::new(caption),
                rating: Cell::new(rating),
                dead: Cell::new(false),
                listeners: Emitter::new(),
            }),
        }
    }

    pub fn id(&self) -> ImageId {
        self.inner.id
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// File name portion of the path, used as the display title
    pub fn file_name(&self) -> String {
        Path::new(&self.inner.path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.inner.path.clone())
    }

    pub fn modification_date(&self) -> DateTime<Utc> {
        self.inner.modification_date
    }

    pub fn caption(&self) -> String {
        self.inner.caption.borrow().clone()
    }

    pub fn rating(&self) -> u8 {
        self.inner.rating.get().get()
    }

    pub fn is_dead(&self) -> bool {
        self.inner.dead.get()
    }

    /// Set the rating (clamped to 0..=5) and notify listeners, even if the value is unchanged.
    pub fn set_rating(&self, value: u8) {
        let rating = Rating::clamped(value);
        if rating.get() != value {
            tracing::warn!(image = %self.id(), value, "rating out of range, clamped to {}", rating.get());
        }
        self.inner.rating.set(rating);
        self.notify(ImageEventKind::RatingChanged);
    }

    pub fn set_caption(&self, caption: impl Into<String>) {
        *self.inner.caption.borrow_mut() = caption.into();
        self.notify(ImageEventKind::CaptionChanged);
    }

    /// Retire this image. Listeners are notified before the image is marked dead.
    ///
    /// Mutations after death still notify whoever is left listening.
    pub fn die(&self) {
        tracing::debug!(image = %self.id(), "image retired");
        self.notify(ImageEventKind::Died);
        self.inner.dead.set(true);
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ImageEvent) + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.inner.listeners.unsubscribe(subscription)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.listener_count()
    }

    /// True if both handles refer to the same image
    pub fn ptr_eq(&self, other: &Image) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self, kind: ImageEventKind) {
        let event = ImageEvent {
            kind,
            image: self.clone(),
        };
        self.inner.listeners.emit(&event);
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Image {}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("id", &self.inner.id)
            .field("path", &self.inner.path)
            .field("caption", &*self.inner.caption.borrow())
            .field("rating", &self.rating())
            .field("dead", &self.is_dead())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(image: &Image) -> Rc<RefCell<Vec<(ImageEventKind, Image)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        image.subscribe(move |event| sink.borrow_mut().push((event.kind, event.image.clone())));
        log
    }

    #[test]
    fn test_set_rating_notifies_every_call() {
        let image = Image::new("images/a.jpg", Utc::now(), "", 0);
        let log = recorder(&image);

        image.set_rating(2);
        image.set_rating(2);

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|(kind, img)| *kind == ImageEventKind::RatingChanged && img.ptr_eq(&image)));
        assert_eq!(image.rating(), 2);
    }

    #[test]
    fn test_second_listener_joins_in_order() {
        let image = Image::new("", Utc::now(), "", 0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&order);
        image.subscribe(move |_| first.borrow_mut().push("first"));
        image.set_rating(2);

        let second = Rc::clone(&order);
        image.subscribe(move |_| second.borrow_mut().push("second"));
        image.set_rating(0);

        assert_eq!(*order.borrow(), vec!["first", "first", "second"]);
    }

    #[test]
    fn test_die_notifies_then_marks_dead() {
        let image = Image::new("", Utc::now(), "", 0);
        let seen_alive = Rc::new(Cell::new(None));
        let probe = Rc::clone(&seen_alive);
        image.subscribe(move |event| {
            if event.kind == ImageEventKind::Died {
                probe.set(Some(!event.image.is_dead()));
            }
        });
        let log = recorder(&image);

        image.die();

        assert_eq!(seen_alive.get(), Some(true));
        assert!(image.is_dead());
        assert_eq!(log.borrow().len(), 1);

        // Still notifies after death
        image.set_caption("Caption");
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(log.borrow()[1].0, ImageEventKind::CaptionChanged);
    }

    #[test]
    fn test_rating_is_clamped() {
        let image = Image::new("", Utc::now(), "", 9);
        assert_eq!(image.rating(), 5);

        image.set_rating(42);
        assert_eq!(image.rating(), MAX_RATING);
    }

    #[test]
    fn test_strict_rating_rejects_out_of_range() {
        assert!(Rating::new(5).is_ok());
        assert!(matches!(Rating::new(6), Err(GalleryError::InvalidRating(6))));
    }

    #[test]
    fn test_ids_are_unique_and_reserved() {
        let a = Image::new("", Utc::now(), "", 0);
        let b = Image::new("", Utc::now(), "", 0);
        assert_ne!(a.id(), b.id());

        let far = ImageId::reserve(b.id().get() + 1000).unwrap();
        let c = Image::new("", Utc::now(), "", 0);
        assert!(c.id() > far);
    }

    #[test]
    fn test_reserve_refuses_ids_past_the_stored_range() {
        assert!(matches!(
            ImageId::reserve(u64::MAX),
            Err(GalleryError::ImageIdOutOfRange(u64::MAX))
        ));

        let edge = ImageId::reserve(MAX_STORED_ID).unwrap();
        let fresh = Image::new("", Utc::now(), "", 0);
        let next = Image::new("", Utc::now(), "", 0);
        assert!(fresh.id() > edge);
        assert!(next.id() > fresh.id());
    }

    #[test]
    fn test_identity_not_value_equality() {
        let date = Utc::now();
        let a = Image::new("same.jpg", date, "", 1);
        let b = Image::new("same.jpg", date, "", 1);

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_file_name() {
        let image = Image::new("/photos/trip/IMG_0001.jpg", Utc::now(), "", 0);
        assert_eq!(image.file_name(), "IMG_0001.jpg");
    }
}
