/// State management module
/// 
/// This module handles the gallery's data model, including:
/// - Typed listener registries (emitter.rs)
/// - Rateable images (image.rs)
/// - Ordered image collections with change relay (collection.rs)
/// - SQLite persistence of the whole gallery (library.rs)
/// - Picking image files from disk (import.rs)

pub mod emitter;
pub mod image;
pub mod collection;
pub mod library;
pub mod import;

pub use collection::{CollectionEvent, CollectionEventKind, ImageCollection};
pub use emitter::{Emitter, Subscription};
pub use image::{Image, ImageEvent, ImageEventKind, ImageId, Rating, MAX_RATING, MAX_STORED_ID};
