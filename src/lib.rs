//! Star Gallery core: an observable image model and a reconciling,
//! toolkit-agnostic view over it.
//!
//! Mutating an image or a collection fires typed events synchronously;
//! a `CollectionView` listening on a collection turns each event into the
//! minimal presentation patches instead of re-rendering everything.

pub mod config;
pub mod error;
pub mod gallery;
pub mod logging;
pub mod state;
pub mod view;

pub use error::{GalleryError, Result};
pub use gallery::Gallery;
