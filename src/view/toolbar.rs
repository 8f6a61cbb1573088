/// Toolbar state: layout choice and minimum-rating filter.
///
/// The toolbar only records the user's choice and announces it; the
/// gallery reacts by switching the view's layout or rebuilding the filter.
use chrono::{DateTime, Utc};
use std::cell::Cell;

use super::patch::LayoutMode;
use crate::error::Result;
use crate::state::{Emitter, Rating, Subscription, MAX_RATING};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarEventKind {
    ListView,
    GridView,
    RatingChange,
}

#[derive(Debug, Clone)]
pub struct ToolbarEvent {
    pub kind: ToolbarEventKind,
    pub layout: LayoutMode,
    /// Minimum rating in effect after this event, 0 = no filtering
    pub rating_filter: u8,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Toolbar {
    layout: Cell<LayoutMode>,
    rating_filter: Cell<Rating>,
    /// Filter stars shown while the pointer hovers one
    preview: Cell<Option<u8>>,
    listeners: Emitter<ToolbarEvent>,
}

impl Toolbar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start in `layout` without announcing it
    pub fn with_layout(layout: LayoutMode) -> Self {
        let toolbar = Self::default();
        toolbar.layout.set(layout);
        toolbar
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout.get()
    }

    /// 0 means no filtering
    pub fn rating_filter(&self) -> u8 {
        self.rating_filter.get().get()
    }

    pub fn set_to_view(&self, layout: LayoutMode) {
        self.layout.set(layout);
        let kind = match layout {
            LayoutMode::List => ToolbarEventKind::ListView,
            LayoutMode::Grid => ToolbarEventKind::GridView,
        };
        self.notify(kind);
    }

    /// Set the minimum rating. Values above 5 are rejected and nothing fires.
    pub fn set_rating_filter(&self, rating: u8) -> Result<()> {
        let rating = Rating::new(rating)?;
        self.rating_filter.set(rating);
        self.preview.set(None);
        self.notify(ToolbarEventKind::RatingChange);
        Ok(())
    }

    pub fn clear_filter(&self) {
        self.rating_filter.set(Rating::default());
        self.preview.set(None);
        self.notify(ToolbarEventKind::RatingChange);
    }

    pub fn hover_filter_star(&self, star: u8) {
        self.preview.set(Some(star.clamp(1, MAX_RATING)));
    }

    pub fn hover_filter_end(&self) {
        self.preview.set(None);
    }

    /// Filter stars to draw filled: the hover preview, else the active filter
    pub fn displayed_filter(&self) -> u8 {
        self.preview.get().unwrap_or_else(|| self.rating_filter())
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ToolbarEvent) + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.listeners.unsubscribe(subscription)
    }

    fn notify(&self, kind: ToolbarEventKind) {
        tracing::debug!(?kind, "toolbar changed");
        self.listeners.emit(&ToolbarEvent {
            kind,
            layout: self.layout(),
            rating_filter: self.rating_filter(),
            timestamp: Utc::now(),
        });
    }
}
