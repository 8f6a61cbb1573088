/// Presentation layer
///
/// Everything here is toolkit-agnostic:
/// - `patch.rs` - patch commands and the `PatchSink` seam
/// - `tree.rs` - headless retained tree the front end draws from
/// - `renderer.rs` - one renderer per image, plus renderer factories
/// - `collection_view.rs` - reconciles renderers with a collection
/// - `toolbar.rs` - layout and rating-filter choices

pub mod patch;
pub mod tree;
pub mod renderer;
pub mod collection_view;
pub mod toolbar;

pub use collection_view::CollectionView;
pub use patch::{ImageElement, LayoutMode, NodeId, Patch, PatchSink};
pub use renderer::{Affordance, DefaultRendererFactory, ImageRenderer, ModelChange, RendererFactory};
pub use toolbar::{Toolbar, ToolbarEvent, ToolbarEventKind};
pub use tree::PresentationTree;
