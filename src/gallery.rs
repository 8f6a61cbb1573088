/// Application context: owns the gallery's root collection for the session.
///
/// Loads on start, stores on `flush`/`shutdown`, and wires the toolbar to the
/// collection view. Filtering never touches the root collection; it points
/// the view at a freshly built filtered collection instead.
use crate::config::Config;
use crate::error::Result;
use crate::state::import::{import_files, ImportedFile};
use crate::state::library::Library;
use crate::state::{ImageCollection, Subscription};
use crate::view::{CollectionView, DefaultRendererFactory, Toolbar, ToolbarEvent, ToolbarEventKind};

pub struct Gallery {
    library: Library,
    root: ImageCollection,
    view: CollectionView,
    toolbar: Toolbar,
    toolbar_subscription: Subscription,
}

impl Gallery {
    /// Open the configured database and start the gallery from it
    pub fn open(config: &Config) -> Result<Self> {
        let library = Library::open(config.database_path()?)?;
        Self::start(library, DefaultRendererFactory::new(config.default_layout))
    }

    pub fn start(library: Library, factory: DefaultRendererFactory) -> Result<Self> {
        let root = library.load_collection()?;
        let layout = factory.layout;

        let view = CollectionView::new(factory);
        view.set_to_view(layout);
        view.set_collection(&root);

        let toolbar = Toolbar::with_layout(layout);
        let toolbar_subscription = toolbar.subscribe({
            let view = view.clone();
            let root = root.clone();
            move |event| apply_toolbar_event(&view, &root, event)
        });

        tracing::info!(images = root.len(), ?layout, "gallery started");

        Ok(Gallery {
            library,
            root,
            view,
            toolbar,
            toolbar_subscription,
        })
    }

    /// Every image of the session, regardless of the active filter
    pub fn root(&self) -> &ImageCollection {
        &self.root
    }

    pub fn view(&self) -> &CollectionView {
        &self.view
    }

    pub fn toolbar(&self) -> &Toolbar {
        &self.toolbar
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Add one image per file to the root collection and store the result.
    pub fn import(&self, files: &[ImportedFile]) -> Result<usize> {
        let added = import_files(&self.root, files);

        // A filtered view does not see the root's additions; rebuild it
        let showing_root = self
            .view
            .collection()
            .is_some_and(|collection| collection.ptr_eq(&self.root));
        if !showing_root {
            self.view
                .set_collection(&self.root.filtered(self.toolbar.rating_filter()));
        }

        tracing::info!(count = added.len(), "imported files");
        self.flush()?;
        Ok(added.len())
    }

    pub fn flush(&self) -> Result<()> {
        self.library.store_collection(&self.root)
    }

    /// Store the gallery and tear down the toolbar wiring
    pub fn shutdown(self) -> Result<()> {
        self.toolbar.unsubscribe(&self.toolbar_subscription);
        self.flush()?;
        tracing::info!("gallery shut down");
        Ok(())
    }
}

fn apply_toolbar_event(view: &CollectionView, root: &ImageCollection, event: &ToolbarEvent) {
    match event.kind {
        ToolbarEventKind::ListView | ToolbarEventKind::GridView => {
            view.set_to_view(event.layout);
            view.rebuild();
        }
        ToolbarEventKind::RatingChange => {
            view.set_collection(&root.filtered(event.rating_filter));
        }
    }
}

impl std::fmt::Debug for Gallery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gallery")
            .field("library", &self.library)
            .field("images", &self.root.len())
            .field("view", &self.view)
            .finish()
    }
}
