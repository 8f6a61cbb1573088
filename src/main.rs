use iced::widget::{column, container, text};
use iced::{window, Element, Length, Subscription, Task, Theme};
use rfd::FileDialog;

use star_gallery::config::Config;
use star_gallery::logging;
use star_gallery::state::import::{scan_folder_async, ImportedFile};
use star_gallery::state::ImageId;
use star_gallery::view::{Affordance, LayoutMode};
use star_gallery::Gallery;

// Declare the ui module
mod ui;

/// Main application state
struct StarGallery {
    /// The gallery session; `None` if the database could not be opened
    gallery: Option<Gallery>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked the "Import Folder" button
    ImportFolder,
    /// Background folder scan finished
    ImportComplete(Result<Vec<ImportedFile>, String>),
    ShowLayout(LayoutMode),
    /// Click on the n-th filter star
    FilterStar(u8),
    FilterHover(u8),
    FilterHoverEnd,
    ClearFilter,
    StarHover(ImageId, u8),
    StarHoverEnd(ImageId),
    /// Star, unrate, delete or enlarge on one image
    Activate(ImageId, Affordance),
    CloseOverlay,
    /// Window close button; the gallery is stored before exiting
    CloseRequested(window::Id),
}

impl StarGallery {
    /// Create a new instance of the application
    fn new(config: Config) -> (Self, Task<Message>) {
        let (gallery, status) = match Gallery::open(&config) {
            Ok(gallery) => {
                let count = gallery.root().len();
                (Some(gallery), format!("Ready. {} images in gallery.", count))
            }
            Err(e) => {
                tracing::error!("failed to open gallery: {}", e);
                (None, format!("Could not open the gallery database: {}", e))
            }
        };

        (StarGallery { gallery, status }, Task::none())
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        if let Message::CloseRequested(id) = message {
            if let Some(gallery) = self.gallery.take() {
                if let Err(e) = gallery.shutdown() {
                    tracing::error!("failed to store gallery on exit: {}", e);
                }
            }
            return window::close(id);
        }

        let Some(gallery) = self.gallery.as_ref() else {
            return Task::none();
        };

        match message {
            Message::ImportFolder => {
                // Show the native folder picker dialog
                let folder = FileDialog::new()
                    .set_title("Select Folder with Photos")
                    .pick_folder();

                if let Some(folder_path) = folder {
                    self.status = format!("Importing from {}...", folder_path.display());
                    return Task::perform(scan_folder_async(folder_path), Message::ImportComplete);
                }
            }
            Message::ImportComplete(Ok(files)) => {
                self.status = match gallery.import(&files) {
                    Ok(count) => format!("Import complete! Added {} images.", count),
                    Err(e) => {
                        tracing::error!("import failed: {}", e);
                        format!("Import failed: {}", e)
                    }
                };
            }
            Message::ImportComplete(Err(e)) => {
                tracing::error!("folder scan failed: {}", e);
                self.status = format!("Import failed: {}", e);
            }
            Message::ShowLayout(layout) => gallery.toolbar().set_to_view(layout),
            Message::FilterStar(star) => {
                if let Err(e) = gallery.toolbar().set_rating_filter(star) {
                    tracing::warn!("ignored filter click: {}", e);
                }
            }
            Message::FilterHover(star) => gallery.toolbar().hover_filter_star(star),
            Message::FilterHoverEnd => gallery.toolbar().hover_filter_end(),
            Message::ClearFilter => gallery.toolbar().clear_filter(),
            Message::StarHover(image, star) => gallery.view().hover_star(image, star),
            Message::StarHoverEnd(image) => gallery.view().hover_end(image),
            Message::Activate(image, affordance) => {
                if !gallery.view().activate(image, affordance) {
                    tracing::debug!(%image, ?affordance, "click on an image that is no longer shown");
                }
            }
            Message::CloseOverlay => gallery.view().close_overlay(),
            Message::CloseRequested(_) => {}
        }

        Task::none()
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let Some(gallery) = self.gallery.as_ref() else {
            return container(text(&self.status).size(16))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into();
        };

        let tree = gallery.view().tree();
        let body = match tree.overlay() {
            Some(path) => ui::gallery::enlarged(path),
            None => ui::gallery::collection(&tree),
        };

        column![
            ui::toolbar::toolbar(gallery.toolbar()),
            text(&self.status).size(14),
            body,
        ]
        .spacing(16)
        .padding(20)
        .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        window::close_requests().map(Message::CloseRequested)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    let config = Config::load();
    logging::init(&config);

    iced::application("Star Gallery", StarGallery::update, StarGallery::view)
        .subscription(StarGallery::subscription)
        .exit_on_close_request(false)
        .theme(StarGallery::theme)
        .centered()
        .run_with(move || StarGallery::new(config))
}
