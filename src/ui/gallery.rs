use iced::widget::{button, column, container, image, mouse_area, row, scrollable, text, Column};
use iced::{Element, Length, Pixels};
use iced_aw::Wrap;

use star_gallery::state::MAX_RATING;
use star_gallery::view::{Affordance, ImageElement, LayoutMode, PresentationTree};

use super::star_glyph;
use crate::Message;

/// Width of a thumbnail in both layouts
const THUMB_WIDTH: f32 = 220.0;

/// One image with its metadata, stars and buttons
fn card<'a>(element: &ImageElement) -> Element<'a, Message> {
    let id = element.image;

    let picture = mouse_area(image(image::Handle::from_path(&element.path)).width(Length::Fixed(THUMB_WIDTH)))
        .on_press(Message::Activate(id, Affordance::Enlarge));

    let stars = row((1..=MAX_RATING).map(|star| {
        mouse_area(text(star_glyph(star, element.filled)).size(22))
            .on_enter(Message::StarHover(id, star))
            .on_exit(Message::StarHoverEnd(id))
            .on_press(Message::Activate(id, Affordance::Star(star)))
            .into()
    }))
    .spacing(2);

    let mut meta: Column<'a, Message> = column![text(element.title.clone()).size(16)].spacing(6);
    if !element.caption.is_empty() {
        meta = meta.push(text(element.caption.clone()).size(14));
    }
    let meta = meta
        .push(text(element.date_text.clone()).size(13))
        .push(stars)
        .push(
            row![
                button(text("unrate").size(13)).on_press(Message::Activate(id, Affordance::Unrate)),
                button(text("delete").size(13))
                    .style(button::danger)
                    .on_press(Message::Activate(id, Affordance::Delete)),
            ]
            .spacing(8),
        );

    match element.layout {
        LayoutMode::List => row![picture, meta].spacing(16).into(),
        LayoutMode::Grid => column![picture, meta]
            .spacing(8)
            .width(Length::Fixed(THUMB_WIDTH))
            .into(),
    }
}

/// The whole collection, laid out as the tree says
pub fn collection<'a>(tree: &PresentationTree) -> Element<'a, Message> {
    if tree.elements().is_empty() {
        return container(text("No images. Use \"Import Folder\" to add some.").size(16))
            .padding(20)
            .into();
    }

    let cards: Vec<Element<'a, Message>> = tree.elements().iter().map(card).collect();

    let content: Element<'a, Message> = match tree.layout() {
        LayoutMode::List => Column::with_children(cards).spacing(16).into(),
        LayoutMode::Grid => Wrap::with_elements(cards)
            .spacing(Pixels(16.0))
            .line_spacing(Pixels(16.0))
            .into(),
    };

    scrollable(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Enlarged view of one image with a close button
pub fn enlarged<'a>(path: &str) -> Element<'a, Message> {
    column![
        button("Close").on_press(Message::CloseOverlay),
        image(image::Handle::from_path(path))
            .width(Length::Fill)
            .height(Length::Fill),
    ]
    .spacing(12)
    .into()
}
