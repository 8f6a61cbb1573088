use iced::widget::{button, mouse_area, row, text, Row};
use iced::{Alignment, Element, Theme};

use star_gallery::state::MAX_RATING;
use star_gallery::view::{LayoutMode, Toolbar};

use super::star_glyph;
use crate::Message;

fn layout_button<'a>(label: &'a str, layout: LayoutMode, current: LayoutMode) -> Element<'a, Message> {
    let style: fn(&Theme, button::Status) -> button::Style = if layout == current {
        button::primary
    } else {
        button::secondary
    };
    button(text(label))
        .style(style)
        .on_press(Message::ShowLayout(layout))
        .into()
}

/// Layout toggle, rating filter and import button
pub fn toolbar<'a>(toolbar: &Toolbar) -> Element<'a, Message> {
    let current = toolbar.layout();
    let filled = toolbar.displayed_filter();

    let filter_stars: Row<'a, Message> = row((1..=MAX_RATING).map(|star| {
        mouse_area(text(star_glyph(star, filled)).size(22))
            .on_enter(Message::FilterHover(star))
            .on_exit(Message::FilterHoverEnd)
            .on_press(Message::FilterStar(star))
            .into()
    }))
    .spacing(2);

    row![
        layout_button("List", LayoutMode::List, current),
        layout_button("Grid", LayoutMode::Grid, current),
        text("Filter by:"),
        filter_stars,
        button("clear").on_press(Message::ClearFilter),
        button("Import Folder")
            .on_press(Message::ImportFolder)
            .padding(10),
    ]
    .spacing(12)
    .align_y(Alignment::Center)
    .into()
}
