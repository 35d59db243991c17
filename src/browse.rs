//! Home-page rows and category filters over an already visibility-filtered list.

use crate::domain::{Brand, CatalogItem, Section};
use serde::Serialize;

const SERIES_GENRE: &str = "TV Series";
const RECENT_SHELF_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shelf {
    pub id: String,
    pub title: String,
    pub items: Vec<CatalogItem>,
}

/// `Movies`, `Series` and `Trending` are built-in; `all` or a blank value
/// keeps everything; anything else is a genre.
pub fn filter_by_category(items: &[CatalogItem], category: &str) -> Vec<CatalogItem> {
    let category = category.trim();
    let keep = |i: &CatalogItem| match category.to_lowercase().as_str() {
        "" | "all" => true,
        "movies" => !i.has_genre(SERIES_GENRE),
        "series" => i.has_genre(SERIES_GENRE),
        "trending" => i.is_trending,
        _ => i.has_genre(category),
    };
    items.iter().filter(|i| keep(i)).cloned().collect()
}

pub fn brand_items(items: &[CatalogItem], brand: Brand) -> Vec<CatalogItem> {
    items.iter().filter(|i| i.brand == brand).cloned().collect()
}

fn by_section(items: &[CatalogItem], section: Section) -> Vec<CatalogItem> {
    items.iter().filter(|i| i.section == section).cloned().collect()
}

/// A signed-in account's own lists, used for the leading home rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonalLists<'a> {
    pub continue_watching: &'a [String],
    pub watchlist: &'a [String],
}

fn pick(items: &[CatalogItem], ids: &[String]) -> Vec<CatalogItem> {
    items.iter().filter(|i| ids.contains(&i.id)).cloned().collect()
}

/// Rows for the home page, in display order. With `personal`, the
/// continue-watching and watchlist rows come first. Empty rows are left out.
///
/// `items` is expected to be the visible items of one brand; the personal
/// rows only show entries present in it, in catalog order.
pub fn home_shelves(items: &[CatalogItem], personal: Option<PersonalLists<'_>>) -> Vec<Shelf> {
    let mut rows: Vec<(&str, &str, Vec<CatalogItem>)> = Vec::new();
    if let Some(lists) = personal {
        rows.push(("continue", "Continue Watching", pick(items, lists.continue_watching)));
        rows.push(("watchlist", "My Watchlist", pick(items, lists.watchlist)));
    }
    rows.extend([
        ("kinyarwanda", "Films in Kinyarwanda", by_section(items, Section::Kinyarwanda)),
        ("rwanda", "Films in Rwanda", by_section(items, Section::Rwanda)),
        ("english", "Films in English", by_section(items, Section::English)),
        (
            "recent",
            "New Arrivals",
            items.iter().take(RECENT_SHELF_LEN).cloned().collect(),
        ),
        ("action", "Action", filter_by_category(items, "Action")),
        ("horror", "Horror", filter_by_category(items, "Horror")),
    ]);
    rows.into_iter()
        .filter(|(_, _, items)| !items.is_empty())
        .map(|(id, title, items)| Shelf {
            id: id.to_string(),
            title: title.to_string(),
            items,
        })
        .collect()
}
