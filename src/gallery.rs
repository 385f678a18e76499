// gallery.rs: category filter and item selection over the gallery document

use crate::content::GalleryItem;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Gallery {
    items: Arc<Vec<GalleryItem>>,
    /// Distinct categories, first-seen order.
    categories: Vec<String>,
    filter: Option<String>,
    /// Index into `items` of the item shown in detail.
    selected: Option<usize>,
}

fn categories_of(items: &[GalleryItem]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.iter().any(|c| *c == item.category) {
            out.push(item.category.clone());
        }
    }
    out
}

impl Gallery {
    /// Filter defaults to the first category.
    pub fn new(items: Arc<Vec<GalleryItem>>) -> Self {
        let categories = categories_of(&items);
        let filter = categories.first().cloned();
        Self {
            items,
            categories,
            filter,
            selected: None,
        }
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Switch to `category`. Unknown categories are ignored.
    pub fn set_filter(&mut self, category: &str) -> bool {
        if !self.categories.iter().any(|c| c == category) {
            tracing::debug!(%category, "ignoring unknown gallery category");
            return false;
        }
        self.filter = Some(category.to_string());
        true
    }

    /// Items of the active category, or all of them without a filter.
    pub fn visible(&self) -> Vec<&GalleryItem> {
        self.visible_indices().map(|i| &self.items[i]).collect()
    }

    fn visible_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter(move |(_, item)| match &self.filter {
                Some(f) => item.category == *f,
                None => true,
            })
            .map(|(i, _)| i)
    }

    /// Open the detail view for the `index`-th visible item.
    pub fn select(&mut self, index: usize) -> bool {
        let nth = self.visible_indices().nth(index);
        match nth {
            Some(i) => {
                self.selected = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn selected(&self) -> Option<&GalleryItem> {
        self.selected.and_then(|i| self.items.get(i))
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    /// Swap in a fresher document. The filter survives if its category
    /// still exists; the detail view is closed.
    pub fn replace_items(&mut self, items: Arc<Vec<GalleryItem>>) {
        let previous = self.filter.take();
        *self = Self::new(items);
        if let Some(f) = previous {
            self.set_filter(&f);
        }
    }
}

/// Display form of a category: first character upper-cased.
pub fn category_label(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GalleryView {
    #[default]
    Loading,
    Unavailable(String),
    Ready(Gallery),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, category: &str) -> GalleryItem {
        GalleryItem {
            title: title.to_string(),
            image: format!("/img/{}.jpg", title),
            location: "somewhere".to_string(),
            category: category.to_string(),
            history: String::new(),
            mystery: None,
        }
    }

    fn gallery() -> Gallery {
        Gallery::new(Arc::new(vec![
            item("kedarnath", "temples"),
            item("ganga", "sacred places"),
            item("somnath", "temples"),
            item("shiva", "gods"),
        ]))
    }

    #[test]
    fn categories_in_first_seen_order_with_default_filter() {
        let g = gallery();
        assert_eq!(g.categories(), ["temples", "sacred places", "gods"]);
        assert_eq!(g.filter(), Some("temples"));
        let titles: Vec<_> = g.visible().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["kedarnath", "somnath"]);
    }

    #[test]
    fn select_indexes_the_visible_list() {
        let mut g = gallery();
        assert!(g.select(1));
        assert_eq!(g.selected().unwrap().title, "somnath");
        assert!(!g.select(5));
        assert_eq!(g.selected().unwrap().title, "somnath");

        assert!(g.set_filter("gods"));
        assert!(g.select(0));
        assert_eq!(g.selected().unwrap().title, "shiva");
        g.close_detail();
        assert!(g.selected().is_none());
    }

    #[test]
    fn unknown_filter_is_ignored() {
        let mut g = gallery();
        assert!(!g.set_filter("rivers"));
        assert_eq!(g.filter(), Some("temples"));
    }

    #[test]
    fn replace_keeps_existing_filter() {
        let mut g = gallery();
        g.set_filter("gods");
        g.select(0);
        g.replace_items(Arc::new(vec![item("x", "temples"), item("y", "gods")]));
        assert_eq!(g.filter(), Some("gods"));
        assert!(g.selected().is_none());

        g.replace_items(Arc::new(vec![item("z", "rivers")]));
        assert_eq!(g.filter(), Some("rivers"));
    }

    #[test]
    fn empty_gallery_has_no_filter() {
        let g = Gallery::new(Arc::new(Vec::new()));
        assert!(g.filter().is_none());
        assert!(g.visible().is_empty());
    }

    #[test]
    fn labels_capitalize_first_letter() {
        assert_eq!(category_label("temples"), "Temples");
        assert_eq!(category_label("sacred places"), "Sacred places");
        assert_eq!(category_label(""), "");
    }
}
