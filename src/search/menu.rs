//! Menu item lookup. The backend has no search endpoint for the menu, so the
//! catalog is fetched and filtered here.

use crate::clients::{ConsoleApi, TransportError};
use crate::framework::Fetcher;
use crate::model::{MenuItem, Suggestion, SuggestionKind};
use crate::text::matches_loosely;
use async_trait::async_trait;

pub const MENU_SUGGESTIONS: usize = 5;

/// Active items whose name, category or description contains `text`,
/// ignoring case and accents.
pub fn filter_menu(items: &[MenuItem], text: &str) -> Vec<MenuItem> {
    let text = text.trim();
    items
        .iter()
        .filter(|item| item.active)
        .filter(|item| {
            matches_loosely(&item.name, text)
                || item
                    .category_name
                    .as_deref()
                    .is_some_and(|c| matches_loosely(c, text))
                || item
                    .description
                    .as_deref()
                    .is_some_and(|d| matches_loosely(d, text))
        })
        .take(MENU_SUGGESTIONS)
        .cloned()
        .collect()
}

#[derive(Clone)]
pub struct MenuItemFetcher {
    api: ConsoleApi,
}

impl MenuItemFetcher {
    pub fn new(api: ConsoleApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Fetcher for MenuItemFetcher {
    async fn fetch(&self, text: &str) -> Result<Vec<Suggestion>, TransportError> {
        let catalog = self.api.menu_items().await?;
        filter_menu(&catalog, text)
            .into_iter()
            .map(|item| -> Result<Suggestion, TransportError> {
                let raw = serde_json::to_value(&item)?;
                Ok(Suggestion::new(item.name, SuggestionKind::MenuItem, raw))
            })
            .collect()
    }
}
