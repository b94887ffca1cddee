//! Suggestions surfaced under a free-text field.
//!
//! Every field searcher, whatever its upstream, produces [`Suggestion`]s so a
//! single resolver type can drive all of them.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Which logical field a suggestion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Street,
    Neighborhood,
    City,
    Customer,
    MenuItem,
    Tracking,
}

impl Display for SuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SuggestionKind::Street => "street",
            SuggestionKind::Neighborhood => "neighborhood",
            SuggestionKind::City => "city",
            SuggestionKind::Customer => "customer",
            SuggestionKind::MenuItem => "menu_item",
            SuggestionKind::Tracking => "tracking",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for SuggestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "street" => Ok(SuggestionKind::Street),
            "neighborhood" => Ok(SuggestionKind::Neighborhood),
            "city" => Ok(SuggestionKind::City),
            "customer" => Ok(SuggestionKind::Customer),
            "menu_item" | "menu" => Ok(SuggestionKind::MenuItem),
            "tracking" => Ok(SuggestionKind::Tracking),
            other => Err(format!("unknown suggestion kind: {other}")),
        }
    }
}

/// One selectable entry under a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    pub kind: SuggestionKind,
    /// The upstream record the label was extracted from.
    pub raw: serde_json::Value,
}

impl Suggestion {
    pub fn new(label: impl Into<String>, kind: SuggestionKind, raw: serde_json::Value) -> Self {
        Self {
            label: label.into(),
            kind,
            raw,
        }
    }

    /// A suggestion whose raw record is just its label.
    pub fn plain(label: impl Into<String>, kind: SuggestionKind) -> Self {
        let label = label.into();
        let raw = serde_json::Value::String(label.clone());
        Self { label, kind, raw }
    }
}

/// One applied resolution for a field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResult {
    pub source_id: String,
    pub sequence: u64,
    pub items: Vec<Suggestion>,
}

/// A registered customer as returned by the console backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub complement: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// A menu entry as returned by the console backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub out_of_stock: bool,
}

fn default_true() -> bool {
    true
}
