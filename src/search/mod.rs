//! Fetchers for the non-address lookup fields. Each one is meant to sit
//! behind its own [`QueryResolver`](crate::framework::QueryResolver).

pub mod customer;
pub mod menu;
pub mod orders;

pub use customer::{customer_label, format_phone, CustomerFetcher};
pub use menu::{filter_menu, MenuItemFetcher};
pub use orders::{order_label, TrackingSearchFetcher};
