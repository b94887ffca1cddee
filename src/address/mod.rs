//! Address lookup: exact postal-code resolution, fuzzy place suggestions,
//! and the form that ties them to per-field resolvers.

pub mod form;
pub mod pipeline;

pub use form::{format_postal_code, AddressFields, AddressForm, PlaceFieldFetcher};
pub use pipeline::{
    AddressLookupPipeline, PlaceKind, PlaceSearchSettings, PostalLookup, MAX_PLACE_SUGGESTIONS,
};
