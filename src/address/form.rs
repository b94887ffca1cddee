//! # Address Form
//!
//! The delivery-address form state, with one [`QueryResolver`] per free-text
//! field (street, neighborhood, city) and the postal-code shortcut that fills
//! three of them at once.

use super::pipeline::{AddressLookupPipeline, PlaceKind, PostalLookup, POSTAL_CODE_DIGITS};
use crate::framework::{
    FrameworkError, Fetcher, QueryResolver, ResolverClient, ResolverConfig,
};
use crate::clients::TransportError;
use crate::model::Suggestion;
use crate::text::digits_only;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Renders a postal code as `NNNNN-NNN`, progressively while typing.
///
/// ```rust
/// use dispatch_console::address::format_postal_code;
///
/// assert_eq!(format_postal_code("140"), "140");
/// assert_eq!(format_postal_code("140900"), "14090-0");
/// assert_eq!(format_postal_code("14090000123"), "14090-000");
/// ```
pub fn format_postal_code(text: &str) -> String {
    let digits: String = digits_only(text).chars().take(POSTAL_CODE_DIGITS).collect();
    if digits.len() > 5 {
        format!("{}-{}", &digits[..5], &digits[5..])
    } else {
        digits
    }
}

/// Fetcher for one address field, reading the form's current city.
pub struct PlaceFieldFetcher {
    pipeline: AddressLookupPipeline,
    kind: PlaceKind,
    city_hint: watch::Receiver<String>,
}

impl PlaceFieldFetcher {
    pub fn new(pipeline: AddressLookupPipeline, kind: PlaceKind, city_hint: watch::Receiver<String>) -> Self {
        Self {
            pipeline,
            kind,
            city_hint,
        }
    }
}

#[async_trait]
impl Fetcher for PlaceFieldFetcher {
    async fn fetch(&self, text: &str) -> Result<Vec<Suggestion>, TransportError> {
        let hint = self.city_hint.borrow().clone();
        Ok(self.pipeline.suggest_places(text, self.kind, &hint).await)
    }
}

/// Plain field values of the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    /// Formatted `NNNNN-NNN`.
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
}

impl AddressFields {
    /// `"street, number - neighborhood, city"`, skipping blank parts.
    pub fn full_address(&self) -> String {
        let mut line = self.street.trim().to_string();
        if !self.number.trim().is_empty() {
            line = format!("{}, {}", line, self.number.trim());
        }
        let tail: Vec<&str> = [self.neighborhood.trim(), self.city.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect();
        if tail.is_empty() {
            line
        } else if line.is_empty() {
            tail.join(", ")
        } else {
            format!("{} - {}", line, tail.join(", "))
        }
    }
}

/// Address form with live suggestions.
///
/// Creating a form spawns its three resolvers on the current Tokio runtime;
/// they stop when the form is dropped.
pub struct AddressForm {
    fields: AddressFields,
    pipeline: AddressLookupPipeline,
    street: ResolverClient,
    neighborhood: ResolverClient,
    city: ResolverClient,
    city_hint: watch::Sender<String>,
}

impl AddressForm {
    pub fn new(pipeline: AddressLookupPipeline, debounce: Duration, min_length: usize) -> Self {
        let (city_hint, _) = watch::channel(String::new());
        let spawn_field = |kind: PlaceKind| {
            let fetcher = PlaceFieldFetcher::new(pipeline.clone(), kind, city_hint.subscribe());
            let config = ResolverConfig::new(kind.to_string(), debounce, min_length);
            let (actor, client) = QueryResolver::new(config, fetcher);
            tokio::spawn(actor.run());
            client
        };
        let street = spawn_field(PlaceKind::Street);
        let neighborhood = spawn_field(PlaceKind::Neighborhood);
        let city = spawn_field(PlaceKind::City);
        info!("Address form ready");

        Self {
            fields: AddressFields::default(),
            pipeline,
            street,
            neighborhood,
            city,
            city_hint,
        }
    }

    pub fn fields(&self) -> &AddressFields {
        &self.fields
    }

    /// Number and complement have no lookups; edit them directly.
    pub fn fields_mut(&mut self) -> &mut AddressFields {
        &mut self.fields
    }

    pub fn full_address(&self) -> String {
        self.fields.full_address()
    }

    /// The resolver behind one field, for observing its suggestions.
    pub fn resolver(&self, kind: PlaceKind) -> &ResolverClient {
        match kind {
            PlaceKind::Street => &self.street,
            PlaceKind::Neighborhood => &self.neighborhood,
            PlaceKind::City => &self.city,
        }
    }

    pub fn set_postal_code(&mut self, text: &str) {
        self.fields.postal_code = format_postal_code(text);
    }

    /// Looks the postal code up and fills street, neighborhood and city on a
    /// hit. A miss leaves every field as the user left it.
    pub async fn apply_postal_code(&mut self) -> PostalLookup {
        let outcome = self.pipeline.resolve_by_postal_code(&self.fields.postal_code).await;
        if let PostalLookup::Found(record) = &outcome {
            debug!(code = %self.fields.postal_code, "Postal code applied");
            self.fields.street = record.street.clone();
            self.fields.neighborhood = record.neighborhood.clone();
            self.fields.city = record.city.clone();
            self.city_hint.send_replace(record.city.clone());
        }
        outcome
    }

    /// Records a keystroke in a lookup field and feeds its resolver.
    pub async fn type_into(&mut self, kind: PlaceKind, text: &str) -> Result<(), FrameworkError> {
        *self.field_mut(kind) = text.to_string();
        if kind == PlaceKind::City {
            self.city_hint.send_replace(text.to_string());
        }
        self.resolver(kind).submit(text).await
    }

    /// Applies the suggestion at `index` to the field. Returns false if the
    /// list no longer has that entry.
    pub async fn select(&mut self, kind: PlaceKind, index: usize) -> Result<bool, FrameworkError> {
        let Some(chosen) = self.resolver(kind).select(index).await? else {
            return Ok(false);
        };
        *self.field_mut(kind) = chosen.label.clone();
        if kind == PlaceKind::City {
            self.city_hint.send_replace(chosen.label);
        }
        Ok(true)
    }

    /// Focus left the field.
    pub async fn blur(&self, kind: PlaceKind) -> Result<(), FrameworkError> {
        self.resolver(kind).clear().await
    }

    fn field_mut(&mut self, kind: PlaceKind) -> &mut String {
        match kind {
            PlaceKind::Street => &mut self.fields.street,
            PlaceKind::Neighborhood => &mut self.fields.neighborhood,
            PlaceKind::City => &mut self.fields.city,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::pipeline::tests::{sumare, FixturePlaces, FixtureRegistry};
    use crate::address::PlaceSearchSettings;
    use crate::clients::PlaceFeature;
    use std::sync::Arc;

    fn form(places: Arc<FixturePlaces>) -> AddressForm {
        let registry = FixtureRegistry {
            records: vec![("14090000".into(), sumare())],
            ..FixtureRegistry::default()
        };
        let pipeline = AddressLookupPipeline::new(Arc::new(registry), places, PlaceSearchSettings::default());
        AddressForm::new(pipeline, Duration::from_millis(300), 3)
    }

    #[test]
    fn test_format_postal_code_progressively() {
        assert_eq!(format_postal_code(""), "");
        assert_eq!(format_postal_code("14090"), "14090");
        assert_eq!(format_postal_code("14090-00"), "14090-00");
        assert_eq!(format_postal_code("14090000"), "14090-000");
    }

    #[test]
    fn test_full_address() {
        let fields = AddressFields {
            street: "Rua Amador Bueno".into(),
            number: "120".into(),
            neighborhood: "Centro".into(),
            city: "Ribeirão Preto".into(),
            ..AddressFields::default()
        };
        assert_eq!(fields.full_address(), "Rua Amador Bueno, 120 - Centro, Ribeirão Preto");

        let partial = AddressFields {
            street: "Rua Amador Bueno".into(),
            ..AddressFields::default()
        };
        assert_eq!(partial.full_address(), "Rua Amador Bueno");
    }

    #[tokio::test]
    async fn test_postal_hit_fills_fields() {
        let mut form = form(Arc::default());
        form.set_postal_code("14090000");
        form.fields_mut().number = "55".into();

        assert!(form.apply_postal_code().await.is_found());
        assert_eq!(form.fields().street, "Avenida Independência");
        assert_eq!(form.fields().neighborhood, "Jardim Sumaré");
        assert_eq!(form.fields().city, "Ribeirão Preto");
        assert_eq!(form.fields().number, "55");
    }

    #[tokio::test]
    async fn test_postal_miss_leaves_fields_untouched() {
        let mut form = form(Arc::default());
        form.fields_mut().street = "Rua digitada".into();
        form.fields_mut().city = "Sertãozinho".into();
        form.set_postal_code("99999-999");
        let before = form.fields().clone();

        assert_eq!(form.apply_postal_code().await, PostalLookup::NotFound);
        assert_eq!(form.fields(), &before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_city_field_steers_street_queries() {
        let places = Arc::new(FixturePlaces {
            features: vec![PlaceFeature {
                name: Some("Rua Tibiriçá".into()),
                ..PlaceFeature::default()
            }],
            ..FixturePlaces::default()
        });
        let mut form = form(places.clone());

        form.type_into(PlaceKind::City, "Sertãozinho").await.unwrap();
        form.type_into(PlaceKind::Street, "Rua Tib").await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let queries = places.queries.lock().unwrap().clone();
        assert!(queries.contains(&"Rua Tib Sertaozinho".to_string()));

        assert!(form.select(PlaceKind::Street, 0).await.unwrap());
        assert_eq!(form.fields().street, "Rua Tibiriçá");
        assert!(form.resolver(PlaceKind::Street).current().suggestions().is_empty());
    }
}
