//! # Address Lookup Pipeline
//!
//! Two lookup paths behind the address form:
//!
//! - **Exact**: an 8-digit postal code goes to the structured registry and
//!   either fills street/neighborhood/city or reports [`PostalLookup::NotFound`].
//! - **Fuzzy**: free text for one field goes to the place search, biased to
//!   the operating area, and comes back as at most five distinct labels.
//!
//! Neither path returns an error. Failures are logged and degrade to
//! `NotFound` or an empty list; the form stays editable either way.

use crate::clients::{PlaceFeature, PlaceSearch, PostalRecord, PostalRegistry};
use crate::geometry::Coordinate;
use crate::model::{Suggestion, SuggestionKind};
use crate::text::{digits_only, normalize_label, strip_diacritics};
use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Digits in a complete postal code.
pub const POSTAL_CODE_DIGITS: usize = 8;

/// Shortest trimmed text worth a place search.
pub const MIN_PLACE_QUERY: usize = 3;

/// Most suggestions a place search returns, whatever the configured limit.
pub const MAX_PLACE_SUGGESTIONS: usize = 5;

/// Outcome of an exact postal-code lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostalLookup {
    Found(PostalRecord),
    /// Invalid length, registry miss, or unreachable registry.
    NotFound,
}

impl PostalLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, PostalLookup::Found(_))
    }
}

/// The address field a place search is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceKind {
    Street,
    Neighborhood,
    City,
}

impl PlaceKind {
    pub fn suggestion_kind(self) -> SuggestionKind {
        match self {
            PlaceKind::Street => SuggestionKind::Street,
            PlaceKind::Neighborhood => SuggestionKind::Neighborhood,
            PlaceKind::City => SuggestionKind::City,
        }
    }

    /// The one attribute this field takes from a feature, if present.
    pub fn extract(self, feature: &PlaceFeature) -> Option<&str> {
        match self {
            PlaceKind::Street => non_empty(&feature.name).or_else(|| non_empty(&feature.street)),
            PlaceKind::Neighborhood => {
                let value = non_empty(&feature.suburb)
                    .or_else(|| non_empty(&feature.district))
                    .or_else(|| non_empty(&feature.locality))
                    .or_else(|| non_empty(&feature.neighbourhood))?;
                match non_empty(&feature.city) {
                    Some(city) if normalize_label(city) == normalize_label(value) => None,
                    _ => Some(value),
                }
            }
            PlaceKind::City => non_empty(&feature.city),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl Display for PlaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.suggestion_kind().fmt(f)
    }
}

impl FromStr for PlaceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "street" => Ok(PlaceKind::Street),
            "neighborhood" => Ok(PlaceKind::Neighborhood),
            "city" => Ok(PlaceKind::City),
            other => Err(format!("unknown place kind: {other}")),
        }
    }
}

/// Settings for the fuzzy path.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceSearchSettings {
    pub bias: Coordinate,
    /// City appended to street/neighborhood queries when the form has none.
    pub default_city: String,
    /// Appended to city queries.
    pub country: String,
    pub limit: usize,
}

impl Default for PlaceSearchSettings {
    fn default() -> Self {
        Self {
            bias: Coordinate::new(-21.17, -47.80),
            default_city: "Ribeirão Preto".to_string(),
            country: "Brasil".to_string(),
            limit: 5,
        }
    }
}

/// Exact and fuzzy address lookup over injected providers.
#[derive(Clone)]
pub struct AddressLookupPipeline {
    registry: Arc<dyn PostalRegistry>,
    places: Arc<dyn PlaceSearch>,
    settings: PlaceSearchSettings,
}

impl AddressLookupPipeline {
    pub fn new(
        registry: Arc<dyn PostalRegistry>,
        places: Arc<dyn PlaceSearch>,
        settings: PlaceSearchSettings,
    ) -> Self {
        Self {
            registry,
            places,
            settings,
        }
    }

    pub fn settings(&self) -> &PlaceSearchSettings {
        &self.settings
    }

    /// Resolves a postal code typed in any format (`14090-000`, `14090000`).
    #[instrument(skip(self))]
    pub async fn resolve_by_postal_code(&self, code: &str) -> PostalLookup {
        let digits = digits_only(code);
        if digits.len() != POSTAL_CODE_DIGITS {
            debug!(digits = digits.len(), "Postal code incomplete");
            return PostalLookup::NotFound;
        }

        match self.registry.lookup(&digits).await {
            Ok(Some(record)) => PostalLookup::Found(record),
            Ok(None) => {
                debug!(code = %digits, "Postal code not registered");
                PostalLookup::NotFound
            }
            Err(e) => {
                warn!(code = %digits, error = %e, "Postal registry unavailable");
                PostalLookup::NotFound
            }
        }
    }

    /// Suggests values for one address field.
    ///
    /// `city_hint` narrows street and neighborhood searches; blank falls back
    /// to the configured default city.
    #[instrument(skip(self))]
    pub async fn suggest_places(&self, text: &str, kind: PlaceKind, city_hint: &str) -> Vec<Suggestion> {
        let text = text.trim();
        if text.chars().count() < MIN_PLACE_QUERY {
            return Vec::new();
        }

        let limit = self.settings.limit.min(MAX_PLACE_SUGGESTIONS);
        let query = self.build_query(text, kind, city_hint);
        let features = match self
            .places
            .search(&query, limit, self.settings.bias)
            .await
        {
            Ok(features) => features,
            Err(e) => {
                warn!(%kind, error = %e, "Place search failed");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let suggestions: Vec<Suggestion> = features
            .iter()
            .filter_map(|feature| {
                let label = kind.extract(feature)?.trim();
                if !seen.insert(normalize_label(label)) {
                    return None;
                }
                let raw = serde_json::to_value(feature).unwrap_or(serde_json::Value::Null);
                Some(Suggestion::new(label, kind.suggestion_kind(), raw))
            })
            .take(limit)
            .collect();

        debug!(%kind, hits = features.len(), kept = suggestions.len(), "Place suggestions");
        suggestions
    }

    fn build_query(&self, text: &str, kind: PlaceKind, city_hint: &str) -> String {
        let text = strip_diacritics(text);
        match kind {
            PlaceKind::Street | PlaceKind::Neighborhood => {
                let city = match city_hint.trim() {
                    "" => self.settings.default_city.as_str(),
                    hint => hint,
                };
                format!("{} {}", text, strip_diacritics(city))
            }
            PlaceKind::City => format!("{} {}", text, self.settings.country),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clients::TransportError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Registry answering from a fixed table.
    #[derive(Default)]
    pub struct FixtureRegistry {
        pub records: Vec<(String, PostalRecord)>,
        pub fail: bool,
    }

    #[async_trait]
    impl PostalRegistry for FixtureRegistry {
        async fn lookup(&self, code: &str) -> Result<Option<PostalRecord>, TransportError> {
            if self.fail {
                return Err(TransportError::Request("unreachable".into()));
            }
            Ok(self
                .records
                .iter()
                .find(|(c, _)| c == code)
                .map(|(_, r)| r.clone()))
        }
    }

    /// Place search returning fixed features and recording queries.
    #[derive(Default)]
    pub struct FixturePlaces {
        pub features: Vec<PlaceFeature>,
        pub fail: bool,
        pub queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PlaceSearch for FixturePlaces {
        async fn search(
            &self,
            query: &str,
            _limit: usize,
            _bias: Coordinate,
        ) -> Result<Vec<PlaceFeature>, TransportError> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(TransportError::Status {
                    status: 503,
                    url: "https://photon.test/api/".into(),
                });
            }
            Ok(self.features.clone())
        }
    }

    pub fn sumare() -> PostalRecord {
        PostalRecord {
            street: "Avenida Independência".into(),
            neighborhood: "Jardim Sumaré".into(),
            city: "Ribeirão Preto".into(),
            state: Some("SP".into()),
        }
    }

    fn pipeline(registry: FixtureRegistry, places: Arc<FixturePlaces>) -> AddressLookupPipeline {
        AddressLookupPipeline::new(Arc::new(registry), places, PlaceSearchSettings::default())
    }

    fn feature(name: Option<&str>, suburb: Option<&str>, city: Option<&str>) -> PlaceFeature {
        PlaceFeature {
            name: name.map(String::from),
            suburb: suburb.map(String::from),
            city: city.map(String::from),
            ..PlaceFeature::default()
        }
    }

    #[tokio::test]
    async fn test_postal_code_found_in_any_format() {
        let registry = FixtureRegistry {
            records: vec![("14090000".into(), sumare())],
            ..FixtureRegistry::default()
        };
        let pipeline = pipeline(registry, Arc::default());

        assert_eq!(
            pipeline.resolve_by_postal_code("14090-000").await,
            PostalLookup::Found(sumare())
        );
        assert!(pipeline.resolve_by_postal_code("14090000").await.is_found());
    }

    #[tokio::test]
    async fn test_postal_code_failures_are_not_found() {
        let pipeline_miss = pipeline(FixtureRegistry::default(), Arc::default());
        assert_eq!(
            pipeline_miss.resolve_by_postal_code("99999999").await,
            PostalLookup::NotFound
        );
        assert_eq!(
            pipeline_miss.resolve_by_postal_code("1409").await,
            PostalLookup::NotFound
        );
        assert_eq!(
            pipeline_miss.resolve_by_postal_code("140900001").await,
            PostalLookup::NotFound
        );

        let failing = FixtureRegistry {
            fail: true,
            ..FixtureRegistry::default()
        };
        assert_eq!(
            pipeline(failing, Arc::default())
                .resolve_by_postal_code("14090000")
                .await,
            PostalLookup::NotFound
        );
    }

    #[tokio::test]
    async fn test_street_query_appends_city_without_accents() {
        let places = Arc::new(FixturePlaces::default());
        let pipeline = pipeline(FixtureRegistry::default(), places.clone());

        pipeline.suggest_places("Rua São José", PlaceKind::Street, "").await;
        pipeline.suggest_places("Centro", PlaceKind::Neighborhood, "Sertãozinho").await;
        pipeline.suggest_places("Ribeir", PlaceKind::City, "ignored").await;

        assert_eq!(
            *places.queries.lock().unwrap(),
            vec![
                "Rua Sao Jose Ribeirao Preto".to_string(),
                "Centro Sertaozinho".to_string(),
                "Ribeir Brasil".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_short_text_skips_search() {
        let places = Arc::new(FixturePlaces::default());
        let pipeline = pipeline(FixtureRegistry::default(), places.clone());

        assert!(pipeline.suggest_places(" ab ", PlaceKind::Street, "").await.is_empty());
        assert!(places.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_street_labels_are_deduplicated() {
        let places = Arc::new(FixturePlaces {
            features: vec![
                feature(Some("Rua Amador Bueno"), None, Some("Ribeirão Preto")),
                feature(Some("rua amador  bueno"), None, Some("Ribeirão Preto")),
                PlaceFeature {
                    street: Some("Rua Tibiriçá".into()),
                    ..PlaceFeature::default()
                },
                feature(None, Some("Centro"), None),
            ],
            ..FixturePlaces::default()
        });
        let pipeline = pipeline(FixtureRegistry::default(), places);

        let suggestions = pipeline.suggest_places("rua", PlaceKind::Street, "").await;
        let labels: Vec<_> = suggestions.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Rua Amador Bueno", "Rua Tibiriçá"]);
        assert_eq!(suggestions[0].kind, SuggestionKind::Street);
        assert_eq!(suggestions[0].raw["city"], "Ribeirão Preto");
    }

    #[tokio::test]
    async fn test_neighborhood_skips_city_echo() {
        let places = Arc::new(FixturePlaces {
            features: vec![
                feature(None, Some("Ribeirão Preto"), Some("Ribeirão Preto")),
                PlaceFeature {
                    district: Some("Vila Tibério".into()),
                    city: Some("Ribeirão Preto".into()),
                    ..PlaceFeature::default()
                },
                PlaceFeature {
                    neighbourhood: Some("Jardim Paulista".into()),
                    ..PlaceFeature::default()
                },
                feature(Some("Loja"), None, None),
            ],
            ..FixturePlaces::default()
        });
        let pipeline = pipeline(FixtureRegistry::default(), places);

        let labels: Vec<_> = pipeline
            .suggest_places("vila", PlaceKind::Neighborhood, "")
            .await
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["Vila Tibério", "Jardim Paulista"]);
    }

    #[tokio::test]
    async fn test_results_capped_at_limit() {
        let features = (0..8)
            .map(|i| feature(None, None, Some(&format!("Cidade {i}"))))
            .collect();
        let places = Arc::new(FixturePlaces {
            features,
            ..FixturePlaces::default()
        });
        let pipeline = pipeline(FixtureRegistry::default(), places);

        assert_eq!(pipeline.suggest_places("cidade", PlaceKind::City, "").await.len(), 5);
    }

    #[tokio::test]
    async fn test_configured_limit_never_exceeds_five() {
        let features = (0..8)
            .map(|i| feature(None, None, Some(&format!("Cidade {i}"))))
            .collect();
        let places = Arc::new(FixturePlaces {
            features,
            ..FixturePlaces::default()
        });
        let settings = PlaceSearchSettings {
            limit: 8,
            ..PlaceSearchSettings::default()
        };
        let pipeline = AddressLookupPipeline::new(Arc::new(FixtureRegistry::default()), places, settings);

        assert_eq!(pipeline.suggest_places("cidade", PlaceKind::City, "").await.len(), 5);
    }

    #[tokio::test]
    async fn test_search_failure_is_empty() {
        let places = Arc::new(FixturePlaces {
            fail: true,
            ..FixturePlaces::default()
        });
        let pipeline = pipeline(FixtureRegistry::default(), places);
        assert!(pipeline.suggest_places("centro", PlaceKind::City, "").await.is_empty());
    }

    #[test]
    fn test_place_kind_parse() {
        assert_eq!("street".parse::<PlaceKind>(), Ok(PlaceKind::Street));
        assert!("customer".parse::<PlaceKind>().is_err());
        assert_eq!(PlaceKind::Neighborhood.to_string(), "neighborhood");
    }
}
