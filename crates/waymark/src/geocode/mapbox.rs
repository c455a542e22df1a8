//! Mapbox forward-geocoding provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, instrument};
use waymark_data::Coordinates;

use super::provider::{GeocodingProvider, PlaceQuery, ProviderError, ProviderMatch};

pub const MAPBOX_GEOCODING_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";
pub const MAPBOX_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

#[derive(Debug, Clone)]
pub struct MapboxProvider {
    client: Client,
    token: String,
    base_url: String,
}

impl MapboxProvider {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token: token.into(),
            base_url: MAPBOX_GEOCODING_URL.to_string(),
        })
    }

    /// Build a provider from the `MAPBOX_ACCESS_TOKEN` environment variable.
    pub fn from_env(timeout: Duration) -> Result<Self, ProviderError> {
        let token = std::env::var(MAPBOX_TOKEN_ENV)
            .map_err(|_| ProviderError::Unavailable(format!("{MAPBOX_TOKEN_ENV} is not set")))?;
        Self::new(token, timeout)
    }

    /// Point at a different endpoint (a proxy, or a local stub server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self, query: &PlaceQuery) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::Unavailable(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ProviderError::Unavailable("base url cannot take a path".to_string()))?
            .pop_if_empty()
            .push(&format!("{}.json", query.text.trim()));
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("access_token", &self.token);
            pairs.append_pair("limit", "1");
            if !query.types.is_empty() {
                let types = query
                    .types
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                pairs.append_pair("types", &types);
            }
            if let Some(countries) = &query.countries {
                pairs.append_pair("country", &countries.join(","));
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl GeocodingProvider for MapboxProvider {
    fn name(&self) -> &'static str {
        "mapbox"
    }

    #[instrument(name = "Mapbox search", skip_all, fields(text = %query.text), level = "debug")]
    async fn search(&self, query: &PlaceQuery) -> Result<Option<ProviderMatch>, ProviderError> {
        let url = self.request_url(query)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        let best = parse_best_feature(&body)?;
        debug!(found = best.is_some(), "Mapbox search complete");
        Ok(best)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    text: Option<String>,
    place_name: Option<String>,
    /// `[longitude, latitude]`
    center: [f64; 2],
}

/// Pull the top-ranked feature out of a Mapbox feature collection.
fn parse_best_feature(body: &str) -> Result<Option<ProviderMatch>, ProviderError> {
    let collection: FeatureCollection =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;
    let Some(feature) = collection.features.into_iter().next() else {
        return Ok(None);
    };

    let name = feature
        .text
        .or(feature.place_name)
        .ok_or_else(|| ProviderError::Decode("feature has no name".to_string()))?;
    let [longitude, latitude] = feature.center;

    Ok(Some(ProviderMatch {
        name,
        coordinates: Coordinates::new(longitude, latitude),
    }))
}
