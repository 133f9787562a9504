//! Amap (高德) place API v5 adapter.
//!
//! Coordinates are `lng,lat`, which is also the canonical order used by
//! the rest of the system, so no swapping happens here.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

use tablescout_core::config::ProviderConfig;
use tablescout_core::domain::{IpLocation, SearchAnchor, SearchOutcome, SearchQuery, Venue};
use tablescout_core::gateway::{ProviderError, ProviderGateway};

const DEFAULT_BASE_URL: &str = "https://restapi.amap.com";

/// Catch-all POI category for food service; used when no cuisine narrows
/// the search.
const FOOD_SERVICE_CATEGORY: &str = "050000";

const MAX_PAGE_SIZE: u32 = 25;

/// Amap POI category codes for the cuisines the catalog knows about.
const FOOD_CATEGORIES: &[(&str, &str)] = &[
    ("中餐", "050100"),
    ("川菜", "050116"),
    ("粤菜", "050117"),
    ("湘菜", "050119"),
    ("东北菜", "050105"),
    ("火锅", "050300"),
    ("海鲜", "050115"),
    ("西餐", "050200"),
    ("日料", "050201"),
    ("韩餐", "050202"),
    ("快餐", "050301"),
    ("咖啡厅", "050500"),
    ("茶馆", "050502"),
    ("甜点", "050400"),
    ("小吃", "050303"),
    ("烧烤", "050304"),
];

pub struct AmapGateway {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl AmapGateway {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ProviderError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    async fn search_inner(&self, query: &SearchQuery) -> Result<SearchOutcome, ProviderError> {
        let category =
            query.category.clone().unwrap_or_else(|| FOOD_SERVICE_CATEGORY.to_string());
        let page_size = query.page_size.min(MAX_PAGE_SIZE);

        let mut params: Vec<(&str, String)> = vec![
            ("key", self.api_key.expose_secret().to_string()),
            ("types", category),
            ("page_num", query.page.to_string()),
            ("page_size", page_size.to_string()),
            ("show_fields", "business".to_string()),
        ];

        let endpoint = match &query.anchor {
            SearchAnchor::Coordinates { location, radius_m } => {
                params.push(("location", location.clone()));
                params.push(("radius", radius_m.to_string()));
                "/v5/place/around"
            }
            SearchAnchor::City { name } => {
                params.push(("city", name.clone()));
                params.push(("citylimit", "true".to_string()));
                "/v5/place/text"
            }
        };

        if !query.keyword.is_empty() {
            params.push(("keywords", query.keyword.clone()));
        }

        let response: AmapSearchResponse = self.get_json(endpoint, &params).await?;

        if response.status == "1" {
            let venues = response.pois.into_iter().map(parse_poi).collect();
            Ok(SearchOutcome::from_venues(venues))
        } else {
            Ok(SearchOutcome::failed(fail_message(&response.info)))
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{endpoint}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|error| ProviderError::Transport(error.to_string()))?;

        response.json::<T>().await.map_err(|error| ProviderError::Decode(error.to_string()))
    }
}

#[async_trait]
impl ProviderGateway for AmapGateway {
    async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        match self.search_inner(query).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(event_name = "provider.amap.search_failed", error = %error, "search call failed");
                SearchOutcome::failed(error.to_string())
            }
        }
    }

    async fn detail(&self, id: &str) -> Result<Venue, ProviderError> {
        let params = vec![
            ("key", self.api_key.expose_secret().to_string()),
            ("id", id.to_string()),
            ("show_fields", "business".to_string()),
        ];

        let response: AmapSearchResponse = self.get_json("/v5/place/detail", &params).await?;

        if response.status == "1" {
            response
                .pois
                .into_iter()
                .next()
                .map(parse_poi)
                .ok_or_else(|| ProviderError::NotFound(id.to_string()))
        } else {
            Err(ProviderError::Status(fail_message(&response.info)))
        }
    }

    async fn geocode(&self, address: &str, city: Option<&str>) -> Option<String> {
        let mut params = vec![
            ("key", self.api_key.expose_secret().to_string()),
            ("address", address.to_string()),
        ];
        if let Some(city) = city {
            params.push(("city", city.to_string()));
        }

        let response: AmapGeocodeResponse =
            self.get_json("/v3/geocode/geo", &params).await.ok()?;

        if response.status != "1" {
            return None;
        }
        response
            .geocodes
            .into_iter()
            .next()
            .map(|geocode| geocode.location)
            .filter(|location| !location.is_empty())
    }

    async fn ip_locate(&self, ip: Option<&str>) -> Result<IpLocation, ProviderError> {
        let mut params = vec![("key", self.api_key.expose_secret().to_string())];
        if let Some(ip) = ip {
            params.push(("ip", ip.to_string()));
        }

        let response: AmapIpResponse = self.get_json("/v3/ip", &params).await?;

        if response.status != "1" {
            return Err(ProviderError::Status(fail_message(&response.info)));
        }

        // IP location may resolve to city granularity only; the rectangle's
        // first corner stands in for coordinates when present.
        let coordinates = response
            .rectangle
            .split(';')
            .next()
            .filter(|corner| corner.contains(','))
            .map(str::to_string);

        Ok(IpLocation { coordinates, city: response.city, province: response.province })
    }

    fn cuisine_category(&self, cuisine: &str) -> Option<String> {
        FOOD_CATEGORIES
            .iter()
            .find(|(name, _)| *name == cuisine)
            .map(|(_, code)| (*code).to_string())
    }
}

fn fail_message(info: &str) -> String {
    if info.is_empty() {
        "search failed".to_string()
    } else {
        info.to_string()
    }
}

fn parse_poi(poi: AmapPoi) -> Venue {
    let category = poi
        .poi_type
        .split(';')
        .next()
        .filter(|head| !head.is_empty())
        .unwrap_or("餐厅")
        .to_string();

    let distance =
        if poi.distance.is_empty() { String::new() } else { format!("{}m", poi.distance) };

    let tag = if poi.business.tag.is_empty() { poi.business.keytag } else { poi.business.tag };

    Venue {
        id: poi.id,
        name: poi.name,
        category,
        address: poi.address,
        location: poi.location,
        phone: poi.business.tel,
        rating: poi.business.rating,
        cost: poi.business.cost,
        distance,
        business_hours: poi.business.opentime_today,
        tag,
        city: poi.cityname,
        district: poi.adname,
    }
}

#[derive(Debug, Default, Deserialize)]
struct AmapSearchResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    info: String,
    #[serde(default)]
    pois: Vec<AmapPoi>,
}

#[derive(Debug, Default, Deserialize)]
struct AmapPoi {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    poi_type: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    distance: String,
    #[serde(default)]
    cityname: String,
    #[serde(default)]
    adname: String,
    #[serde(default)]
    business: AmapBusiness,
}

#[derive(Debug, Default, Deserialize)]
struct AmapBusiness {
    #[serde(default)]
    tel: String,
    #[serde(default)]
    rating: String,
    #[serde(default)]
    cost: String,
    #[serde(default)]
    opentime_today: String,
    #[serde(default)]
    tag: String,
    #[serde(default)]
    keytag: String,
}

#[derive(Debug, Default, Deserialize)]
struct AmapGeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    geocodes: Vec<AmapGeocode>,
}

#[derive(Debug, Default, Deserialize)]
struct AmapGeocode {
    #[serde(default)]
    location: String,
}

#[derive(Debug, Default, Deserialize)]
struct AmapIpResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    info: String,
    #[serde(default)]
    rectangle: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    province: String,
}
