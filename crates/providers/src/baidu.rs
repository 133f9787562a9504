//! Baidu place API v2 adapter.
//!
//! Baidu addresses coordinates as `lat,lng`; the canonical order everywhere
//! else is `lng,lat`, so this adapter swaps on the way out and normalizes
//! responses back.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

use tablescout_core::catalog::FALLBACK_KEYWORD;
use tablescout_core::config::ProviderConfig;
use tablescout_core::domain::{IpLocation, SearchAnchor, SearchOutcome, SearchQuery, Venue};
use tablescout_core::gateway::{ProviderError, ProviderGateway};

const DEFAULT_BASE_URL: &str = "https://api.map.baidu.com";

const MAX_RADIUS_M: u32 = 50_000;
const MAX_PAGE_SIZE: u32 = 20;

/// Baidu uses free-text tags instead of numeric category codes.
const FOOD_TAGS: &[(&str, &str)] = &[
    ("中餐", "中餐厅"),
    ("川菜", "川菜"),
    ("粤菜", "粤菜"),
    ("湘菜", "湘菜"),
    ("东北菜", "东北菜"),
    ("火锅", "火锅"),
    ("海鲜", "海鲜"),
    ("西餐", "西餐"),
    ("日料", "日本料理"),
    ("韩餐", "韩国料理"),
    ("快餐", "快餐"),
    ("咖啡厅", "咖啡厅"),
    ("茶馆", "茶馆"),
    ("甜点", "甜品店"),
    ("小吃", "小吃"),
    ("烧烤", "烧烤"),
];

pub struct BaiduGateway {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl BaiduGateway {
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
        // Baidu requires a query term; fall back to the generic one.
        let keyword = if query.keyword.is_empty() {
            FALLBACK_KEYWORD.to_string()
        } else {
            query.keyword.clone()
        };
        let page_size = query.page_size.min(MAX_PAGE_SIZE);

        let mut params: Vec<(&str, String)> = vec![
            ("ak", self.api_key.expose_secret().to_string()),
            ("query", keyword),
            ("scope", "2".to_string()),
            ("output", "json".to_string()),
            // Baidu pages from zero.
            ("page_num", query.page.saturating_sub(1).to_string()),
            ("page_size", page_size.to_string()),
        ];

        match &query.anchor {
            SearchAnchor::Coordinates { location, radius_m } => {
                params.push(("location", swap_coord_order(location)));
                params.push(("radius", (*radius_m).min(MAX_RADIUS_M).to_string()));
                // Inbound coordinates are GCJ-02; Baidu converts internally.
                params.push(("coord_type", "2".to_string()));
            }
            SearchAnchor::City { name } => {
                params.push(("region", name.clone()));
                params.push(("city_limit", "true".to_string()));
            }
        }

        if let Some(tag) = &query.category {
            params.push(("tag", tag.clone()));
        }

        let response: BaiduSearchResponse =
            self.get_json("/place/v2/search", &params).await?;

        if response.status == 0 {
            let venues = response.results.into_iter().map(parse_poi).collect();
            Ok(SearchOutcome::from_venues(venues))
        } else {
            Ok(SearchOutcome::failed(fail_message(&response.message)))
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
impl ProviderGateway for BaiduGateway {
    async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        match self.search_inner(query).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(event_name = "provider.baidu.search_failed", error = %error, "search call failed");
                SearchOutcome::failed(error.to_string())
            }
        }
    }

    async fn detail(&self, id: &str) -> Result<Venue, ProviderError> {
        let params = vec![
            ("ak", self.api_key.expose_secret().to_string()),
            ("uid", id.to_string()),
            ("scope", "2".to_string()),
            ("output", "json".to_string()),
        ];

        let response: BaiduDetailResponse = self.get_json("/place/v2/detail", &params).await?;

        if response.status == 0 {
            response.result.map(parse_poi).ok_or_else(|| ProviderError::NotFound(id.to_string()))
        } else {
            Err(ProviderError::Status(fail_message(&response.message)))
        }
    }

    async fn geocode(&self, address: &str, city: Option<&str>) -> Option<String> {
        let mut params = vec![
            ("ak", self.api_key.expose_secret().to_string()),
            ("address", address.to_string()),
            ("output", "json".to_string()),
        ];
        if let Some(city) = city {
            params.push(("city", city.to_string()));
        }

        let response: BaiduGeocodeResponse =
            self.get_json("/geocoding/v3/", &params).await.ok()?;

        if response.status != 0 {
            return None;
        }
        let location = response.result?.location?;
        Some(format!("{},{}", location.lng, location.lat))
    }

    async fn ip_locate(&self, ip: Option<&str>) -> Result<IpLocation, ProviderError> {
        let mut params = vec![
            ("ak", self.api_key.expose_secret().to_string()),
            ("coor", "bd09ll".to_string()),
        ];
        if let Some(ip) = ip {
            params.push(("ip", ip.to_string()));
        }

        let response: BaiduIpResponse = self.get_json("/location/ip", &params).await?;

        if response.status != 0 {
            return Err(ProviderError::Status(fail_message(&response.message)));
        }

        let content = response.content.unwrap_or_default();
        let coordinates = content
            .point
            .filter(|point| !point.x.is_empty() && !point.y.is_empty())
            .map(|point| format!("{},{}", point.x, point.y));
        let detail = content.address_detail.unwrap_or_default();

        Ok(IpLocation { coordinates, city: detail.city, province: detail.province })
    }

    fn cuisine_category(&self, cuisine: &str) -> Option<String> {
        FOOD_TAGS.iter().find(|(name, _)| *name == cuisine).map(|(_, tag)| (*tag).to_string())
    }
}

/// `lng,lat` -> `lat,lng` (and back; the swap is its own inverse). Strings
/// that are not two comma-separated parts pass through unchanged.
fn swap_coord_order(location: &str) -> String {
    match location.split_once(',') {
        Some((first, second)) if !second.contains(',') => format!("{second},{first}"),
        _ => location.to_string(),
    }
}

fn fail_message(message: &str) -> String {
    if message.is_empty() {
        "search failed".to_string()
    } else {
        message.to_string()
    }
}

fn parse_poi(poi: BaiduPoi) -> Venue {
    let detail = poi.detail_info.unwrap_or_default();

    let category = detail
        .tag
        .split(';')
        .next()
        .filter(|head| !head.is_empty())
        .unwrap_or("餐厅")
        .to_string();

    let distance = detail.distance.map(|meters| format!("{meters}m")).unwrap_or_default();

    let location = poi
        .location
        .map(|point| format!("{},{}", point.lng, point.lat))
        .unwrap_or_default();

    Venue {
        id: poi.uid,
        name: poi.name,
        category,
        address: poi.address,
        location,
        phone: poi.telephone,
        rating: detail.overall_rating,
        cost: detail.price,
        distance,
        business_hours: detail.shop_hours,
        tag: detail.tag,
        city: poi.city,
        district: poi.area,
    }
}

#[derive(Debug, Default, Deserialize)]
struct BaiduSearchResponse {
    #[serde(default = "failed_status")]
    status: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    results: Vec<BaiduPoi>,
}

#[derive(Debug, Default, Deserialize)]
struct BaiduDetailResponse {
    #[serde(default = "failed_status")]
    status: i64,
    #[serde(default)]
    message: String,
    result: Option<BaiduPoi>,
}

fn failed_status() -> i64 {
    -1
}

#[derive(Debug, Default, Deserialize)]
struct BaiduPoi {
    #[serde(default)]
    uid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    telephone: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    area: String,
    location: Option<BaiduPoint>,
    detail_info: Option<BaiduDetailInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct BaiduPoint {
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lng: f64,
}

#[derive(Debug, Default, Deserialize)]
struct BaiduDetailInfo {
    #[serde(default)]
    tag: String,
    #[serde(default)]
    overall_rating: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    shop_hours: String,
    distance: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct BaiduGeocodeResponse {
    #[serde(default = "failed_status")]
    status: i64,
    result: Option<BaiduGeocodeResult>,
}

#[derive(Debug, Default, Deserialize)]
struct BaiduGeocodeResult {
    location: Option<BaiduPoint>,
}

#[derive(Debug, Default, Deserialize)]
struct BaiduIpResponse {
    #[serde(default = "failed_status")]
    status: i64,
    #[serde(default)]
    message: String,
    content: Option<BaiduIpContent>,
}

#[derive(Debug, Default, Deserialize)]
struct BaiduIpContent {
    address_detail: Option<BaiduAddressDetail>,
    point: Option<BaiduIpPoint>,
}

#[derive(Debug, Default, Deserialize)]
struct BaiduAddressDetail {
    #[serde(default)]
    city: String,
    #[serde(default)]
    province: String,
}

// The IP endpoint returns point coordinates as strings, unlike the POI
// endpoints which use numbers.
#[derive(Debug, Default, Deserialize)]
struct BaiduIpPoint {
    #[serde(default)]
    x: String,
    #[serde(default)]
    y: String,
}
