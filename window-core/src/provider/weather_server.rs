use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    ServerError,
    model::{RegionSuggestion, WeatherSnapshot},
};

use super::{RegionSearch, WeatherLookup, normalize_base, truncate_body};

const NOT_FOUND_CODE: &str = "LOCATION_NOT_FOUND";

/// Client for the weather / region backend (`/api/weather`, `/api/regions`).
#[derive(Debug, Clone)]
pub struct WeatherServer {
    base: String,
    http: Client,
}

impl WeatherServer {
    pub fn new(base: &str, http: Client) -> anyhow::Result<Self> {
        Ok(Self {
            base: normalize_base(base)?,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_text(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<(StatusCode, String), ServerError> {
        let res = self
            .http
            .get(self.endpoint(path))
            .query(query)
            .send()
            .await
            .map_err(|e| {
                ServerError::ServiceUnavailable(format!("request to {path} failed: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ServerError::ServiceUnavailable(format!("failed to read {path} response body: {e}"))
        })?;

        Ok((status, body))
    }
}

#[derive(Debug, Deserialize)]
struct WireWeather {
    name: Option<String>,
    #[serde(rename = "tempC")]
    temp_c: Option<f64>,
    sky: Option<String>,
    #[serde(rename = "precipProb")]
    precip_prob: Option<f64>,
    precip1h_mm: Option<f64>,
    pm25: Option<f64>,
}

#[async_trait]
impl WeatherLookup for WeatherServer {
    async fn fetch_weather(&self, location: &str) -> Result<WeatherSnapshot, ServerError> {
        let target = location.trim();
        if target.is_empty() {
            return Err(ServerError::LocationNotFound);
        }

        let (status, body) = self.get_text("/api/weather", &[("location", target)]).await?;
        interpret_weather(target, status, &body)
    }
}

#[async_trait]
impl RegionSearch for WeatherServer {
    async fn search_regions(&self, query: &str) -> Result<Vec<RegionSuggestion>, ServerError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let (status, body) = self.get_text("/api/regions", &[("query", trimmed)]).await?;
        interpret_regions(status, &body)
    }
}

/// Turn a `/api/weather` response into a snapshot for `target`.
///
/// A canonical `name` echoed by the server wins over what the user typed.
pub(crate) fn interpret_weather(
    target: &str,
    status: StatusCode,
    body: &str,
) -> Result<WeatherSnapshot, ServerError> {
    if !status.is_success() {
        if status == StatusCode::NOT_FOUND && is_not_found_body(body) {
            return Err(ServerError::LocationNotFound);
        }

        return Err(ServerError::ServiceUnavailable(format!(
            "weather request failed with status {}: {}",
            status,
            truncate_body(body),
        )));
    }

    let parsed: WireWeather = serde_json::from_str(body).map_err(|e| {
        ServerError::ServiceUnavailable(format!("failed to parse weather JSON: {e}"))
    })?;

    let location_name = parsed
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| target.to_string());

    Ok(WeatherSnapshot {
        location_name,
        temperature_c: parsed.temp_c,
        sky_condition: parsed.sky.filter(|s| !s.trim().is_empty()),
        precipitation_probability_pct: parsed.precip_prob,
        precipitation_1h_mm: parsed.precip1h_mm,
        pm25: parsed.pm25,
    })
}

pub(crate) fn interpret_regions(
    status: StatusCode,
    body: &str,
) -> Result<Vec<RegionSuggestion>, ServerError> {
    if !status.is_success() {
        return Err(ServerError::ServiceUnavailable(format!(
            "region search failed with status {}: {}",
            status,
            truncate_body(body),
        )));
    }

    serde_json::from_str(body)
        .map_err(|e| ServerError::ServiceUnavailable(format!("failed to parse regions JSON: {e}")))
}

/// Accepts `{"error": ...}` as well as the `{"detail": {"error": ...}}`
/// envelope the backend framework produces for HTTP exceptions.
fn is_not_found_body(body: &str) -> bool {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return false;
    };

    [value.get("error"), value.pointer("/detail/error")]
        .into_iter()
        .flatten()
        .any(|v| v.as_str() == Some(NOT_FOUND_CODE))
}
