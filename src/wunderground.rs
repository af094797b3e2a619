//! # Weather Underground Forecast Client
//!
//! Fetches probability of precipitation from the Weather Underground JSON API.
//!
//! ## Endpoints
//! - **Today**: `{base}/api/{key}/forecast/q/{location}.json`, PoP of the first
//!   `forecast.txt_forecast.forecastday` entry
//! - **Next hours**: `{base}/api/{key}/hourly/q/{location}.json`, PoP of each
//!   `hourly_forecast` entry, earliest first, truncated to the requested window
//!
//! ## Error Mapping
//! - Connection failures and timeouts: [`FetchError::Network`]
//! - Non-2xx status, or a `response.error` object in the body: [`FetchError::Service`]
//! - Invalid JSON, missing fields, PoP outside 0-100: [`FetchError::Parse`]
//!
//! The API key is part of the URL path, so URLs are stripped from every error before
//! it leaves this module.

use crate::config::ForecastConfig;
use crate::error::FetchError;
use crate::forecast::{ForecastProvider, Horizon};
use crate::ForecastSample;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub struct WundergroundClient {
    client: reqwest::Client,
    config: ForecastConfig,
}

#[derive(Debug, Deserialize)]
struct WuResponse {
    #[serde(default)]
    response: Option<WuMeta>,
    #[serde(default)]
    forecast: Option<WuForecast>,
    #[serde(default)]
    hourly_forecast: Option<Vec<WuPeriod>>,
}

#[derive(Debug, Deserialize)]
struct WuMeta {
    #[serde(default)]
    error: Option<WuError>,
}

#[derive(Debug, Deserialize)]
struct WuError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct WuForecast {
    txt_forecast: WuTxtForecast,
}

#[derive(Debug, Deserialize)]
struct WuTxtForecast {
    forecastday: Vec<WuPeriod>,
}

#[derive(Debug, Deserialize)]
struct WuPeriod {
    pop: PopValue,
}

/// The API reports PoP as a string ("20"); accept plain numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PopValue {
    Text(String),
    Number(i64),
}

impl PopValue {
    fn percent(&self) -> Result<u8, FetchError> {
        let value = match self {
            PopValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| FetchError::Parse(format!("pop {s:?} is not an integer")))?,
            PopValue::Number(n) => *n,
        };
        u8::try_from(value)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| FetchError::Parse(format!("pop {value} outside 0-100")))
    }
}

impl WundergroundClient {
    pub fn new(config: ForecastConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(FetchError::from)?;
        Ok(Self { client, config })
    }

    fn url(&self, horizon: Horizon) -> String {
        format!(
            "{}/api/{}/{}/q/{}.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_key,
            service_name(horizon),
            self.config.location
        )
    }
}

fn service_name(horizon: Horizon) -> &'static str {
    match horizon {
        Horizon::Today => "forecast",
        Horizon::NextHours(_) => "hourly",
    }
}

#[async_trait]
impl ForecastProvider for WundergroundClient {
    async fn fetch(&self, horizon: Horizon) -> Result<Vec<ForecastSample>, FetchError> {
        debug!(
            service = service_name(horizon),
            location = %self.config.location,
            "requesting forecast"
        );

        let response = self
            .client
            .get(self.url(horizon))
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        parse_body(&body, horizon)
    }
}

/// Extract PoP samples for `horizon` from a raw response body.
pub fn parse_body(body: &str, horizon: Horizon) -> Result<Vec<ForecastSample>, FetchError> {
    let parsed: WuResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    if let Some(err) = parsed.response.and_then(|r| r.error) {
        return Err(FetchError::Service(format!(
            "{}: {}",
            err.kind, err.description
        )));
    }

    let samples = match horizon {
        Horizon::Today => {
            let day = parsed
                .forecast
                .ok_or_else(|| FetchError::Parse("missing forecast".into()))?
                .txt_forecast
                .forecastday
                .into_iter()
                .next()
                .ok_or_else(|| FetchError::Parse("empty forecastday".into()))?;
            vec![ForecastSample {
                pop: day.pop.percent()?,
                hour_offset: None,
            }]
        }
        Horizon::NextHours(_) => parsed
            .hourly_forecast
            .ok_or_else(|| FetchError::Parse("missing hourly_forecast".into()))?
            .iter()
            .take(horizon.max_samples())
            .enumerate()
            .map(|(i, period)| {
                Ok(ForecastSample {
                    pop: period.pop.percent()?,
                    hour_offset: Some(i as u8),
                })
            })
            .collect::<Result<Vec<_>, FetchError>>()?,
    };

    if samples.is_empty() {
        return Err(FetchError::Parse("no PoP values in response".into()));
    }
    Ok(samples)
}
