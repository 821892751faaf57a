//! Current-weather advisory.
//!
//! Purely informational: the condition and the advice line are display text and
//! nothing else in the app depends on them.

use crate::config::WeatherConfig;
use crate::error::WeatherError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Body of an Open-Meteo style `current` forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub current: CurrentWeather,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature_2m: f64,
    pub weather_code: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Fog,
    Rain,
    Snow,
    Storm,
    Other,
}

impl WeatherCondition {
    /// Map a WMO weather code onto the display conditions
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => WeatherCondition::Clear,
            1 | 2 | 3 => WeatherCondition::Cloudy,
            45 | 48 => WeatherCondition::Fog,
            51 | 53 | 55 | 61 | 63 | 65 => WeatherCondition::Rain,
            71 | 73 | 75 => WeatherCondition::Snow,
            95 | 96 | 99 => WeatherCondition::Storm,
            _ => WeatherCondition::Other,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear sky",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::Fog => "Fog",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Storm => "Thunderstorm",
            WeatherCondition::Other => "Variable",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// What to wear at this temperature (°C)
pub fn clothing_advice(temperature_c: f64) -> &'static str {
    if temperature_c < 10.0 {
        "Very cold: coat and scarf"
    } else if temperature_c < 15.0 {
        "Chilly: jacket or a heavy sweater"
    } else if temperature_c < 22.0 {
        "Pleasant: light sweatshirt or long sleeves"
    } else {
        "Hot: t-shirt and sunglasses"
    }
}

/// Display-ready weather summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub temperature_c: f64,
    pub condition: WeatherCondition,
    pub advice: &'static str,
}

impl From<CurrentWeather> for WeatherReport {
    fn from(current: CurrentWeather) -> Self {
        Self {
            temperature_c: current.temperature_2m,
            condition: WeatherCondition::from_code(current.weather_code),
            advice: clothing_advice(current.temperature_2m),
        }
    }
}

pub struct WeatherClient {
    base_url: String,
    client: reqwest::Client,
}

impl WeatherClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Self::new(&config.base_url, config.timeout_secs)
    }

    /// Fetch current conditions at a location
    pub async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherReport, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        debug!("GET {} ({}, {})", url, latitude, longitude);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", "temperature_2m,weather_code".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Weather service responded {}", status);
            return Err(WeatherError::Status {
                status: status.as_u16(),
            });
        }

        let body: WeatherResponse = response.json().await?;
        Ok(body.current.into())
    }

    /// Fetch conditions at the configured location.
    ///
    /// No location means the position is unknown, as when location access was denied.
    pub async fn current_at(&self, config: &WeatherConfig) -> Result<WeatherReport, WeatherError> {
        match (config.latitude, config.longitude) {
            (Some(latitude), Some(longitude)) => self.current(latitude, longitude).await,
            _ => Err(WeatherError::PermissionDenied),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn spawn_forecast_server(temperature: f64, code: i32) -> String {
        let app = Router::new().route(
            "/v1/forecast",
            get(move |Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(
                    params.get("current").map(String::as_str),
                    Some("temperature_2m,weather_code")
                );
                assert!(params.contains_key("latitude"));
                Json(WeatherResponse {
                    current: CurrentWeather {
                        temperature_2m: temperature,
                        weather_code: code,
                    },
                })
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn test_condition_codes() {
        assert_eq!(WeatherCondition::from_code(0), WeatherCondition::Clear);
        for code in [1, 2, 3] {
            assert_eq!(WeatherCondition::from_code(code), WeatherCondition::Cloudy);
        }
        assert_eq!(WeatherCondition::from_code(48), WeatherCondition::Fog);
        for code in [51, 53, 55, 61, 63, 65] {
            assert_eq!(WeatherCondition::from_code(code), WeatherCondition::Rain);
        }
        assert_eq!(WeatherCondition::from_code(73), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_code(96), WeatherCondition::Storm);
        assert_eq!(WeatherCondition::from_code(80), WeatherCondition::Other);
        assert_eq!(WeatherCondition::from_code(-1), WeatherCondition::Other);
    }

    #[test]
    fn test_advice_thresholds() {
        assert_eq!(clothing_advice(9.9), "Very cold: coat and scarf");
        assert_eq!(clothing_advice(10.0), "Chilly: jacket or a heavy sweater");
        assert_eq!(clothing_advice(15.0), "Pleasant: light sweatshirt or long sleeves");
        assert_eq!(clothing_advice(22.0), "Hot: t-shirt and sunglasses");
    }

    #[tokio::test]
    async fn test_current_weather() {
        let base_url = spawn_forecast_server(12.5, 61).await;
        let client = WeatherClient::new(&base_url, 5).unwrap();

        let report = client.current(45.46, 9.19).await.unwrap();
        assert_eq!(report.temperature_c, 12.5);
        assert_eq!(report.condition, WeatherCondition::Rain);
        assert_eq!(report.advice, "Chilly: jacket or a heavy sweater");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let app = Router::new().route(
            "/v1/forecast",
            get(|| async { axum::http::StatusCode::SERVICE_UNAVAILABLE }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = WeatherClient::new(&format!("http://{}", addr), 5).unwrap();
        let err = client.current(0.0, 0.0).await.unwrap_err();
        assert!(matches!(err, WeatherError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn test_unknown_location() {
        let client = WeatherClient::new("http://127.0.0.1:9", 1).unwrap();
        let config = crate::config::SmartClosetConfig::default().weather;
        assert!(matches!(
            client.current_at(&config).await,
            Err(WeatherError::PermissionDenied)
        ));
    }
}
