use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use shared::config::WeatherSettings;
use tracing::debug;

const TOMORROW_URL: &str = "https://api.tomorrow.io/v4/weather/realtime";

#[derive(Debug, Deserialize)]
struct RealtimeResponse {
    data: RealtimeData,
}

#[derive(Debug, Deserialize)]
struct RealtimeData {
    values: RealtimeValues,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeValues {
    temperature: f64,
    temperature_apparent: f64,
    humidity: f64,
    cloud_cover: f64,
    wind_speed: f64,
}

/// Tomorrow.io realtime weather. Coordinates come from settings; a location
/// argument only relabels the report (no geocoding).
pub struct WeatherClient {
    http: reqwest::Client,
    settings: WeatherSettings,
}

impl WeatherClient {
    pub fn new(settings: WeatherSettings) -> Self {
        Self {
            http: crate::SHARED_HTTP.clone(),
            settings,
        }
    }

    pub async fn realtime(&self, location_name: Option<&str>) -> Result<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("Weather API key is not configured"))?;
        let name = location_name.unwrap_or(&self.settings.city);
        debug!(location = name, "fetching weather");

        let location = format!("{},{}", self.settings.latitude, self.settings.longitude);
        let resp = self
            .http
            .get(TOMORROW_URL)
            .query(&[
                ("apikey", api_key),
                ("location", location.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .context("Error fetching weather data")?;
        if !resp.status().is_success() {
            return Err(anyhow!("Error fetching weather data: HTTP {}", resp.status()));
        }
        let body: RealtimeResponse = resp
            .json()
            .await
            .context("Error parsing weather data")?;

        let v = body.data.values;
        Ok(format!(
            "📍 Weather in {name}\n\
             🌡️ Temperature: {}°C\n\
             🤔 Feels like: {}°C\n\
             💧 Humidity: {}%\n\
             🌤️ Conditions: {}\n\
             💨 Wind Speed: {} m/s",
            v.temperature,
            v.temperature_apparent,
            v.humidity,
            condition_from_cloud_cover(v.cloud_cover),
            v.wind_speed,
        ))
    }
}

fn condition_from_cloud_cover(cloud_cover: f64) -> &'static str {
    if cloud_cover < 10.0 {
        "Clear sky"
    } else if cloud_cover < 30.0 {
        "Mostly clear"
    } else if cloud_cover < 70.0 {
        "Partly cloudy"
    } else if cloud_cover < 90.0 {
        "Mostly cloudy"
    } else {
        "Overcast"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_cover_maps_to_condition_bands() {
        assert_eq!(condition_from_cloud_cover(0.0), "Clear sky");
        assert_eq!(condition_from_cloud_cover(15.0), "Mostly clear");
        assert_eq!(condition_from_cloud_cover(50.0), "Partly cloudy");
        assert_eq!(condition_from_cloud_cover(80.0), "Mostly cloudy");
        assert_eq!(condition_from_cloud_cover(95.0), "Overcast");
    }
}
