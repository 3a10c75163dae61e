use std::time::Duration;

use tracing::{debug, warn};

use super::base::{FunctionDeclaration, FunctionDeclarationName};
use crate::Error;

pub const DEFAULT_WEATHER_BASE_URL: &str = "https://wttr.in";
const WEATHER_TIMEOUT: Duration = Duration::from_secs(10);

pub fn get_weather_fn() -> FunctionDeclaration {
  FunctionDeclaration {
    name: FunctionDeclarationName::GetWeather,
    description: String::from("Gets the current temperature for a given location."),
    parameters: serde_json::json!({
      "type": "OBJECT",
      "properties": {
        "city": {
          "type": "STRING",
          "description": "The city name, e.g. Delhi"
        }
      },
      "required": ["city"]
    }),
  }
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
  #[error("weather service answered with status {0}")]
  Status(u16),
  #[error("{0}")]
  Transport(#[from] reqwest::Error),
}

/// Plain-text lookups against a wttr.in compatible service.
#[derive(Debug, Clone)]
pub struct WeatherLookup {
  base_url: String,
  http_client: reqwest::Client,
}

impl WeatherLookup {
  pub fn new(base_url: &str) -> Result<Self, Error> {
    let http_client = reqwest::Client::builder()
      .timeout(WEATHER_TIMEOUT)
      .build()?;

    Ok(Self {
      base_url: base_url.trim_end_matches('/').to_owned(),
      http_client,
    })
  }

  fn get_endpoint(&self, city: &str) -> String {
    format!("{}/{}?format=%C+%t", self.base_url, city)
  }

  /// Fetches the raw condition text for `city`. Only a 200 counts as success.
  pub async fn fetch(&self, city: &str) -> Result<String, WeatherError> {
    let end_point = self.get_endpoint(city);
    debug!(%end_point, "fetching weather");
    let resp = self.http_client.get(&end_point).send().await?;
    let status = resp.status();
    if status != reqwest::StatusCode::OK {
      return Err(WeatherError::Status(status.as_u16()));
    }
    Ok(resp.text().await?)
  }

  /// Never fails: every outcome is rendered into a sentence for the model.
  pub async fn lookup(&self, city: &str) -> String {
    match self.fetch(city).await {
      Ok(text) => format!("The weather in {} is {}.", city, text),
      Err(WeatherError::Status(status)) => {
        warn!(city, status, "weather service rejected lookup");
        format!("Could not fetch weather data for {}. Please try again.", city)
      }
      Err(WeatherError::Transport(err)) => {
        warn!(city, error = %err, "weather lookup failed");
        format!("Error fetching weather data: {}", err)
      }
    }
  }
}
