use std::env;

use crate::utils::functions::get_weather::DEFAULT_WEATHER_BASE_URL;
use crate::{Error, GeminiClient, GeminiModel, Toolbox, WeatherLookup, DEFAULT_GEMINI_BASE_URL};

pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const BOT_TOKEN_VAR: &str = "TELOXIDE_TOKEN";

/// Settings read from the process environment, after `.env` is loaded.
#[derive(Debug, Clone)]
pub struct Config {
  pub api_key: String,
  pub model: GeminiModel,
  pub gemini_base_url: String,
  pub weather_base_url: String,
}

impl Config {
  /// Loads `.env` if present, then reads the environment. A missing or blank
  /// `GOOGLE_API_KEY` is an error.
  pub fn from_env() -> Result<Self, Error> {
    dotenv::dotenv().ok();
    Self::from_lookup(|key| env::var(key).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
  where
    F: Fn(&str) -> Option<String>,
  {
    let api_key = required(&lookup, API_KEY_VAR)?;
    let model = lookup("GEMINI_MODEL")
      .filter(|v| !v.trim().is_empty())
      .map(|v| GeminiModel::from(v.trim()))
      .unwrap_or_default();
    let gemini_base_url =
      lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_owned());
    let weather_base_url =
      lookup("WEATHER_BASE_URL").unwrap_or_else(|| DEFAULT_WEATHER_BASE_URL.to_owned());

    Ok(Self {
      api_key,
      model,
      gemini_base_url,
      weather_base_url,
    })
  }

  pub fn with_model(mut self, model: Option<&str>) -> Self {
    if let Some(model) = model {
      self.model = GeminiModel::from(model);
    }
    self
  }

  pub fn gemini_client(&self) -> Result<GeminiClient, Error> {
    Ok(GeminiClient::new(&self.api_key, self.model.clone())?.with_base_url(&self.gemini_base_url))
  }

  pub fn toolbox(&self) -> Result<Toolbox, Error> {
    Toolbox::new(WeatherLookup::new(&self.weather_base_url)?)
  }
}

/// Reads the Telegram token the bot front end needs.
pub fn bot_token() -> Result<String, Error> {
  dotenv::dotenv().ok();
  required(&|key: &str| env::var(key).ok(), BOT_TOKEN_VAR)
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, Error>
where
  F: Fn(&str) -> Option<String>,
{
  lookup(key)
    .filter(|v| !v.trim().is_empty())
    .ok_or(Error::MissingEnv(key))
}
