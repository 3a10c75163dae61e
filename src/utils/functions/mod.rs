pub mod base;
pub mod get_weather;

use std::collections::HashSet;

use tracing::info;

use self::base::{FunctionDeclaration, FunctionDeclarationName, ToolInvocationRequest};
use self::get_weather::{get_weather_fn, WeatherLookup};
use crate::Error;

/// Maps each tool name to its handler and holds the declarations advertised
/// to the model.
#[derive(Debug, Clone)]
pub struct Toolbox {
  weather: WeatherLookup,
  declarations: Vec<FunctionDeclaration>,
}

impl Toolbox {
  pub fn new(weather: WeatherLookup) -> Result<Self, Error> {
    let declarations = FunctionDeclarationName::ALL
      .into_iter()
      .map(declaration_for)
      .collect::<Vec<_>>();
    validate(&declarations)?;
    Ok(Self {
      weather,
      declarations,
    })
  }

  pub fn declarations(&self) -> &[FunctionDeclaration] {
    &self.declarations
  }

  pub async fn invoke(&self, request: &ToolInvocationRequest) -> Result<String, Error> {
    match request.tool()? {
      FunctionDeclarationName::GetWeather => {
        let city = request.argument("city")?;
        info!(city, call_id = %request.call_id, "running get_weather");
        Ok(self.weather.lookup(city).await)
      }
    }
  }
}

fn declaration_for(name: FunctionDeclarationName) -> FunctionDeclaration {
  match name {
    FunctionDeclarationName::GetWeather => get_weather_fn(),
  }
}

fn validate(declarations: &[FunctionDeclaration]) -> Result<(), Error> {
  let mut seen = HashSet::new();
  for declaration in declarations {
    if !seen.insert(declaration.name) {
      return Err(Error::ToolRegistry(format!(
        "{} is declared more than once",
        declaration.name
      )));
    }
  }
  for name in FunctionDeclarationName::ALL {
    if !seen.contains(&name) {
      return Err(Error::ToolRegistry(format!("{} has no declaration", name)));
    }
  }
  Ok(())
}
