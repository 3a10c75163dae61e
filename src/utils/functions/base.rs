use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::FunctionCall;
use crate::Error;

/// Every tool the assistant can run. The set is closed: a name the model
/// invents that is not listed here is rejected rather than dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionDeclarationName {
  GetWeather,
}

impl FunctionDeclarationName {
  pub const ALL: [FunctionDeclarationName; 1] = [FunctionDeclarationName::GetWeather];

  pub fn as_str(&self) -> &'static str {
    match self {
      FunctionDeclarationName::GetWeather => "get_weather",
    }
  }
}

impl fmt::Display for FunctionDeclarationName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FunctionDeclarationName {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|name| name.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| Error::UnknownTool(s.to_owned()))
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDeclaration {
  pub name: FunctionDeclarationName,
  pub description: String,
  pub parameters: serde_json::Value,
}

/// A model-issued request to run one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocationRequest {
  pub tool_name: String,
  pub arguments: HashMap<String, String>,
  pub call_id: String,
}

impl ToolInvocationRequest {
  /// Builds a request from a function call found at `index` in a model reply.
  /// Providers that do not assign call ids get `{name}-{index}`.
  pub fn from_call(call: &FunctionCall, index: usize) -> Self {
    let arguments = match &call.args {
      serde_json::Value::Object(map) => map
        .iter()
        .map(|(key, value)| {
          let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
          };
          (key.clone(), value)
        })
        .collect(),
      _ => HashMap::new(),
    };
    let call_id = call
      .id
      .clone()
      .unwrap_or_else(|| format!("{}-{}", call.name, index));

    Self {
      tool_name: call.name.clone(),
      arguments,
      call_id,
    }
  }

  pub fn tool(&self) -> Result<FunctionDeclarationName, Error> {
    self.tool_name.parse()
  }

  pub fn argument(&self, argument: &'static str) -> Result<&str, Error> {
    self
      .arguments
      .get(argument)
      .map(String::as_str)
      .filter(|value| !value.trim().is_empty())
      .ok_or_else(|| Error::MissingArgument {
        tool: self.tool_name.clone(),
        argument,
      })
  }
}
