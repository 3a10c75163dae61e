use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::functions::base::FunctionDeclaration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRole {
  User,
  Model,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub function_call: Option<FunctionCall>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub function_response: Option<FunctionResponse>,

  /// Opaque token some models attach to function calls; must be echoed back.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub thought_signature: Option<String>,
}

impl Part {
  pub fn text(text: &str) -> Self {
    Self {
      text: Some(text.to_owned()),
      ..Default::default()
    }
  }

  pub fn function_response(response: FunctionResponse) -> Self {
    Self {
      function_response: Some(response),
      ..Default::default()
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
  pub role: ContentRole,
  #[serde(default)]
  pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub name: String,
  #[serde(default)]
  pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub name: String,
  pub response: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
  pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
  pub contents: Vec<Content>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
  pub content: Option<Content>,
  #[serde(default)]
  pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
  #[serde(default)]
  pub candidates: Vec<Candidate>,
  #[serde(default)]
  pub model_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
  pub code: u16,
  pub message: String,
  #[serde(default)]
  pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
  pub error: ApiErrorBody,
}
