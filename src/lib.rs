use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::json;
use tracing::debug;

pub mod bot;
pub mod config;
pub mod orchestrator;
pub mod session;
pub mod terminal;
pub mod types;
pub mod utils;

pub use config::Config;
pub use orchestrator::Orchestrator;
pub use session::{ChatTurn, Phase, Role, Session, SessionStats};
pub use utils::functions::base::{FunctionDeclaration, FunctionDeclarationName, ToolInvocationRequest};
pub use utils::functions::get_weather::{WeatherError, WeatherLookup};
pub use utils::functions::Toolbox;
pub use utils::response::ModelReply;

use crate::types::{
  ApiErrorResponse, Content, ContentRole, FunctionResponse, GenerateContentRequest, Part, Tool,
};
use crate::utils::response::read_response;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Cities offered as one-click queries.
pub const PRESET_CITIES: [&str; 6] = ["Delhi", "Mumbai", "Bangalore", "Chennai", "Kolkata", "Hyderabad"];

pub fn quick_query(city: &str) -> String {
  format!("What's the weather in {}?", city)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("missing required environment variable {0}")]
  MissingEnv(&'static str),
  #[error("network error: {0}")]
  FetchError(#[from] reqwest::Error),
  #[error("failed to parse response: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("authentication failed: {0}")]
  Authentication(String),
  #[error("invalid request: {0}")]
  InvalidRequest(String),
  #[error("rate limit exceeded: {0}")]
  RateLimit(String),
  #[error("API error (status {status}): {message}")]
  Api { status: u16, message: String },
  #[error("the model returned no answer")]
  EmptyResponse,
  #[error("unknown tool requested: {0}")]
  UnknownTool(String),
  #[error("tool {tool} called without `{argument}`")]
  MissingArgument { tool: String, argument: &'static str },
  #[error("invalid tool registry: {0}")]
  ToolRegistry(String),
}

impl Error {
  fn from_status(status: u16, message: String) -> Self {
    match status {
      400 => Error::InvalidRequest(message),
      401 | 403 => Error::Authentication(message),
      429 => Error::RateLimit(message),
      _ => Error::Api { status, message },
    }
  }
}

/// A hosted chat model that may answer with text or with tool requests.
#[async_trait]
pub trait ChatModel: Send + Sync {
  async fn generate(
    &self,
    history: &ChatHistory,
    tools: &[FunctionDeclaration],
  ) -> Result<ModelReply, Error>;
}

#[async_trait]
impl<M: ChatModel + ?Sized> ChatModel for std::sync::Arc<M> {
  async fn generate(
    &self,
    history: &ChatHistory,
    tools: &[FunctionDeclaration],
  ) -> Result<ModelReply, Error> {
    (**self).generate(history, tools).await
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GeminiModel {
  #[default]
  Flash,
  Named(String),
}

impl From<&str> for GeminiModel {
  fn from(value: &str) -> Self {
    match value {
      "gemini-2.0-flash" => GeminiModel::Flash,
      other => GeminiModel::Named(other.to_owned()),
    }
  }
}

impl From<GeminiModel> for String {
  fn from(value: GeminiModel) -> Self {
    match value {
      GeminiModel::Flash => String::from("gemini-2.0-flash"),
      GeminiModel::Named(name) => name,
    }
  }
}

/// The message list sent on each model call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatHistory {
  items: Vec<Content>,
}

impl ChatHistory {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push_user(&mut self, text: &str) {
    self.items.push(Content {
      role: ContentRole::User,
      parts: vec![Part::text(text)],
    });
  }

  pub fn push_model(&mut self, content: Content) {
    self.items.push(content);
  }

  /// Appends tool results, each keyed by the call id it answers.
  pub fn push_tool_results(&mut self, results: &[(ToolInvocationRequest, String)]) {
    let parts = results
      .iter()
      .map(|(request, result)| {
        Part::function_response(FunctionResponse {
          id: Some(request.call_id.clone()),
          name: request.tool_name.clone(),
          response: json!({ "result": result }),
        })
      })
      .collect();
    self.items.push(Content {
      role: ContentRole::User,
      parts,
    });
  }

  pub fn items(&self) -> &[Content] {
    &self.items
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn format(&self, tools: &[FunctionDeclaration]) -> GenerateContentRequest {
    let tools = if tools.is_empty() {
      vec![]
    } else {
      vec![Tool {
        function_declarations: tools.to_vec(),
      }]
    };
    GenerateContentRequest {
      contents: self.items.clone(),
      tools,
    }
  }
}

pub struct GeminiClient {
  api_key: String,
  model: GeminiModel,
  base_url: String,
  http_client: reqwest::Client,
}

impl GeminiClient {
  pub fn new(api_key: &str, model: GeminiModel) -> Result<Self, Error> {
    if api_key.trim().is_empty() {
      return Err(Error::MissingEnv("GOOGLE_API_KEY"));
    }
    Ok(GeminiClient {
      api_key: api_key.to_owned(),
      model,
      base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
      http_client: reqwest::Client::new(),
    })
  }

  pub fn with_base_url(mut self, base_url: &str) -> Self {
    self.base_url = base_url.trim_end_matches('/').to_owned();
    self
  }

  pub fn model_name(&self) -> String {
    self.model.clone().into()
  }

  fn get_endpoint(&self) -> String {
    format!(
      "{}/v1beta/models/{}:generateContent",
      self.base_url,
      self.model_name()
    )
  }

  fn headers(&self) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
      "x-goog-api-key",
      HeaderValue::from_str(&self.api_key)
        .map_err(|e| Error::Authentication(format!("invalid API key format: {}", e)))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
  }

  async fn send_request(&self, body: &GenerateContentRequest) -> Result<ModelReply, Error> {
    let end_point = self.get_endpoint();
    debug!(%end_point, contents = body.contents.len(), "calling model");
    let resp = self
      .http_client
      .post(&end_point)
      .headers(self.headers()?)
      .json(body)
      .send()
      .await?;

    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
      return Err(match serde_json::from_str::<ApiErrorResponse>(&text) {
        Ok(envelope) => Error::from_status(envelope.error.code, envelope.error.message),
        Err(_) => Error::from_status(status.as_u16(), text),
      });
    }

    read_response(serde_json::from_str(&text)?)
  }
}

#[async_trait]
impl ChatModel for GeminiClient {
  async fn generate(
    &self,
    history: &ChatHistory,
    tools: &[FunctionDeclaration],
  ) -> Result<ModelReply, Error> {
    self.send_request(&history.format(tools)).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::utils::functions::get_weather::get_weather_fn;
  use mockito::Matcher;

  const PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

  #[test]
  fn test_client_rejects_empty_key() {
    assert!(matches!(
      GeminiClient::new(" ", GeminiModel::Flash),
      Err(Error::MissingEnv("GOOGLE_API_KEY"))
    ));
  }

  #[test]
  fn test_model_names() {
    assert_eq!(String::from(GeminiModel::from("gemini-2.0-flash")), "gemini-2.0-flash");
    assert_eq!(GeminiModel::from("gemini-1.5-pro"), GeminiModel::Named("gemini-1.5-pro".into()));
  }

  #[test]
  fn test_history_keys_tool_results_by_call_id() {
    let mut history = ChatHistory::new();
    history.push_user("weather in Delhi?");
    let request = ToolInvocationRequest {
      tool_name: "get_weather".into(),
      arguments: Default::default(),
      call_id: "call-7".into(),
    };
    history.push_tool_results(&[(request, "The weather in Delhi is Sunny.".into())]);

    let body = serde_json::to_value(history.format(&[get_weather_fn()])).unwrap();
    let response = &body["contents"][1]["parts"][0]["functionResponse"];
    assert_eq!(response["id"], "call-7");
    assert_eq!(response["name"], "get_weather");
    assert_eq!(response["response"]["result"], "The weather in Delhi is Sunny.");
    assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "get_weather");
  }

  #[tokio::test]
  async fn test_generate_sends_key_and_tools() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", PATH)
      .match_header("x-goog-api-key", "secret")
      .match_body(Matcher::PartialJson(serde_json::json!({
        "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
        "tools": [{ "functionDeclarations": [{ "name": "get_weather" }] }]
      })))
      .with_status(200)
      .with_body(
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello!"}]},"finishReason":"STOP"}]}"#,
      )
      .create_async()
      .await;

    let client = GeminiClient::new("secret", GeminiModel::Flash)
      .unwrap()
      .with_base_url(&server.url());
    let mut history = ChatHistory::new();
    history.push_user("hi");
    let reply = client.generate(&history, &[get_weather_fn()]).await.unwrap();

    assert_eq!(reply.text, "Hello!");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_generate_parses_function_call() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", PATH)
      .with_status(200)
      .with_body(
        r#"{"candidates":[{"content":{"role":"model","parts":[{"functionCall":{"name":"get_weather","args":{"city":"Mumbai"}}}]}}]}"#,
      )
      .create_async()
      .await;

    let client = GeminiClient::new("secret", GeminiModel::Flash)
      .unwrap()
      .with_base_url(&server.url());
    let mut history = ChatHistory::new();
    history.push_user("What's the weather in Mumbai?");
    let reply = client.generate(&history, &[get_weather_fn()]).await.unwrap();

    assert_eq!(reply.tool_calls.len(), 1);
    assert_eq!(reply.tool_calls[0].arguments["city"], "Mumbai");
  }

  #[tokio::test]
  async fn test_generate_maps_rate_limit() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", PATH)
      .with_status(429)
      .with_body(r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#)
      .create_async()
      .await;

    let client = GeminiClient::new("secret", GeminiModel::Flash)
      .unwrap()
      .with_base_url(&server.url());
    let mut history = ChatHistory::new();
    history.push_user("hi");
    let err = client.generate(&history, &[]).await.unwrap_err();
    assert!(matches!(err, Error::RateLimit(message) if message == "quota"));
  }

  #[tokio::test]
  async fn test_generate_maps_unparsed_error_body() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", PATH)
      .with_status(503)
      .with_body("upstream unavailable")
      .create_async()
      .await;

    let client = GeminiClient::new("secret", GeminiModel::Flash)
      .unwrap()
      .with_base_url(&server.url());
    let mut history = ChatHistory::new();
    history.push_user("hi");
    let err = client.generate(&history, &[]).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 503, .. }));
  }
}
