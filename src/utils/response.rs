use tracing::debug;

use super::functions::base::ToolInvocationRequest;
use crate::types::{Content, GenerateContentResponse};
use crate::Error;

/// What the orchestrator needs from one `generateContent` answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
  pub text: String,
  pub tool_calls: Vec<ToolInvocationRequest>,
  /// The model turn as returned, echoed back when answering its tool calls.
  pub content: Content,
}

impl ModelReply {
  pub fn wants_tools(&self) -> bool {
    !self.tool_calls.is_empty()
  }
}

/// Walks candidates -> content -> parts of the first candidate, collecting
/// text and function calls.
pub fn read_response(resp: GenerateContentResponse) -> Result<ModelReply, Error> {
  let candidate = resp.candidates.into_iter().next().ok_or(Error::EmptyResponse)?;
  let content = match candidate.content {
    Some(content) => content,
    None => {
      debug!(finish_reason = ?candidate.finish_reason, "candidate carried no content");
      return Err(Error::EmptyResponse);
    }
  };

  let mut text = String::new();
  let mut tool_calls = vec![];
  for part in &content.parts {
    if let Some(t) = &part.text {
      text.push_str(t);
    }
    if let Some(call) = &part.function_call {
      tool_calls.push(ToolInvocationRequest::from_call(call, tool_calls.len()));
    }
  }

  Ok(ModelReply {
    text,
    tool_calls,
    content,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn parse(value: serde_json::Value) -> Result<ModelReply, Error> {
    read_response(serde_json::from_value(value).unwrap())
  }

  #[test]
  fn test_text_parts_are_joined() {
    let reply = parse(json!({
      "candidates": [{
        "content": { "role": "model", "parts": [{ "text": "It's " }, { "text": "sunny." }] },
        "finishReason": "STOP"
      }]
    }))
    .unwrap();
    assert_eq!(reply.text, "It's sunny.");
    assert!(!reply.wants_tools());
  }

  #[test]
  fn test_function_calls_are_collected() {
    let reply = parse(json!({
      "candidates": [{
        "content": {
          "role": "model",
          "parts": [
            { "functionCall": { "name": "get_weather", "args": { "city": "Delhi" } } },
            { "functionCall": { "id": "c2", "name": "get_weather", "args": { "city": "Pune" } } }
          ]
        }
      }]
    }))
    .unwrap();
    assert!(reply.wants_tools());
    assert_eq!(reply.tool_calls[0].call_id, "get_weather-0");
    assert_eq!(reply.tool_calls[1].call_id, "c2");
    assert_eq!(reply.tool_calls[1].arguments["city"], "Pune");
  }

  #[test]
  fn test_no_candidates_is_empty_response() {
    assert!(matches!(parse(json!({ "candidates": [] })), Err(Error::EmptyResponse)));
  }

  #[test]
  fn test_blocked_candidate_is_empty_response() {
    let result = parse(json!({ "candidates": [{ "finishReason": "SAFETY" }] }));
    assert!(matches!(result, Err(Error::EmptyResponse)));
  }
}
