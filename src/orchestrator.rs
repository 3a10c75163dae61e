use tracing::{debug, info, warn};

use crate::session::{ChatTurn, Phase, Session};
use crate::utils::functions::Toolbox;
use crate::{ChatHistory, ChatModel, Error};

/// Sequences one query into model calls and tool calls.
///
/// A query gets at most two model calls: the first may ask for tools, the
/// second receives the tool results and must answer in text. Tool requests in
/// the second answer are not executed.
pub struct Orchestrator<M> {
  model: M,
  tools: Toolbox,
}

impl<M: ChatModel> Orchestrator<M> {
  pub fn new(model: M, tools: Toolbox) -> Self {
    Self { model, tools }
  }

  /// Appends the user turn, any tool turns and exactly one assistant turn to
  /// `session`, and returns the assistant turn. Failures become that turn.
  pub async fn ask(&self, session: &mut Session, query: &str) -> ChatTurn {
    session.append(ChatTurn::user(query));
    session.set_phase(Phase::AwaitingModel);
    info!(query, "handling query");

    let answer = match self.answer(session, query).await {
      Ok(text) => text,
      Err(err) => {
        warn!(error = %err, "query failed");
        format!("❌ Error: {}", err)
      }
    };

    let turn = ChatTurn::assistant(answer);
    session.append(turn.clone());
    session.set_phase(Phase::Done);
    turn
  }

  async fn answer(&self, session: &mut Session, query: &str) -> Result<String, Error> {
    let mut history = ChatHistory::new();
    history.push_user(query);

    let reply = self.model.generate(&history, self.tools.declarations()).await?;
    if !reply.wants_tools() {
      return final_text(reply.text);
    }

    let mut results = Vec::with_capacity(reply.tool_calls.len());
    for request in &reply.tool_calls {
      let result = self.tools.invoke(request).await?;
      session.append(ChatTurn::tool(format!("🌡️ Weather data fetched: {}", result)));
      results.push((request.clone(), result));
    }
    history.push_model(reply.content);
    history.push_tool_results(&results);

    let follow_up = self.model.generate(&history, self.tools.declarations()).await?;
    if follow_up.wants_tools() {
      debug!(
        requested = follow_up.tool_calls.len(),
        "ignoring tool requests in follow-up answer"
      );
    }
    final_text(follow_up.text)
  }
}

fn final_text(text: String) -> Result<String, Error> {
  if text.trim().is_empty() {
    Err(Error::EmptyResponse)
  } else {
    Ok(text)
  }
}
