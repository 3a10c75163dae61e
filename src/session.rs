use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Assistant,
  Tool,
}

impl Role {
  pub fn label(&self) -> &'static str {
    match self {
      Role::User => "👤 You",
      Role::Assistant => "🤖 Assistant",
      Role::Tool => "🔧 Tool",
    }
  }
}

/// One role-tagged message. Fields are private so a turn cannot change once
/// it is in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
  role: Role,
  text: String,
}

impl ChatTurn {
  pub fn new(role: Role, text: impl Into<String>) -> Self {
    Self {
      role,
      text: text.into(),
    }
  }

  pub fn user(text: impl Into<String>) -> Self {
    Self::new(Role::User, text)
  }

  pub fn assistant(text: impl Into<String>) -> Self {
    Self::new(Role::Assistant, text)
  }

  pub fn tool(text: impl Into<String>) -> Self {
    Self::new(Role::Tool, text)
  }

  pub fn role(&self) -> Role {
    self.role
  }

  pub fn text(&self) -> &str {
    &self.text
  }
}

impl fmt::Display for ChatTurn {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.role.label(), self.text)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
  AwaitingModel,
  #[default]
  Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
  pub messages: usize,
  pub weather_queries: usize,
}

/// Ordered turns of one conversation, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  turns: Vec<ChatTurn>,
  phase: Phase,
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn append(&mut self, turn: ChatTurn) {
    self.turns.push(turn);
  }

  pub fn all(&self) -> &[ChatTurn] {
    &self.turns
  }

  pub fn last(&self) -> Option<&ChatTurn> {
    self.turns.last()
  }

  pub fn len(&self) -> usize {
    self.turns.len()
  }

  pub fn is_empty(&self) -> bool {
    self.turns.is_empty()
  }

  pub fn clear(&mut self) {
    self.turns.clear();
    self.phase = Phase::Done;
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub(crate) fn set_phase(&mut self, phase: Phase) {
    self.phase = phase;
  }

  pub fn stats(&self) -> SessionStats {
    SessionStats {
      messages: self.turns.len(),
      weather_queries: self
        .turns
        .iter()
        .filter(|turn| turn.text.to_lowercase().contains("weather"))
        .count(),
    }
  }

  pub fn transcript(&self) -> String {
    self
      .turns
      .iter()
      .map(ChatTurn::to_string)
      .collect::<Vec<_>>()
      .join("\n\n")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_append_keeps_order() {
    let mut session = Session::new();
    session.append(ChatTurn::user("one"));
    session.append(ChatTurn::tool("two"));
    session.append(ChatTurn::assistant("three"));

    let roles: Vec<Role> = session.all().iter().map(ChatTurn::role).collect();
    assert_eq!(roles, vec![Role::User, Role::Tool, Role::Assistant]);
    assert_eq!(session.last().unwrap().text(), "three");
  }

  #[test]
  fn test_clear_empties_session() {
    let mut session = Session::new();
    session.append(ChatTurn::user("hello"));
    session.set_phase(Phase::AwaitingModel);
    session.clear();

    assert!(session.all().is_empty());
    assert_eq!(session.phase(), Phase::Done);
    session.clear();
    assert!(session.is_empty());
  }

  #[test]
  fn test_stats_counts_weather_mentions() {
    let mut session = Session::new();
    session.append(ChatTurn::user("What's the Weather in Delhi?"));
    session.append(ChatTurn::assistant("It is sunny."));
    session.append(ChatTurn::user("thanks"));

    let stats = session.stats();
    assert_eq!(stats.messages, 3);
    assert_eq!(stats.weather_queries, 1);
  }

  #[test]
  fn test_transcript_labels_roles() {
    let mut session = Session::new();
    session.append(ChatTurn::user("hi"));
    session.append(ChatTurn::assistant("hello"));
    assert_eq!(session.transcript(), "👤 You: hi\n\n🤖 Assistant: hello");
  }
}
