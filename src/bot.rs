use std::sync::Arc;

use teloxide::{
  dispatching::dialogue::InMemStorage,
  prelude::*,
  types::{InlineKeyboardButton, InlineKeyboardMarkup},
  utils::command::BotCommands,
};
use tracing::info;

use crate::session::{ChatTurn, Session};
use crate::{quick_query, GeminiClient, Orchestrator, PRESET_CITIES};

pub type Assistant = Orchestrator<GeminiClient>;
type MyDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

const CALLBACK_PREFIX: &str = "city:";
// Telegram rejects messages above 4096 characters.
const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
  #[default]
  Start,
  Chatting(Session),
}

/// These commands are supported:
#[derive(Clone, Debug, PartialEq, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
  /// Show usage and quick buttons.
  Start,
  /// Show usage and quick buttons.
  Help,
  /// Pick a city for a one-click weather query.
  Cities,
  /// Show this chat's conversation.
  History,
  /// Show message counts for this chat.
  Stats,
  /// Clear this chat's conversation.
  Reset,
}

/// Runs the Telegram front end until Ctrl-C. Each chat gets its own in-memory
/// session.
pub async fn run(bot: Bot, assistant: Arc<Assistant>) {
  info!("starting telegram bot");
  let handler = dptree::entry()
    .branch(
      Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<State>, State>()
        .branch(dptree::entry().filter_command::<Command>().endpoint(command))
        .branch(dptree::endpoint(chat)),
    )
    .branch(
      Update::filter_callback_query()
        .enter_dialogue::<CallbackQuery, InMemStorage<State>, State>()
        .endpoint(quick),
    );

  Dispatcher::builder(bot, handler)
    .dependencies(dptree::deps![InMemStorage::<State>::new(), assistant])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

async fn command(bot: Bot, dialogue: MyDialogue, msg: Message, cmd: Command) -> HandlerResult {
  match cmd {
    Command::Start | Command::Help => {
      let text = format!(
        "🌤️ Ask me about the weather in any city.\n\n{}",
        Command::descriptions()
      );
      bot
        .send_message(msg.chat.id, text)
        .reply_markup(city_keyboard())
        .await?;
    }
    Command::Cities => {
      bot
        .send_message(msg.chat.id, "🚀 Quick actions")
        .reply_markup(city_keyboard())
        .await?;
    }
    Command::History => {
      let session = load_session(&dialogue).await?;
      let text = if session.is_empty() {
        String::from("No messages yet.")
      } else {
        clip(&session.transcript())
      };
      bot.send_message(msg.chat.id, text).await?;
    }
    Command::Stats => {
      let stats = load_session(&dialogue).await?.stats();
      let text = format!(
        "📊 Messages: {}\nWeather queries: {}",
        stats.messages, stats.weather_queries
      );
      bot.send_message(msg.chat.id, text).await?;
    }
    Command::Reset => {
      dialogue.exit().await?;
      bot
        .send_message(msg.chat.id, "----- Chat history is reset -----")
        .await?;
    }
  }
  Ok(())
}

async fn chat(bot: Bot, dialogue: MyDialogue, msg: Message, assistant: Arc<Assistant>) -> HandlerResult {
  match msg.text() {
    Some(text) => answer(&bot, &dialogue, &assistant, text).await,
    None => {
      bot
        .send_message(msg.chat.id, "Please send your question as text.")
        .await?;
      Ok(())
    }
  }
}

async fn quick(
  bot: Bot,
  dialogue: MyDialogue,
  q: CallbackQuery,
  assistant: Arc<Assistant>,
) -> HandlerResult {
  bot.answer_callback_query(q.id).await?;
  if let Some(city) = q.data.as_deref().and_then(parse_callback) {
    answer(&bot, &dialogue, &assistant, &quick_query(city)).await?;
  }
  Ok(())
}

async fn answer(bot: &Bot, dialogue: &MyDialogue, assistant: &Assistant, query: &str) -> HandlerResult {
  let chat_id = dialogue.chat_id();
  let mut session = load_session(dialogue).await?;
  let pending = bot
    .send_message(chat_id, "🤖 Processing your request...")
    .await?;

  let start = session.len();
  assistant.ask(&mut session, query).await;
  // Skip the user's own turn; show tool turns and the answer.
  let text = render_exchange(&session.all()[start + 1..]);
  dialogue.update(State::Chatting(session)).await?;

  bot.edit_message_text(chat_id, pending.id, clip(&text)).await?;
  Ok(())
}

async fn load_session(dialogue: &MyDialogue) -> Result<Session, Box<dyn std::error::Error + Send + Sync>> {
  Ok(match dialogue.get().await? {
    Some(State::Chatting(session)) => session,
    _ => Session::new(),
  })
}

fn city_keyboard() -> InlineKeyboardMarkup {
  let rows: Vec<Vec<InlineKeyboardButton>> = PRESET_CITIES
    .chunks(3)
    .map(|row| {
      row
        .iter()
        .map(|city| {
          InlineKeyboardButton::callback(
            format!("🌡️ {}", city),
            format!("{}{}", CALLBACK_PREFIX, city),
          )
        })
        .collect()
    })
    .collect();
  InlineKeyboardMarkup::new(rows)
}

fn parse_callback(data: &str) -> Option<&'static str> {
  let city = data.strip_prefix(CALLBACK_PREFIX)?;
  PRESET_CITIES.into_iter().find(|preset| *preset == city)
}

fn render_exchange(turns: &[ChatTurn]) -> String {
  turns
    .iter()
    .map(ChatTurn::to_string)
    .collect::<Vec<_>>()
    .join("\n\n")
}

/// Keeps the tail of `text` so the newest turns survive.
fn clip(text: &str) -> String {
  let count = text.chars().count();
  if count <= MAX_MESSAGE_CHARS {
    return text.to_owned();
  }
  let tail: String = text.chars().skip(count - MAX_MESSAGE_CHARS + 1).collect();
  format!("…{}", tail)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_commands_parse() {
    assert_eq!(Command::parse("/reset", "weather_bot").unwrap(), Command::Reset);
    assert_eq!(Command::parse("/history", "weather_bot").unwrap(), Command::History);
    assert!(Command::parse("/weather", "weather_bot").is_err());
  }

  #[test]
  fn test_keyboard_covers_presets() {
    let keyboard = city_keyboard();
    assert_eq!(keyboard.inline_keyboard.len(), 2);
    let count: usize = keyboard.inline_keyboard.iter().map(Vec::len).sum();
    assert_eq!(count, PRESET_CITIES.len());
    assert_eq!(keyboard.inline_keyboard[0][0].text, "🌡️ Delhi");
  }

  #[test]
  fn test_parse_callback() {
    assert_eq!(parse_callback("city:Mumbai"), Some("Mumbai"));
    assert_eq!(parse_callback("city:Paris"), None);
    assert_eq!(parse_callback("Mumbai"), None);
  }

  #[test]
  fn test_render_exchange() {
    let turns = vec![
      ChatTurn::tool("🌡️ Weather data fetched: The weather in Pune is Clear +28°C."),
      ChatTurn::assistant("It's clear in Pune."),
    ];
    assert_eq!(
      render_exchange(&turns),
      "🔧 Tool: 🌡️ Weather data fetched: The weather in Pune is Clear +28°C.\n\n🤖 Assistant: It's clear in Pune."
    );
  }

  #[test]
  fn test_clip_keeps_tail() {
    let long = "a".repeat(MAX_MESSAGE_CHARS) + "end";
    let clipped = clip(&long);
    assert_eq!(clipped.chars().count(), MAX_MESSAGE_CHARS);
    assert!(clipped.ends_with("end"));
    assert_eq!(clip("short"), "short");
  }
}
