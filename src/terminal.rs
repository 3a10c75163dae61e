use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::session::Session;
use crate::{quick_query, ChatModel, Orchestrator, PRESET_CITIES};

const HELP: &str = "Commands:\n  /cities   list quick queries\n  /quick N  ask quick query N\n  /history  show the conversation\n  /stats    show message counts\n  /reset    clear the conversation\n  /quit     exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
  Query(String),
  Cities,
  History,
  Stats,
  Reset,
  Help,
  Quit,
  Empty,
  Invalid(String),
}

pub fn parse_input(line: &str) -> Input {
  let line = line.trim();
  if line.is_empty() {
    return Input::Empty;
  }
  if !line.starts_with('/') {
    return Input::Query(line.to_owned());
  }

  let mut words = line.split_whitespace();
  match (words.next().unwrap_or_default(), words.next()) {
    ("/cities", None) => Input::Cities,
    ("/history", None) => Input::History,
    ("/stats", None) => Input::Stats,
    ("/reset", None) => Input::Reset,
    ("/help", None) => Input::Help,
    ("/quit", None) | ("/exit", None) => Input::Quit,
    ("/quick", Some(n)) => match n.parse::<usize>() {
      Ok(n) if (1..=PRESET_CITIES.len()).contains(&n) => Input::Query(quick_query(PRESET_CITIES[n - 1])),
      _ => Input::Invalid(format!("pick a number between 1 and {}", PRESET_CITIES.len())),
    },
    _ => Input::Invalid(format!("unknown command {}", line)),
  }
}

/// Interactive chat on stdin/stdout with one session for the whole run.
pub async fn run<M: ChatModel>(assistant: &Orchestrator<M>) -> std::io::Result<()> {
  let mut stdout = tokio::io::stdout();
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut session = Session::new();

  stdout
    .write_all("🌤️ Weather Assistant. Type a question or /help.\n".as_bytes())
    .await?;
  loop {
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;
    let Some(line) = lines.next_line().await? else {
      break;
    };

    match parse_input(&line) {
      Input::Query(query) => {
        let start = session.len();
        assistant.ask(&mut session, &query).await;
        for turn in &session.all()[start + 1..] {
          print_line(&mut stdout, &turn.to_string()).await?;
        }
      }
      Input::Cities => {
        for (i, city) in PRESET_CITIES.iter().enumerate() {
          print_line(&mut stdout, &format!("  {}. 🌡️ {}", i + 1, city)).await?;
        }
      }
      Input::History if session.is_empty() => print_line(&mut stdout, "No messages yet.").await?,
      Input::History => print_line(&mut stdout, &session.transcript()).await?,
      Input::Stats => {
        let stats = session.stats();
        let text = format!(
          "📊 Messages: {}  Weather queries: {}",
          stats.messages, stats.weather_queries
        );
        print_line(&mut stdout, &text).await?;
      }
      Input::Reset => {
        session.clear();
        print_line(&mut stdout, "----- Chat history is reset -----").await?;
      }
      Input::Help => print_line(&mut stdout, HELP).await?,
      Input::Quit => break,
      Input::Empty => {}
      Input::Invalid(reason) => print_line(&mut stdout, &reason).await?,
    }
  }
  Ok(())
}

async fn print_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
  out.write_all(text.as_bytes()).await?;
  out.write_all(b"\n").await
}
