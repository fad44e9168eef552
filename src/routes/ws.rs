//! WebSocket upgrade + message loop. Each connection is one player with its
//! own `PlayerGame`; messages are handled strictly one at a time and every
//! request gets exactly one JSON reply.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{CategoryRequest, Difficulty};
use crate::error::ClaimError;
use crate::logic::PlayerGame;
use crate::protocol::{guess_message, puzzle_message, session_view, ClientWsMessage, ServerWsMessage, StreakOut};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "whatsit_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "whatsit_backend", "WebSocket connected");
  let mut game = PlayerGame::new(state.local.clone());

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "whatsit_backend", ?incoming, "WS received");
            handle_client_ws(incoming, &state, &mut game).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "whatsit_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "whatsit_backend", "WebSocket disconnected");
}

fn no_session() -> ServerWsMessage {
  ServerWsMessage::Error { message: "No puzzle in progress".into() }
}

#[instrument(level = "info", skip(state, game))]
pub async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, game: &mut PlayerGame) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewPuzzle { category, difficulty } => {
      let category = CategoryRequest::parse(category.as_deref());
      let difficulty = Difficulty::from_request(difficulty.as_deref());
      let origin = game.request_puzzle(state.generator.as_ref(), &category, difficulty).await;
      match game.session() {
        Some(s) => {
          info!(target: "puzzle", id = %s.puzzle().id, origin = origin.as_str(), %difficulty, "WS puzzle served");
          puzzle_message(origin, s)
        }
        None => no_session(),
      }
    }

    ClientWsMessage::DailyPuzzle { date, difficulty } => {
      let difficulty = Difficulty::from_request(difficulty.as_deref());
      match game.request_daily(state.generator.as_ref(), date, state.today(), difficulty).await {
        Ok(origin) => match game.session() {
          Some(s) => {
            info!(target: "puzzle", id = %s.puzzle().id, %date, origin = origin.as_str(), "WS daily puzzle served");
            puzzle_message(origin, s)
          }
          None => no_session(),
        },
        Err(e) => {
          warn!(target: "puzzle", %date, error = %e, "WS daily puzzle refused");
          ServerWsMessage::Rejected { reason: e.to_string() }
        }
      }
    }

    ClientWsMessage::Draft { text } => match game.set_draft(text) {
      Ok(s) => ServerWsMessage::Session { session: session_view(s) },
      Err(e) => ServerWsMessage::Rejected { reason: e.to_string() },
    },

    ClientWsMessage::Guess { text } => {
      let result = match text {
        Some(t) => game.submit_guess(&t),
        None => game.submit_draft(),
      };
      match result {
        Ok(report) => match game.session() {
          Some(s) => guess_message(&report, s),
          None => no_session(),
        },
        Err(e) => ServerWsMessage::Rejected { reason: e.to_string() },
      }
    }

    ClientWsMessage::Hint => match game.use_hint() {
      Ok(text) => match game.session() {
        Some(s) => ServerWsMessage::Hint { text, session: session_view(s) },
        None => no_session(),
      },
      Err(e) => ServerWsMessage::Rejected { reason: e.to_string() },
    },

    ClientWsMessage::ClaimStreak { name } => {
      match game.claim_streak(state.db.as_ref(), &name, state.today()).await {
        Ok(entry) => ServerWsMessage::LeaderboardSaved { entry },
        Err(e @ (ClaimError::EmptyName | ClaimError::NothingPending)) => ServerWsMessage::Rejected { reason: e.to_string() },
        Err(e) => {
          error!(target: "session", error = %e, "Streak claim failed");
          ServerWsMessage::Error { message: e.to_string() }
        }
      }
    }

    ClientWsMessage::Stats => {
      let streak = game.streak();
      let pending = streak.pending().unwrap_or_else(|e| {
        warn!(target: "session", error = %e, "Could not read pending streak");
        None
      });
      ServerWsMessage::Streak(StreakOut { current: streak.current(), best: streak.best(), pending })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::LeaderboardStore;
  use crate::streak::MemoryLocalStore;

  fn offline() -> AppState {
    AppState::offline(Arc::new(MemoryLocalStore::new()))
  }

  async fn send(state: &AppState, game: &mut PlayerGame, json: &str) -> serde_json::Value {
    let msg: ClientWsMessage = serde_json::from_str(json).unwrap();
    serde_json::to_value(handle_client_ws(msg, state, game).await).unwrap()
  }

  #[tokio::test]
  async fn full_round_over_the_socket_protocol() {
    let state = offline();
    let mut game = PlayerGame::new(state.local.clone());

    assert_eq!(send(&state, &mut game, r#"{"type":"ping"}"#).await["type"], "pong");
    assert_eq!(send(&state, &mut game, r#"{"type":"guess","text":"x"}"#).await["type"], "rejected");

    let v = send(&state, &mut game, r#"{"type":"new_puzzle","category":"Surprise Me!"}"#).await;
    assert_eq!(v["type"], "puzzle");
    assert_eq!(v["origin"], "fallback");

    let v = send(&state, &mut game, r#"{"type":"hint"}"#).await;
    assert_eq!(v["type"], "hint");
    assert_eq!(v["session"]["guessesRemaining"], 2);

    let v = send(&state, &mut game, r#"{"type":"guess","text":"apple"}"#).await;
    assert_eq!(v["correct"], false);
    assert!(v["answer"].is_null());

    let v = send(&state, &mut game, r#"{"type":"draft","text":"Bananas!"}"#).await;
    assert_eq!(v["type"], "session");
    assert_eq!(v["session"]["draft"], "Bananas!");

    let v = send(&state, &mut game, r#"{"type":"guess"}"#).await;
    assert_eq!(v["correct"], true);
    assert_eq!(v["gameOver"], true);
    assert_eq!(v["streak"], 1);
    assert_eq!(v["perfect"], false);

    let v = send(&state, &mut game, r#"{"type":"stats"}"#).await;
    assert_eq!(v["current"], 1);
  }

  #[tokio::test]
  async fn lost_streak_can_be_claimed_once() {
    let state = offline();
    let mut game = PlayerGame::new(state.local.clone());

    send(&state, &mut game, r#"{"type":"new_puzzle"}"#).await;
    send(&state, &mut game, r#"{"type":"guess","text":"banana"}"#).await;
    send(&state, &mut game, r#"{"type":"new_puzzle"}"#).await;
    for guess in ["kiwi", "plum", "pear"] {
      send(&state, &mut game, &format!(r#"{{"type":"guess","text":"{guess}"}}"#)).await;
    }
    assert_eq!(state.local.get(crate::streak::PENDING_STREAK_KEY).unwrap().as_deref(), Some("1"));

    let v = send(&state, &mut game, r#"{"type":"claim_streak","name":"Ann"}"#).await;
    assert_eq!(v["type"], "leaderboard_saved");
    assert_eq!(v["entry"]["streak"], 1);

    let v = send(&state, &mut game, r#"{"type":"claim_streak","name":"Ann"}"#).await;
    assert_eq!(v["type"], "rejected");

    let top = state.db.top_entries(10, 0, None).await.unwrap();
    assert_eq!(top.len(), 1);
  }

  #[tokio::test]
  async fn future_daily_is_rejected() {
    let state = offline();
    let mut game = PlayerGame::new(state.local.clone());
    let tomorrow = state.today().succ_opt().unwrap();
    let v = send(&state, &mut game, &format!(r#"{{"type":"daily_puzzle","date":"{tomorrow}"}}"#)).await;
    assert_eq!(v["type"], "rejected");
    assert!(game.session().is_none());
  }
}
