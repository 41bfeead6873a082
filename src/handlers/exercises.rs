//! Exercise endpoint: a fresh question at the learner's current level.

use axum::{
  extract::{Path, State},
  Json,
};
use serde_json::{json, Value};

use super::{parse_subject, UsernameQuery};
use crate::content;
use crate::db;
use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::services::scoring;
use crate::state::AppState;

/// GET /exercise/{subject}?username= - Generate a question. Nothing is stored.
pub async fn next_exercise(
  State(state): State<AppState>,
  Path(subject): Path<String>,
  ApiQuery(query): ApiQuery<UsernameQuery>,
) -> Result<Json<Value>, ApiError> {
  let subject = parse_subject(&subject)?;
  let username = scoring::require_username(query.username.as_deref())?;

  let level = {
    let conn = db::try_lock(&state.db)?;
    scoring::subject_level(&conn, username, subject)?
  };

  let exercise = content::generate(subject, level, &mut rand::rng());
  Ok(Json(json!({
    "ok": true,
    "subject": subject,
    "level": level.factor(),
    "question": exercise,
  })))
}

#[cfg(test)]
mod tests {
  use crate::db;
  use crate::domain::{Subject, Tier};
  use crate::handlers::router;
  use crate::testing::{utc, TestEnv};
  use axum::http::StatusCode;
  use axum_test::TestServer;
  use serde_json::Value;

  fn setup() -> (TestEnv, TestServer) {
    let env = TestEnv::new().unwrap();
    db::create_user(&env.conn(), "mia", "hash", 8, utc(2026, 10, 1, 9, 0, 0)).unwrap();
    let (state, _clock) = env.app_state(utc(2026, 10, 15, 12, 0, 0));
    let server = TestServer::new(router(state)).unwrap();
    (env, server)
  }

  #[tokio::test]
  async fn test_exercise_matches_level() {
    let (env, server) = setup();
    {
      let conn = env.conn();
      let mut progress = db::load_progress(&conn, "mia").unwrap().unwrap();
      progress.subject_mut(Subject::Division).level = Tier::Hard;
      db::save_progress(&conn, &progress).unwrap();
    }

    let response = server.get("/exercise/division").add_query_param("username", "mia").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["subject"], "division");
    assert_eq!(body["level"], 3);
    assert_eq!(body["question"]["level"], "hard");

    let left = body["question"]["left"].as_u64().unwrap();
    let right = body["question"]["right"].as_u64().unwrap();
    let answer = body["question"]["answer"].as_u64().unwrap();
    assert_eq!(left, right * answer);
  }

  #[tokio::test]
  async fn test_exercise_does_not_touch_progress() {
    let (env, server) = setup();
    let before = db::load_progress(&env.conn(), "mia").unwrap();

    server
      .get("/exercise/addition")
      .add_query_param("username", "mia")
      .await
      .assert_status_ok();

    assert_eq!(db::load_progress(&env.conn(), "mia").unwrap(), before);
  }

  #[tokio::test]
  async fn test_exercise_errors() {
    let (_env, server) = setup();

    let subject = server.get("/exercise/algebra").add_query_param("username", "mia").await;
    assert_eq!(subject.status_code(), StatusCode::BAD_REQUEST);

    let ghost = server.get("/exercise/addition").add_query_param("username", "ghost").await;
    assert_eq!(ghost.status_code(), StatusCode::NOT_FOUND);
  }
}
