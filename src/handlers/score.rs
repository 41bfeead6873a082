//! Answer submission.

use axum::{
  extract::{Path, State},
  Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::parse_subject;
use crate::db;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::services::scoring;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
  pub username: Option<String>,
  /// Only a JSON boolean counts; anything else makes the call a read
  #[serde(rename = "isCorrect")]
  pub is_correct: Option<Value>,
}

/// POST /score/{subject} - Record one answer and return today's count
pub async fn submit_score(
  State(state): State<AppState>,
  Path(subject): Path<String>,
  ApiJson(req): ApiJson<ScoreRequest>,
) -> Result<Json<Value>, ApiError> {
  let subject = parse_subject(&subject)?;
  let username = scoring::require_username(req.username.as_deref())?;
  let outcome = req.is_correct.as_ref().and_then(Value::as_bool);

  let day = state.today();
  let result = {
    let mut conn = db::try_lock(&state.db)?;
    scoring::record_answer(&mut conn, username, subject, outcome, day)?
  };

  let mut body = Map::new();
  body.insert("ok".into(), Value::Bool(true));
  body.insert(subject.as_str().into(), result.today.into());
  body.insert("dayIndex".into(), result.day.get().into());
  body.insert("level".into(), result.level.factor().into());
  Ok(Json(Value::Object(body)))
}
