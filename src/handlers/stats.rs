//! Progress read endpoints: today's counts, weekly ledgers, level factors.

use axum::{
  extract::State,
  Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::UsernameQuery;
use crate::db;
use crate::domain::Subject;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::services::scoring;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatsRequest {
  pub username: Option<String>,
}

/// GET /user/today?username= - Today's count per subject
pub async fn today(
  State(state): State<AppState>,
  ApiQuery(query): ApiQuery<UsernameQuery>,
) -> Result<Json<Value>, ApiError> {
  let username = scoring::require_username(query.username.as_deref())?;
  let day = state.today();

  let counts = {
    let conn = db::try_lock(&state.db)?;
    scoring::today_counts(&conn, username, day)?
  };

  let counts: Map<String, Value> = counts
    .into_iter()
    .map(|(subject, n)| (subject.as_str().to_string(), n.into()))
    .collect();
  Ok(Json(json!({ "ok": true, "dayIndex": day.get(), "counts": counts })))
}

/// POST /user/stats - Full weekly ledgers (reporting only)
pub async fn weekly_stats(
  State(state): State<AppState>,
  ApiJson(req): ApiJson<StatsRequest>,
) -> Result<Json<Value>, ApiError> {
  let username = scoring::require_username(req.username.as_deref())?;

  let weekly = {
    let conn = db::try_lock(&state.db)?;
    scoring::weekly_counts(&conn, username)?
  };

  let mut user = Map::new();
  user.insert("username".into(), username.into());
  for (subject, days) in weekly {
    user.insert(subject.as_str().into(), json!(days));
  }
  Ok(Json(json!({ "ok": true, "user": user })))
}

/// GET /user/{subject}-f?username= - Current level factor (1/2/3)
pub async fn subject_factor(
  State(state): State<AppState>,
  ApiQuery(query): ApiQuery<UsernameQuery>,
  subject: Subject,
) -> Result<Json<Value>, ApiError> {
  let username = scoring::require_username(query.username.as_deref())?;

  let level = {
    let conn = db::try_lock(&state.db)?;
    scoring::subject_level(&conn, username, subject)?
  };

  let mut body = Map::new();
  body.insert("ok".into(), Value::Bool(true));
  body.insert(subject.factor_field().into(), level.factor().into());
  Ok(Json(Value::Object(body)))
}
