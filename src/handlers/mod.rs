//! HTTP surface: JSON endpoints and the router that wires them.

pub mod exercises;
pub mod score;
pub mod stats;

use axum::{
  extract::State,
  http::Uri,
  routing::{get, post},
  Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth;
use crate::domain::Subject;
use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::state::AppState;

/// `?username=` query shared by the read endpoints
#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
  pub username: Option<String>,
}

/// Subject from a path segment, rejected before any lookup when unknown
pub(crate) fn parse_subject(raw: &str) -> Result<Subject, ApiError> {
  Subject::from_str(raw).ok_or_else(|| ApiError::UnsupportedSubject(raw.to_string()))
}

pub async fn health() -> Json<Value> {
  Json(json!({ "ok": true, "version": env!("CARGO_PKG_VERSION") }))
}

/// Unmatched paths. `/user/<x>-f` for an unknown `x` is a bad subject, not a
/// missing route.
async fn unknown_route(uri: Uri) -> ApiError {
  let path = uri.path();
  match path.strip_prefix("/user/").and_then(|rest| rest.strip_suffix("-f")) {
    Some(subject) => ApiError::UnsupportedSubject(subject.to_string()),
    None => ApiError::UnknownRoute(path.to_string()),
  }
}

async fn method_not_allowed() -> ApiError {
  ApiError::MethodNotAllowed
}

pub fn router(state: AppState) -> Router {
  let mut app: Router<AppState> = Router::new()
    .route("/health", get(health))
    .route("/register", post(auth::register))
    .route("/check-login", post(auth::check_login))
    .route("/score/{subject}", post(score::submit_score))
    .route("/user/today", get(stats::today))
    .route("/user/stats", post(stats::weekly_stats))
    .route("/exercise/{subject}", get(exercises::next_exercise));

  // "{subject}-f" cannot be captured inside a single segment
  for subject in Subject::ALL {
    app = app.route(
      &format!("/user/{}-f", subject.as_str()),
      get(move |state: State<AppState>, query: ApiQuery<UsernameQuery>| {
        stats::subject_factor(state, query, subject)
      }),
    );
  }

  app
    .fallback(unknown_route)
    .method_not_allowed_fallback(method_not_allowed)
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(state)
}
