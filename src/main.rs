use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catmath::{clock::SystemClock, config, db, handlers, services, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "catmath=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let settings = config::load();
  tracing::info!(
    "Day buckets and archive schedule use timezone {}",
    settings.schedule.timezone
  );

  let pool = db::init_db(&settings.database_path).expect("Failed to initialize database");

  {
    let conn = pool.lock().expect("Database lock failed during startup");
    match db::count_users(&conn) {
      Ok(n) => tracing::info!("Database ready with {} users", n),
      Err(e) => tracing::warn!("Could not count users: {}", e),
    }
  }

  let bind_addr = settings.bind_addr();
  let port = settings.port;
  let state = AppState::new(pool, Arc::new(SystemClock), settings);

  services::archive::spawn_scheduler(state.clone());

  let app = handlers::router(state);

  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", port);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
