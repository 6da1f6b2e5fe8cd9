/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use kanmind_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = kanmind_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::require_auth, task_scope::resolve_task},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET  /health                                  (public)
/// ├── POST /registration/                           (public)
/// ├── POST /login/                                  (public)
/// ├── GET  /email-check/?email=
/// ├── GET|POST /boards/
/// ├── GET|PUT|PATCH|DELETE /boards/:board_id/
/// ├── GET|POST /tasks/
/// ├── GET  /tasks/assigned-to-me/
/// ├── GET  /tasks/reviewing/
/// ├── GET|PUT|PATCH|DELETE /tasks/:task_id/
/// ├── GET|POST /tasks/:task_id/comments/            (task scope)
/// └── GET|PUT|PATCH|DELETE /tasks/:task_id/comments/:comment_id/  (task scope)
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. CORS (tower-http CorsLayer)
/// 2. Logging (tower-http TraceLayer)
/// 3. Bearer authentication (all routes but health/registration/login)
/// 4. Task scope (comment routes only)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/registration/", post(routes::auth::register))
        .route("/login/", post(routes::auth::login));

    let comment_routes = Router::new()
        .route(
            "/tasks/:task_id/comments/",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .route(
            "/tasks/:task_id/comments/:comment_id/",
            get(routes::comments::get_comment)
                .put(routes::comments::update_comment)
                .patch(routes::comments::update_comment)
                .delete(routes::comments::delete_comment),
        )
        .route_layer(from_fn_with_state(state.clone(), resolve_task));

    let protected_routes = Router::new()
        .route("/email-check/", get(routes::auth::email_check))
        .route(
            "/boards/",
            get(routes::boards::list_boards).post(routes::boards::create_board),
        )
        .route(
            "/boards/:board_id/",
            get(routes::boards::get_board)
                .put(routes::boards::replace_board)
                .patch(routes::boards::patch_board)
                .delete(routes::boards::delete_board),
        )
        .route(
            "/tasks/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/assigned-to-me/", get(routes::tasks::assigned_to_me))
        .route("/tasks/reviewing/", get(routes::tasks::reviewing))
        .route(
            "/tasks/:task_id/",
            get(routes::tasks::get_task)
                .put(routes::tasks::replace_task)
                .patch(routes::tasks::patch_task)
                .delete(routes::tasks::delete_task),
        )
        .merge(comment_routes)
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
