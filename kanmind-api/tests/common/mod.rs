/// Common test utilities for integration tests
///
/// - Test database setup (skipped when DATABASE_URL is unset)
/// - Test user creation with ready-made bearer tokens
/// - A JSON request helper that drives the router in-process

use axum::body::Body;
use axum::http::{Request, StatusCode};
use kanmind_api::app::{build_router, AppState};
use kanmind_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, LogConfig};
use kanmind_shared::auth::jwt::{create_token, Claims};
use kanmind_shared::db::migrations::run_migrations;
use kanmind_shared::models::user::{CreateUser, User};
use serde_json::Value;
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
}

/// A user plus a valid token for them
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

impl TestContext {
    /// Connects to DATABASE_URL and applies migrations; `None` when the
    /// variable isn't set so callers can skip
    pub async fn new() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: url.clone(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: JWT_SECRET.to_string(),
            },
            log: LogConfig::default(),
        };

        let db = PgPool::connect(&url).await.expect("Failed to connect to test database");
        run_migrations(&db).await.expect("Failed to run migrations");

        let app = build_router(AppState::new(db.clone(), config.clone()));

        Some(TestContext { db, app, config })
    }

    /// Creates a user directly in the database
    ///
    /// The stored hash is a placeholder, so these users can't log in with a
    /// password; use the token instead.
    pub async fn create_user(&self, fullname: &str) -> anyhow::Result<TestUser> {
        let email = format!("test-{}@example.com", Uuid::new_v4());
        let user = User::create(
            &self.db,
            CreateUser::from_fullname(&email, fullname, "test_hash".to_string()),
        )
        .await?;

        let token = create_token(&Claims::new(user.id), &self.config.jwt.secret)?;

        Ok(TestUser { user, token })
    }

    /// Sends a request and returns the status and JSON body (`Null` when
    /// the body is empty)
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .call(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request("GET", uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(&user.token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, Some(&user.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(&user.token), None).await
    }
}

/// Reads an ID field out of a JSON response
pub fn id_of(value: &Value, field: &str) -> Uuid {
    value[field]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("missing uuid field {field} in {value}"))
}
