//! Common test utilities for integration tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use hd_api::state::GateSettings;
use hd_api::{ApiServer, ApiServerConfig, AppState, PortalSessionStore};
use hd_core::db::{
    create_pool_with_options, create_staff_repository, create_student_repository,
    create_ticket_repository, run_migrations, DbPool, PoolOptions,
};
use hd_core::{HashingCost, NewTicket, Role};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

pub const COOKIE_NAME: &str = "helpdesk_session";

/// Staff seeded into every test database.
pub const SUPPORT_USER: (&str, &str) = ("amy", "hunter2");
pub const ADMIN_USER: (&str, &str) = ("root", "toor");

async fn memory_pool(prefix: &str) -> DbPool {
    let db_url = format!(
        "sqlite:file:{}_{}?mode=memory&cache=shared",
        prefix,
        Uuid::new_v4()
    );
    let options = PoolOptions {
        max_connections: 1,
        ..PoolOptions::default()
    };

    create_pool_with_options(&db_url, options)
        .await
        .expect("Failed to create SQLite pool")
}

/// Creates an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> DbPool {
    let pool = memory_pool("integration_test").await;
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A cheap hashing cost so tests stay fast.
pub fn test_settings() -> GateSettings {
    GateSettings {
        hashing_cost: HashingCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        store_timeout: Duration::from_secs(5),
    }
}

/// A seeded portal and a handle on its database.
pub struct TestPortal {
    pub app: Router,
    pub db: DbPool,
    pub student_id: i64,
}

/// Builds the full portal with one support and one admin account, both
/// still holding legacy plaintext passwords, and one student.
pub async fn create_test_portal() -> TestPortal {
    let db = setup_test_db().await;

    let staff = create_staff_repository(&db);
    staff
        .create(SUPPORT_USER.0, Role::Support, SUPPORT_USER.1)
        .await
        .expect("Failed to seed support user");
    staff
        .create(ADMIN_USER.0, Role::Admin, ADMIN_USER.1)
        .await
        .expect("Failed to seed admin user");

    let student = create_student_repository(&db)
        .create("Dana Reyes", "dana@campus.edu", "Computer Science")
        .await
        .expect("Failed to seed student");

    let state = AppState::new(db.clone(), test_settings());
    let config = ApiServerConfig {
        session_secure: false,
        ..ApiServerConfig::default()
    };
    // Sessions live apart from the portal data so tests can take the
    // portal store down while the browser session survives.
    let sessions = PortalSessionStore::connect(&memory_pool("sessions").await)
        .await
        .expect("Failed to create session store");
    let app = ApiServer::new(state, sessions, config).router();

    TestPortal {
        app,
        db,
        student_id: student.id,
    }
}

/// Files an open ticket for the seeded student.
pub async fn seed_ticket(portal: &TestPortal, issue: &str) -> i64 {
    create_ticket_repository(&portal.db)
        .create(&NewTicket {
            student_id: portal.student_id,
            issue: issue.to_string(),
        })
        .await
        .expect("Failed to seed ticket")
        .id
}

/// Response status, headers of interest and body text.
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// A browser stand-in that carries the session cookie between requests.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub fn new(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
        }
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.builder(Method::GET, uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let request = self
            .builder(Method::POST, uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Loads the index and signs in with the token it carries.
    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        let index = self.get("/").await;
        let token = extract_csrf_token(&index.body).expect("index has a login token");
        self.post_form(
            "/login",
            &[
                ("username", username),
                ("password", password),
                ("csrf_token", token.as_str()),
            ],
        )
        .await
    }

    fn builder(&self, method: Method, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(value) => builder.header(header::COOKIE, format!("{}={}", COOKIE_NAME, value)),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = set_cookie.to_str() else {
                continue;
            };
            let pair = raw.split(';').next().unwrap_or_default();
            if let Some(value) = pair.strip_prefix(&format!("{}=", COOKIE_NAME)) {
                let expired = raw.contains("Max-Age=0");
                self.cookie = if value.is_empty() || expired {
                    None
                } else {
                    Some(value.to_string())
                };
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&body).to_string(),
        }
    }
}

/// Pulls the first `csrf_token` hidden field value out of a page.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let marker = "name=\"csrf_token\" value=\"";
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}

/// Pulls the text of the first `class="error"` paragraph out of a page.
pub fn extract_error(html: &str) -> Option<String> {
    let marker = "<p class=\"error\">";
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find("</p>")?;
    Some(html[start..start + end].to_string())
}

/// A client already signed in as `user`.
pub async fn signed_in(app: &Router, user: (&str, &str)) -> TestClient {
    let mut client = TestClient::new(app);
    let response = client.login(user.0, user.1).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER, "login for {}", user.0);
    client
}
