//! Sign-in, credential migration and sign-out through the full router.

use axum::http::StatusCode;
use hd_core::db::create_staff_repository;
use hd_core::{INVALID_CREDENTIALS_MESSAGE, SERVICE_UNAVAILABLE_MESSAGE};

use super::common::{
    create_test_portal, extract_csrf_token, extract_error, signed_in, TestClient, ADMIN_USER,
    SUPPORT_USER,
};

#[tokio::test]
async fn test_index_renders_login_form() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    let response = client.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(extract_csrf_token(&response.body).is_some());
    assert!(extract_error(&response.body).is_none());
    assert!(client.session_cookie().is_some());
}

#[tokio::test]
async fn test_support_login_lands_on_support() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    let response = client.login(SUPPORT_USER.0, SUPPORT_USER.1).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/support"));
    assert_eq!(client.get("/support").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_login_lands_on_admin() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    let response = client.login(ADMIN_USER.0, ADMIN_USER.1).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/admin"));
}

#[tokio::test]
async fn test_legacy_password_migrates_on_first_login() {
    let portal = create_test_portal().await;
    let staff = create_staff_repository(&portal.db);

    let before = staff.get_by_username("amy").await.unwrap().unwrap();
    assert!(before.credential.is_legacy());

    let mut client = signed_in(&portal.app, SUPPORT_USER).await;

    let after = staff.get_by_username("amy").await.unwrap().unwrap();
    assert!(!after.credential.is_legacy());
    assert!(after.credential.as_stored().starts_with("$argon2"));

    // Second sign-in goes through the hashed path.
    client.post_form("/logout", &[]).await;
    let response = client.login(SUPPORT_USER.0, SUPPORT_USER.1).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let again = staff.get_by_username("amy").await.unwrap().unwrap();
    assert_eq!(again.credential, after.credential);
}

#[tokio::test]
async fn test_failed_logins_share_one_message() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    let unknown = client.login("nosuchuser", "x").await;
    let wrong = client.login(SUPPORT_USER.0, "wrongpass").await;

    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(wrong.status, StatusCode::OK);

    let unknown_error = extract_error(&unknown.body).expect("error shown");
    let wrong_error = extract_error(&wrong.body).expect("error shown");
    assert_eq!(unknown_error, wrong_error);
    assert_eq!(unknown_error, INVALID_CREDENTIALS_MESSAGE);
}

#[tokio::test]
async fn test_wrong_password_does_not_sign_in() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    client.login(SUPPORT_USER.0, "Hunter2").await;

    let response = client.get("/support").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn test_store_outage_is_reported_separately() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    let index = client.get("/").await;
    let token = extract_csrf_token(&index.body).unwrap();
    portal.db.close().await;

    let response = client
        .post_form(
            "/login",
            &[
                ("username", SUPPORT_USER.0),
                ("password", SUPPORT_USER.1),
                ("csrf_token", token.as_str()),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    let error = extract_error(&response.body).expect("error shown");
    assert_eq!(error, SERVICE_UNAVAILABLE_MESSAGE);
    assert_ne!(error, INVALID_CREDENTIALS_MESSAGE);
}

#[tokio::test]
async fn test_login_without_token_is_rejected() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    let response = client
        .post_form(
            "/login",
            &[
                ("username", SUPPORT_USER.0),
                ("password", SUPPORT_USER.1),
                ("csrf_token", "forged"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let error = extract_error(&response.body).unwrap();
    assert!(error.starts_with("Session expired"));

    // The password was never checked, so nothing migrated.
    let amy = create_staff_repository(&portal.db)
        .get_by_username("amy")
        .await
        .unwrap()
        .unwrap();
    assert!(amy.credential.is_legacy());
}

#[tokio::test]
async fn test_login_with_wrong_token_is_rejected() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);
    client.get("/").await;

    let response = client
        .post_form(
            "/login",
            &[
                ("username", SUPPORT_USER.0),
                ("password", SUPPORT_USER.1),
                ("csrf_token", "forged"),
            ],
        )
        .await;

    let error = extract_error(&response.body).unwrap();
    assert!(error.starts_with("Invalid request"));
    assert_eq!(client.get("/support").await.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_session_id_changes_on_login() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    client.get("/").await;
    let before = client.session_cookie().map(str::to_string);

    let index = client.get("/").await;
    let token = extract_csrf_token(&index.body).unwrap();
    client
        .post_form(
            "/login",
            &[
                ("username", SUPPORT_USER.0),
                ("password", SUPPORT_USER.1),
                ("csrf_token", token.as_str()),
            ],
        )
        .await;

    assert!(before.is_some());
    assert_ne!(client.session_cookie().map(str::to_string), before);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let portal = create_test_portal().await;
    let mut client = signed_in(&portal.app, ADMIN_USER).await;
    assert_eq!(client.get("/admin").await.status, StatusCode::OK);

    let response = client.post_form("/logout", &[]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));

    let response = client.get("/admin").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn test_logout_when_anonymous_succeeds() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    let response = client.post_form("/logout", &[]).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn test_login_errors_are_escaped() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    let response = client.login("<script>alert(1)</script>", "x").await;

    assert!(!response.body.contains("<script>alert(1)</script>"));
}
