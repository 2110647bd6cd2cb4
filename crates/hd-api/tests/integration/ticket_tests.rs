//! Public ticket submission and search, and staff status changes.

use axum::http::StatusCode;
use hd_core::db::{create_audit_repository, create_ticket_repository};
use hd_core::{AuditEvent, TicketStatus};

use super::common::{
    create_test_portal, extract_csrf_token, extract_error, seed_ticket, signed_in, TestClient,
    ADMIN_USER, SUPPORT_USER,
};

#[tokio::test]
async fn test_submit_ticket() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);
    let student_id = portal.student_id.to_string();

    let response = client
        .post_form(
            "/submit_ticket",
            &[("student_id", student_id.as_str()), ("issue", "Printer on floor 2 jams")],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Ticket #1 submitted."));

    let ticket = create_ticket_repository(&portal.db)
        .get(1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.issue, "Printer on floor 2 jams");

    let audit = create_audit_repository(&portal.db).recent(10).await.unwrap();
    assert!(audit
        .iter()
        .any(|e| e.event == AuditEvent::TicketSubmitted && e.actor == "anonymous"));
}

#[tokio::test]
async fn test_submit_ticket_unknown_student() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    let response = client
        .post_form("/submit_ticket", &[("student_id", "9999"), ("issue", "help")])
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        extract_error(&response.body).as_deref(),
        Some("No student is registered with that ID.")
    );
}

#[tokio::test]
async fn test_submit_ticket_invalid_input() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);
    let student_id = portal.student_id.to_string();

    let response = client
        .post_form("/submit_ticket", &[("student_id", "1; DROP TABLE tickets"), ("issue", "x")])
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = client
        .post_form("/submit_ticket", &[("student_id", student_id.as_str()), ("issue", "   ")])
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let tickets = create_ticket_repository(&portal.db).list(None).await.unwrap();
    assert!(tickets.is_empty());
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let portal = create_test_portal().await;
    seed_ticket(&portal, "WiFi drops in the library").await;
    seed_ticket(&portal, "Printer jam").await;
    let mut client = TestClient::new(&portal.app);

    let response = client.get("/search?q=wifi").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("WiFi drops in the library"));
    assert!(!response.body.contains("Printer jam"));
}

#[tokio::test]
async fn test_search_wildcards_are_literal() {
    let portal = create_test_portal().await;
    seed_ticket(&portal, "Quota at 100% full").await;
    seed_ticket(&portal, "Printer jam").await;
    let mut client = TestClient::new(&portal.app);

    let response = client.get("/search?q=%25").await;

    assert!(response.body.contains("Quota at 100% full"));
    assert!(!response.body.contains("Printer jam"));
}

#[tokio::test]
async fn test_empty_search_returns_nothing() {
    let portal = create_test_portal().await;
    seed_ticket(&portal, "Printer jam").await;
    let mut client = TestClient::new(&portal.app);

    let response = client.get("/search?q=").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("No tickets found."));
}

#[tokio::test]
async fn test_search_escapes_issue_text() {
    let portal = create_test_portal().await;
    seed_ticket(&portal, "<script>alert(1)</script> login page").await;
    let mut client = TestClient::new(&portal.app);

    let response = client.get("/search?q=login").await;

    assert!(!response.body.contains("<script>alert(1)</script>"));
    assert!(response.body.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn test_status_toggle() {
    let portal = create_test_portal().await;
    let id = seed_ticket(&portal, "Printer jam").await;
    let mut client = signed_in(&portal.app, SUPPORT_USER).await;

    let page = client.get("/tickets").await;
    let token = extract_csrf_token(&page.body).expect("toggle form carries a token");

    let response = client
        .post_form(
            &format!("/tickets/{}/status", id),
            &[("csrf_token", token.as_str()), ("status", "resolved")],
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/tickets"));

    let ticket = create_ticket_repository(&portal.db)
        .get(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Resolved);

    let audit = create_audit_repository(&portal.db).recent(10).await.unwrap();
    assert!(audit
        .iter()
        .any(|e| e.event == AuditEvent::TicketStatusChanged && e.actor == "amy"));
}

#[tokio::test]
async fn test_status_toggle_requires_token() {
    let portal = create_test_portal().await;
    let id = seed_ticket(&portal, "Printer jam").await;
    let mut client = signed_in(&portal.app, ADMIN_USER).await;

    let response = client
        .post_form(
            &format!("/tickets/{}/status", id),
            &[("csrf_token", "forged"), ("status", "resolved")],
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    let ticket = create_ticket_repository(&portal.db)
        .get(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
}

#[tokio::test]
async fn test_status_toggle_unknown_ticket() {
    let portal = create_test_portal().await;
    let id = seed_ticket(&portal, "Printer jam").await;
    let mut client = signed_in(&portal.app, ADMIN_USER).await;
    let page = client.get("/tickets").await;
    let token = extract_csrf_token(&page.body).unwrap();

    let response = client
        .post_form(
            &format!("/tickets/{}/status", id + 100),
            &[("csrf_token", token.as_str()), ("status", "resolved")],
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_support_queue_lists_open_tickets() {
    let portal = create_test_portal().await;
    let open = seed_ticket(&portal, "Printer jam").await;
    let done = seed_ticket(&portal, "Projector bulb").await;
    create_ticket_repository(&portal.db)
        .set_status(done, TicketStatus::Resolved)
        .await
        .unwrap();
    let mut client = signed_in(&portal.app, SUPPORT_USER).await;

    let response = client.get("/support").await;

    assert!(open > 0);
    assert!(response.body.contains("Printer jam"));
    assert!(!response.body.contains("Projector bulb"));
}

#[tokio::test]
async fn test_admin_pages_show_store_contents() {
    let portal = create_test_portal().await;
    seed_ticket(&portal, "Printer jam").await;
    let mut client = signed_in(&portal.app, ADMIN_USER).await;

    let landing = client.get("/admin").await;
    assert!(landing.body.contains("staff_users"));
    assert!(landing.body.contains("<td>tickets</td><td>1</td>"));

    let students = client.get("/admin/students").await;
    assert!(students.body.contains("dana@campus.edu"));

    let audit = client.get("/admin/audit").await;
    assert!(audit.body.contains("login_succeeded"));
    assert!(audit.body.contains("credential_migrated"));
}

#[tokio::test]
async fn test_unknown_ticket_filter_is_bad_request() {
    let portal = create_test_portal().await;
    let mut client = signed_in(&portal.app, ADMIN_USER).await;

    let response = client.get("/tickets?status=closed").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_database() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    let response = client.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["database"]["connected"], true);

    portal.db.close().await;
    let response = client.get("/health").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}
