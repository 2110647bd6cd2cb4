//! Every protected route denies anonymous and wrong-role sessions.

use axum::http::StatusCode;
use hd_core::db::create_ticket_repository;
use hd_core::TicketStatus;

use super::common::{
    create_test_portal, seed_ticket, signed_in, TestClient, ADMIN_USER, SUPPORT_USER,
};

/// Who may call a route.
#[derive(Clone, Copy, Debug)]
enum Audience {
    Admin,
    Support,
    AnyStaff,
}

const GET_ROUTES: &[(&str, Audience)] = &[
    ("/admin", Audience::Admin),
    ("/admin/students", Audience::Admin),
    ("/admin/audit", Audience::Admin),
    ("/support", Audience::Support),
    ("/tickets", Audience::AnyStaff),
    ("/tickets?status=open", Audience::AnyStaff),
];

#[tokio::test]
async fn test_anonymous_is_sent_to_login() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    for (route, _) in GET_ROUTES {
        let response = client.get(route).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "GET {}", route);
        assert_eq!(response.location.as_deref(), Some("/"), "GET {}", route);
    }

    let id = seed_ticket(&portal, "Projector in B12 is dead").await;
    let response = client
        .post_form(
            &format!("/tickets/{}/status", id),
            &[("csrf_token", "x"), ("status", "resolved")],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));

    let ticket = create_ticket_repository(&portal.db)
        .get(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
}

#[tokio::test]
async fn test_support_session_denied_admin_routes() {
    let portal = create_test_portal().await;
    let mut client = signed_in(&portal.app, SUPPORT_USER).await;

    for (route, audience) in GET_ROUTES {
        let expected = match audience {
            Audience::Admin => StatusCode::FORBIDDEN,
            Audience::Support | Audience::AnyStaff => StatusCode::OK,
        };
        assert_eq!(client.get(route).await.status, expected, "GET {}", route);
    }
}

#[tokio::test]
async fn test_admin_session_denied_support_routes() {
    let portal = create_test_portal().await;
    let mut client = signed_in(&portal.app, ADMIN_USER).await;

    for (route, audience) in GET_ROUTES {
        let expected = match audience {
            Audience::Support => StatusCode::FORBIDDEN,
            Audience::Admin | Audience::AnyStaff => StatusCode::OK,
        };
        assert_eq!(client.get(route).await.status, expected, "GET {}", route);
    }
}

#[tokio::test]
async fn test_forbidden_body_names_requirement() {
    let portal = create_test_portal().await;
    let mut client = signed_in(&portal.app, SUPPORT_USER).await;

    let response = client.get("/admin").await;
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();

    assert_eq!(body["code"], "FORBIDDEN");
    assert!(body["message"].as_str().unwrap().contains("role admin"));
}

#[tokio::test]
async fn test_public_routes_need_no_session() {
    let portal = create_test_portal().await;
    let mut client = TestClient::new(&portal.app);

    assert_eq!(client.get("/").await.status, StatusCode::OK);
    assert_eq!(client.get("/search?q=wifi").await.status, StatusCode::OK);
    assert_eq!(client.get("/health").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_present() {
    let portal = create_test_portal().await;
    let response = {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        portal
            .app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap()
    };

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("x-request-id").is_some());
}
