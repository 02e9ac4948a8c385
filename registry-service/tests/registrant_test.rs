//! Role matrix over the registrant endpoints.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use registry_service::{models::Role, services::store::RegistrantStore};
use serde_json::json;

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let app = TestApp::spawn();

    for uri in ["/api/2.0/registrants", "/api/2.0/applications", "/api/2.0/klinks"] {
        let (status, body) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["message"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_user_sees_only_themselves() {
    let app = TestApp::spawn();
    let user = app.registrant("user@example.com", Role::User).await;
    let other = app.registrant("other@example.com", Role::User).await;
    let token = app.token_for(&user);

    let (status, body) = app.get("/api/2.0/registrants", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], user.id);
    assert!(listed[0].get("password_hash").is_none());

    let (status, _) = app
        .get(&format!("/api/2.0/registrants/{}", user.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .get(&format!("/api/2.0/registrants/{}", other.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Insufficient permissions for this resource");
}

#[tokio::test]
async fn test_admin_reads_every_registrant() {
    let app = TestApp::spawn();
    let admin = app.registrant("admin@example.com", Role::Admin).await;
    let user = app.registrant("user@example.com", Role::User).await;
    app.registrant("owner@example.com", Role::Owner).await;
    let token = app.token_for(&admin);

    let (status, body) = app.get("/api/2.0/registrants", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) = app
        .get(&format!("/api/2.0/registrants/{}", user.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "user@example.com");
    assert_eq!(body["role"], "ROLE_USER");

    let (status, _) = app.get("/api/2.0/registrants/9999", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/2.0/registrants/abc", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "URL could not be understood");
}

#[tokio::test]
async fn test_creating_registrants_follows_role_ceiling() {
    let app = TestApp::spawn();
    let user = app.registrant("user@example.com", Role::User).await;
    let admin = app.registrant("admin@example.com", Role::Admin).await;
    let owner = app.registrant("owner@example.com", Role::Owner).await;

    let new = |email: &str, role: &str| {
        json!({"email": email, "name": "New", "role": role, "active": true})
    };

    let (status, _) = app
        .post(
            "/api/2.0/registrants",
            Some(&app.token_for(&user)),
            new("a@example.com", "ROLE_USER"),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/api/2.0/registrants",
            Some(&app.token_for(&admin)),
            new("b@example.com", "ROLE_ADMIN"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ROLE_ADMIN");
    assert_eq!(body["active"], true);

    let (status, _) = app
        .post(
            "/api/2.0/registrants",
            Some(&app.token_for(&admin)),
            new("c@example.com", "ROLE_OWNER"),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/api/2.0/registrants",
            Some(&app.token_for(&owner)),
            new("c@example.com", "ROLE_OWNER"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ROLE_OWNER");

    let (status, body) = app
        .post(
            "/api/2.0/registrants",
            Some(&app.token_for(&owner)),
            new("c@example.com", "ROLE_USER"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already taken");
}

#[tokio::test]
async fn test_user_cannot_change_own_role_or_status() {
    let app = TestApp::spawn();
    let user = app.registrant("user@example.com", Role::User).await;
    let token = app.token_for(&user);

    let (status, body) = app
        .put(
            &format!("/api/2.0/registrants/{}", user.id),
            Some(&token),
            json!({
                "email": "user@example.com",
                "name": "Renamed",
                "role": "ROLE_OWNER",
                "active": false
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["role"], "ROLE_USER");
    assert_eq!(body["active"], true);

    let stored = app.store.get_registrant_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::User);
    assert_eq!(stored.name, "Renamed");
}

#[tokio::test]
async fn test_admin_manages_users_but_not_peers() {
    let app = TestApp::spawn();
    let admin = app.registrant("admin@example.com", Role::Admin).await;
    let peer = app.registrant("peer@example.com", Role::Admin).await;
    let user = app.registrant("user@example.com", Role::User).await;
    let token = app.token_for(&admin);

    // Activate and promote a user
    let (status, body) = app
        .put(
            &format!("/api/2.0/registrants/{}", user.id),
            Some(&token),
            json!({
                "email": "user@example.com",
                "name": "user",
                "role": "ROLE_ADMIN",
                "active": false
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ROLE_ADMIN");
    assert_eq!(body["active"], false);

    // Promotion to owner is out of reach
    let other = app.registrant("other@example.com", Role::User).await;
    let (status, _) = app
        .put(
            &format!("/api/2.0/registrants/{}", other.id),
            Some(&token),
            json!({"email": "other@example.com", "name": "other", "role": "ROLE_OWNER"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Peer admins are neither demoted nor deleted
    let (status, body) = app
        .put(
            &format!("/api/2.0/registrants/{}", peer.id),
            Some(&token),
            json!({"email": "peer@example.com", "name": "peer", "role": "ROLE_USER"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ROLE_ADMIN");

    let (status, _) = app
        .delete(&format!("/api/2.0/registrants/{}", peer.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .delete(&format!("/api/2.0/registrants/{}", other.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert!(app
        .store
        .get_registrant_by_id(other.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_owner_deletes_anyone_and_absent_ids_are_ok() {
    let app = TestApp::spawn();
    let owner = app.registrant("owner@example.com", Role::Owner).await;
    let admin = app.registrant("admin@example.com", Role::Admin).await;
    let token = app.token_for(&owner);

    let (status, _) = app
        .delete(&format!("/api/2.0/registrants/{}", admin.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.delete("/api/2.0/registrants/9999", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_user_cannot_delete_anyone() {
    let app = TestApp::spawn();
    let user = app.registrant("user@example.com", Role::User).await;
    let token = app.token_for(&user);

    let (status, _) = app
        .delete(&format!("/api/2.0/registrants/{}", user.id), Some(&token))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
