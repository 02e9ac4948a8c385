//! K-Link and permission endpoints.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use registry_service::models::Role;
use serde_json::json;

fn klink(identifier: &str) -> serde_json::Value {
    json!({
        "identifier": identifier,
        "name": "Test K-Link",
        "website": "https://klink.example.org",
        "description": "A node"
    })
}

#[tokio::test]
async fn test_only_privileged_roles_create_and_delete_klinks() {
    let app = TestApp::spawn();
    let user = app.registrant("user@example.com", Role::User).await;
    let admin = app.registrant("admin@example.com", Role::Admin).await;

    let (status, _) = app
        .post("/api/2.0/klinks", Some(&app.token_for(&user)), klink("KLINK_A"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post("/api/2.0/klinks", Some(&app.token_for(&admin)), klink("KLINK_A"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["manager_id"], admin.id);
    let id = body["id"].as_i64().unwrap();

    // Everyone signed in can read
    let (status, body) = app.get("/api/2.0/klinks", Some(&app.token_for(&user))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = app
        .post("/api/2.0/klinks", Some(&app.token_for(&admin)), klink("KLINK_A"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .delete(&format!("/api/2.0/klinks/{}", id), Some(&app.token_for(&user)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .delete(&format!("/api/2.0/klinks/{}", id), Some(&app.token_for(&admin)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .get(&format!("/api/2.0/klinks/{}", id), Some(&app.token_for(&admin)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manager_updates_their_klink_but_cannot_hand_it_over() {
    let app = TestApp::spawn();
    let admin = app.registrant("admin@example.com", Role::Admin).await;
    let manager = app.registrant("manager@example.com", Role::User).await;
    let stranger = app.registrant("stranger@example.com", Role::User).await;

    let mut body = klink("KLINK_B");
    body["manager_id"] = json!(manager.id);
    let (status, created) = app
        .post("/api/2.0/klinks", Some(&app.token_for(&admin)), body)
        .await;
    assert_eq!(status, StatusCode::OK);
    let uri = format!("/api/2.0/klinks/{}", created["id"]);

    let mut update = klink("KLINK_B");
    update["name"] = json!("Renamed");
    let (status, body) = app
        .put(&uri, Some(&app.token_for(&manager)), update.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["manager_id"], manager.id);

    let (status, _) = app
        .put(&uri, Some(&app.token_for(&stranger)), update.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    update["manager_id"] = json!(stranger.id);
    let (status, _) = app.put(&uri, Some(&app.token_for(&manager)), update).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_klink_manager_cannot_be_deleted() {
    let app = TestApp::spawn();
    let owner = app.registrant("owner@example.com", Role::Owner).await;
    let manager = app.registrant("manager@example.com", Role::User).await;
    let token = app.token_for(&owner);

    let mut body = klink("KLINK_C");
    body["manager_id"] = json!(manager.id);
    app.post("/api/2.0/klinks", Some(&token), body).await;

    let (status, body) = app
        .delete(&format!("/api/2.0/registrants/{}", manager.id), Some(&token))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Resource is still in use");
}

#[tokio::test]
async fn test_permissions_are_public_to_read_and_privileged_to_create() {
    let app = TestApp::spawn();
    let user = app.registrant("user@example.com", Role::User).await;
    let owner = app.registrant("owner@example.com", Role::Owner).await;

    let (status, body) = app.get("/api/2.0/permissions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = app
        .post("/api/2.0/permissions", None, json!({"name": "search"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/2.0/permissions",
            Some(&app.token_for(&user)),
            json!({"name": "search"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/api/2.0/permissions",
            Some(&app.token_for(&owner)),
            json!({"name": "search"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"name": "search"}));

    let (status, _) = app
        .post(
            "/api/2.0/permissions",
            Some(&app.token_for(&owner)),
            json!({"name": "search"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.get("/api/2.0/permissions", None).await;
    assert_eq!(body, json!([{"name": "search"}]));
}
