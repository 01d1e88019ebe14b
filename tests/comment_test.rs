//! Comment API integration tests.

mod common;

use common::TestServer;
use serde_json::{json, Value};

async fn post_comment(server: &TestServer, toilet_id: &str, user_id: &str, text: &str) -> Value {
    let response = server
        .client()
        .post(server.url("/api/v1/comments"))
        .json(&json!({ "toiletId": toilet_id, "userId": user_id, "text": text }))
        .send()
        .await
        .expect("Failed to post comment");
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_comment_is_decoded_and_linked() {
    let server = TestServer::start().await;
    let client = server.client();
    let toilet = server.create_toilet("Cafe", 8.0, 47.0).await;
    let toilet_id = toilet["id"].as_str().unwrap();
    let user_id = server.create_user("Carla", "carla@example.org").await;

    let comment = post_comment(&server, toilet_id, &user_id, "Sehr%20sauber%21").await;
    assert_eq!(comment["text"], "Sehr sauber!");
    assert_eq!(comment["userName"], "Carla");

    let toilet: Value = client
        .get(server.url(&format!("/api/v1/toilets/{}", toilet_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(toilet["commentCount"], 1);

    let comments: Vec<Value> = client
        .get(server.url(&format!("/api/v1/toilets/{}/comments", toilet_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["id"], comment["id"]);

    let by_query: Vec<Value> = client
        .get(server.url(&format!("/api/v1/comments?toiletId={}", toilet_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_query.len(), 1);
}

#[tokio::test]
async fn test_comment_requires_known_user() {
    let server = TestServer::start().await;
    let toilet = server.create_toilet("Cafe", 8.0, 47.0).await;

    let response = server
        .client()
        .post(server.url("/api/v1/comments"))
        .json(&json!({
            "toiletId": toilet["id"],
            "userId": "00000000-0000-0000-0000-000000000000",
            "text": "hello",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "user_not_found");
}

#[tokio::test]
async fn test_update_comment() {
    let server = TestServer::start().await;
    let toilet = server.create_toilet("Cafe", 8.0, 47.0).await;
    let user_id = server.create_user("Dan", "dan@example.org").await;
    let comment = post_comment(&server, toilet["id"].as_str().unwrap(), &user_id, "ok").await;

    let response = server
        .client()
        .put(server.url(&format!("/api/v1/comments/{}", comment["id"].as_str().unwrap())))
        .json(&json!({ "text": "actually great" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["text"], "actually great");
    assert!(json["updatedAt"].is_string());
}

#[tokio::test]
async fn test_delete_comment_unlinks_from_toilet() {
    let server = TestServer::start().await;
    let client = server.client();
    let toilet = server.create_toilet("Cafe", 8.0, 47.0).await;
    let toilet_id = toilet["id"].as_str().unwrap();
    let user_id = server.create_user("Eve", "eve@example.org").await;
    let comment = post_comment(&server, toilet_id, &user_id, "gone soon").await;
    let comment_id = comment["id"].as_str().unwrap();

    let response = client
        .delete(server.url(&format!("/api/v1/comments/{}", comment_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let toilet: Value = client
        .get(server.url(&format!("/api/v1/toilets/{}", toilet_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(toilet["commentCount"], 0);

    let response = client
        .delete(server.url(&format!("/api/v1/comments/{}", comment_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_comment_count_matches_existing_comments() {
    let server = TestServer::start().await;
    let client = server.client();
    let toilet = server.create_toilet("Cafe", 8.0, 47.0).await;
    let toilet_id = toilet["id"].as_str().unwrap();
    let user_id = server.create_user("Fay", "fay@example.org").await;
    let kept = post_comment(&server, toilet_id, &user_id, "stays").await;
    let removed = post_comment(&server, toilet_id, &user_id, "goes").await;

    // a record-only delete is not offered publicly
    let response = client
        .delete(server.url(&format!(
            "/api/v1/comments/{}?unlink=false",
            removed["id"].as_str().unwrap()
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let toilet: Value = client
        .get(server.url(&format!("/api/v1/toilets/{}", toilet_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(toilet["commentCount"], 1);

    let comments: Vec<Value> = client
        .get(server.url(&format!("/api/v1/toilets/{}/comments", toilet_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["id"], kept["id"]);
}
