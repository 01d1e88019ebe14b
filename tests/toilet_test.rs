//! Toilet API integration tests.

mod common;

use common::TestServer;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_then_fetch_toilet() {
    let server = TestServer::start().await;
    let client = server.client();

    let created = server.create_toilet("Central Station", 13.369, 52.525).await;
    assert_eq!(created["rating"], 0.0);
    assert_eq!(created["approved"], false);
    let id = created["id"].as_str().unwrap();

    let response = client
        .get(server.url(&format!("/api/v1/toilets/{}", id)))
        .send()
        .await
        .expect("Failed to fetch toilet");
    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["title"], "Central Station");
    assert_eq!(json["location"]["lon"], 13.369);
    assert_eq!(json["location"]["lat"], 52.525);
    assert!(json["previewUrl"].is_null());
}

#[tokio::test]
async fn test_unknown_toilet_is_404() {
    let server = TestServer::start().await;

    let response = server
        .client()
        .get(server.url("/api/v1/toilets/00000000-0000-0000-0000-000000000000"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "toilet_not_found");
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_invalid_location_rejected() {
    let server = TestServer::start().await;

    let response = server
        .client()
        .post(server.url("/api/v1/toilets"))
        .json(&json!({ "title": "Nowhere", "location": { "lon": 0.0, "lat": 123.0 } }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_update_toilet() {
    let server = TestServer::start().await;
    let client = server.client();
    let created = server.create_toilet("Park", 2.35, 48.85).await;
    let id = created["id"].as_str().unwrap();

    let response = client
        .put(server.url(&format!("/api/v1/toilets/{}", id)))
        .json(&json!({ "description": "renovated", "disabled": true }))
        .send()
        .await
        .expect("Failed to update toilet");
    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["title"], "Park");
    assert_eq!(json["description"], "renovated");
    assert_eq!(json["disabled"], true);
}

#[tokio::test]
async fn test_nearby_orders_by_distance() {
    let server = TestServer::start().await;
    let client = server.client();

    // ~2 km, ~0.7 km and ~100 km east of the search center
    let far = server.create_toilet("far", 13.43, 52.5).await;
    let near = server.create_toilet("near", 13.41, 52.5).await;
    server.create_toilet("other city", 14.9, 52.5).await;

    let response = client
        .get(server.url("/api/v1/toilets?lon=13.4&lat=52.5&radiusInKm=5"))
        .send()
        .await
        .expect("Failed to search");
    assert_eq!(response.status(), 200);

    let json: Vec<Value> = response.json().await.unwrap();
    assert_eq!(json.len(), 2);
    assert_eq!(json[0]["id"], near["id"]);
    assert_eq!(json[1]["id"], far["id"]);

    let first = json[0]["distanceMeters"].as_f64().unwrap();
    let second = json[1]["distanceMeters"].as_f64().unwrap();
    assert!(first < second);
    assert!(second < 5000.0);
}

#[tokio::test]
async fn test_nearby_radius_units() {
    let server = TestServer::start().await;
    let client = server.client();

    // ~1.36 km east of the center: outside 1 km, inside 1 mile
    server.create_toilet("edge", 13.42, 52.5).await;

    let km: Vec<Value> = client
        .get(server.url("/api/v1/toilets?lon=13.4&lat=52.5&radiusInKm=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(km.is_empty());

    let miles: Vec<Value> = client
        .get(server.url("/api/v1/toilets?lon=13.4&lat=52.5&radiusInMiles=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(miles.len(), 1);
}

#[tokio::test]
async fn test_nearby_respects_max_toilets_to_load() {
    let server = TestServer::start().await;

    for i in 0..4 {
        server
            .create_toilet(&format!("t{}", i), 13.4 + i as f64 * 0.001, 52.5)
            .await;
    }

    let json: Vec<Value> = server
        .client()
        .get(server.url("/api/v1/toilets?lon=13.4&lat=52.5&maxToiletsToLoad=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json.len(), 2);
    assert_eq!(json[0]["title"], "t0");
}

#[tokio::test]
async fn test_nearby_needs_both_coordinates() {
    let server = TestServer::start().await;

    let response = server
        .client()
        .get(server.url("/api/v1/toilets?lon=13.4"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_list_as_event_stream() {
    let server = TestServer::start().await;
    server.create_toilet("streamed", 1.0, 1.0).await;

    let response = server
        .client()
        .get(server.url("/api/v1/toilets"))
        .header("Accept", "text/event-stream")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let body = response.text().await.unwrap();
    let data: Vec<Value> = body
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|payload| serde_json::from_str(payload).unwrap())
        .collect();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["title"], "streamed");
}

#[tokio::test]
async fn test_delete_toilet_removes_comments() {
    let server = TestServer::start().await;
    let client = server.client();

    let toilet = server.create_toilet("Doomed", 5.0, 5.0).await;
    let toilet_id = toilet["id"].as_str().unwrap();
    let user_id = server.create_user("Bob", "bob@example.org").await;

    let comment: Value = client
        .post(server.url("/api/v1/comments"))
        .json(&json!({ "toiletId": toilet_id, "userId": user_id, "text": "bye" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let comment_id = comment["id"].as_str().unwrap();

    let response = client
        .delete(server.url(&format!("/api/v1/toilets/{}", toilet_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(server.url(&format!("/api/v1/toilets/{}", toilet_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .get(server.url(&format!("/api/v1/comments/{}", comment_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
