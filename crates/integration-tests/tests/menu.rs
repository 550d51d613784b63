//! Menu endpoints over the demo catalog.

#![allow(clippy::unwrap_used)]

use cravely_integration_tests::TestServer;
use reqwest::StatusCode;
use serde_json::Value;

async fn get_json(server: &TestServer, path: &str) -> (StatusCode, Value) {
    let resp = server.client.get(server.url(path)).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::spawn().await;

    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    // No pool configured, so readiness only reflects the process
    let resp = server
        .client
        .get(server.url("/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_categories_with_products() {
    let server = TestServer::spawn().await;
    let (status, body) = get_json(&server, "/order-mode/categories/all").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let slugs: Vec<&str> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["slug"].as_str().unwrap())
        .collect();
    assert_eq!(
        slugs,
        [
            "rice-box-section",
            "fish-and-chips-section",
            "drinks-section",
            "general-section"
        ]
    );
    // The unpublished staff meal is not counted
    assert_eq!(body["categories"][0]["product_count"], 2);
}

#[tokio::test]
async fn test_listing_is_cacheable() {
    let server = TestServer::spawn().await;
    let resp = server
        .client
        .get(server.url("/order-mode/products/all"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["cache-control"].to_str().unwrap(),
        "public, max-age=300"
    );

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total_products"], 5);
    let names: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert!(!names.contains(&"Staff Meal"));
}

#[tokio::test]
async fn test_products_by_category_short_slug() {
    let server = TestServer::spawn().await;
    let (status, body) = get_json(&server, "/order-mode/products/category/fish-and-chips").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"]["name"], "Fish & Chips");
    assert_eq!(body["products"][0]["name"], "Classic Fish & Chips");
    assert_eq!(body["products"][0]["price"], 1200.0);
}

#[tokio::test]
async fn test_unknown_category_is_404() {
    let server = TestServer::spawn().await;
    let (status, body) = get_json(&server, "/order-mode/products/category/desserts").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Category \"desserts\" not found");
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let server = TestServer::spawn().await;
    let (status, body) = get_json(&server, "/order-mode/products/search?q=RICE").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["search_query"], "RICE");
    assert_eq!(body["total_results"], 2);
}

#[tokio::test]
async fn test_single_product() {
    let server = TestServer::spawn().await;

    let (status, body) = get_json(&server, "/order-mode/products/single/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["id"], "product-2");
    assert_eq!(body["product"]["price"], 700.0);
    assert_eq!(body["product"]["original_price"], 750.0);

    // Unpublished products are not addressable
    let (status, body) = get_json(&server, "/order-mode/products/single/6").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product with ID 6 not found");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::spawn().await;

    let resp = server
        .client
        .get(server.url("/get/categories"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "trace-me");

    let resp = server
        .client
        .get(server.url("/get/categories"))
        .send()
        .await
        .unwrap();
    let generated = resp.headers()["x-request-id"].to_str().unwrap();
    assert!(!generated.is_empty());

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 3);
}
