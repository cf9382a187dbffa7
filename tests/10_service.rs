mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn root_describes_the_api() -> Result<()> {
    let server = common::start_server().await?;
    let body: Value = reqwest::get(server.url("/")).await?.json().await?;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Banca API");
    assert!(body["data"]["endpoints"]["sales"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_is_degraded_without_database() -> Result<()> {
    let server = common::start_server().await?;
    let res = reqwest::get(server.url("/health")).await?;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() -> Result<()> {
    let server = common::start_server().await?;
    let client = reqwest::Client::new();

    for path in ["/unique-user", "/get-address", "/stores", "/get-all-product"] {
        let res = client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);

        let body: Value = res.json().await?;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    let res = client
        .get(server.url("/stores"))
        .bearer_auth("definitely-not-a-jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn sign_in_rejects_invalid_body() -> Result<()> {
    let server = common::start_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/sign-in"))
        .json(&json!({ "email": "nope", "password": "1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["email"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> Result<()> {
    let server = common::start_server().await?;
    let res = reqwest::get(server.url("/nao-existe")).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
