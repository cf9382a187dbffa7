mod common;

use anyhow::{Context, Result};
use reqwest::{multipart, StatusCode};
use serde_json::{json, Value};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

macro_rules! require_database {
    () => {
        match common::test_database_url() {
            Some(url) => url,
            None => {
                eprintln!("BANCA_TEST_DATABASE_URL not set; skipping");
                return Ok(());
            }
        }
    };
}

async fn data(res: reqwest::Response, expected: StatusCode) -> Result<Value> {
    let status = res.status();
    let body: Value = res.json().await?;
    anyhow::ensure!(status == expected, "expected {}, got {}: {}", expected, status, body);
    Ok(body["data"].clone())
}

fn product_form(name: &str, price: &str, quantity: &str) -> Result<multipart::Form> {
    Ok(multipart::Form::new()
        .text("name", name.to_string())
        .text("price", price.to_string())
        .text("quantity", quantity.to_string())
        .part(
            "image",
            multipart::Part::bytes(PNG.to_vec()).file_name("produto.png").mime_str("image/png")?,
        ))
}

/// Open a store for `token` and list one product per `(name, price, quantity)`
async fn open_store(
    client: &reqwest::Client,
    server: &common::TestServer,
    token: &str,
    products: &[(&str, &str, &str)],
) -> Result<(String, Vec<String>)> {
    let store = data(
        client
            .post(server.url("/store"))
            .bearer_auth(token)
            .json(&json!({ "name": "Banca do Mercado", "description": "Produtos regionais" }))
            .send()
            .await?,
        StatusCode::CREATED,
    )
    .await?;
    let store_id = store["id"].as_str().context("store id")?.to_string();

    let mut product_ids = Vec::new();
    for (name, price, quantity) in products {
        let product = data(
            client
                .post(server.url(&format!("/create-product/{}", store_id)))
                .bearer_auth(token)
                .multipart(product_form(name, price, quantity)?)
                .send()
                .await?,
            StatusCode::CREATED,
        )
        .await?;
        product_ids.push(product["id"].as_str().context("product id")?.to_string());
    }

    Ok((store_id, product_ids))
}

#[tokio::test]
async fn seller_lists_and_buyer_purchases() -> Result<()> {
    let database_url = require_database!();
    let server = common::start_server_with_database(&database_url).await?;
    let client = reqwest::Client::new();

    let (seller_id, seller) = common::register_and_sign_in(&client, &server, "Vendedora", "Vendedor").await?;
    let (buyer_id, buyer) = common::register_and_sign_in(&client, &server, "Comprador", "Comprador").await?;

    // Seller opens a store
    let store = data(
        client
            .post(server.url("/store"))
            .bearer_auth(&seller)
            .json(&json!({ "name": "Banca da Feira", "description": "Frutas e verduras" }))
            .send()
            .await?,
        StatusCode::CREATED,
    )
    .await?;
    let store_id = store["id"].as_str().context("store id")?.to_string();
    assert_eq!(store["user_id"], seller_id.as_str());

    // ... and lists a product with an image
    let form = multipart::Form::new()
        .text("name", "Manga Tommy")
        .text("description", "Caixa com 6")
        .text("price", "12.50")
        .text("quantity", "5")
        .part(
            "image",
            multipart::Part::bytes(PNG.to_vec()).file_name("manga.png").mime_str("image/png")?,
        );
    let product = data(
        client
            .post(server.url(&format!("/create-product/{}", store_id)))
            .bearer_auth(&seller)
            .multipart(form)
            .send()
            .await?,
        StatusCode::CREATED,
    )
    .await?;
    let product_id = product["id"].as_str().context("product id")?.to_string();
    let image_url = product["image"].as_str().context("image url")?;
    assert!(image_url.ends_with("-manga.png"), "{}", image_url);

    // The uploaded image is served back
    let image = client.get(image_url).send().await?;
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(&image.bytes().await?[..], PNG);

    // Buyer sees it in the catalogue
    let listed = data(
        client
            .get(server.url(&format!("/get-all-product/store/{}", store_id)))
            .bearer_auth(&buyer)
            .send()
            .await?,
        StatusCode::OK,
    )
    .await?;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["store_owner_id"], seller_id.as_str());

    // Buying more than the stock fails and leaves stock untouched
    let res = client
        .post(server.url("/create-sale"))
        .bearer_auth(&buyer)
        .json(&json!({ "products": [{ "productId": product_id, "quantity": 6 }] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Two lines of the same product are merged into one purchase of 3
    let sale = data(
        client
            .post(server.url("/create-sale"))
            .bearer_auth(&buyer)
            .json(&json!({ "products": [
                { "productId": product_id, "quantity": 2 },
                { "productId": product_id, "quantity": 1 }
            ] }))
            .send()
            .await?,
        StatusCode::CREATED,
    )
    .await?;
    let sale_id = sale["id"].as_str().context("sale id")?.to_string();
    assert_eq!(sale["buyer_id"], buyer_id.as_str());
    assert_eq!(sale["total_value"], "37.50");
    assert_eq!(sale["products"][0]["quantity"], 3);

    let product = data(
        client
            .get(server.url(&format!("/get-unique-product/{}", product_id)))
            .bearer_auth(&buyer)
            .send()
            .await?,
        StatusCode::OK,
    )
    .await?;
    assert_eq!(product["quantity"], 2);

    // Both parties can read the sale
    for token in [&buyer, &seller] {
        let detail = data(
            client
                .get(server.url(&format!("/get-details-sale-by-user/{}", sale_id)))
                .bearer_auth(token)
                .send()
                .await?,
            StatusCode::OK,
        )
        .await?;
        assert_eq!(detail["id"], sale_id.as_str());
    }

    let by_owner = data(
        client
            .get(server.url("/get-all-sale-by-owner"))
            .bearer_auth(&seller)
            .send()
            .await?,
        StatusCode::OK,
    )
    .await?;
    assert!(by_owner
        .as_array()
        .context("sales array")?
        .iter()
        .any(|s| s["id"] == sale_id.as_str()));

    // A stranger cannot
    let (_, stranger) = common::register_and_sign_in(&client, &server, "Curioso", "Comprador").await?;
    let res = client
        .get(server.url(&format!("/get-details-sale-by-user/{}", sale_id)))
        .bearer_auth(&stranger)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Nor can they touch the seller's store
    let res = client
        .delete(server.url(&format!("/delete-store/{}", store_id)))
        .bearer_auth(&stranger)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn duplicate_email_and_address_ownership() -> Result<()> {
    let database_url = require_database!();
    let server = common::start_server_with_database(&database_url).await?;
    let client = reqwest::Client::new();

    let (_, owner) = common::register_and_sign_in(&client, &server, "Ana", "Comprador").await?;
    let (_, other) = common::register_and_sign_in(&client, &server, "Bruno", "Vendedor").await?;

    let profile = data(
        client.get(server.url("/unique-user")).bearer_auth(&owner).send().await?,
        StatusCode::OK,
    )
    .await?;
    let res = client
        .post(server.url("/user"))
        .json(&json!({
            "name": "Ana Clone",
            "email": profile["email"],
            "cpf": "99999999999",
            "password": "segredo123",
            "accessLevelName": "Comprador"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let address = data(
        client
            .post(server.url("/create-address"))
            .bearer_auth(&owner)
            .json(&json!({
                "street": "Rua da Aurora, 100",
                "city": "Recife",
                "neighborhood": "Boa Vista",
                "CEP": "50050000",
                "state": "PE"
            }))
            .send()
            .await?,
        StatusCode::CREATED,
    )
    .await?;
    let address_id = address["id"].as_str().context("address id")?.to_string();

    let res = client
        .put(server.url(&format!("/update-address/{}", address_id)))
        .bearer_auth(&other)
        .json(&json!({ "city": "Olinda" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let updated = data(
        client
            .put(server.url(&format!("/update-address/{}", address_id)))
            .bearer_auth(&owner)
            .json(&json!({ "city": "Olinda" }))
            .send()
            .await?,
        StatusCode::OK,
    )
    .await?;
    assert_eq!(updated["city"], "Olinda");

    let res = client
        .delete(server.url(&format!("/delete-address/{}", uuid::Uuid::new_v4())))
        .bearer_auth(&owner)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(server.url("/delete-user")).bearer_auth(&owner).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.get(server.url("/unique-user")).bearer_auth(&owner).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn sellers_cannot_manage_each_others_stores() -> Result<()> {
    let database_url = require_database!();
    let server = common::start_server_with_database(&database_url).await?;
    let client = reqwest::Client::new();

    let (_, owner) = common::register_and_sign_in(&client, &server, "Dona", "Vendedor").await?;
    let (_, rival) = common::register_and_sign_in(&client, &server, "Rival", "Vendedor").await?;
    let (store_id, products) = open_store(&client, &server, &owner, &[("Tapioca", "6.00", "4")]).await?;
    let product_id = &products[0];

    let res = client
        .post(server.url(&format!("/create-product/{}", store_id)))
        .bearer_auth(&rival)
        .multipart(product_form("Beiju", "5.00", "2")?)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(server.url(&format!("/get-unique-store-by-owner/{}", store_id)))
        .bearer_auth(&rival)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(server.url(&format!("/update-store/{}", store_id)))
        .bearer_auth(&rival)
        .json(&json!({ "name": "Banca Tomada" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(server.url(&format!("/update-product/{}", product_id)))
        .bearer_auth(&rival)
        .json(&json!({ "quantity": 0 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .delete(server.url(&format!("/delete-product/{}", product_id)))
        .bearer_auth(&rival)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Nothing changed
    let product = data(
        client
            .get(server.url(&format!("/get-unique-product/{}", product_id)))
            .bearer_auth(&owner)
            .send()
            .await?,
        StatusCode::OK,
    )
    .await?;
    assert_eq!(product["quantity"], 4);

    let store = data(
        client
            .get(server.url(&format!("/get-unique-store-by-owner/{}", store_id)))
            .bearer_auth(&owner)
            .send()
            .await?,
        StatusCode::OK,
    )
    .await?;
    assert_eq!(store["name"], "Banca do Mercado");

    let listed = data(
        client
            .get(server.url(&format!("/get-all-product/store/{}", store_id)))
            .bearer_auth(&owner)
            .send()
            .await?,
        StatusCode::OK,
    )
    .await?;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    Ok(())
}

#[tokio::test]
async fn nobody_buys_from_their_own_store() -> Result<()> {
    let database_url = require_database!();
    let server = common::start_server_with_database(&database_url).await?;
    let client = reqwest::Client::new();

    // Administrators may both sell and buy
    let admin = common::create_admin_and_sign_in(&client, &server, &database_url).await?;
    let (_, products) = open_store(&client, &server, &admin, &[("Bolo de rolo", "25.00", "3")]).await?;
    let product_id = &products[0];

    let res = client
        .post(server.url("/create-sale"))
        .bearer_auth(&admin)
        .json(&json!({ "products": [{ "productId": product_id, "quantity": 1 }] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["error"].as_str().unwrap_or_default().contains("your own store"), "{}", body);

    // Stock is untouched and still for sale to others
    let (_, buyer) = common::register_and_sign_in(&client, &server, "Cliente", "Comprador").await?;
    let sale = data(
        client
            .post(server.url("/create-sale"))
            .bearer_auth(&buyer)
            .json(&json!({ "products": [{ "productId": product_id, "quantity": 3 }] }))
            .send()
            .await?,
        StatusCode::CREATED,
    )
    .await?;
    assert_eq!(sale["total_value"], "75.00");

    Ok(())
}

#[tokio::test]
async fn sales_listing_products_in_opposite_order_all_complete() -> Result<()> {
    let database_url = require_database!();
    let server = common::start_server_with_database(&database_url).await?;
    let client = reqwest::Client::new();

    let (_, seller) = common::register_and_sign_in(&client, &server, "Atacado", "Vendedor").await?;
    let (_, first) = common::register_and_sign_in(&client, &server, "Primeira", "Comprador").await?;
    let (_, second) = common::register_and_sign_in(&client, &server, "Segunda", "Comprador").await?;
    let (_, products) = open_store(
        &client,
        &server,
        &seller,
        &[("Farinha", "4.00", "100"), ("Feijao", "8.00", "100")],
    )
    .await?;
    let (a, b) = (&products[0], &products[1]);

    const ROUNDS: usize = 10;
    for _ in 0..ROUNDS {
        let forward = client
            .post(server.url("/create-sale"))
            .bearer_auth(&first)
            .json(&json!({ "products": [
                { "productId": a, "quantity": 1 },
                { "productId": b, "quantity": 1 }
            ] }))
            .send();
        let backward = client
            .post(server.url("/create-sale"))
            .bearer_auth(&second)
            .json(&json!({ "products": [
                { "productId": b, "quantity": 1 },
                { "productId": a, "quantity": 1 }
            ] }))
            .send();

        let (forward, backward) = tokio::join!(forward, backward);
        for res in [forward?, backward?] {
            let status = res.status();
            let body: Value = res.json().await?;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
            assert_eq!(body["data"]["total_value"], "12.00");
        }
    }

    for id in [a, b] {
        let product = data(
            client
                .get(server.url(&format!("/get-unique-product/{}", id)))
                .bearer_auth(&seller)
                .send()
                .await?,
            StatusCode::OK,
        )
        .await?;
        assert_eq!(product["quantity"], 100 - 2 * ROUNDS as i64);
    }

    Ok(())
}
