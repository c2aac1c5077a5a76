//! Black-box HTTP tests: spawn the real server on an ephemeral port and
//! exercise it over the wire with a plain HTTP client.

use serde_json::{json, Value};
use tokio::task::JoinHandle;

struct TestServer {
    base_url: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let app = tienda_api::app::build_app().await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server run");
        });

        TestServer {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_product(server: &TestServer, payload: Value) -> Value {
    let response = reqwest::Client::new()
        .post(server.url("/products"))
        .json(&payload)
        .send()
        .await
        .expect("send create");
    assert_eq!(response.status(), 201, "product create should succeed");
    response.json().await.expect("create body")
}

async fn create_user(server: &TestServer, payload: Value) -> Value {
    let response = reqwest::Client::new()
        .post(server.url("/user"))
        .json(&payload)
        .send()
        .await
        .expect("send create");
    assert_eq!(response.status(), 201, "user create should succeed");
    response.json().await.expect("create body")
}

#[tokio::test]
async fn health_endpoint_responds_ok() {
    let server = TestServer::spawn().await;

    let response = reqwest::get(server.url("/health")).await.expect("health");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn creating_a_valid_product_returns_201_with_the_row() {
    let server = TestServer::spawn().await;

    let body = create_product(
        &server,
        json!({ "name": "Balon", "price": 400, "availability": true }),
    )
    .await;

    assert_eq!(body["data"]["name"], "Balon");
    assert_eq!(body["data"]["price"].as_f64(), Some(400.0));
    assert_eq!(body["data"]["availability"], true);
    assert!(body["data"]["id"].as_i64().is_some());
    assert!(body["data"]["createdAt"].is_string());
}

#[tokio::test]
async fn empty_product_body_lists_validation_errors() {
    let server = TestServer::spawn().await;

    let response = reqwest::Client::new()
        .post(server.url("/products"))
        .send()
        .await
        .expect("send");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("body");
    let errors = body["errors"].as_array().expect("errors array");
    assert!(errors.len() >= 2);
    assert!(errors.iter().any(|e| e["field"] == "name"));
    assert!(errors.iter().any(|e| e["field"] == "price"));
}

#[tokio::test]
async fn product_price_must_be_a_number_greater_than_zero() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for price in [json!(0), json!(-50), json!("texto")] {
        let response = client
            .post(server.url("/products"))
            .json(&json!({ "name": "Telefono", "price": price }))
            .send()
            .await
            .expect("send");
        assert_eq!(response.status(), 400, "price {price} should be rejected");

        let body: Value = response.json().await.expect("body");
        assert!(body["errors"]
            .as_array()
            .expect("errors array")
            .iter()
            .all(|e| e["field"] == "price"));
    }
}

#[tokio::test]
async fn sub_cent_price_is_a_validation_error_not_a_500() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // 0.004 rounds to 0.00 at storage precision; must fail validation,
    // never reach the store
    let response = client
        .post(server.url("/products"))
        .json(&json!({ "name": "Micro", "price": 0.004 }))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("body");
    assert_eq!(body["errors"][0]["field"], "price");

    let created = create_product(&server, json!({ "name": "Balon", "price": 400 })).await;
    let id = created["data"]["id"].as_i64().expect("id");

    let response = client
        .put(server.url(&format!("/products/{id}")))
        .json(&json!({ "name": "Balon", "price": 0.004, "availability": true }))
        .send()
        .await
        .expect("put");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("body");
    assert_eq!(body["errors"][0]["field"], "price");
}

#[tokio::test]
async fn product_availability_defaults_to_true() {
    let server = TestServer::spawn().await;

    let body = create_product(&server, json!({ "name": "Mochila", "price": 100 })).await;
    assert_eq!(body["data"]["availability"], true);
}

#[tokio::test]
async fn product_list_is_ordered_by_price_descending() {
    let server = TestServer::spawn().await;

    create_product(&server, json!({ "name": "Botella", "price": 30 })).await;
    create_product(&server, json!({ "name": "Balon", "price": 400 })).await;
    create_product(&server, json!({ "name": "Taza", "price": 90 })).await;

    let response = reqwest::get(server.url("/products")).await.expect("list");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("body");
    let prices: Vec<f64> = body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|p| p["price"].as_f64().expect("numeric price"))
        .collect();
    assert_eq!(prices, vec![400.0, 90.0, 30.0]);
}

#[tokio::test]
async fn malformed_product_id_is_a_validation_error() {
    let server = TestServer::spawn().await;

    for path in ["/products/hola", "/products/4.5", "/products/99999999999"] {
        let response = reqwest::get(server.url(path)).await.expect("get");
        assert_eq!(response.status(), 400, "{path}");

        let body: Value = response.json().await.expect("body");
        assert_eq!(body["errors"][0]["field"], "id");
    }
}

#[tokio::test]
async fn missing_product_is_a_404_with_spanish_message() {
    let server = TestServer::spawn().await;

    let response = reqwest::get(server.url("/products/999"))
        .await
        .expect("get");
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.expect("body");
    assert_eq!(body["error"], "Producto no encontrado");
}

#[tokio::test]
async fn put_overwrites_every_mutable_field() {
    let server = TestServer::spawn().await;
    let created = create_product(&server, json!({ "name": "Balon", "price": 400 })).await;
    let id = created["data"]["id"].as_i64().expect("id");

    let response = reqwest::Client::new()
        .put(server.url(&format!("/products/{id}")))
        .json(&json!({ "name": "Balon Pro", "price": 450.5, "availability": false }))
        .send()
        .await
        .expect("put");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("body");
    assert_eq!(body["data"]["name"], "Balon Pro");
    assert_eq!(body["data"]["price"].as_f64(), Some(450.5));
    assert_eq!(body["data"]["availability"], false);
}

#[tokio::test]
async fn put_requires_the_full_payload() {
    let server = TestServer::spawn().await;
    let created = create_product(&server, json!({ "name": "Balon", "price": 400 })).await;
    let id = created["data"]["id"].as_i64().expect("id");

    let response = reqwest::Client::new()
        .put(server.url(&format!("/products/{id}")))
        .json(&json!({ "name": "Balon", "price": 0, "availability": true }))
        .send()
        .await
        .expect("put");
    assert_eq!(response.status(), 400);

    let response = reqwest::Client::new()
        .put(server.url("/products/999"))
        .json(&json!({ "name": "Balon", "price": 10, "availability": true }))
        .send()
        .await
        .expect("put");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn patch_toggles_availability_back_and_forth() {
    let server = TestServer::spawn().await;
    let created = create_product(
        &server,
        json!({ "name": "Balon", "price": 400, "availability": true }),
    )
    .await;
    let id = created["data"]["id"].as_i64().expect("id");
    let client = reqwest::Client::new();

    let first: Value = client
        .patch(server.url(&format!("/products/{id}")))
        .send()
        .await
        .expect("patch")
        .json()
        .await
        .expect("body");
    assert_eq!(first["data"]["availability"], false);

    let second: Value = client
        .patch(server.url(&format!("/products/{id}")))
        .send()
        .await
        .expect("patch")
        .json()
        .await
        .expect("body");
    assert_eq!(second["data"]["availability"], true);
}

#[tokio::test]
async fn deleting_a_product_removes_the_row() {
    let server = TestServer::spawn().await;
    let created = create_product(&server, json!({ "name": "Balon", "price": 400 })).await;
    let id = created["data"]["id"].as_i64().expect("id");
    let client = reqwest::Client::new();

    let response = client
        .delete(server.url(&format!("/products/{id}")))
        .send()
        .await
        .expect("delete");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("body");
    assert_eq!(body["message"], "Producto eliminado");

    let response = reqwest::get(server.url(&format!("/products/{id}")))
        .await
        .expect("get");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn creating_a_valid_user_returns_the_row() {
    let server = TestServer::spawn().await;

    let body = create_user(
        &server,
        json!({ "username": "Liz", "email": "liz@gmail.com", "password": "123456", "role": "user" }),
    )
    .await;

    assert_eq!(body["data"]["username"], "Liz");
    assert_eq!(body["data"]["email"], "liz@gmail.com");
    assert_eq!(body["data"]["role"], "user");
    assert_eq!(body["data"]["isActive"], true);
}

#[tokio::test]
async fn user_role_defaults_to_user() {
    let server = TestServer::spawn().await;

    let body = create_user(
        &server,
        json!({ "username": "Ana", "email": "ana@gmail.com", "password": "123456" }),
    )
    .await;
    assert_eq!(body["data"]["role"], "user");
}

#[tokio::test]
async fn empty_user_body_lists_required_fields() {
    let server = TestServer::spawn().await;

    let response = reqwest::Client::new()
        .post(server.url("/user"))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("body");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .map(|e| e["field"].as_str().expect("field"))
        .collect();
    assert_eq!(fields, ["username", "email", "password"]);
}

#[tokio::test]
async fn malformed_email_is_rejected() {
    let server = TestServer::spawn().await;

    let response = reqwest::Client::new()
        .post(server.url("/user"))
        .json(&json!({
            "username": "Liz",
            "email": "email falso",
            "password": "123456",
            "role": "user"
        }))
        .send()
        .await
        .expect("send");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("body");
    assert!(body["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .any(|e| e["field"] == "email"));
}

#[tokio::test]
async fn duplicate_username_or_email_is_a_conflict() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    create_user(
        &server,
        json!({ "username": "Liz", "email": "liz@gmail.com", "password": "123456" }),
    )
    .await;

    for payload in [
        json!({ "username": "Liz", "email": "otra@gmail.com", "password": "123456" }),
        json!({ "username": "Otra", "email": "liz@gmail.com", "password": "123456" }),
    ] {
        let response = client
            .post(server.url("/user"))
            .json(&payload)
            .send()
            .await
            .expect("send");
        assert_eq!(response.status(), 400);

        let body: Value = response.json().await.expect("body");
        assert_eq!(
            body["error"],
            "El email o username, ya se encuentran registrados"
        );
    }

    let list: Value = reqwest::get(server.url("/user"))
        .await
        .expect("list")
        .json()
        .await
        .expect("body");
    assert_eq!(list["data"].as_array().expect("data").len(), 1);
}

#[tokio::test]
async fn user_list_filters_by_role() {
    let server = TestServer::spawn().await;

    create_user(
        &server,
        json!({ "username": "Lucia", "email": "lucia@gmail.com", "password": "123456", "role": "user" }),
    )
    .await;
    create_user(
        &server,
        json!({ "username": "Saul", "email": "saul@gmail.com", "password": "123456789", "role": "admin" }),
    )
    .await;

    let body: Value = reqwest::get(server.url("/user?role=user"))
        .await
        .expect("list")
        .json()
        .await
        .expect("body");

    let users = body["data"].as_array().expect("data");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "Lucia");

    let body: Value = reqwest::get(server.url("/user?role=superadmin"))
        .await
        .expect("list")
        .json()
        .await
        .expect("body");
    assert!(body["data"].as_array().expect("data").is_empty());
}

#[tokio::test]
async fn missing_user_is_a_404_with_spanish_message() {
    let server = TestServer::spawn().await;

    for path in ["/user/999", "/user/hola"] {
        let response = reqwest::get(server.url(path)).await.expect("get");
        assert_eq!(response.status(), 404, "{path}");

        let body: Value = response.json().await.expect("body");
        assert_eq!(body["error"], "Usuario no encontrado");
    }
}

#[tokio::test]
async fn user_update_applies_only_the_given_fields() {
    let server = TestServer::spawn().await;
    let created = create_user(
        &server,
        json!({ "username": "Liz", "email": "liz@gmail.com", "password": "123456" }),
    )
    .await;
    let id = created["data"]["id"].as_i64().expect("id");

    let response = reqwest::Client::new()
        .put(server.url(&format!("/user/{id}")))
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .expect("put");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("body");
    assert_eq!(body["data"]["role"], "admin");
    assert_eq!(body["data"]["username"], "Liz");
    assert_eq!(body["data"]["email"], "liz@gmail.com");
}

#[tokio::test]
async fn user_id_and_password_are_immutable() {
    let server = TestServer::spawn().await;
    let created = create_user(
        &server,
        json!({ "username": "Liz", "email": "liz@gmail.com", "password": "123456" }),
    )
    .await;
    let id = created["data"]["id"].as_i64().expect("id");
    let client = reqwest::Client::new();

    for payload in [
        json!({ "password": "nuevo" }),
        json!({ "id": 99, "username": "Liz2" }),
    ] {
        let response = client
            .put(server.url(&format!("/user/{id}")))
            .json(&payload)
            .send()
            .await
            .expect("put");
        assert_eq!(response.status(), 400);

        let body: Value = response.json().await.expect("body");
        assert_eq!(body["error"], "No puedes modificar los campos de id o password");
    }

    // the stored row is untouched
    let body: Value = reqwest::get(server.url(&format!("/user/{id}")))
        .await
        .expect("get")
        .json()
        .await
        .expect("body");
    assert_eq!(body["data"]["id"].as_i64(), Some(id));
    assert_eq!(body["data"]["username"], "Liz");
    assert_eq!(body["data"]["password"], "123456");
}

#[tokio::test]
async fn immutable_field_check_applies_even_to_missing_users() {
    let server = TestServer::spawn().await;

    let response = reqwest::Client::new()
        .put(server.url("/user/999"))
        .json(&json!({ "password": "nuevo" }))
        .send()
        .await
        .expect("put");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("body");
    assert_eq!(body["error"], "No puedes modificar los campos de id o password");
}

#[tokio::test]
async fn deleting_a_user_only_deactivates_it() {
    let server = TestServer::spawn().await;
    let created = create_user(
        &server,
        json!({ "username": "Liz", "email": "liz@gmail.com", "password": "123456" }),
    )
    .await;
    let id = created["data"]["id"].as_i64().expect("id");

    let response = reqwest::Client::new()
        .delete(server.url(&format!("/user/{id}")))
        .send()
        .await
        .expect("delete");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("body");
    assert_eq!(body["message"], "Usuario eliminado");

    // soft delete: the row stays retrievable, flagged inactive
    let response = reqwest::get(server.url(&format!("/user/{id}")))
        .await
        .expect("get");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("body");
    assert_eq!(body["data"]["isActive"], false);
}
