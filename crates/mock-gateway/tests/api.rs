use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use medmarket_models::{Cart, Company, CredentialPair, Order, OrderStatus, Page, Product, User};
use mock_gateway::{router, AppState, GatewayConfig, TokenKind};
use serde_json::{json, Value};

fn server_with(config: GatewayConfig) -> (TestServer, Arc<AppState>) {
    let state = Arc::new(AppState::seeded(config));
    let server = TestServer::new(router(state.clone())).unwrap();
    (server, state)
}

fn server() -> TestServer {
    server_with(GatewayConfig::default()).0
}

async fn login(server: &TestServer, email: &str, password: &str) -> CredentialPair {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();
    response.json::<CredentialPair>()
}

#[tokio::test]
async fn login_rejects_bad_password() {
    let response = server()
        .post("/api/auth/login")
        .json(&json!({ "email": "buyer@clinic.org", "password": "nope" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>()["message"],
        "Invalid email or password"
    );
}

#[tokio::test]
async fn refresh_answers_with_raw_token() {
    let (server, state) = server_with(GatewayConfig::default());
    let pair = login(&server, "buyer@clinic.org", "buyer").await;

    let response = server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh": pair.refresh_token }))
        .await;
    response.assert_status_ok();

    let token = response.text();
    let claims = state.issuer.verify(&token, TokenKind::Access).unwrap();
    assert_eq!(claims.sub, "buyer@clinic.org");
}

#[tokio::test]
async fn access_token_cannot_refresh() {
    let server = server();
    let pair = login(&server, "buyer@clinic.org", "buyer").await;

    server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh": pair.access_token }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_a_bearer() {
    let response = server().get("/api/product-service/products").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "missing bearer token");
}

#[tokio::test]
async fn expired_access_token_is_unauthorized() {
    let (server, state) = server_with(GatewayConfig::default());
    let expired = mock_gateway::TokenIssuer::new(&state.config.jwt_secret, -60, 60)
        .issue("buyer@clinic.org", &[], TokenKind::Access)
        .unwrap();

    server
        .get("/api/product-service/products")
        .authorization_bearer(expired)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn product_search_by_name() {
    let server = server();
    let pair = login(&server, "buyer@clinic.org", "buyer").await;

    let page = server
        .get("/api/product-service/products")
        .add_query_param("name", "GLOVES")
        .authorization_bearer(&pair.access_token)
        .await
        .json::<Page<Product>>();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].sku, "GL-NIT-100");
}

#[tokio::test]
async fn cart_to_order_flow() {
    let server = server();
    let buyer = login(&server, "buyer@clinic.org", "buyer").await;

    let cart = server
        .post("/api/product-service/cart/items")
        .authorization_bearer(&buyer.access_token)
        .json(&json!({ "productId": 1, "quantity": 2 }))
        .await
        .json::<Cart>();
    assert_eq!(cart.unit_count(), 2);

    let order = server
        .post("/api/product-service/orders/create")
        .authorization_bearer(&buyer.access_token)
        .await
        .json::<Order>();
    assert_eq!(order.status, OrderStatus::Pending);

    // Buyers cannot move orders along.
    server
        .patch(&format!("/api/product-service/orders/{}/status", order.id))
        .authorization_bearer(&buyer.access_token)
        .json(&json!({ "status": "SHIPPED" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let seller = login(&server, "seller@acme.com", "seller").await;
    let shipped = server
        .patch(&format!("/api/product-service/orders/{}/status", order.id))
        .authorization_bearer(&seller.access_token)
        .json(&json!({ "status": "shipped" }))
        .await
        .json::<Order>();
    assert_eq!(shipped.status, OrderStatus::Shipped);

    let mine = server
        .get("/api/product-service/orders/user")
        .add_query_param("status", "SHIPPED")
        .authorization_bearer(&buyer.access_token)
        .await
        .json::<Page<Order>>();
    assert_eq!(mine.content.len(), 1);
}

#[tokio::test]
async fn missing_order_reports_message() {
    let server = server();
    let pair = login(&server, "buyer@clinic.org", "buyer").await;

    let response = server
        .get("/api/product-service/orders/999")
        .authorization_bearer(&pair.access_token)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["message"], "Order 999 not found");
}

#[tokio::test]
async fn director_registers_staff_in_own_company_only() {
    let server = server();
    let director = login(&server, "director@clinic.org", "director").await;

    let registration = |company_id: u64| {
        json!({
            "registerData": {
                "email": "nurse@clinic.org",
                "password": "nurse",
                "repeatPassword": "nurse",
                "roles": ["OPERATOR"]
            },
            "user": {
                "name": "Nina",
                "surname": "Nurse",
                "birthDate": "1990-01-31",
                "email": "nurse@clinic.org",
                "companyId": company_id,
                "role": "OPERATOR"
            }
        })
    };

    server
        .post("/api/user-service/users/register")
        .authorization_bearer(&director.access_token)
        .json(&registration(2))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = server
        .post("/api/user-service/users/register")
        .authorization_bearer(&director.access_token)
        .json(&registration(1))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<User>().role, "OPERATOR");

    let staff = server
        .get("/api/user-service/users")
        .add_query_param("companyId", 2)
        .authorization_bearer(&director.access_token)
        .await
        .json::<Page<User>>();
    // Directors are pinned to their own company whatever they ask for.
    assert_eq!(staff.content.len(), 3);
    assert!(staff.content.iter().all(|u| u.company_id == Some(1)));

    login(&server, "nurse@clinic.org", "nurse").await;
}

#[tokio::test]
async fn buyers_cannot_list_users() {
    let server = server();
    let buyer = login(&server, "buyer@clinic.org", "buyer").await;
    server
        .get("/api/user-service/users")
        .authorization_bearer(&buyer.access_token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn password_change_is_limited_to_the_owner() {
    let server = server();
    let buyer = login(&server, "buyer@clinic.org", "buyer").await;
    let change = json!({
        "oldPassword": "buyer",
        "newPassword": "better",
        "repeatPassword": "better"
    });

    server
        .put("/api/auth/password/seller@acme.com")
        .authorization_bearer(&buyer.access_token)
        .json(&change)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    server
        .put("/api/auth/password/buyer%40clinic.org")
        .authorization_bearer(&buyer.access_token)
        .json(&change)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    login(&server, "buyer@clinic.org", "better").await;
}

#[tokio::test]
async fn limited_companies_hide_administrative_fields() {
    let server = server();
    let buyer = login(&server, "buyer@clinic.org", "buyer").await;

    server
        .get("/api/user-service/companies")
        .authorization_bearer(&buyer.access_token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let cards = server
        .get("/api/user-service/companies/limited")
        .add_query_param("ids", "2")
        .authorization_bearer(&buyer.access_token)
        .await
        .json::<Page<Company>>();
    assert_eq!(cards.content.len(), 1);
    assert_eq!(cards.content[0].name, "Acme Medical");
    assert!(cards.content[0].company_type.is_empty());
    assert!(cards.content[0].contact_email.is_none());
}

#[tokio::test]
async fn admin_creates_and_disables_companies() {
    let server = server();
    let admin = login(&server, "admin@medmarket.io", "admin").await;

    let response = server
        .post("/api/user-service/companies")
        .authorization_bearer(&admin.access_token)
        .json(&json!({
            "name": "North Pharmacy",
            "type": "BUYER",
            "address": "2 Elm St",
            "contactEmail": "north@pharmacy.org"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created = response.json::<Company>();

    let disabled = server
        .patch(&format!("/api/user-service/companies/{}", created.id))
        .add_query_param("availability", false)
        .authorization_bearer(&admin.access_token)
        .await
        .json::<Company>();
    assert_eq!(disabled.availability, Some(false));

    let available = server
        .get("/api/user-service/companies")
        .add_query_param("availability", true)
        .authorization_bearer(&admin.access_token)
        .await
        .json::<Page<Company>>();
    assert!(available.content.iter().all(|c| c.id != created.id));
}
