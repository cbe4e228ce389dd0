use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};
use sitecart_auth::{JwtClaims, PrincipalId, Role};
use sitecart_core::TenantId;

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over in-memory services, on an ephemeral port.
        let services = Arc::new(sitecart_api::app::services::in_memory_services());
        let app = sitecart_api::app::build_app(services, SECRET);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(tenant_id: TenantId, role: Role, employee_id: Option<&str>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        tenant_id,
        roles: vec![role],
        employee_id: employee_id.map(str::to_string),
        employee_name: None,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

struct Staff {
    storefront: String,
    packer: String,
    verifier: String,
    dispatcher: String,
    driver: String,
}

impl Staff {
    fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            storefront: mint_jwt(tenant_id, Role::STOREFRONT, None),
            packer: mint_jwt(tenant_id, Role::PACKER, Some("EMP-P01")),
            verifier: mint_jwt(tenant_id, Role::STORAGE_VERIFIER, Some("EMP-S01")),
            dispatcher: mint_jwt(tenant_id, Role::DISPATCHER, Some("EMP-D01")),
            driver: mint_jwt(tenant_id, Role::DRIVER, Some("DRV-001")),
        }
    }
}

async fn post(client: &reqwest::Client, url: String, token: &str, body: Value) -> (StatusCode, Value) {
    let res = client.post(url).bearer_auth(token).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

async fn get(client: &reqwest::Client, url: String, token: &str) -> (StatusCode, Value) {
    let res = client.get(url).bearer_auth(token).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

async fn place_order(client: &reqwest::Client, srv: &TestServer, token: &str) -> String {
    let (status, body) = post(
        client,
        srv.url("/orders"),
        token,
        json!({
            "customerId": "CUST-7",
            "customerName": "Hill Builders",
            "items": [
                {"productId": "CEM-50", "name": "Cement", "quantity": 2, "unitPrice": 9500, "weight": "50kg bag"},
                {"productId": "SND-25", "name": "Sand", "quantity": 1, "unitPrice": 6000, "weight": "25kg"}
            ],
            "deliveryAddress": "Plot 12, Ridge Road",
            "deliveryDate": "2026-03-10",
            "timeSlot": "08:00-12:00",
            "totalAmount": 250
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "order-confirmed");
    body["orderId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn whoami_reflects_the_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let tenant_id = TenantId::new();

    let (status, body) = get(
        &client,
        srv.url("/whoami"),
        &mint_jwt(tenant_id, Role::DRIVER, Some("DRV-001")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenantId"].as_str().unwrap(), tenant_id.to_string());
    assert_eq!(body["roles"][0], "driver");
    assert_eq!(body["employee"]["employeeId"], "DRV-001");
}

#[tokio::test]
async fn order_moves_from_checkout_to_delivery() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let staff = Staff::for_tenant(TenantId::new());
    let id = place_order(&client, &srv, &staff.storefront).await;

    // Packing: first item starts the stage, completion needs every item.
    let (status, body) = post(&client, srv.url(&format!("/orders/{id}/packing/items/0")), &staff.packer, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["packingProgress"], 50);

    let (status, body) = post(&client, srv.url(&format!("/orders/{id}/packing/complete")), &staff.packer, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "guard_violation");

    post(&client, srv.url(&format!("/orders/{id}/packing/items/1")), &staff.packer, json!({"packingStatus": "packed"})).await;
    let (status, body) = post(&client, srv.url(&format!("/orders/{id}/packing/complete")), &staff.packer, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["newStatus"], "allocated-driver");

    // Storage.
    for idx in 0..2 {
        let (status, _) = post(
            &client,
            srv.url(&format!("/orders/{id}/storage/items/{idx}/verify")),
            &staff.verifier,
            json!({"condition": "good"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = post(
        &client,
        srv.url(&format!("/orders/{id}/storage/complete")),
        &staff.verifier,
        json!({"storageLocation": "Bay 3"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["newStatus"], "ready-to-pickup");

    // Dispatch takes the suggested vehicle.
    let (status, suggestion) = get(&client, srv.url(&format!("/orders/{id}/vehicle-suggestion")), &staff.dispatcher).await;
    assert_eq!(status, StatusCode::OK);
    let vehicle_id = suggestion["vehicle"]["vehicleId"].as_str().unwrap().to_string();

    let (status, body) = post(
        &client,
        srv.url(&format!("/orders/{id}/assign")),
        &staff.dispatcher,
        json!({"driverId": "DRV-001"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["newStatus"], "allocated-dispatch-officer-2");

    // Driver loads, starts the route and delivers.
    let (status, _) = post(&client, srv.url(&format!("/orders/{id}/driver/verify")), &staff.driver, json!({"verified": true})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&client, srv.url(&format!("/vehicles/{vehicle_id}/start-route")), &staff.driver, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["updatedOrders"].as_array().unwrap().len(), 1);
    assert!(body["errors"].as_array().unwrap().is_empty());

    post(&client, srv.url(&format!("/orders/{id}/delivery/arrive")), &staff.driver, json!({"location": "gate"})).await;

    let (status, body) = post(
        &client,
        srv.url(&format!("/orders/{id}/delivery/complete")),
        &staff.driver,
        json!({"customerConfirmed": true}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "no photo yet: {body}");

    post(
        &client,
        srv.url(&format!("/orders/{id}/delivery/photos")),
        &staff.driver,
        json!({"url": "https://photos.example/1.jpg"}),
    )
    .await;
    let (status, body) = post(
        &client,
        srv.url(&format!("/orders/{id}/delivery/complete")),
        &staff.driver,
        json!({"customerConfirmed": true, "recipientName": "Site foreman"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["newStatus"], "order-complete");

    let (status, tracking) = get(&client, srv.url(&format!("/orders/{id}/tracking")), &staff.dispatcher).await;
    assert_eq!(status, StatusCode::OK);
    for stage in ["pending", "packed", "storage", "assigned", "loaded", "inTransit", "delivered"] {
        assert_eq!(tracking["workflowStatus"][stage]["completed"], true, "stage {stage}");
    }
    assert!(tracking["timingMetrics"]["actualDeliveryTime"].is_string());

    let (_, history) = get(&client, srv.url(&format!("/orders/{id}/history")), &staff.dispatcher).await;
    assert!(history.as_array().unwrap().len() >= 12);
}

#[tokio::test]
async fn roles_are_limited_to_their_stage() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let staff = Staff::for_tenant(TenantId::new());
    let id = place_order(&client, &srv, &staff.storefront).await;

    let (status, body) = post(&client, srv.url(&format!("/orders/{id}/packing/start")), &staff.driver, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = post(&client, srv.url("/orders"), &staff.packer, json!({})).await;
    assert!(status == StatusCode::FORBIDDEN || status == StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn staff_cannot_act_as_another_employee() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let staff = Staff::for_tenant(TenantId::new());
    let id = place_order(&client, &srv, &staff.storefront).await;

    let (status, _) = post(
        &client,
        srv.url(&format!("/orders/{id}/packing/start")),
        &staff.packer,
        json!({"employeeId": "EMP-S01"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn orders_are_invisible_across_tenants() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let staff = Staff::for_tenant(TenantId::new());
    let id = place_order(&client, &srv, &staff.storefront).await;

    let other = mint_jwt(TenantId::new(), Role::ADMIN, None);
    let (status, _) = get(&client, srv.url(&format!("/orders/{id}")), &other).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, queue) = get(&client, srv.url("/dashboard/queues/packing"), &other).await;
    assert_eq!(queue["count"], 0);

    let (_, queue) = get(&client, srv.url("/dashboard/queues/packing"), &staff.packer).await;
    assert_eq!(queue["count"], 1);
    assert_eq!(queue["orders"][0]["priority"], "HIGH");
}

#[tokio::test]
async fn stale_expected_version_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let staff = Staff::for_tenant(TenantId::new());
    let id = place_order(&client, &srv, &staff.storefront).await;

    let (status, body) = post(
        &client,
        srv.url(&format!("/orders/{id}/packing/start")),
        &staff.packer,
        json!({"expectedVersion": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = post(
        &client,
        srv.url(&format!("/orders/{id}/packing/items/0")),
        &staff.packer,
        json!({"expectedVersion": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}
