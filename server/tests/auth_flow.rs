//! End-to-end tests for the login flow and the ownership boundary.
//!
//! Spawns the real router on an ephemeral port and drives it with a plain
//! HTTP client, handling cookies by hand so the cookie attributes
//! themselves can be asserted.

use std::sync::Arc;

use quickbill_server::api::auth::{AuthManager, OtpService};
use quickbill_server::api::server::{AppState, build_router};
use quickbill_server::core::config::{
    AppConfig, AuthConfig, DatabaseConfig, EmailConfig, MailerBackend, ServerConfig,
};
use quickbill_server::data::{TransactionalRepository, TransactionalService};
use quickbill_server::email::LogMailer;
use reqwest::StatusCode;
use reqwest::header::SET_COOKIE;
use serde_json::json;

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origin: "http://localhost:5173".to_string(),
        },
        auth: AuthConfig {
            access_secret: "test-access-secret".to_string(),
            access_ttl_secs: 3600,
            refresh_secret: "test-refresh-secret".to_string(),
            refresh_ttl_secs: 86_400,
            otp_ttl_minutes: 5,
        },
        database: DatabaseConfig {
            path: ":memory:".to_string(),
        },
        email: EmailConfig {
            backend: MailerBackend::Log,
            api_url: None,
            api_key: None,
            from_address: "no-reply@quickbill.local".to_string(),
        },
    }
}

async fn spawn_server() -> (String, Arc<TransactionalService>) {
    let config = Arc::new(test_config());
    let database = Arc::new(
        TransactionalService::init(&config.database)
            .await
            .expect("database init"),
    );
    let auth_manager = Arc::new(AuthManager::new(database.clone(), config.auth.clone()));
    let otp = Arc::new(OtpService::new(
        database.clone(),
        Arc::new(LogMailer),
        config.auth.otp_ttl_minutes,
    ));

    let state = AppState {
        config,
        database: database.clone(),
        auth_manager,
        otp,
    };
    let router = build_router(&state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });

    (format!("http://{}", addr), database)
}

/// Pull a `name=value` pair out of the Set-Cookie response headers
fn extract_cookie(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|raw| raw.starts_with(&format!("{}=", name)))
        .and_then(|raw| raw.split(';').next())
        .map(|pair| pair.to_string())
}

/// The raw Set-Cookie header line for a cookie name
fn raw_cookie<'a>(response: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|raw| raw.starts_with(&format!("{}=", name)))
}

/// Run request-otp for an email and read the generated code from storage
async fn request_otp(
    client: &reqwest::Client,
    base: &str,
    database: &TransactionalService,
    email: &str,
) -> String {
    let response = client
        .post(format!("{}/api/v1/auth/request-otp", base))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("request-otp");
    assert_eq!(response.status(), StatusCode::OK);

    let record = database
        .repository()
        .get_otp(email)
        .await
        .expect("get otp")
        .expect("otp stored");
    record.otp.expect("otp code set")
}

/// Full login helper: returns (access cookie, refresh cookie)
async fn login(
    client: &reqwest::Client,
    base: &str,
    database: &TransactionalService,
    email: &str,
) -> (String, String) {
    let code = request_otp(client, base, database, email).await;
    let response = client
        .post(format!("{}/api/v1/auth/login", base))
        .json(&json!({ "email": email, "otp": code }))
        .send()
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);

    let access = extract_cookie(&response, "accessToken").expect("access cookie");
    let refresh = extract_cookie(&response, "refreshToken").expect("refresh cookie");
    (access, refresh)
}

#[tokio::test]
async fn login_flow_issues_single_use_otp_and_session_cookies() {
    let (base, database) = spawn_server().await;
    let client = reqwest::Client::new();

    let code = request_otp(&client, &base, &database, "a@x.com").await;
    assert_eq!(code.len(), 6);

    // Wrong code is rejected and the stored code stays usable
    let response = client
        .post(format!("{}/api/v1/auth/login", base))
        .json(&json!({ "email": "a@x.com", "otp": "000000" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct code logs in and sets hardened cookies
    let response = client
        .post(format!("{}/api/v1/auth/login", base))
        .json(&json!({ "email": "a@x.com", "otp": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let raw_access = raw_cookie(&response, "accessToken").unwrap();
    assert!(raw_access.contains("HttpOnly"));
    assert!(raw_access.contains("SameSite=Strict"));
    assert!(raw_access.contains("Max-Age=3600"));

    let raw_refresh = raw_cookie(&response, "refreshToken").unwrap();
    assert!(raw_refresh.contains("HttpOnly"));
    assert!(raw_refresh.contains("SameSite=Strict"));
    assert!(raw_refresh.contains("Max-Age=86400"));

    // The code was consumed on success: replay fails
    let response = client
        .post(format!("{}/api/v1/auth/login", base))
        .json(&json!({ "email": "a@x.com", "otp": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn self_endpoint_reports_derived_onboarding() {
    let (base, database) = spawn_server().await;
    let client = reqwest::Client::new();
    let (access, _refresh) = login(&client, &base, &database, "a@x.com").await;

    let response = client
        .get(format!("{}/api/v1/users/self", base))
        .header("Cookie", &access)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["isOnboarded"], false);
    assert_eq!(body["companyIds"], json!([]));

    // Owning a company flips the derived flag
    let response = client
        .post(format!("{}/api/v1/companies", base))
        .header("Cookie", &access)
        .json(&json!({
            "name": "Acme",
            "email": "info@acme.test",
            "address": {
                "street": "Main St", "number": "1", "zip": "12345",
                "city": "Offenburg", "country": "Germany"
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value = client
        .get(format!("{}/api/v1/users/self", base))
        .header("Cookie", &access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["isOnboarded"], true);
}

#[tokio::test]
async fn refresh_works_until_logout_revokes_the_token() {
    let (base, database) = spawn_server().await;
    let client = reqwest::Client::new();
    let (access, refresh) = login(&client, &base, &database, "a@x.com").await;

    // Refresh with a live token mints a new access cookie
    let response = client
        .post(format!("{}/api/v1/auth/refresh-token", base))
        .header("Cookie", &refresh)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(extract_cookie(&response, "accessToken").is_some());

    // Logout clears both cookies and revokes the stored refresh token
    let response = client
        .post(format!("{}/api/v1/auth/logout", base))
        .header("Cookie", format!("{}; {}", access, refresh))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = raw_cookie(&response, "accessToken").unwrap();
    assert!(cleared.contains("Max-Age=0"));

    // The refresh token is still cryptographically valid but revoked
    let response = client
        .post(format!("{}/api/v1/auth/refresh-token", base))
        .header("Cookie", &refresh)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_without_cookie_is_unauthorized() {
    let (base, _database) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/v1/auth/refresh-token", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_succeeds_without_valid_session() {
    let (base, _database) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/v1/auth/logout", base))
        .header("Cookie", "accessToken=garbage; refreshToken=garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn resource_routes_require_a_session() {
    let (base, _database) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/v1/companies", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{}/api/v1/companies", base))
        .header("Cookie", "accessToken=not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn companies_are_isolated_between_tenants() {
    let (base, database) = spawn_server().await;
    let client = reqwest::Client::new();

    let (access_a, _) = login(&client, &base, &database, "a@x.com").await;
    let (access_b, _) = login(&client, &base, &database, "b@x.com").await;

    // A creates a company
    let response = client
        .post(format!("{}/api/v1/companies", base))
        .header("Cookie", &access_a)
        .json(&json!({
            "name": "Acme",
            "email": "info@acme.test",
            "address": {
                "street": "Main St", "number": "1", "zip": "12345",
                "city": "Offenburg", "country": "Germany"
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.unwrap();
    let company_id = body["id"].as_str().unwrap().to_string();

    // The owner can read it
    let response = client
        .get(format!("{}/api/v1/companies/{}", base, company_id))
        .header("Cookie", &access_a)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // B gets Forbidden even though the company exists
    let response = client
        .get(format!("{}/api/v1/companies/{}", base, company_id))
        .header("Cookie", &access_b)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .patch(format!("{}/api/v1/companies/{}", base, company_id))
        .header("Cookie", &access_b)
        .json(&json!({ "name": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // B's own listing stays empty
    let body: serde_json::Value = client
        .get(format!("{}/api/v1/companies", base))
        .header("Cookie", &access_b)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalItems"], 0);
}

#[tokio::test]
async fn invoice_lifecycle_with_archive_and_restore() {
    let (base, database) = spawn_server().await;
    let client = reqwest::Client::new();
    let (access, _) = login(&client, &base, &database, "a@x.com").await;

    // Company
    let body: serde_json::Value = client
        .post(format!("{}/api/v1/companies", base))
        .header("Cookie", &access)
        .json(&json!({
            "name": "Acme",
            "email": "info@acme.test",
            "address": {
                "street": "Main St", "number": "1", "zip": "12345",
                "city": "Offenburg", "country": "Germany"
            }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let company_id = body["id"].as_str().unwrap().to_string();

    // Customer for the company
    let body: serde_json::Value = client
        .post(format!("{}/api/v1/customers", base))
        .header("Cookie", &access)
        .json(&json!({
            "customerOf": company_id,
            "name": "Anna Smith",
            "email": "anna@customers.test"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let customer_id = body["id"].as_str().unwrap().to_string();

    // Invoice with two items
    let response = client
        .post(format!("{}/api/v1/invoices", base))
        .header("Cookie", &access)
        .json(&json!({
            "invoiceNumber": "INV-1",
            "date": "2024-06-01",
            "subTotal": 100.0,
            "totalAmount": 119.0,
            "vat": 19.0,
            "currency": "EUR",
            "companyId": company_id,
            "customerId": customer_id,
            "items": [
                { "description": "Design", "unitPrice": 50.0, "quantity": 1, "totalPrice": 50.0 },
                { "description": "Development", "unitPrice": 25.0, "quantity": 2, "totalPrice": 50.0 }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.unwrap();
    let invoice_id = body["id"].as_str().unwrap().to_string();

    // Detail view includes the items
    let body: serde_json::Value = client
        .get(format!("{}/api/v1/invoices/{}", base, invoice_id))
        .header("Cookie", &access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    // Archive: invoice leaves the default listing
    let response = client
        .delete(format!("{}/api/v1/invoices/{}", base, invoice_id))
        .header("Cookie", &access)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = client
        .get(format!("{}/api/v1/invoices", base))
        .header("Cookie", &access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalItems"], 0);

    // Restore brings it back
    let response = client
        .post(format!("{}/api/v1/invoices/{}/restore", base, invoice_id))
        .header("Cookie", &access)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = client
        .get(format!("{}/api/v1/invoices", base))
        .header("Cookie", &access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalItems"], 1);
}
