// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! HTTP API integration tests through the full middleware stack.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;
use tender_api::auth::{Claims, JwtConfig, JwtManager};
use tender_core::UserStatus;
use tender_tests::prelude::*;

fn harness() -> ApiHarness {
    init_test_logging();
    ApiHarness::new()
}

// =============================================================================
// Public endpoints
// =============================================================================

#[tokio::test]
async fn test_index_and_health_are_public() {
    let harness = harness();

    let (status, body) = harness.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());

    let (status, body) = harness.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["components"].is_array());
}

// =============================================================================
// Accounts and tokens
// =============================================================================

#[tokio::test]
async fn test_signup_login_me() {
    let harness = harness();

    let (status, body) = harness
        .post(
            "/v1/auth/signup",
            None,
            json!({
                "userName": "alice",
                "email": "alice@example.org",
                "password": TEST_PASSWORD,
                "roles": ["ROLE_ADMIN"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_name"], "alice");
    assert_eq!(body["roles"], json!(["ROLE_USER"]));
    assert_eq!(body["status"], "active");
    assert!(body.get("password_hash").is_none());

    let (status, body) = harness
        .post(
            "/v1/auth/login",
            None,
            json!({ "user_name": "alice", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["roles"], json!(["ROLE_USER"]));
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = harness.get("/v1/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_name"], "alice");
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let harness = harness();
    harness.add_user("bob", &[Role::User]).await;

    let (status, body) = harness
        .post(
            "/v1/auth/signup",
            None,
            json!({ "user_name": "bob", "email": "b@example.org", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "CONFLICT");
}

#[tokio::test]
async fn test_signup_validation_reports_every_field() {
    let harness = harness();

    let (status, body) = harness
        .post(
            "/v1/auth/signup",
            None,
            json!({ "user_name": "", "email": "nope", "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let fields: Vec<_> = body["error"]["details"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["user_name", "email", "password"]);
}

#[tokio::test]
async fn test_signup_can_be_disabled() {
    init_test_logging();
    let harness = ApiHarness::with_config(ConfigFixtures::api().with_signup(false));

    let (status, _) = harness
        .post(
            "/v1/auth/signup",
            None,
            json!({ "user_name": "carol", "email": "c@example.org", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let harness = harness();
    harness.add_user("dave", &[Role::User]).await;

    let (status, body) = harness
        .post(
            "/v1/auth/login",
            None,
            json!({ "user_name": "dave", "password": "not-the-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHORIZED");

    let (status, _) = harness
        .post(
            "/v1/auth/login",
            None,
            json!({ "user_name": "nobody", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_banned_user_cannot_sign_in() {
    let harness = harness();
    harness.add_user("eve", &[Role::User]).await;
    harness.set_status("eve", UserStatus::Banned).await;

    let (status, body) = harness
        .post(
            "/v1/auth/login",
            None,
            json!({ "user_name": "eve", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");
}

#[tokio::test]
async fn test_expired_and_foreign_tokens_are_anonymous() {
    let harness = harness();

    let claims = Claims::builder("frank")
        .role(Role::User)
        .issuer(harness.state().jwt().issuer())
        .expires_in(-3_600)
        .build();
    let expired = harness.state().jwt().create_token(&claims).unwrap();
    let (status, _) = harness.get("/api/v1/procurements", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = JwtManager::new(JwtConfig::new("some-other-secret-that-is-long-enough"))
        .unwrap()
        .create_access_token("frank", &[Role::Admin])
        .unwrap();
    let (status, _) = harness.get("/api/v1/procurements", Some(&foreign)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = harness.get("/api/v1/procurements", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// One-time login codes
// =============================================================================

#[tokio::test]
async fn test_login_code_is_single_use() {
    let harness = harness();
    let admin = harness.admin_token().await;
    harness.add_user("grace", &[Role::User, Role::Telegram]).await;

    let (status, body) = harness
        .post(
            "/api/v1/management/codes",
            Some(&admin),
            json!({ "user_name": "grace" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_name"], "grace");
    let code = body["code"].as_str().unwrap().to_string();

    let uri = format!("/v1/auth/code/{code}");
    let (status, body) = harness.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_name"], "grace");
    assert_eq!(body["roles"], json!(["ROLE_USER", "ROLE_TELEGRAM"]));

    let (status, _) = harness.get(&uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_code_for_unknown_or_inactive_user() {
    let harness = harness();
    let admin = harness.admin_token().await;

    let (status, _) = harness
        .post(
            "/api/v1/management/codes",
            Some(&admin),
            json!({ "user_name": "ghost" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    harness.add_user("heidi", &[Role::User]).await;
    harness.set_status("heidi", UserStatus::Disabled).await;
    let (status, _) = harness
        .post(
            "/api/v1/management/codes",
            Some(&admin),
            json!({ "user_name": "heidi" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// =============================================================================
// Access policy
// =============================================================================

#[tokio::test]
async fn test_access_policy_decisions() {
    let harness = harness();
    let user = harness.token_for("ivan", &[Role::User]);
    let extension = harness.token_for("ext", &[Role::ChromeExtension]);
    let admin = harness.token_for("root", &[Role::Admin]);

    let cases: [(&str, Option<&str>, StatusCode); 10] = [
        ("/api/v1/procurements", None, StatusCode::UNAUTHORIZED),
        ("/api/v1/procurements", Some(&user), StatusCode::OK),
        ("/api/v1/management/users", Some(&user), StatusCode::FORBIDDEN),
        ("/api/v1/management/users", Some(&extension), StatusCode::OK),
        ("/api/v1/management/users", Some(&admin), StatusCode::OK),
        ("/v1/chrome/procurements/44/none", Some(&user), StatusCode::FORBIDDEN),
        ("/v1/chrome/procurements/44/none", Some(&admin), StatusCode::NOT_FOUND),
        ("/v1/auth/test/jwt", Some(&admin), StatusCode::FORBIDDEN),
        ("/v1/auth/test/jwt", Some(&extension), StatusCode::OK),
        ("/v1/auth/me", None, StatusCode::UNAUTHORIZED),
    ];

    for (uri, token, expected) in cases {
        let (status, _) = harness.get(uri, token).await;
        assert_eq!(status, expected, "GET {uri} with token {:?}", token.is_some());
    }
}

#[tokio::test]
async fn test_rejections_use_error_envelope() {
    let harness = harness();
    let user = harness.token_for("judy", &[Role::User]);

    let (_, body) = harness.get("/api/v1/procurements", None).await;
    assert_eq!(error_code(&body), "UNAUTHORIZED");

    let (_, body) = harness.get("/api/v1/management/users", Some(&user)).await;
    assert_eq!(error_code(&body), "FORBIDDEN");
    assert!(body["error"]["message"].is_string());
}

// =============================================================================
// Procurements
// =============================================================================

#[tokio::test]
async fn test_procurement_lifecycle() {
    let harness = harness();
    let user = harness.token_for("kim", &[Role::User]);
    let admin = harness.token_for("root", &[Role::Admin]);

    let (status, created) = harness
        .post(
            "/api/v1/procurements",
            Some(&user),
            ProcurementFixtures::api_payload(44, "life-1"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert!(created["created_at"].is_string());

    let uri = format!("/api/v1/procurements/{id}");
    let (status, fetched) = harness.get(&uri, Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let mut update = ProcurementFixtures::api_payload(44, "life-1");
    update["stage"] = json!("Completed");
    let (status, replaced) = harness.put(&uri, Some(&user), update).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["stage"], "Completed");
    assert_eq!(replaced["created_at"], created["created_at"]);

    let delete_uri = format!("/api/v1/management/procurements/{id}");
    let (status, _) = harness.delete(&delete_uri, Some(&user)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = harness.delete(&delete_uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = harness.get(&uri, Some(&user)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");

    let (status, _) = harness.delete(&delete_uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_replace_unknown_id_is_not_found() {
    let harness = harness();
    let user = harness.token_for("lee", &[Role::User]);

    let (status, _) = harness
        .put(
            "/api/v1/procurements/4242",
            Some(&user),
            ProcurementFixtures::api_payload(44, "missing"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_procurement_payload() {
    let harness = harness();
    let user = harness.token_for("mia", &[Role::User]);

    let (status, body) = harness
        .post(
            "/api/v1/procurements",
            Some(&user),
            json!({
                "fz_number": "forty-four",
                "uin": " ",
                "object_of": "Paper",
                "publisher_name": "School",
                "procedure_type": "Auction",
                "contract_price": "-5",
                "date_of_auction": "31/12/2024"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let fields: Vec<_> = body["error"]["details"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap().to_string())
        .collect();
    for expected in ["fz_number", "uin", "contract_price", "date_of_auction"] {
        assert!(fields.iter().any(|f| f == expected), "missing {expected} in {fields:?}");
    }
}

#[tokio::test]
async fn test_list_paging_and_filters() {
    let harness = harness();
    let user = harness.token_for("ned", &[Role::User]);

    let mut ids = Vec::new();
    for (fz, uin) in [(44, "p-1"), (223, "p-2"), (44, "p-3"), (44, "p-4")] {
        let (_, body) = harness
            .post(
                "/api/v1/procurements",
                Some(&user),
                ProcurementFixtures::api_payload(fz, uin),
            )
            .await;
        ids.push(body["id"].as_i64().unwrap());
    }

    let (status, page) = harness
        .get("/api/v1/procurements?page=1&size=3", Some(&user))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_elements"], 4);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["content"].as_array().unwrap().len(), 1);
    assert_eq!(page["content"][0]["uin"], "p-4");

    let uri = format!("/api/v1/procurements?ids={},999,{}", ids[2], ids[0]);
    let (status, page) = harness.get(&uri, Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
    let uins: Vec<_> = page["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["uin"].as_str().unwrap())
        .collect();
    assert_eq!(uins, vec!["p-1", "p-3"]);

    let (status, records) = harness
        .get("/api/v1/procurements/fz/44", Some(&user))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(records.as_array().unwrap().len(), 3);

    let (status, page) = harness
        .get("/api/v1/procurements/created-before/01.01.2000", Some(&user))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_elements"], 0);

    let (status, page) = harness
        .get("/api/v1/procurements/created-before/2999-01-01", Some(&user))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_elements"], 4);
}

#[tokio::test]
async fn test_bad_path_and_query_values() {
    let harness = harness();
    let user = harness.token_for("olga", &[Role::User]);

    for uri in [
        "/api/v1/procurements/abc",
        "/api/v1/procurements/fz/law",
        "/api/v1/procurements/created-before/yesterday",
        "/api/v1/procurements?size=0",
        "/api/v1/procurements?ids=1,x",
    ] {
        let (status, body) = harness.get(uri, Some(&user)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "GET {uri}");
        assert_eq!(error_code(&body), "BAD_REQUEST");
    }
}

// =============================================================================
// Browser extension
// =============================================================================

#[tokio::test]
async fn test_extension_upsert_and_lookup() {
    let harness = harness();
    let extension = harness.token_for("ext", &[Role::ChromeExtension]);

    let (status, first) = harness
        .post(
            "/v1/chrome/procurements",
            Some(&extension),
            ProcurementFixtures::extension_payload("ext-1"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["date_of_placement"], "2024-01-15");
    assert_eq!(first["time_of_auction"], "09:00:00");
    let price = Decimal::from_str(first["contract_price"].as_str().unwrap()).unwrap();
    assert_eq!(price, Decimal::from(98_500));

    let mut again = ProcurementFixtures::extension_payload("ext-1");
    again["stage"] = json!("Completed");
    let (status, second) = harness
        .post("/v1/chrome/procurements", Some(&extension), again)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["created_at"], first["created_at"]);
    assert_eq!(second["stage"], "Completed");

    let (status, found) = harness
        .get("/v1/chrome/procurements/44/ext-1", Some(&extension))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], first["id"]);

    let (status, _) = harness
        .get("/v1/chrome/procurements/223/ext-1", Some(&extension))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// User management
// =============================================================================

#[tokio::test]
async fn test_admin_manages_users() {
    let harness = harness();
    let admin = harness.admin_token().await;

    let (status, created) = harness
        .post(
            "/api/v1/management/users",
            Some(&admin),
            json!({
                "user_name": "bot",
                "email": "bot@example.org",
                "password": TEST_PASSWORD,
                "roles": ["ROLE_CHROME_EXTENSION"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["roles"], json!(["ROLE_CHROME_EXTENSION"]));

    let (status, body) = harness
        .post(
            "/api/v1/management/users",
            Some(&admin),
            json!({
                "user_name": "other",
                "email": "other@example.org",
                "password": TEST_PASSWORD,
                "roles": ["ROLE_SUPERUSER"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let (status, users) = harness.get("/api/v1/management/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["user_name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"root"));
    assert!(names.contains(&"bot"));
    assert!(!names.contains(&"other"));

    let (status, _) = harness
        .put(
            "/api/v1/management/users/bot/status",
            Some(&admin),
            json!({ "status": "banned" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = harness
        .post(
            "/v1/auth/login",
            None,
            json!({ "user_name": "bot", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = harness
        .put(
            "/api/v1/management/users/ghost/status",
            Some(&admin),
            json!({ "status": "active" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
