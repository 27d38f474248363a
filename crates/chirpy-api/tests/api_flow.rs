use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use chirpy_api::auth::{AppState, AppStateInner};
use chirpy_db::Database;

const SECRET: &str = "integration-test-secret";
const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

struct TestApp {
    _dir: TempDir,
    app: Router,
    state: AppState,
}

fn setup() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("database.json")).unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Welcome to Chirpy</h1>").unwrap();

    let state = AppStateInner::new(db, SECRET, POLKA_KEY.to_string());
    let app = chirpy_api::router(state.clone(), dir.path());
    TestApp { _dir: dir, app, state }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            req = req.header(header::AUTHORIZATION, auth);
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    async fn signup(&self, email: &str, password: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/users",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    async fn login(&self, email: &str, password: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn chirp(&self, access: &str, text: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/chirps",
            Some(&bearer(access)),
            Some(json!({ "body": text })),
        )
        .await
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

fn str_field<'a>(v: &'a Value, key: &str) -> &'a str {
    v[key].as_str().unwrap()
}

#[tokio::test]
async fn test_end_to_end_token_lifecycle() {
    let t = setup();

    let user = t.signup("a@x.com", "secret").await;
    assert_eq!(user["email"], "a@x.com");
    assert_eq!(user["is_chirpy_red"], false);
    let user_id = user["id"].as_u64().unwrap();

    let login = t.login("a@x.com", "secret").await;
    assert_eq!(login["id"].as_u64().unwrap(), user_id);
    let access = str_field(&login, "token").to_string();
    let refresh = str_field(&login, "refresh_token").to_string();

    // Lifetimes: 1 hour for access, 60 days for refresh.
    let access_claims = t.state.tokens.validate(&access, chirpy_api::tokens::TokenRole::Access).unwrap();
    assert_eq!(access_claims.exp - access_claims.iat, 3600);
    let refresh_claims = t.state.tokens.validate(&refresh, chirpy_api::tokens::TokenRole::Refresh).unwrap();
    assert_eq!(refresh_claims.exp - refresh_claims.iat, 60 * 24 * 3600);

    let (status, chirp) = t.chirp(&access, "hello").await;
    assert_eq!(status, StatusCode::CREATED);
    let chirp_id = chirp["id"].as_u64().unwrap();

    let (status, fetched) = t
        .send(Method::GET, &format!("/api/chirps/{}", chirp_id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["body"], "hello");
    assert_eq!(fetched["author_id"].as_u64().unwrap(), user_id);

    // Refresh works before revocation.
    let (status, refreshed) = t
        .send(Method::POST, "/api/refresh", Some(&bearer(&refresh)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["token"].is_string());

    let (status, _) = t
        .send(Method::POST, "/api/revoke", Some(&bearer(&refresh)), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = t
        .send(Method::POST, "/api/refresh", Some(&bearer(&refresh)), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    // Re-revoking is a uniqueness violation, not a silent success.
    let (status, _) = t
        .send(Method::POST, "/api/revoke", Some(&bearer(&refresh)), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The access token is untouched by the revocation.
    let (status, _) = t.chirp(&access, "still here").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_roles_are_enforced_per_endpoint() {
    let t = setup();
    t.signup("a@x.com", "secret").await;
    let login = t.login("a@x.com", "secret").await;
    let access = str_field(&login, "token");
    let refresh = str_field(&login, "refresh_token");

    let (status, _) = t.chirp(refresh, "nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t
        .send(Method::POST, "/api/refresh", Some(&bearer(access)), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t
        .send(Method::POST, "/api/revoke", Some(&bearer(access)), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.chirp("garbage", "nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t
        .send(Method::POST, "/api/chirps", None, Some(json!({ "body": "anon" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_and_login_failures() {
    let t = setup();
    t.signup("a@x.com", "secret").await;

    let (status, _) = t
        .send(
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "email": "a@x.com", "password": "other" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(t.state.db.load().unwrap().users.len(), 1);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "email": "b@x.com", "password": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "nobody@x.com", "password": "secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The stored password is a hash, never the plaintext.
    let stored = t.state.db.get_user_by_email("a@x.com").unwrap();
    assert_ne!(stored.password, "secret");
}

#[tokio::test]
async fn test_malformed_input_is_a_json_400() {
    let t = setup();

    let (status, body) = t
        .send(Method::POST, "/api/users", None, Some(json!({ "email": "a@x.com" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = t
        .send(Method::POST, "/api/login", None, Some(json!({ "email": 7, "password": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = t.send(Method::GET, "/api/chirps?author_id=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = t.send(Method::GET, "/api/chirps/not-a-number", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    t.signup("a@x.com", "secret").await;
    let a = t.login("a@x.com", "secret").await;
    let (status, body) = t
        .send(Method::POST, "/api/chirps", Some(&bearer(str_field(&a, "token"))), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = t
        .send(
            Method::POST,
            "/api/polka/webhooks",
            Some(&format!("ApiKey {}", POLKA_KEY)),
            Some(json!({ "event": "user.upgraded" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_update_user() {
    let t = setup();
    t.signup("a@x.com", "secret").await;
    let login = t.login("a@x.com", "secret").await;
    let access = str_field(&login, "token");

    let (status, updated) = t
        .send(
            Method::PUT,
            "/api/users",
            Some(&bearer(access)),
            Some(json!({ "email": "new@x.com", "password": "hunter2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["email"], "new@x.com");

    t.login("new@x.com", "hunter2").await;

    let (status, _) = t
        .send(
            Method::PUT,
            "/api/users",
            None,
            Some(json!({ "email": "x@x.com", "password": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_chirp_listing_and_validation() {
    let t = setup();
    t.signup("a@x.com", "secret").await;
    t.signup("b@x.com", "secret").await;
    let a = t.login("a@x.com", "secret").await;
    let b = t.login("b@x.com", "secret").await;

    for text in ["first", "second"] {
        assert_eq!(t.chirp(str_field(&a, "token"), text).await.0, StatusCode::CREATED);
    }
    assert_eq!(t.chirp(str_field(&b, "token"), "third").await.0, StatusCode::CREATED);

    let (_, all) = t.send(Method::GET, "/api/chirps", None, None).await;
    let ids: Vec<u64> = all.as_array().unwrap().iter().map(|c| c["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let (_, desc) = t.send(Method::GET, "/api/chirps?sort=desc", None, None).await;
    let ids: Vec<u64> = desc.as_array().unwrap().iter().map(|c| c["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![3, 2, 1]);

    let b_id = b["id"].as_u64().unwrap();
    let (_, by_b) = t
        .send(Method::GET, &format!("/api/chirps?author_id={}", b_id), None, None)
        .await;
    assert_eq!(by_b.as_array().unwrap().len(), 1);
    assert_eq!(by_b[0]["body"], "third");

    let (status, _) = t.send(Method::GET, "/api/chirps?sort=sideways", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.send(Method::GET, "/api/chirps/99", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t.chirp(str_field(&a, "token"), &"x".repeat(141)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, cleaned) = t.chirp(str_field(&a, "token"), "what a Kerfuffle").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cleaned["body"], "what a ****");
}

#[tokio::test]
async fn test_delete_chirp_requires_author() {
    let t = setup();
    t.signup("a@x.com", "secret").await;
    t.signup("b@x.com", "secret").await;
    let a = t.login("a@x.com", "secret").await;
    let b = t.login("b@x.com", "secret").await;

    let (_, chirp) = t.chirp(str_field(&a, "token"), "mine").await;
    let uri = format!("/api/chirps/{}", chirp["id"]);

    let (status, body) = t
        .send(Method::DELETE, &uri, Some(&bearer(str_field(&b, "token"))), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, _) = t
        .send(Method::DELETE, &uri, Some(&bearer(str_field(&a, "token"))), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t
        .send(Method::DELETE, &uri, Some(&bearer(str_field(&a, "token"))), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_polka_webhook_upgrades_user() {
    let t = setup();
    let user = t.signup("a@x.com", "secret").await;
    let user_id = user["id"].as_u64().unwrap();
    let upgrade = json!({ "event": "user.upgraded", "data": { "user_id": user_id } });
    let api_key = format!("ApiKey {}", POLKA_KEY);

    let (status, _) = t
        .send(Method::POST, "/api/polka/webhooks", Some("ApiKey wrong"), Some(upgrade.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/polka/webhooks",
            Some(&api_key),
            Some(json!({ "event": "user.payment_failed", "data": { "user_id": user_id } })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(t.login("a@x.com", "secret").await["is_chirpy_red"], false);

    for _ in 0..2 {
        let (status, _) = t
            .send(Method::POST, "/api/polka/webhooks", Some(&api_key), Some(upgrade.clone()))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    assert_eq!(t.login("a@x.com", "secret").await["is_chirpy_red"], true);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/polka/webhooks",
            Some(&api_key),
            Some(json!({ "event": "user.upgraded", "data": { "user_id": 404 } })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fileserver_hits_and_health() {
    let t = setup();

    let (status, body) = t.send(Method::GET, "/api/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    for _ in 0..2 {
        let (status, _) = t.send(Method::GET, "/app/index.html", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, page) = t.send(Method::GET, "/admin/metrics", None, None).await;
    assert!(page.as_str().unwrap().contains("visited 2 times"));

    let (status, _) = t.send(Method::GET, "/api/reset", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, page) = t.send(Method::GET, "/admin/metrics", None, None).await;
    assert!(page.as_str().unwrap().contains("visited 0 times"));
}
