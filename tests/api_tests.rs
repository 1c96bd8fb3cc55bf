//! HTTP boundary tests driven through the warp filters.

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tinyblog::api::v1::{recover_error, routes};
use tinyblog::application_impl::SessionConfig;
use tinyblog::server::{Server, SessionCookie};
use warp::Filter;
use warp::http::StatusCode;
use warp::test::request;

fn server() -> Arc<Server> {
    Arc::new(Server::in_memory(
        SessionConfig {
            issuer: "tinyblog.test".to_string(),
            audience: "tinyblog-web".to_string(),
            ttl: Duration::from_secs(600),
            signing_key: b"api-key".to_vec(),
        },
        SessionCookie {
            name: "session".to_string(),
            max_age_secs: 600,
            secure: false,
        },
    ))
}

fn body(res: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

/// Registers and logs in, returning the `Cookie` header value to send.
async fn sign_in(server: &Arc<Server>, username: &str, password: &str) -> String {
    let api = routes(server.clone()).recover(recover_error);
    let creds = json!({ "username": username, "password": password });

    let res = request()
        .method("POST")
        .path("/auth/register")
        .json(&creds)
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = request()
        .method("POST")
        .path("/auth/login")
        .json(&creds)
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let set_cookie = res.headers()["set-cookie"].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn register_validation_and_conflict() {
    let server = server();
    let api = routes(server.clone()).recover(recover_error);

    for (username, password, status, message) in [
        ("", "", StatusCode::BAD_REQUEST, "User name is required."),
        ("a", "", StatusCode::BAD_REQUEST, "Password is required."),
    ] {
        let res = request()
            .method("POST")
            .path("/auth/register")
            .json(&json!({ "username": username, "password": password }))
            .reply(&api)
            .await;
        assert_eq!(res.status(), status);
        assert_eq!(body(&res)["error"]["message"], message);
    }

    sign_in(&server, "test", "test").await;
    let res = request()
        .method("POST")
        .path("/auth/register")
        .json(&json!({ "username": "test", "password": "test" }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body(&res)["error"]["code"], "UsernameTaken");
}

#[tokio::test]
async fn login_failures_are_distinguished() {
    let server = server();
    let api = routes(server.clone()).recover(recover_error);
    sign_in(&server, "test", "test").await;

    for (username, password, message) in [
        ("a", "test", "Incorrect user name."),
        ("test", "a", "Incorrect password."),
        ("", "test", "Incorrect user name."),
        ("test", "", "Incorrect password."),
    ] {
        let res = request()
            .method("POST")
            .path("/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(&res)["error"]["message"], message);
        assert!(res.headers().get("set-cookie").is_none());
    }
}

#[tokio::test]
async fn protected_routes_require_login() {
    let server = server();
    let api = routes(server).recover(recover_error);

    let attempts = [
        ("POST", "/posts"),
        ("PUT", "/posts/1"),
        ("DELETE", "/posts/1"),
        ("GET", "/posts/1/edit"),
    ];
    for (method, path) in attempts {
        let res = request()
            .method(method)
            .path(path)
            .json(&json!({ "title": "t" }))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{method} {path}");
        assert_eq!(res.headers()["location"], "/api/v1/auth/login");
    }
}

#[tokio::test]
async fn post_lifecycle_with_ownership() {
    let server = server();
    let api = routes(server.clone()).recover(recover_error);
    let alice = sign_in(&server, "alice", "secret").await;
    let bob = sign_in(&server, "bob", "pw").await;

    let res = request()
        .method("GET")
        .path("/auth/me")
        .header("cookie", &alice)
        .reply(&api)
        .await;
    assert_eq!(body(&res)["data"]["username"], "alice");

    let res = request()
        .method("POST")
        .path("/posts")
        .header("cookie", &alice)
        .json(&json!({ "title": "Hello", "body": "World" }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let post_id = body(&res)["data"]["post_id"].as_i64().unwrap();

    let res = request().method("GET").path("/posts").reply(&api).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(&res)["data"][0]["title"], "Hello");
    assert_eq!(body(&res)["data"][0]["author_username"], "alice");

    let path = format!("/posts/{post_id}");
    let res = request()
        .method("PUT")
        .path(&path)
        .header("cookie", &bob)
        .json(&json!({ "title": "hijack", "body": "" }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = request()
        .method("DELETE")
        .path(&path)
        .header("cookie", &bob)
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = request()
        .method("PUT")
        .path("/posts/9999")
        .header("cookie", &bob)
        .json(&json!({ "title": "x" }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = request()
        .method("PUT")
        .path(&path)
        .header("cookie", &alice)
        .json(&json!({ "title": "", "body": "" }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&res)["error"]["message"], "Title is required.");

    let res = request()
        .method("PUT")
        .path(&path)
        .header("cookie", &alice)
        .json(&json!({ "title": "updated" }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = request()
        .method("GET")
        .path(&format!("/posts/{post_id}/edit"))
        .header("cookie", &alice)
        .reply(&api)
        .await;
    assert_eq!(body(&res)["data"]["title"], "updated");
    assert_eq!(body(&res)["data"]["body"], "");

    let res = request()
        .method("DELETE")
        .path(&path)
        .header("cookie", &alice)
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = request().method("GET").path(&path).reply(&api).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logout_clears_cookie_and_session() {
    let server = server();
    let api = routes(server.clone()).recover(recover_error);
    let cookie = sign_in(&server, "test", "test").await;

    let res = request()
        .method("POST")
        .path("/auth/logout")
        .header("cookie", &cookie)
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = res.headers()["set-cookie"].to_str().unwrap();
    assert!(cleared.starts_with("session=;"));
    assert!(cleared.contains("Max-Age=0"));

    // A replayed cookie no longer identifies anyone.
    let res = request()
        .method("GET")
        .path("/auth/me")
        .header("cookie", &cookie)
        .reply(&api)
        .await;
    assert!(body(&res)["data"].is_null());
}
