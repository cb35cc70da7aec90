//! End-to-end behaviour of the humans/zombies API, driven in process
//! through `Router::handle`.

use std::sync::Arc;

use serde_json::{Value, json};

use brains::{
    ApiVersion, Config, Method, Request, Response, Router, Status, Stores, app,
};

const V1: &str = "application/vnd.zombies.v1+json";

fn api() -> Router {
    app::router(&Config::default(), &Stores::default())
}

fn get(path: &str) -> Request {
    Request::builder(Method::Get, path).build()
}

fn post(path: &str, body: Value) -> Request {
    Request::builder(Method::Post, path).json(&body).build()
}

fn body(res: &Response) -> Value {
    serde_json::from_slice(res.body()).expect("json body")
}

fn names(res: &Response) -> Vec<String> {
    body(res)
        .as_array()
        .expect("array body")
        .iter()
        .map(|h| h["name"].as_str().unwrap_or_default().to_owned())
        .collect()
}

#[tokio::test]
async fn lists_humans_by_brain_type() {
    let api = api();
    api.handle(post("/humans", json!({ "name": "Allan", "brain_type": "large" }))).await;
    api.handle(post("/humans", json!({ "name": "John", "brain_type": "small" }))).await;

    let res = api.handle(get("/humans?brain_type=small")).await;
    assert_eq!(res.status_code(), Status::Ok);
    assert_eq!(names(&res), vec!["John"]);

    let res = api.handle(get("/humans")).await;
    assert_eq!(names(&res), vec!["Allan", "John"]);
}

#[tokio::test]
async fn unknown_query_parameters_do_not_filter() {
    let api = api();
    api.handle(post("/humans", json!({ "name": "Ash" }))).await;
    let res = api.handle(get("/humans?page=2")).await;
    assert_eq!(names(&res), vec!["Ash"]);
}

#[tokio::test]
async fn created_human_can_be_shown() {
    let api = api();
    let res = api.handle(post("/humans", json!({ "name": "John", "brain_type": "small" }))).await;
    assert_eq!(res.status_code(), Status::Created);
    let created = body(&res);
    let id = created["id"].as_u64().expect("numeric id");
    assert_eq!(res.header("location"), Some(format!("/humans/{id}").as_str()));

    let res = api.handle(get(&format!("/humans/{id}"))).await;
    assert_eq!(res.status_code(), Status::Ok);
    assert_eq!(body(&res), json!({ "id": id, "name": "John", "brain_type": "small" }));
    assert_eq!(body(&res), created);
}

#[tokio::test]
async fn wrapped_create_body_is_accepted() {
    let api = api();
    let res = api.handle(post("/zombies", json!({ "zombie": { "name": "Ash", "weapon": "axe" } }))).await;
    assert_eq!(res.status_code(), Status::Created);
    assert_eq!(body(&res)["weapon"], "axe");
}

#[tokio::test]
async fn create_without_name_is_unprocessable() {
    let api = api();
    let res = api.handle(post("/humans", json!({}))).await;
    assert_eq!(res.status_code(), Status::UnprocessableContent);
    assert_eq!(body(&res), json!({ "name": "required" }));

    let res = api.handle(Request::builder(Method::Post, "/humans").build()).await;
    assert_eq!(res.status_code(), Status::UnprocessableContent);
    assert_eq!(body(&res), json!({ "name": "required" }));
}

#[tokio::test]
async fn validation_lists_every_field() {
    let api = api();
    let res = api.handle(post("/zombies", json!({ "weapon": 12, "brain_type": "small" }))).await;
    assert_eq!(res.status_code(), Status::UnprocessableContent);
    assert_eq!(
        body(&res),
        json!({
            "name": "required",
            "weapon": "must be a string",
            "brain_type": "is not a known field",
        }),
    );
}

#[tokio::test]
async fn show_update_delete_unknown_ids() {
    let api = api();
    assert_eq!(api.handle(get("/humans/99")).await.status_code(), Status::NotFound);
    assert_eq!(api.handle(get("/humans/abc")).await.status_code(), Status::NotFound);

    let patch = Request::builder(Method::Patch, "/humans/99").json(&json!({ "name": "x" })).build();
    assert_eq!(api.handle(patch).await.status_code(), Status::NotFound);

    // The id is looked up before the body is read.
    let patch = Request::builder(Method::Patch, "/humans/99")
        .header("content-type", "application/json")
        .body("{\"name\":")
        .build();
    assert_eq!(api.handle(patch).await.status_code(), Status::NotFound);

    let delete = Request::builder(Method::Delete, "/humans/99").build();
    let res = api.handle(delete).await;
    assert_eq!(res.status_code(), Status::NotFound);
    assert_eq!(body(&res), json!({ "error": "not found" }));
}

#[tokio::test]
async fn update_then_delete_twice() {
    let api = api();
    let res = api.handle(post("/humans", json!({ "name": "Ash", "brain_type": "large" }))).await;
    let id = body(&res)["id"].as_u64().unwrap();
    let member = format!("/humans/{id}");

    let put = Request::builder(Method::Put, &member).json(&json!({ "brain_type": "small" })).build();
    let res = api.handle(put).await;
    assert_eq!(res.status_code(), Status::Ok);
    assert_eq!(body(&res), json!({ "id": id, "name": "Ash", "brain_type": "small" }));

    let patch = Request::builder(Method::Patch, &member).json(&json!({ "name": "" })).build();
    let res = api.handle(patch).await;
    assert_eq!(res.status_code(), Status::UnprocessableContent);

    let delete = || Request::builder(Method::Delete, &member).build();
    let res = api.handle(delete()).await;
    assert_eq!(res.status_code(), Status::NoContent);
    assert!(res.body().is_empty());
    assert_eq!(api.handle(delete()).await.status_code(), Status::NotFound);
}

#[tokio::test]
async fn malformed_and_non_json_bodies() {
    let api = api();
    let res = api
        .handle(
            Request::builder(Method::Post, "/humans")
                .header("content-type", "application/json")
                .body("{\"name\":")
                .build(),
        )
        .await;
    assert_eq!(res.status_code(), Status::BadRequest);

    let res = api
        .handle(
            Request::builder(Method::Post, "/humans")
                .header("content-type", "text/plain")
                .body("John")
                .build(),
        )
        .await;
    assert_eq!(res.status_code(), Status::UnsupportedMediaType);
}

#[tokio::test]
async fn renders_xml_on_request() {
    let api = api();
    api.handle(post("/humans", json!({ "name": "John", "brain_type": "small" }))).await;
    let res = api
        .handle(Request::builder(Method::Get, "/humans").header("accept", "application/xml").build())
        .await;
    assert_eq!(res.status_code(), Status::Ok);
    assert_eq!(res.header("content-type"), Some("application/xml"));
    let xml = String::from_utf8(res.body().to_vec()).unwrap();
    assert!(xml.contains("<humans type=\"array\"><human>"));
    assert!(xml.contains("<name>John</name>"));
}

#[tokio::test]
async fn xml_replaces_control_characters() {
    let api = api();
    let res = api.handle(post("/humans", json!({ "name": "a\u{1}b" }))).await;
    assert_eq!(res.status_code(), Status::Created);
    let res = api
        .handle(Request::builder(Method::Get, "/humans").header("accept", "application/xml").build())
        .await;
    let xml = String::from_utf8(res.body().to_vec()).unwrap();
    assert!(xml.contains("<name>a\u{fffd}b</name>"));
    assert!(!xml.contains('\u{1}'));

    // JSON keeps the value as stored.
    let res = api.handle(get("/humans")).await;
    assert_eq!(names(&res), vec!["a\u{1}b"]);
}

#[tokio::test]
async fn head_answers_like_get_without_body() {
    let api = api();
    api.handle(post("/humans", json!({ "name": "Ash" }))).await;
    let full = api.handle(get("/humans")).await;

    let res = api.handle(Request::builder(Method::Head, "/humans").build()).await;
    assert_eq!(res.status_code(), Status::Ok);
    assert!(res.body().is_empty());
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(res.header("content-length"), Some(full.body().len().to_string().as_str()));

    let res = api.handle(Request::builder(Method::Head, "/humans/42").build()).await;
    assert_eq!(res.status_code(), Status::NotFound);
    assert!(res.body().is_empty());
}

#[tokio::test]
async fn unsupported_accept_is_not_acceptable() {
    let res = api()
        .handle(Request::builder(Method::Get, "/humans").header("accept", "text/html").build())
        .await;
    assert_eq!(res.status_code(), Status::NotAcceptable);
    assert_eq!(res.body(), b"not acceptable");
}

#[tokio::test]
async fn localizes_messages_per_request() {
    let mut config = Config::default();
    config
        .translations
        .entry("pt-BR".to_owned())
        .or_default()
        .insert("required".to_owned(), "obrigatório".to_owned());
    let api = app::router(&config, &Stores::default());

    let res = api
        .handle(
            Request::builder(Method::Post, "/humans")
                .header("accept-language", "pt-BR")
                .json(&json!({}))
                .build(),
        )
        .await;
    assert_eq!(res.header("content-language"), Some("pt-BR"));
    assert_eq!(body(&res), json!({ "name": "obrigatório" }));

    let res = api.handle(post("/humans", json!({}))).await;
    assert_eq!(res.header("content-language"), Some("en"));
    assert_eq!(body(&res), json!({ "name": "required" }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_keep_their_own_locale() {
    let mut config = Config::default();
    config
        .translations
        .insert("es".to_owned(), [("required".to_owned(), "obligatorio".to_owned())].into());
    let api = Arc::new(app::router(&config, &Stores::default()));

    let tasks: Vec<_> = (0..64)
        .map(|i| {
            let api = Arc::clone(&api);
            let locale = if i % 2 == 0 { "es" } else { "en" };
            tokio::spawn(async move {
                let res = api
                    .handle(
                        Request::builder(Method::Post, "/humans")
                            .header("accept-language", locale)
                            .json(&json!({}))
                            .build(),
                    )
                    .await;
                (locale, body(&res)["name"].as_str().unwrap_or_default().to_owned())
            })
        })
        .collect();

    for task in tasks {
        let (locale, message) = task.await.unwrap();
        let expected = if locale == "es" { "obligatorio" } else { "required" };
        assert_eq!(message, expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_are_all_visible() {
    let api = Arc::new(api());
    let tasks: Vec<_> = (0..50)
        .map(|i| {
            let api = Arc::clone(&api);
            tokio::spawn(async move {
                api.handle(post("/humans", json!({ "name": format!("h{i}") }))).await.status_code()
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), Status::Created);
    }
    let res = api.handle(get("/humans")).await;
    assert_eq!(names(&res).len(), 50);
}

// ── Version routing ───────────────────────────────────────────────────────────

fn versioned() -> Config {
    Config {
        versions: vec![ApiVersion::new("v1"), ApiVersion::new("v2").as_default()],
        ..Config::default()
    }
}

#[tokio::test]
async fn vendor_accept_selects_explicit_version() {
    let api = app::router(&versioned(), &Stores::default());
    let req = Request::builder(Method::Get, "/humans").header("accept", V1).build();
    assert_eq!(api.select(&req).map(ApiVersion::identifier), Some("v1"));
    assert_eq!(api.handle(req).await.status_code(), Status::Ok);
}

#[tokio::test]
async fn missing_accept_selects_default_version() {
    let api = app::router(&versioned(), &Stores::default());
    assert_eq!(api.select(&get("/humans")).map(ApiVersion::identifier), Some("v2"));
}

#[tokio::test]
async fn versions_share_stores() {
    let api = app::router(&versioned(), &Stores::default());
    let create = Request::builder(Method::Post, "/humans")
        .header("accept", V1)
        .json(&json!({ "name": "John" }))
        .build();
    assert_eq!(api.handle(create).await.status_code(), Status::Created);
    assert_eq!(names(&api.handle(get("/humans")).await), vec!["John"]);
}

#[tokio::test]
async fn no_matching_version_is_not_found() {
    let config = Config { versions: vec![ApiVersion::new("v1")], ..Config::default() };
    let api = app::router(&config, &Stores::default());

    let res = api.handle(get("/humans")).await;
    assert_eq!(res.status_code(), Status::NotFound);
    assert_eq!(body(&res), json!({ "error": "not found" }));

    let req = Request::builder(Method::Get, "/humans")
        .header("accept", "application/vnd.zombies.v3+json")
        .build();
    assert_eq!(api.handle(req).await.status_code(), Status::NotFound);

    let req = Request::builder(Method::Get, "/humans").header("accept", V1).build();
    assert_eq!(api.handle(req).await.status_code(), Status::Ok);
}

#[tokio::test]
async fn health_probes_ignore_versions_and_host() {
    let config = Config {
        versions: vec![ApiVersion::new("v1")],
        host: Some("api.example.com".to_owned()),
        ..Config::default()
    };
    let api = app::router(&config, &Stores::default());
    let res = api.handle(get("/healthz")).await;
    assert_eq!(res.status_code(), Status::Ok);
    assert_eq!(res.body(), b"ok");
    assert_eq!(api.handle(get("/readyz")).await.body(), b"ready");

    let plain = Request::builder(Method::Get, "/healthz").header("accept", "text/plain").build();
    let res = api.handle(plain).await;
    assert_eq!(res.status_code(), Status::Ok);
    assert_eq!(res.body(), b"ok");
}

#[tokio::test]
async fn host_constraint_applies_to_api_routes() {
    let config = Config { host: Some("api.example.com".to_owned()), ..Config::default() };
    let api = app::router(&config, &Stores::default());

    let req = Request::builder(Method::Get, "/humans").header("host", "api.example.com").build();
    assert_eq!(api.handle(req).await.status_code(), Status::Ok);

    let req = Request::builder(Method::Get, "/humans").header("host", "www.example.com").build();
    assert_eq!(api.handle(req).await.status_code(), Status::NotFound);
}
