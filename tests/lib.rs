use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use sneaker_store::{
    app,
    config::UnmatchedRoute,
    router::{MatchMode, Router},
    AppState, FileStore, JsonStore, MemoryStore,
};
use std::{fs, path::Path};
use tempfile::TempDir;
use tower::ServiceExt;

fn file_state(path: &Path, mode: MatchMode, unmatched: UnmatchedRoute) -> AppState {
    let store = FileStore::open(path).unwrap();
    AppState::new(
        Box::new(store),
        Router::new("/sneakers", mode),
        unmatched,
    )
}

fn default_state(path: &Path) -> AppState {
    file_state(path, MatchMode::Segment, UnmatchedRoute::NotFound)
}

async fn send(state: &AppState, method: Method, uri: &str, body: Option<&str>) -> Response {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_owned())))
        .unwrap();
    app(state.clone()).oneshot(req).await.unwrap()
}

async fn json_body(res: Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_cors(res: &Response) {
    let h = res.headers();
    assert_eq!(h["access-control-allow-origin"], "*");
    assert_eq!(
        h["access-control-allow-methods"],
        "GET, POST, DELETE, OPTIONS"
    );
    assert_eq!(h["access-control-allow-headers"], "Content-Type");
    assert_eq!(h["content-type"], "application/json");
}

#[tokio::test]
async fn empty_store_lists_empty_catalog() {
    let dir = TempDir::new().unwrap();
    let state = default_state(&dir.path().join("db.json"));
    for uri in ["/sneakers", "/sneakers/", "/sneakers/items"] {
        let res = send(&state, Method::GET, uri, None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_cors(&res);
        assert_eq!(json_body(res).await, json!([]));
    }
}

#[tokio::test]
async fn cart_append_and_remove() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("db.json");
    let state = default_state(&db);

    let res = send(
        &state,
        Method::POST,
        "/sneakers/cart",
        Some(r#"{"id": 7, "name": "Air Max"}"#),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, json!([{"id": 7, "name": "Air Max"}]));

    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&db).unwrap()).unwrap();
    assert_eq!(on_disk["cart"], json!([{"id": 7, "name": "Air Max"}]));

    let res = send(&state, Method::DELETE, "/sneakers/cart/7", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, json!([]));

    let res = send(&state, Method::DELETE, "/sneakers/cart/7", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_cors(&res);
    assert_eq!(json_body(res).await, json!({"message": "Items Not Found"}));
}

#[tokio::test]
async fn append_then_list_every_collection() {
    let dir = TempDir::new().unwrap();
    let state = default_state(&dir.path().join("db.json"));
    for name in ["favorites", "orders", "cart"] {
        let item = json!({"id": 3, "title": "Puma", "price": 99.5, "tags": ["a"]});
        let uri = format!("/sneakers/{name}");
        let res = send(&state, Method::POST, &uri, Some(&item.to_string())).await;
        assert_eq!(res.status(), StatusCode::OK);

        let first = json_body(send(&state, Method::GET, &uri, None).await).await;
        let second = json_body(send(&state, Method::GET, &uri, None).await).await;
        assert_eq!(first.as_array().unwrap().last(), Some(&item));
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn removing_unknown_id_keeps_file_untouched() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("db.json");
    fs::write(&db, r#"{"items":[],"favorites":[{"id":1},{"id":1}],"orders":[],"cart":[]}"#)
        .unwrap();
    let state = default_state(&db);
    let before = fs::read_to_string(&db).unwrap();

    for uri in ["/sneakers/favorites/2", "/sneakers/favorites/abc", "/sneakers/favorites"] {
        let res = send(&state, Method::DELETE, uri, None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }
    assert_eq!(fs::read_to_string(&db).unwrap(), before);

    let res = send(&state, Method::DELETE, "/sneakers/favorites/1", None).await;
    assert_eq!(json_body(res).await, json!([{"id": 1}]));
}

#[tokio::test]
async fn preflight_is_empty_ok() {
    let dir = TempDir::new().unwrap();
    let state = default_state(&dir.path().join("db.json"));
    let res = send(&state, Method::OPTIONS, "/whatever/path", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_cors(&res);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn large_bodies_are_accepted() {
    let dir = TempDir::new().unwrap();
    let state = default_state(&dir.path().join("db.json"));
    let item = json!({"id": 9, "blob": "x".repeat(3 * 1024 * 1024)});
    let body = item.to_string();

    let res = send(&state, Method::POST, "/sneakers/cart", Some(&body)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_cors(&res);
    let cart = json_body(res).await;
    assert_eq!(cart.as_array().and_then(|c| c.last()), Some(&item));

    let res = send(&state, Method::OPTIONS, "/sneakers/cart", Some(&body)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_cors(&res);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn unmatched_route_defaults_to_not_found() {
    let dir = TempDir::new().unwrap();
    let state = default_state(&dir.path().join("db.json"));
    let res = send(&state, Method::GET, "/sneakers/unknown-path", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_cors(&res);
    assert_eq!(json_body(res).await, json!({"message": "Not Found"}));
}

#[tokio::test]
async fn unmatched_route_can_answer_null() {
    let dir = TempDir::new().unwrap();
    let state = file_state(
        &dir.path().join("db.json"),
        MatchMode::Segment,
        UnmatchedRoute::Null,
    );
    for (method, uri) in [
        (Method::GET, "/sneakers/unknown-path"),
        (Method::PUT, "/sneakers/cart"),
        (Method::POST, "/sneakers/items"),
    ] {
        let res = send(&state, method, uri, Some("{}")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_cors(&res);
        assert_eq!(json_body(res).await, Value::Null);
    }
}

#[tokio::test]
async fn malformed_body_is_a_server_error() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("db.json");
    let state = default_state(&db);
    for body in ["{\"id\": 1", "", "[1, 2]"] {
        let res = send(&state, Method::POST, "/sneakers/orders", Some(body)).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&res);
        assert_eq!(json_body(res).await, json!({"message": "Server Error"}));
    }
    let doc = FileStore::open(&db).unwrap().load().unwrap();
    assert_eq!(doc["orders"], json!([]));
}

#[tokio::test]
async fn corrupt_store_is_a_server_error() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("db.json");
    let state = default_state(&db);
    fs::write(&db, "{broken").unwrap();
    let res = send(&state, Method::GET, "/sneakers/items", None).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(res).await, json!({"message": "Server Error"}));
}

#[tokio::test]
async fn legacy_substring_routing() {
    let dir = TempDir::new().unwrap();
    let state = file_state(
        &dir.path().join("db.json"),
        MatchMode::Substring,
        UnmatchedRoute::Null,
    );
    let res = send(&state, Method::GET, "/sneakers/favorites", None).await;
    assert_eq!(json_body(res).await, json!([]));

    // the literal segment names a collection that does not exist
    let res = send(&state, Method::DELETE, "/sneakers/favoritesXYZ/1", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await, json!({"message": "Items Not Found"}));

    let res = send(&state, Method::GET, "/sneakers/", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, Value::Null);
}

#[tokio::test]
async fn query_string_is_ignored() {
    let store = MemoryStore::from_json(r#"{"items":[{"id":1,"title":"Nike"}]}"#).unwrap();
    let state = AppState::new(
        Box::new(store),
        Router::new("/sneakers", MatchMode::Segment),
        UnmatchedRoute::NotFound,
    );
    let res = send(&state, Method::GET, "/sneakers/items?sort=price", None).await;
    assert_eq!(json_body(res).await, json!([{"id": 1, "title": "Nike"}]));
}

#[tokio::test]
async fn concurrent_appends_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("db.json");
    let state = default_state(&db);
    let mut tasks = vec![];
    for i in 0..20 {
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            let body = json!({ "id": i }).to_string();
            let res = send(&state, Method::POST, "/sneakers/orders", Some(&body)).await;
            assert_eq!(res.status(), StatusCode::OK);
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }
    let res = send(&state, Method::GET, "/sneakers/orders", None).await;
    assert_eq!(json_body(res).await.as_array().unwrap().len(), 20);
}

#[test]
fn seed_database_is_canonical() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("db.json");
    let content = fs::read_to_string(path).unwrap();
    let doc: Value = serde_json::from_str(&content).unwrap();
    for name in ["items", "favorites", "orders", "cart"] {
        assert!(doc[name].is_array(), "{name}");
    }
    assert!(doc["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|item| item["id"].is_number()));
}
