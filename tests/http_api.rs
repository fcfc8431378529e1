//! End-to-end HTTP tests: a real server on localhost backed by the in-memory store.

use gemstock::{serve, CatalogService, MemoryProductStore};
use serde_json::Value;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

static NEXT_PORT: AtomicU16 = AtomicU16::new(38_470);

/// Start a server on a fresh port and wait until it answers `/health`.
fn start_server() -> (String, Arc<CatalogService<MemoryProductStore>>) {
    let port = NEXT_PORT.fetch_add(1, Ordering::SeqCst);
    let service = Arc::new(CatalogService::new(MemoryProductStore::new()));
    let addr = format!("127.0.0.1:{port}");
    // Dropping the handle detaches the server; it runs until the test process exits.
    serve(Arc::clone(&service), addr.as_str()).expect("server should bind");

    let base = format!("http://{addr}");
    for _ in 0..50 {
        if ureq::get(&format!("{base}/health")).call().is_ok() {
            return (base, service);
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server on {addr} never became healthy");
}

/// Send a request and return status and body, treating 4xx/5xx as ordinary responses.
fn send(request: ureq::Request, body: Option<&str>) -> (u16, String) {
    let result = match body {
        Some(body) => request
            .set("Content-Type", "application/json")
            .send_string(body),
        None => request.call(),
    };
    match result {
        Ok(response) => {
            let status = response.status();
            (status, response.into_string().unwrap())
        }
        Err(ureq::Error::Status(status, response)) => (status, response.into_string().unwrap()),
        Err(e) => panic!("transport error: {e}"),
    }
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("invalid JSON {body:?}: {e}"))
}

#[test]
fn test_product_lifecycle() {
    let (base, _service) = start_server();
    let products = format!("{base}/api/products");

    let (status, body) = send(ureq::get(&products), None);
    assert_eq!(status, 200);
    assert_eq!(json(&body), Value::Array(vec![]));

    let ring = r#"{"name":"Solitaire ring","sku":"RING-100","price":1250.5,"weight":3.2,"purity":0.75,"gemstone_id":7}"#;
    let (status, body) = send(ureq::post(&products), Some(ring));
    assert_eq!(status, 201);
    let created = json(&body);
    let id = created["id"].as_i64().expect("create returns the new id");
    assert!(created["message"].is_string());

    let item = format!("{products}/{id}");
    let (status, body) = send(ureq::get(&item), None);
    assert_eq!(status, 200);
    let product = json(&body);
    assert_eq!(product["id"], id);
    assert_eq!(product["sku"], "RING-100");
    assert_eq!(product["price"], 1250.5);
    assert_eq!(product["gemstone_id"], 7);
    assert_eq!(product["stock_quantity"], 0);
    assert_eq!(product["min_stock_alert"], 1);
    assert_eq!(product["is_active"], true);
    assert_eq!(product["barcode"], Value::Null);

    let replacement = r#"{"name":"Solitaire ring","sku":"RING-100","price":1100}"#;
    let (status, body) = send(ureq::put(&item), Some(replacement));
    assert_eq!(status, 204);
    assert!(body.is_empty());

    let (_, body) = send(ureq::get(&item), None);
    let product = json(&body);
    assert_eq!(product["price"], 1100.0);
    assert_eq!(product["gemstone_id"], Value::Null);
    assert_eq!(product["weight"], Value::Null);

    let (status, _) = send(ureq::delete(&item), None);
    assert_eq!(status, 204);
    let (status, body) = send(ureq::get(&item), None);
    assert_eq!(status, 404);
    assert!(json(&body)["message"].is_string());
    let (status, _) = send(ureq::delete(&item), None);
    assert_eq!(status, 404);
}

#[test]
fn test_rejections() {
    let (base, service) = start_server();
    let products = format!("{base}/api/products");

    let (status, body) = send(ureq::post(&products), Some(r#"{"name":"Band","price":20}"#));
    assert_eq!(status, 400);
    assert!(json(&body)["message"].as_str().unwrap().contains("sku"));

    let (status, _) = send(ureq::post(&products), Some("{broken"));
    assert_eq!(status, 400);

    let (status, _) = send(ureq::get(&format!("{products}/abc")), None);
    assert_eq!(status, 400);
    let (status, _) = send(ureq::delete(&format!("{products}/abc")), None);
    assert_eq!(status, 400);

    let band = r#"{"name":"Band","sku":"BAND-1","price":20}"#;
    assert_eq!(send(ureq::post(&products), Some(band)).0, 201);
    let (status, body) = send(ureq::post(&products), Some(band));
    assert_eq!(status, 409);
    assert!(json(&body)["message"].as_str().unwrap().contains("sku"));

    assert_eq!(service.list().unwrap().len(), 1);
}

#[test]
fn test_update_into_existing_sku_conflicts() {
    let (base, _service) = start_server();
    let products = format!("{base}/api/products");

    send(ureq::post(&products), Some(r#"{"name":"A","sku":"A-1","price":1}"#));
    let (_, body) = send(ureq::post(&products), Some(r#"{"name":"B","sku":"B-1","price":2}"#));
    let b_id = json(&body)["id"].as_i64().unwrap();

    let (status, _) = send(
        ureq::put(&format!("{products}/{b_id}")),
        Some(r#"{"name":"B","sku":"A-1","price":2}"#),
    );
    assert_eq!(status, 409);

    let (_, body) = send(ureq::get(&format!("{products}/{b_id}")), None);
    assert_eq!(json(&body)["sku"], "B-1");
}

#[test]
fn test_unknown_route_and_health() {
    let (base, service) = start_server();

    let (status, _) = send(ureq::get(&format!("{base}/api/unknown")), None);
    assert_eq!(status, 404);

    let (status, _) = send(ureq::get(&format!("{base}/health")), None);
    assert_eq!(status, 200);

    service.shutdown();
    let (status, _) = send(ureq::get(&format!("{base}/health")), None);
    assert_eq!(status, 503);
    let (status, body) = send(ureq::get(&format!("{base}/api/products")), None);
    assert_eq!(status, 500);
    assert!(!body.contains("shut down"));
}
