//! HTTP adapter over `may_minihttp`.
//!
//! Routes:
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | `GET` | `/api/products` | list |
//! | `POST` | `/api/products` | create |
//! | `GET` | `/api/products/{id}` | get |
//! | `PUT` | `/api/products/{id}` | update (full replace) |
//! | `DELETE` | `/api/products/{id}` | delete |
//! | `GET` | `/health` | store health |
//! | `GET` | `/metrics` | Prometheus text (`metrics` feature) |
//!
//! Catalog results map onto [`Outcome`], and each outcome class has its own status code.
//! Store error details are logged here and never sent to the caller.

use crate::error::CatalogError;
use crate::model::ProductInput;
use crate::service::{CatalogService, WriteOutcome};
use crate::store::ProductStore;
use crate::validation::parse_id;
use may_minihttp::{HttpServer, HttpService, Request, Response};
use serde_json::{json, Value};
use std::io::{self, Read};
use std::net::ToSocketAddrs;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

const PRODUCTS_PATH: &str = "/api/products";

/// Caller-visible result of one request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 200 with a JSON body
    Payload(Value),
    /// 201 with a JSON body
    Created(Value),
    /// 204, nothing to return
    Empty,
    /// 404
    NotFound(String),
    /// 400
    InvalidInput(String),
    /// 409
    Conflict(String),
    /// 500; the detail stays in the logs
    Internal,
    /// 405
    MethodNotAllowed,
}

impl Outcome {
    /// HTTP status code and reason phrase
    pub fn status(&self) -> (usize, &'static str) {
        match self {
            Outcome::Payload(_) => (200, "OK"),
            Outcome::Created(_) => (201, "Created"),
            Outcome::Empty => (204, "No Content"),
            Outcome::NotFound(_) => (404, "Not Found"),
            Outcome::InvalidInput(_) => (400, "Bad Request"),
            Outcome::Conflict(_) => (409, "Conflict"),
            Outcome::Internal => (500, "Internal Server Error"),
            Outcome::MethodNotAllowed => (405, "Method Not Allowed"),
        }
    }

    /// Short label for metrics
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Payload(_) | Outcome::Created(_) => "ok",
            Outcome::Empty => "empty",
            Outcome::NotFound(_) => "not_found",
            Outcome::InvalidInput(_) => "invalid_input",
            Outcome::Conflict(_) => "conflict",
            Outcome::Internal => "internal",
            Outcome::MethodNotAllowed => "method_not_allowed",
        }
    }

    /// JSON body, if the outcome carries one
    pub fn body(&self) -> Option<Value> {
        match self {
            Outcome::Payload(v) | Outcome::Created(v) => Some(v.clone()),
            Outcome::Empty => None,
            Outcome::NotFound(msg) | Outcome::InvalidInput(msg) | Outcome::Conflict(msg) => {
                Some(json!({ "message": msg }))
            }
            Outcome::Internal => Some(json!({ "error": "internal server error" })),
            Outcome::MethodNotAllowed => Some(json!({ "message": "method not allowed" })),
        }
    }

    fn from_error(operation: &str, err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidInput(msg) => Outcome::InvalidInput(msg),
            CatalogError::Conflict(msg) => Outcome::Conflict(msg),
            CatalogError::Storage(e) => {
                log::error!("{operation} failed: {e}");
                Outcome::Internal
            }
        }
    }

    fn from_write(outcome: WriteOutcome, id: i64) -> Self {
        match outcome {
            WriteOutcome::Applied => Outcome::Empty,
            WriteOutcome::NotFound => Outcome::NotFound(format!("product {id} not found")),
        }
    }
}

/// Catalog operation a request resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Resolve a method and path to an operation plus the raw `id` segment.
///
/// `Ok(None)` means the path is not a catalog route; `Err(())` means it is one but the method
/// does not apply.
#[allow(clippy::result_unit_err)]
pub fn resolve<'p>(method: &str, path: &'p str) -> Result<Option<(Operation, Option<&'p str>)>, ()> {
    let path = path.split('?').next().unwrap_or_default().trim_end_matches('/');
    let Some(rest) = path.strip_prefix(PRODUCTS_PATH) else {
        return Ok(None);
    };

    if rest.is_empty() {
        return match method {
            "GET" => Ok(Some((Operation::List, None))),
            "POST" => Ok(Some((Operation::Create, None))),
            _ => Err(()),
        };
    }

    let Some(id) = rest.strip_prefix('/').filter(|id| !id.contains('/')) else {
        return Ok(None);
    };
    match method {
        "GET" => Ok(Some((Operation::Get, Some(id)))),
        "PUT" => Ok(Some((Operation::Update, Some(id)))),
        "DELETE" => Ok(Some((Operation::Delete, Some(id)))),
        _ => Err(()),
    }
}

/// Run one catalog operation and classify the result.
pub fn dispatch<S: ProductStore>(
    service: &CatalogService<S>,
    operation: Operation,
    raw_id: Option<&str>,
    body: &[u8],
) -> Outcome {
    let op = operation.name();
    let id = match raw_id.map(parse_id).transpose() {
        Ok(id) => id.unwrap_or_default(),
        Err(e) => return Outcome::from_error(op, e),
    };

    let result = match operation {
        Operation::List => service
            .list()
            .map(|products| Outcome::Payload(json!(products))),
        Operation::Get => service.get(id).map(|product| match product {
            Some(product) => Outcome::Payload(json!(product)),
            None => Outcome::NotFound(format!("product {id} not found")),
        }),
        Operation::Create => parse_body(body)
            .and_then(|input| service.create(input))
            .map(|new_id| Outcome::Created(json!({ "id": new_id, "message": "product created" }))),
        Operation::Update => parse_body(body)
            .and_then(|input| service.update(id, input))
            .map(|outcome| Outcome::from_write(outcome, id)),
        Operation::Delete => service
            .delete(id)
            .map(|outcome| Outcome::from_write(outcome, id)),
    };

    result.unwrap_or_else(|e| Outcome::from_error(op, e))
}

fn parse_body(body: &[u8]) -> Result<ProductInput, CatalogError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ProductInput::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| CatalogError::InvalidInput(format!("malformed JSON body: {e}")))
}

/// `may_minihttp` service serving the catalog
pub struct CatalogHttpService<S: ProductStore> {
    service: Arc<CatalogService<S>>,
}

impl<S: ProductStore> Clone for CatalogHttpService<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: ProductStore> CatalogHttpService<S> {
    pub fn new(service: Arc<CatalogService<S>>) -> Self {
        Self { service }
    }

    fn health(&self, res: &mut Response) {
        if self.service.is_healthy() {
            write_json(res, (200, "OK"), &json!({ "status": "ok" }));
        } else {
            write_json(res, (503, "Service Unavailable"), &json!({ "status": "unavailable" }));
        }
    }

    #[cfg(feature = "metrics")]
    fn metrics(&self, res: &mut Response) {
        match METRICS.render() {
            Ok(text) => {
                res.status_code(200, "OK");
                res.header("Content-Type: text/plain; version=0.0.4; charset=utf-8");
                res.body_vec(text);
            }
            Err(e) => {
                log::error!("failed to render metrics: {e}");
                write_outcome(res, &Outcome::Internal);
            }
        }
    }

    #[cfg(not(feature = "metrics"))]
    fn metrics(&self, res: &mut Response) {
        write_outcome(res, &Outcome::NotFound("metrics are disabled".to_string()));
    }
}

impl<S: ProductStore + 'static> HttpService for CatalogHttpService<S> {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let method = req.method().to_string();
        let path = req.path().to_string();

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::request_span(&method, &path).entered();

        res.header("Access-Control-Allow-Origin: *");

        if method == "OPTIONS" {
            res.status_code(204, "No Content");
            res.header("Access-Control-Allow-Methods: GET, POST, PUT, DELETE, OPTIONS");
            res.header("Access-Control-Allow-Headers: Content-Type");
            return Ok(());
        }

        match (method.as_str(), path.split('?').next().unwrap_or_default()) {
            ("GET", "/health") => {
                self.health(res);
                return Ok(());
            }
            ("GET", "/metrics") => {
                self.metrics(res);
                return Ok(());
            }
            _ => {}
        }

        let outcome = match resolve(&method, &path) {
            Ok(Some((operation, raw_id))) => {
                let mut body = Vec::new();
                req.body().read_to_end(&mut body)?;
                let outcome = dispatch(&self.service, operation, raw_id, &body);

                #[cfg(feature = "metrics")]
                METRICS.record_request(operation.name(), outcome.label());

                log::debug!("{method} {path} -> {}", outcome.status().0);
                outcome
            }
            Ok(None) => Outcome::NotFound(format!("no route for {path}")),
            Err(()) => Outcome::MethodNotAllowed,
        };

        write_outcome(res, &outcome);
        Ok(())
    }
}

fn write_outcome(res: &mut Response, outcome: &Outcome) {
    match outcome.body() {
        Some(body) => write_json(res, outcome.status(), &body),
        None => {
            let (code, reason) = outcome.status();
            res.status_code(code, reason);
        }
    }
}

fn write_json(res: &mut Response, (code, reason): (usize, &'static str), body: &Value) {
    res.status_code(code, reason);
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}

/// Start serving `service` on `addr`.
///
/// # Errors
///
/// Returns the bind error if the address cannot be listened on.
pub fn serve<S, A>(service: Arc<CatalogService<S>>, addr: A) -> io::Result<may::coroutine::JoinHandle<()>>
where
    S: ProductStore + 'static,
    A: ToSocketAddrs,
{
    HttpServer(CatalogHttpService::new(service)).start(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryProductStore;

    fn service() -> CatalogService<MemoryProductStore> {
        CatalogService::new(MemoryProductStore::new())
    }

    fn create(service: &CatalogService<MemoryProductStore>, sku: &str) -> i64 {
        let body = format!(r#"{{"name":"Chain","sku":"{sku}","price":30}}"#);
        match dispatch(service, Operation::Create, None, body.as_bytes()) {
            Outcome::Created(v) => v["id"].as_i64().unwrap(),
            other => panic!("create failed: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_routes() {
        assert_eq!(resolve("GET", "/api/products"), Ok(Some((Operation::List, None))));
        assert_eq!(resolve("POST", "/api/products/"), Ok(Some((Operation::Create, None))));
        assert_eq!(resolve("GET", "/api/products/5"), Ok(Some((Operation::Get, Some("5")))));
        assert_eq!(resolve("PUT", "/api/products/5?x=1"), Ok(Some((Operation::Update, Some("5")))));
        assert_eq!(resolve("DELETE", "/api/products/abc"), Ok(Some((Operation::Delete, Some("abc")))));
        assert_eq!(resolve("PATCH", "/api/products/5"), Err(()));
        assert_eq!(resolve("DELETE", "/api/products"), Err(()));
        assert_eq!(resolve("GET", "/api/products/5/extra"), Ok(None));
        assert_eq!(resolve("GET", "/api/productsx"), Ok(None));
        assert_eq!(resolve("GET", "/api/backup/download/1"), Ok(None));
    }

    #[test]
    fn test_outcome_statuses_are_distinct() {
        let outcomes = [
            Outcome::Payload(json!([])),
            Outcome::Empty,
            Outcome::NotFound(String::new()),
            Outcome::InvalidInput(String::new()),
            Outcome::Conflict(String::new()),
            Outcome::Internal,
        ];
        let mut codes: Vec<usize> = outcomes.iter().map(|o| o.status().0).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes, vec![200, 204, 400, 404, 409, 500]);
    }

    #[test]
    fn test_create_then_get() {
        let service = service();
        let id = create(&service, "CH-1");
        match dispatch(&service, Operation::Get, Some(&id.to_string()), b"") {
            Outcome::Payload(v) => {
                assert_eq!(v["sku"], "CH-1");
                assert_eq!(v["stock_quantity"], 0);
                assert!(v["created_at"].is_string());
            }
            other => panic!("get failed: {other:?}"),
        }
    }

    #[test]
    fn test_unparsable_id_is_invalid_input() {
        let service = service();
        for op in [Operation::Get, Operation::Update, Operation::Delete] {
            let outcome = dispatch(&service, op, Some("abc"), b"{}");
            assert_eq!(outcome.status().0, 400, "{op:?}");
        }
    }

    #[test]
    fn test_missing_rows_are_not_found() {
        let service = service();
        assert_eq!(dispatch(&service, Operation::Get, Some("9"), b"").status().0, 404);
        assert_eq!(dispatch(&service, Operation::Delete, Some("9"), b"").status().0, 404);
        let body = br#"{"name":"Chain","sku":"CH-9","price":30}"#;
        assert_eq!(dispatch(&service, Operation::Update, Some("9"), body).status().0, 404);
    }

    #[test]
    fn test_update_and_delete_are_empty_success() {
        let service = service();
        let id = create(&service, "CH-2").to_string();
        let body = br#"{"name":"Chain 2","sku":"CH-2","price":35}"#;
        assert_eq!(dispatch(&service, Operation::Update, Some(&id), body), Outcome::Empty);
        assert_eq!(dispatch(&service, Operation::Delete, Some(&id), b""), Outcome::Empty);
    }

    #[test]
    fn test_duplicate_sku_is_conflict() {
        let service = service();
        create(&service, "CH-3");
        let body = br#"{"name":"Other","sku":"CH-3","price":10}"#;
        assert_eq!(dispatch(&service, Operation::Create, None, body).status().0, 409);
    }

    #[test]
    fn test_bad_bodies_are_invalid_input() {
        let service = service();
        assert_eq!(dispatch(&service, Operation::Create, None, b"{not json").status().0, 400);
        assert_eq!(dispatch(&service, Operation::Create, None, b"").status().0, 400);
        let zero_price = br#"{"name":"Chain","sku":"CH-4","price":0}"#;
        assert_eq!(dispatch(&service, Operation::Create, None, zero_price).status().0, 400);
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_storage_failure_hides_detail() {
        let service = service();
        service.shutdown();
        let outcome = dispatch(&service, Operation::List, None, b"");
        assert_eq!(outcome, Outcome::Internal);
        let body = outcome.body().unwrap().to_string();
        assert!(!body.contains("shut down"));
    }
}
