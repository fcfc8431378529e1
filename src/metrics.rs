//! Metrics and tracing instrumentation.
//!
//! With the `metrics` feature, OpenTelemetry instruments are exported into a Prometheus
//! registry and rendered on `GET /metrics`. With the `tracing` feature, store queries and
//! HTTP requests run inside `tracing` spans.

#[cfg(feature = "metrics")]
pub use self::prometheus_metrics::{CatalogMetrics, METRICS};

#[cfg(feature = "metrics")]
mod prometheus_metrics {
    use once_cell::sync::Lazy;
    use opentelemetry::metrics::{Counter, Histogram, MeterProvider as _};
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Encoder, Registry, TextEncoder};
    use std::time::Duration;

    pub static METRICS: Lazy<CatalogMetrics> = Lazy::new(CatalogMetrics::init);

    pub struct CatalogMetrics {
        registry: Registry,
        _provider: SdkMeterProvider,
        pub requests_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub store_errors_total: Counter<u64>,
        pub connect_duration: Histogram<f64>,
    }

    impl CatalogMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let provider = match opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
            {
                Ok(exporter) => SdkMeterProvider::builder().with_reader(exporter).build(),
                Err(e) => {
                    log::warn!("prometheus exporter unavailable, metrics will not be exported: {e}");
                    SdkMeterProvider::builder().build()
                }
            };
            let meter = provider.meter("gemstock");

            let requests_total = meter
                .u64_counter("gemstock_requests_total")
                .with_description("Catalog requests by operation and outcome")
                .build();

            let query_duration = meter
                .f64_histogram("gemstock_store_query_duration_seconds")
                .with_description("Duration of store queries")
                .build();

            let store_errors_total = meter
                .u64_counter("gemstock_store_errors_total")
                .with_description("Store queries that returned an error")
                .build();

            let connect_duration = meter
                .f64_histogram("gemstock_store_connect_seconds")
                .with_description("Time spent establishing the store connection")
                .build();

            Self {
                registry,
                _provider: provider,
                requests_total,
                query_duration,
                store_errors_total,
                connect_duration,
            }
        }

        pub fn record_request(&self, operation: &'static str, outcome: &'static str) {
            self.requests_total.add(
                1,
                &[
                    KeyValue::new("operation", operation),
                    KeyValue::new("outcome", outcome),
                ],
            );
        }

        pub fn record_query(&self, statement: &'static str, elapsed: Duration) {
            self.query_duration.record(
                elapsed.as_secs_f64(),
                &[KeyValue::new("statement", statement)],
            );
        }

        pub fn record_store_error(&self, statement: &'static str) {
            self.store_errors_total
                .add(1, &[KeyValue::new("statement", statement)]);
        }

        pub fn record_connect(&self, elapsed: Duration) {
            self.connect_duration.record(elapsed.as_secs_f64(), &[]);
        }

        /// Prometheus text exposition of everything recorded so far.
        pub fn render(&self) -> Result<Vec<u8>, prometheus::Error> {
            let mut buffer = Vec::new();
            TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
            Ok(buffer)
        }
    }

}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    /// Span around a single store statement
    pub fn query_span(statement: &'static str) -> Span {
        info_span!("store.query", db.system = "postgresql", db.operation = statement)
    }

    /// Span around one HTTP request
    pub fn request_span(method: &str, path: &str) -> Span {
        info_span!("http.request", http.method = method, http.path = path)
    }
}
