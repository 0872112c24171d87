//! # Metrics
//!
//! Prometheus registry for the HTTP layer, exposed at `GET /metrics` in the
//! OpenMetrics text format.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::time::Duration;

pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    pub route: String,
    pub status: String,
}

fn latency_histogram() -> Histogram {
    Histogram::new(exponential_buckets(0.001, 2.0, 14))
}

pub struct Metrics {
    registry: Registry,
    requests: Family<RequestLabels, Counter>,
    latency: Family<RequestLabels, Histogram, fn() -> Histogram>,
    rate_limited_actors: Gauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("forum");
        let requests = Family::<RequestLabels, Counter>::default();
        let latency = Family::<RequestLabels, Histogram, fn() -> Histogram>::new_with_constructor(
            latency_histogram,
        );
        let rate_limited_actors = Gauge::default();

        registry.register("http_requests", "Handled HTTP requests", requests.clone());
        registry.register(
            "http_request_duration_seconds",
            "HTTP request latency",
            latency.clone(),
        );
        registry.register(
            "rate_limiter_entries",
            "Actor/action pairs currently tracked by the rate limiter",
            rate_limited_actors.clone(),
        );

        Self {
            registry,
            requests,
            latency,
            rate_limited_actors,
        }
    }

    pub fn observe_request(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let labels = RequestLabels {
            method: method.to_owned(),
            route: route.to_owned(),
            status: status.to_string(),
        };
        self.requests.get_or_create(&labels).inc();
        self.latency
            .get_or_create(&labels)
            .observe(elapsed.as_secs_f64());
    }

    pub fn set_rate_limiter_entries(&self, entries: usize) {
        self.rate_limited_actors
            .set(i64::try_from(entries).unwrap_or(i64::MAX));
    }

    /// Renders the registry in the text exposition format.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observed_requests_are_rendered() {
        let metrics = Metrics::new();
        metrics.observe_request("POST", "/forum/problem", 201, Duration::from_millis(3));
        metrics.observe_request("POST", "/forum/problem", 201, Duration::from_millis(5));
        metrics.set_rate_limiter_entries(2);

        let text = metrics.render().unwrap();
        assert!(text.contains("forum_http_requests_total"));
        assert!(text.contains(r#"route="/forum/problem""#));
        assert!(text.contains("forum_rate_limiter_entries 2"));
        assert!(text.ends_with("# EOF\n"));
    }
}
