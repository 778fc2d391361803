//! Request and push-channel counters.
//!
//! Exposed as JSON on `/health`.

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Counters shared by the HTTP middleware and push connections
#[derive(Default)]
pub struct GatewayMetrics {
    http_requests: AtomicU64,
    http_failures: AtomicU64,
    /// POST/PUT/PATCH/DELETE
    http_writes: AtomicU64,
    http_latency_ms: AtomicU64,

    push_clients: AtomicU64,
    push_events_sent: AtomicU64,
    push_commands: AtomicU64,
}

/// Point-in-time copy of [`GatewayMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub http_requests: u64,
    pub http_failures: u64,
    pub http_writes: u64,
    pub push_clients: u64,
    pub push_events_sent: u64,
    pub push_commands: u64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, status_ok: bool, is_write: bool, latency_ms: u64) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
        if !status_ok {
            self.http_failures.fetch_add(1, Ordering::Relaxed);
        }
        if is_write {
            self.http_writes.fetch_add(1, Ordering::Relaxed);
        }
        self.http_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_ws_connect(&self) {
        self.push_clients.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ws_disconnect(&self) {
        let _ = self
            .push_clients
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn record_ws_message(&self) {
        self.push_events_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ws_command(&self) {
        self.push_commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            http_requests: self.http_requests.load(Ordering::Relaxed),
            http_failures: self.http_failures.load(Ordering::Relaxed),
            http_writes: self.http_writes.load(Ordering::Relaxed),
            push_clients: self.push_clients.load(Ordering::Relaxed),
            push_events_sent: self.push_events_sent.load(Ordering::Relaxed),
            push_commands: self.push_commands.load(Ordering::Relaxed),
        }
    }

    /// Mean request latency, 0 before the first request
    pub fn average_latency_ms(&self) -> f64 {
        let requests = self.http_requests.load(Ordering::Relaxed);
        if requests == 0 {
            return 0.0;
        }
        self.http_latency_ms.load(Ordering::Relaxed) as f64 / requests as f64
    }

    pub fn to_json(&self) -> serde_json::Value {
        let s = self.snapshot();
        serde_json::json!({
            "http": {
                "requests": s.http_requests,
                "failures": s.http_failures,
                "writes": s.http_writes,
                "averageLatencyMs": self.average_latency_ms(),
            },
            "push": {
                "clients": s.push_clients,
                "eventsSent": s.push_events_sent,
                "commands": s.push_commands,
            },
        })
    }
}

/// `axum::middleware::from_fn_with_state` hook that times every request.
/// Anything below 400 counts as a success.
pub async fn track_requests(
    State(metrics): State<Arc<GatewayMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let is_write = [Method::POST, Method::PUT, Method::DELETE, Method::PATCH]
        .contains(request.method());
    let started = Instant::now();
    let response = next.run(request).await;
    metrics.record_request(
        response.status().as_u16() < 400,
        is_write,
        started.elapsed().as_millis() as u64,
    );
    response
}
