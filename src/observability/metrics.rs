//! Metrics collection and Prometheus export module.
//!
//! This module provides:
//! - Rate limiting and bearer authentication for the metrics endpoint
//! - The Prometheus metrics / health HTTP server
//! - Recording functions for vote and session metrics

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

use crate::observability::health_checks;
use crate::observability_config::ObservabilityConfig;
use crate::vote_store::{ChoiceLabel, VoteStore};

/// Simple rate limiter for HTTP requests
#[derive(Debug)]
pub struct RateLimiter {
    requests: Mutex<HashMap<String, Vec<Instant>>>,
    max_requests: u32,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests,
            window_secs,
        }
    }

    /// Check if request is allowed for the given IP
    pub fn is_allowed(&self, ip: &str) -> bool {
        let now = Instant::now();
        let window = Duration::from_secs(self.window_secs);

        let mut requests = self.requests.lock();

        // Drop requests outside the window, and clients left with none
        requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < window);
            !times.is_empty()
        });

        let client_requests = requests.entry(ip.to_string()).or_default();
        if client_requests.len() >= self.max_requests as usize {
            return false;
        }

        client_requests.push(now);
        true
    }

    /// Number of clients with requests inside the window
    pub fn tracked_clients(&self) -> usize {
        self.requests.lock().len()
    }
}

/// Compare an `Authorization` header against the expected bearer token
///
/// No expected token means the endpoint is open.
pub fn is_authorized(auth_header: Option<&str>, expected_token: Option<&str>) -> bool {
    let expected = match expected_token {
        Some(token) if !token.is_empty() => token,
        _ => return true,
    };

    auth_header
        .and_then(|h| h.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}

/// Initialize metrics collection with Prometheus exporter and configuration
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    tracing::info!(
        metrics_enabled = %config.enable_metrics_export,
        "Metrics collection initialized"
    );
    Ok(handle)
}

/// Produce the response for one metrics/health request
pub fn route_request(
    method: &hyper::Method,
    path: &str,
    metrics_handle: &PrometheusHandle,
    store: &VoteStore,
) -> hyper::Response<String> {
    match (method, path) {
        (&hyper::Method::GET, "/metrics") => {
            let mut response = hyper::Response::new(metrics_handle.render());
            response.headers_mut().insert(
                "content-type",
                hyper::header::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
            );
            response
        }
        (&hyper::Method::GET, "/health/live") => hyper::Response::new("OK".to_string()),
        (&hyper::Method::GET, "/health/ready") => {
            let report = health_checks::readiness_report(store);
            let body = serde_json::to_string(&report)
                .unwrap_or_else(|_| r#"{"status":"ready"}"#.to_string());
            let mut response = hyper::Response::new(body);
            response.headers_mut().insert(
                "content-type",
                hyper::header::HeaderValue::from_static("application/json"),
            );
            response
        }
        _ => {
            let mut response = hyper::Response::new("Not Found".to_string());
            *response.status_mut() = hyper::StatusCode::NOT_FOUND;
            response
        }
    }
}

/// Start the metrics server with health checks
pub async fn start_metrics_server(
    metrics_handle: PrometheusHandle,
    port: u16,
    store: Arc<VoteStore>,
) -> Result<()> {
    // Localhost only unless explicitly configured
    let bind_all = std::env::var("METRICS_BIND_ALL_INTERFACES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    let addr = if bind_all {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)
    } else {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    };

    let auth_token = std::env::var("METRICS_AUTH_TOKEN").ok();

    // 10 requests per minute per IP
    let rate_limiter = Arc::new(RateLimiter::new(10, 60));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, bind_all, "Metrics server listening");

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let metrics_handle = metrics_handle.clone();
                    let store = Arc::clone(&store);
                    let rate_limiter = Arc::clone(&rate_limiter);
                    let auth_token = auth_token.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = hyper::service::service_fn(
                            move |req: hyper::Request<hyper::body::Incoming>| {
                                let peer_ip = peer_addr.ip().to_string();
                                let response = if !rate_limiter.is_allowed(&peer_ip) {
                                    let mut response =
                                        hyper::Response::new("Rate limit exceeded".to_string());
                                    *response.status_mut() = hyper::StatusCode::TOO_MANY_REQUESTS;
                                    response
                                } else if !is_authorized(
                                    req.headers()
                                        .get("authorization")
                                        .and_then(|v| v.to_str().ok()),
                                    auth_token.as_deref(),
                                ) {
                                    let mut response =
                                        hyper::Response::new("Unauthorized".to_string());
                                    *response.status_mut() = hyper::StatusCode::UNAUTHORIZED;
                                    response.headers_mut().insert(
                                        "www-authenticate",
                                        hyper::header::HeaderValue::from_static("Bearer"),
                                    );
                                    response
                                } else {
                                    route_request(
                                        req.method(),
                                        req.uri().path(),
                                        &metrics_handle,
                                        &store,
                                    )
                                };
                                async move { Ok::<_, std::convert::Infallible>(response) }
                            },
                        );

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            crate::errors::error_logging::log_network_error(
                                &err,
                                "serve_http_connection",
                                None,
                            );
                        }
                    });
                }
                Err(e) => {
                    crate::errors::error_logging::log_network_error(
                        &e,
                        "accept_tcp_connection",
                        None,
                    );
                }
            }
        }
    });

    Ok(())
}

/// Record request metrics
pub fn record_request_metrics(method: &str, status: u16, duration: Duration) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!("requests_total", "method" => method, "status" => status).increment(1);
    metrics::histogram!("request_duration_seconds").record(duration.as_secs_f64());
}

/// Record error rate metrics
pub fn record_error_metrics(error_type: &str, component: &str) {
    let error_type = error_type.to_string();
    let component = component.to_string();
    metrics::counter!("errors_total", "type" => error_type, "component" => component).increment(1);
}

/// Record an incoming Telegram update by kind
pub fn record_telegram_update(update_type: &str) {
    let update_type = update_type.to_string();
    metrics::counter!("telegram_updates_total", "type" => update_type).increment(1);
}

/// Record a registered vote
pub fn record_vote_metrics(label: &ChoiceLabel, changed: bool) {
    let label = label.as_str().to_string();
    metrics::counter!("votes_registered_total", "label" => label).increment(1);
    if !changed {
        metrics::counter!("votes_unchanged_total").increment(1);
    }
}

/// Record a newly created session
pub fn record_session_created(active_sessions: usize) {
    metrics::counter!("sessions_created_total").increment(1);
    metrics::gauge!("active_sessions").set(active_sessions as f64);
}

/// Record the outcome of an expiry sweep
pub fn record_sweep_metrics(removed: usize, remaining: usize) {
    metrics::counter!("sessions_expired_total").increment(removed as u64);
    metrics::counter!("expiry_sweeps_total").increment(1);
    metrics::gauge!("active_sessions").set(remaining as f64);
}

/// Record application startup metrics
pub fn record_startup_metrics(duration: Duration) {
    metrics::histogram!("application_startup_duration_seconds").record(duration.as_secs_f64());
    metrics::counter!("application_starts_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_blocks_after_limit() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.is_allowed("127.0.0.1"));
        assert!(limiter.is_allowed("127.0.0.1"));
        assert!(!limiter.is_allowed("127.0.0.1"));

        // Other clients are tracked separately
        assert!(limiter.is_allowed("10.0.0.1"));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_rate_limiter_forgets_idle_clients() {
        let limiter = RateLimiter::new(5, 0);
        for i in 0..100 {
            assert!(limiter.is_allowed(&format!("10.0.0.{}", i)));
        }

        // With a zero window every earlier request is already stale
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_authorization() {
        assert!(is_authorized(None, None));
        assert!(is_authorized(None, Some("")));
        assert!(is_authorized(Some("Bearer secret"), Some("secret")));
        assert!(!is_authorized(Some("Bearer wrong"), Some("secret")));
        assert!(!is_authorized(Some("secret"), Some("secret")));
        assert!(!is_authorized(None, Some("secret")));
    }

    #[test]
    fn test_routes() {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let store = VoteStore::new();
        store.create_session("q1", "Pizza night?");

        let live = route_request(&hyper::Method::GET, "/health/live", &handle, &store);
        assert_eq!(live.status(), hyper::StatusCode::OK);
        assert_eq!(live.body(), "OK");

        let ready = route_request(&hyper::Method::GET, "/health/ready", &handle, &store);
        assert_eq!(ready.status(), hyper::StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(ready.body()).unwrap();
        assert_eq!(body["active_sessions"], 1);

        let metrics = route_request(&hyper::Method::GET, "/metrics", &handle, &store);
        assert_eq!(metrics.status(), hyper::StatusCode::OK);

        let missing = route_request(&hyper::Method::POST, "/metrics", &handle, &store);
        assert_eq!(missing.status(), hyper::StatusCode::NOT_FOUND);
    }
}
