//! HTTP middleware for the console API.
//!
//! Layers are listed outermost first: the first one sees the request first
//! and the response last.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::HeaderName;
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::NetworkConfig;
use super::shutdown::ShutdownController;

type HttpLayers = tower::layer::util::Stack<
    TimeoutLayer,
    tower::layer::util::Stack<
        CorsLayer,
        tower::layer::util::Stack<
            RequestBodyLimitLayer,
            tower::layer::util::Stack<
                CompressionLayer,
                tower::layer::util::Stack<
                    TraceLayer<
                        tower_http::classify::SharedClassifier<
                            tower_http::classify::ServerErrorsAsFailures,
                        >,
                    >,
                    tower::layer::util::Stack<
                        PropagateRequestIdLayer,
                        tower::layer::util::Stack<
                            SetRequestIdLayer<MakeRequestUuid>,
                            tower::layer::util::Identity,
                        >,
                    >,
                >,
            >,
        >,
    >,
>;

/// Transport middleware, outermost to innermost:
/// 1. `SetRequestId`: UUID v4 `x-request-id` on every request
/// 2. `PropagateRequestId`: echoes `x-request-id` on every response, 413s
///    included
/// 3. `Trace`: one span per request
/// 4. `Compression`: gzip responses
/// 5. `RequestBodyLimit`: `max_body_bytes`, 413 beyond it
/// 6. `CORS`: configured origins, console verbs
/// 7. `Timeout`: 408 after `request_timeout`
///
/// CORS must wrap a response body with a `Default`, so the body limit sits
/// outside it.
#[must_use]
pub fn build_http_layers(config: &NetworkConfig) -> HttpLayers {
    let x_request_id = HeaderName::from_static("x-request-id");

    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(x_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(build_cors_layer(&config.cors_origins))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .into_inner()
}

/// `"*"` allows any origin; otherwise only the parseable listed origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}

/// Counts API requests for the shutdown drain and refuses new ones with 503
/// once draining has begun.
pub async fn track_in_flight(
    State(shutdown): State<Arc<ShutdownController>>,
    request: Request,
    next: Next,
) -> Response {
    if !shutdown.health_state().accepts_requests() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let _guard = shutdown.in_flight_guard();
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use std::time::Duration;
    use tower::ServiceExt;

    #[test]
    fn layers_build_with_defaults_and_custom_timeout() {
        let _defaults = build_http_layers(&NetworkConfig::default());
        let config = NetworkConfig {
            request_timeout: Duration::from_secs(5),
            ..NetworkConfig::default()
        };
        let _custom = build_http_layers(&config);
    }

    #[test]
    fn cors_accepts_wildcard_and_explicit_origins() {
        let _any = build_cors_layer(&["*".to_string()]);
        let _listed = build_cors_layer(&[
            "http://localhost:3000".to_string(),
            "not a header\n".to_string(),
        ]);
    }

    fn guarded(shutdown: Arc<ShutdownController>) -> Router {
        let observed = Arc::clone(&shutdown);
        Router::new()
            .route(
                "/guarded",
                get(move || {
                    let observed = Arc::clone(&observed);
                    async move { observed.in_flight_count().to_string() }
                }),
            )
            .layer(axum::middleware::from_fn_with_state(shutdown, track_in_flight))
    }

    fn request() -> Request {
        Request::builder().uri("/guarded").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn requests_are_counted_while_running() {
        let shutdown = Arc::new(ShutdownController::new());
        shutdown.set_ready();

        let response = guarded(Arc::clone(&shutdown)).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"1");
        assert_eq!(shutdown.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn draining_refuses_new_requests() {
        let shutdown = Arc::new(ShutdownController::new());
        shutdown.trigger_shutdown();

        let response = guarded(shutdown).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
