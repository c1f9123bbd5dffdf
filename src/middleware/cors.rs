//! CORS policy for the browser frontend.
//!
//! Policy:
//! - Production: allowlist origins from Config (exact match), WITHOUT credentials.
//!   An empty allowlist allows no cross-origin browser calls.
//! - Development: the allowlist when one is configured, otherwise any origin.
//!
//! Bearer tokens travel in the Authorization header, so cookies/credentials are never enabled.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

pub fn apply(router: Router, config: &Config) -> Router {
    router.layer(layer(config))
}

fn layer(config: &Config) -> CorsLayer {
    let allowed: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();

    let base = if allowed.is_empty() && !config.app_env.is_production() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(allowed))
    };

    base.allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static("x-request-id"),
    ])
    .max_age(std::time::Duration::from_secs(60 * 10))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .chain([("DATABASE_URL".to_string(), "postgres://x".to_string())])
            .collect();
        Config::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    async fn preflight(config: &Config, origin: &'static str) -> Option<HeaderValue> {
        let router = apply(Router::new().route("/x", get(|| async { "x" })), config);
        let res = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/x")
                    .header(header::ORIGIN, origin)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .cloned()
    }

    #[tokio::test]
    async fn development_without_allowlist_is_permissive() {
        let allow = preflight(&config(&[]), "http://anywhere.test").await;
        assert_eq!(allow.unwrap(), "*");
    }

    #[tokio::test]
    async fn allowlist_is_exact() {
        let cfg = config(&[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:5173"),
        ]);
        assert_eq!(
            preflight(&cfg, "http://localhost:5173").await.unwrap(),
            "http://localhost:5173"
        );
        assert!(preflight(&cfg, "http://evil.test").await.is_none());
    }
}
