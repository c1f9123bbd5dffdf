/*
 * Responsibility
 * - Config読み込み → 依存生成 (PgPool / TokenService / IdentityStore) → Router 組み立て
 * - Middleware の適用 (認証 / error path / security headers / CORS / HTTP)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::auth::{PgIdentityStore, build_token_service};
use crate::services::expense_store::PgExpenseStore;
use crate::state::AppState;
use crate::{api, middleware, seed};

fn init_tracing() {
    // RUST_LOG があればそちらを優先
    // RUST_LOG=info,expense_tracker=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // dev は即落として気付けるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {} (auth fail mode: {:?})",
        config.app_env,
        config.addr,
        config.auth_fail_mode
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!()
        .run(&db)
        .await
        .context("failed to run migrations")?;

    if config.seed_demo_data {
        seed::run(&db).await.context("failed to seed demo data")?;
    }

    let tokens = build_token_service(config);
    let identities = Arc::new(PgIdentityStore::new(db.clone()));
    let expenses = Arc::new(PgExpenseStore::new(db.clone()));

    Ok(AppState::new(
        db,
        tokens,
        identities,
        expenses,
        config.auth_fail_mode,
        config.fallback_subject.clone(),
    ))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let authn = state.authenticator();

    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    // 後から足した layer ほど外側 (http → cors → security headers → error path → auth → handler)
    let router = middleware::auth::access::apply(router, authn);
    let router = middleware::error_path::apply(router);
    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthFailMode;
    use crate::repos::expense_repo::ExpenseRow;
    use crate::services::auth::{Identity, MemoryIdentityStore, TokenService};
    use crate::services::expense_store::MemoryExpenseStore;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use sqlx::PgPool;
    use std::collections::HashMap;
    use tower::ServiceExt;

    const SECRET: &str = "change-me-in-dev";

    fn config(fallback: Option<&str>) -> Config {
        let mut map = HashMap::from([(
            "DATABASE_URL".to_string(),
            "postgres://localhost/expenses".to_string(),
        )]);
        map.insert(
            "FALLBACK_SUBJECT".to_string(),
            fallback.unwrap_or("").to_string(),
        );
        Config::from_lookup(|key| map.get(key).cloned()).unwrap()
    }

    fn app(fallback: Option<&str>) -> Router {
        app_with_expenses(fallback, Arc::new(MemoryExpenseStore::default()))
    }

    // handlers under test never reach the pool
    fn app_with_expenses(fallback: Option<&str>, expenses: Arc<MemoryExpenseStore>) -> Router {
        let config = config(fallback);
        let db = PgPool::connect_lazy(&config.database_url).unwrap();
        let tokens = Arc::new(TokenService::from_secret(SECRET, 86_400));
        let identities = Arc::new(MemoryIdentityStore::new([
            Identity::new("demo@example.com", 1),
            Identity::new("other@example.com", 2),
        ]));
        let state = AppState::new(
            db,
            tokens,
            identities,
            expenses,
            AuthFailMode::Open,
            config.fallback_subject.clone(),
        );
        build_router(state, &config)
    }

    fn bearer_for(subject: &str) -> String {
        let token = TokenService::from_secret(SECRET, 86_400)
            .generate(&Identity::new(subject, 0))
            .unwrap();
        format!("Bearer {}", token.into_string())
    }

    async fn send(router: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = router.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, json) = send(app(None), get("/api/v1/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn me_reflects_the_token_subject() {
        let (status, json) = send(
            app(None),
            get("/api/v1/auth/me", Some(&bearer_for("other@example.com"))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["email"], "other@example.com");
        assert_eq!(json["capabilities"], serde_json::json!(["USER"]));
    }

    #[tokio::test]
    async fn me_ignores_the_fallback_identity() {
        for authorization in [None, Some("Bearer not-a-jwt")] {
            let (status, json) = send(
                app(Some("demo@example.com")),
                get("/api/v1/auth/me", authorization),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(json["error"]["code"], "UNAUTHORIZED");
            assert_eq!(json["error"]["path"], "/api/v1/auth/me");
        }
    }

    #[tokio::test]
    async fn expenses_need_an_actor_without_fallback() {
        let (status, json) = send(app(None), get("/api/v1/expenses", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["path"], "/api/v1/expenses");
    }

    #[tokio::test]
    async fn register_validates_before_touching_the_store() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"new@example.com","password":"short"}"#))
            .unwrap();
        let (status, json) = send(app(None), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn responses_carry_request_id_and_security_headers() {
        let res = app(None)
            .oneshot(get("/api/v1/health", None))
            .await
            .unwrap();
        assert!(res.headers().contains_key("x-request-id"));
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    }

    fn taxi_owned_by_other() -> ExpenseRow {
        ExpenseRow {
            id: Uuid::new_v4(),
            user_id: 2,
            owner_id: "other@example.com".to_string(),
            title: "Taxi".to_string(),
            amount: Decimal::new(1800, 2),
            category: "Transport".to_string(),
            date: Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap(),
            notes: None,
        }
    }

    fn request(
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        body: Option<&str>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    const UPDATE_BODY: &str =
        r#"{"title":"Mine now","amount":"1.00","category":"Food","date":"2026-05-11T00:00:00Z"}"#;

    #[tokio::test]
    async fn deleting_another_users_expense_is_forbidden() {
        let row = taxi_owned_by_other();
        let id = row.id;
        let expenses = Arc::new(MemoryExpenseStore::new([row]));
        let uri = format!("/api/v1/expenses/{id}");

        let (status, json) = send(
            app_with_expenses(None, expenses.clone()),
            request("DELETE", &uri, Some(&bearer_for("demo@example.com")), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert_eq!(json["error"]["path"], uri);
        assert!(expenses.contains(id));
    }

    #[tokio::test]
    async fn fallback_identity_cannot_touch_another_users_expense() {
        let row = taxi_owned_by_other();
        let id = row.id;
        let expenses = Arc::new(MemoryExpenseStore::new([row]));
        let uri = format!("/api/v1/expenses/{id}");

        let (status, _) = send(
            app_with_expenses(Some("demo@example.com"), expenses.clone()),
            request("PUT", &uri, None, Some(UPDATE_BODY)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(expenses.row(id).unwrap().title, "Taxi");
    }

    #[tokio::test]
    async fn anonymous_delete_is_unauthenticated() {
        let row = taxi_owned_by_other();
        let id = row.id;
        let expenses = Arc::new(MemoryExpenseStore::new([row]));

        let (status, _) = send(
            app_with_expenses(None, expenses.clone()),
            request("DELETE", &format!("/api/v1/expenses/{id}"), None, None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(expenses.contains(id));
    }

    #[tokio::test]
    async fn owner_updates_then_deletes() {
        let row = taxi_owned_by_other();
        let id = row.id;
        let expenses = Arc::new(MemoryExpenseStore::new([row]));
        let uri = format!("/api/v1/expenses/{id}");
        let owner = bearer_for("other@example.com");

        let (status, json) = send(
            app_with_expenses(None, expenses.clone()),
            request("PUT", &uri, Some(&owner), Some(UPDATE_BODY)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["title"], "Mine now");

        let res = app_with_expenses(None, expenses.clone())
            .oneshot(request("DELETE", &uri, Some(&owner), None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(!expenses.contains(id));
    }

    #[tokio::test]
    async fn missing_expense_is_not_found() {
        let (status, json) = send(
            app(None),
            request(
                "DELETE",
                &format!("/api/v1/expenses/{}", Uuid::new_v4()),
                Some(&bearer_for("demo@example.com")),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn amount_beyond_column_range_is_a_validation_error() {
        let body = r#"{"title":"Yacht","amount":"1000000000000000","category":"Fun","date":"2026-05-11T00:00:00Z"}"#;
        let (status, json) = send(
            app(None),
            request(
                "POST",
                "/api/v1/expenses",
                Some(&bearer_for("demo@example.com")),
                Some(body),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }
}
