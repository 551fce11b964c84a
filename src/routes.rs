use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue},
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{
    authorize_middleware, expose_error_details, jwt_auth_middleware, rate_limit_middleware,
    request_limits_middleware, request_logging_middleware, PanicResponder, RequestLimits, RequestLogging,
};
use crate::state::AppState;

const X_REQUEST_TIMEOUT: HeaderName = HeaderName::from_static("x-request-timeout");

/// Full application: routes plus the global middleware chain
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = public_routes()
        .merge(protected_routes(state.clone()))
        .fallback(not_found)
        .with_state(state.clone())
        .layer(CorsLayer::permissive());

    if config.api.enable_rate_limiting {
        app = app.layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));
    }

    let limits = RequestLimits {
        max_body_bytes: config.api.max_request_size_bytes,
        timeout: config.request_timeout(),
    };
    // The JSON-speaking limits middleware sits outside the streaming body cap
    app = app
        .layer(DefaultBodyLimit::max(limits.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(limits.max_body_bytes))
        .layer(middleware::from_fn_with_state(limits, request_limits_middleware));
    if let Ok(value) = HeaderValue::try_from(format!("{}s", limits.timeout.as_secs())) {
        app = app.layer(SetResponseHeaderLayer::overriding(X_REQUEST_TIMEOUT, value));
    }

    // Internal causes only reach clients in development
    if config.is_development() {
        app = app.layer(middleware::from_fn(expose_error_details));
    }

    app.layer(CompressionLayer::new())
        .layer(CatchPanicLayer::custom(PanicResponder {
            expose_details: config.is_development(),
        }))
        .layer(middleware::from_fn_with_state(
            RequestLogging {
                enabled: config.api.enable_request_logging,
            },
            request_logging_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/login", post(public::login))
        .route("/api/forgot-password", post(public::forgot_password))
        .route("/api/reset-password", post(public::reset_password))
}

/// Authentication runs first, then the policy guard, then the handler
fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{companies, report_types, reports, users};

    Router::new()
        // Users
        .route("/api/register", post(users::register))
        .route("/api/users", get(users::list))
        .route(
            "/api/users/:id",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route("/api/loginUser", get(users::current))
        .route("/api/updateRole", put(users::update_role))
        .route("/api/change-password", patch(users::change_password))
        // Companies
        .route("/api/company", get(companies::list).post(companies::create))
        .route(
            "/api/company/:id",
            get(companies::get).put(companies::update).delete(companies::delete),
        )
        .route("/api/user/companies", get(companies::for_current_user))
        // Report types
        .route(
            "/api/reportTypes",
            get(report_types::list).post(report_types::create),
        )
        .route(
            "/api/reportTypes/:id",
            get(report_types::get)
                .put(report_types::update)
                .delete(report_types::delete),
        )
        // Reports
        .route("/api/reports", get(reports::list).post(reports::create))
        .route("/api/reports/companies", post(reports::by_companies))
        .route(
            "/api/reports/:id",
            get(reports::get).put(reports::update).delete(reports::delete),
        )
        .route("/api/reports/name/:name", get(reports::by_name))
        .route("/api/reports/company/:companyId", get(reports::by_company))
        .route("/api/reports/reportType/:reportType", get(reports::by_report_type))
        .route("/api/reports/userAccess/:id", get(reports::by_user_access))
        .route("/api/reports/createdBy/:id", get(reports::by_created_by))
        .route_layer(middleware::from_fn(authorize_middleware))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

async fn not_found() -> ApiError {
    ApiError::not_found("NOT_FOUND", "Route not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::Role;
    use crate::testing::{test_config, TestContext};

    fn small_body_context() -> TestContext {
        let mut config = test_config();
        config.api.max_request_size_bytes = 16;
        TestContext::with_config(config)
    }

    async fn post_with_length(ctx: &TestContext, token: &str, payload: String) -> (StatusCode, String, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/company")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, payload.len())
            .body(Body::from(payload))
            .unwrap();
        let response = app(ctx.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, content_type, body)
    }

    #[tokio::test]
    async fn declared_oversize_body_gets_json_413() {
        let ctx = small_body_context();
        let (_, token) = ctx.login_as(Role::Admin);
        let payload = json!({ "name": "A company with a long name" }).to_string();

        let (status, content_type, body) = post_with_length(&ctx, &token, payload).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(content_type.starts_with("application/json"), "got {content_type}");
        assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
        assert!(ctx.db.lock().companies.is_empty());
    }

    #[tokio::test]
    async fn streamed_oversize_body_gets_json_413() {
        let ctx = small_body_context();
        let (_, token) = ctx.login_as(Role::Admin);

        let (status, body) = ctx
            .post("/api/company", &token, json!({ "name": "A company with a long name" }))
            .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn body_within_limit_passes() {
        let ctx = small_body_context();
        let (_, token) = ctx.login_as(Role::Admin);

        let (status, _, body) = post_with_length(&ctx, &token, json!({ "name": "Acme" }).to_string()).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }
}
