use std::{any::Any, sync::Arc};

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::{
    ServerError,
    extract::{BearerHeader, CurrentSession, TOKEN_REQUIRED, bearer_token},
    internal_error, payment_types, payments, students,
    types::{ErrorBody, Health},
    users,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolve the bearer token into a session, attaching the [`engine::Actor`]
/// and the [`CurrentSession`] to the request.
async fn auth(
    State(state): State<ServerState>,
    header: BearerHeader,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = bearer_token(header)?
        .ok_or_else(|| ServerError::Unauthorized(TOKEN_REQUIRED.to_string()))?;
    let info = state.engine.authenticate(&token).await?;

    request.extensions_mut().insert(info.actor.clone());
    request
        .extensions_mut()
        .insert(CurrentSession { token, info });
    Ok(next.run(request).await)
}

async fn health() -> Json<Health> {
    Json(Health {
        message: "SIPESDA API berjalan".to_string(),
        timestamp: Utc::now(),
    })
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Route not found".to_string(),
            searched_id: None,
        }),
    )
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("handler panicked: {detail}");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(internal_error())).into_response()
}

/// `"/api/"` and `"api"` become `Some("/api")`; an empty or `/` base path
/// mounts the API at the root.
fn normalize_base_path(base_path: &str) -> Option<String> {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}

fn api(state: ServerState) -> Router<ServerState> {
    let public = Router::new()
        .route("/users/login", post(users::login))
        .route("/users/register", post(users::register));

    let protected = Router::new()
        .route("/users/logout", post(users::logout))
        .route("/users/session", get(users::session))
        .route("/users/keep-alive", post(users::keep_alive))
        .route(
            "/users/profile",
            get(users::profile).put(users::update_profile),
        )
        .route("/users/change-password", put(users::change_password))
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route(
            "/users/{id}/permissions",
            get(users::permissions).put(users::update_permissions),
        )
        .route("/users/{id}/password", put(users::set_password))
        .route("/students", get(students::list).post(students::create))
        .route("/students/nisn/{nisn}", get(students::get_by_nisn))
        .route(
            "/students/{id}",
            get(students::get)
                .put(students::update)
                .delete(students::delete),
        )
        .route("/payments", get(payments::list).post(payments::create))
        .route("/payments/by-month", get(payments::by_month))
        .route(
            "/payments/{id}",
            get(payments::get)
                .put(payments::update)
                .delete(payments::delete),
        )
        .route(
            "/payment-types",
            get(payment_types::list).post(payment_types::create),
        )
        .route(
            "/payment-types/{id}",
            get(payment_types::get)
                .put(payment_types::update)
                .delete(payment_types::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, auth));

    public.merge(protected)
}

/// Build the application router with every endpoint mounted under
/// `base_path`. The health check always answers on `/`.
pub fn router(engine: Arc<Engine>, base_path: &str) -> Router {
    let state = ServerState { engine };
    let api = api(state.clone());
    let app = match normalize_base_path(base_path) {
        Some(base) => Router::new().route("/", get(health)).nest(&base, api),
        None => api.route("/", get(health)),
    };

    app.fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
    base_path: &str,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine, base_path)).await
}
