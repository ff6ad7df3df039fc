// server.rs - Router assembly and the HTTP listener

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::chat;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::protected::media::{self, Recordings, Screenshots};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Room for multipart boundaries and the `class_id` field around an upload
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()));

    Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        // Chat relay authenticates during the upgrade
        .route("/ws", get(chat::ws_handler))
        .nest("/api/v1", api)
        .nest_service("/uploads", ServeDir::new(state.uploads.root()))
        .fallback(route_not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(state.config.server.max_request_size_bytes))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::{applications, auth};

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/applications", post(applications::submit))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{
        admins, applications, attendance, auth, book_assign, books, classes, dashboard, messages,
        notifications, payouts, schedules, students, teachers,
    };

    let upload_limit = DefaultBodyLimit::max(state.uploads.max_bytes().saturating_add(MULTIPART_OVERHEAD));

    Router::new()
        // Session
        .route("/auth/me", get(auth::me))
        .route("/auth/password", patch(auth::change_password))
        .route("/auth/register", post(auth::register))
        // People
        .route("/students", get(students::list).post(students::create))
        .route(
            "/students/:id",
            get(students::get).patch(students::update).delete(students::delete),
        )
        .route("/teachers", get(teachers::list))
        .route(
            "/teachers/:id",
            get(teachers::get).patch(teachers::update).delete(teachers::delete),
        )
        .route("/teachers/:id/students", get(teachers::students))
        .route("/admins", get(admins::list))
        .route("/admins/:id", delete(admins::delete))
        // Teaching
        .route("/classes", get(classes::list).post(classes::create))
        .route(
            "/classes/:id",
            get(classes::get).patch(classes::update).delete(classes::delete),
        )
        .route("/classes/:id/makeup", post(classes::makeup))
        .route("/schedules", get(schedules::list).post(schedules::create))
        .route("/schedules/:id", delete(schedules::delete))
        .route("/attendance", get(attendance::list).post(attendance::create))
        .route(
            "/attendance/:id",
            patch(attendance::update).delete(attendance::delete),
        )
        // Materials
        .route("/books", get(books::list).post(books::create))
        .route(
            "/books/:id",
            get(books::get).patch(books::update).delete(books::delete),
        )
        .route("/book-assign", get(book_assign::list).post(book_assign::create))
        .route("/book-assign/:id", delete(book_assign::delete))
        // Office
        .route("/payout", get(payouts::list).post(payouts::create))
        .route(
            "/payout/:id",
            get(payouts::get).patch(payouts::update).delete(payouts::delete),
        )
        .route("/applications", get(applications::list))
        .route("/applications/:id", patch(applications::review))
        .route("/dashboard", get(dashboard::show))
        // Messaging
        .route("/message", post(messages::send))
        .route("/message/conversations", get(messages::conversations))
        .route("/message/:user_id", get(messages::thread))
        .route("/notification", get(notifications::list).post(notifications::create))
        .route("/notification/read-all", patch(notifications::mark_all_read))
        .route("/notification/:id/read", patch(notifications::mark_read))
        .route("/notification/:id", delete(notifications::delete))
        // Class media
        .route(
            "/recording",
            get(media::list::<Recordings>)
                .post(media::upload::<Recordings>)
                .layer(upload_limit.clone()),
        )
        .route(
            "/recording/:id",
            get(media::get::<Recordings>).delete(media::delete::<Recordings>),
        )
        .route(
            "/screenshot",
            get(media::list::<Screenshots>)
                .post(media::upload::<Screenshots>)
                .layer(upload_limit),
        )
        .route(
            "/screenshot/:id",
            get(media::get::<Screenshots>).delete(media::delete::<Screenshots>),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Credentialed CORS for the configured frontend origins
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Binds the configured port and serves until Ctrl-C
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!(
        addr = %bind_addr,
        environment = ?state.config.environment,
        cache = state.cache.backend(),
        "Academy API listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
