// handlers/public/system.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/api/v1/auth/login, /api/v1/auth/refresh, /api/v1/auth/logout (public)",
                "applications": "POST /api/v1/applications (public), GET/PATCH (staff)",
                "auth": "/api/v1/auth/me, /api/v1/auth/password, /api/v1/auth/register (protected)",
                "people": "/api/v1/students, /api/v1/teachers, /api/v1/admins (protected)",
                "teaching": "/api/v1/classes, /api/v1/schedules, /api/v1/attendance (protected)",
                "materials": "/api/v1/books, /api/v1/book-assign (protected)",
                "media": "/api/v1/recording, /api/v1/screenshot (protected, multipart)",
                "office": "/api/v1/payout, /api/v1/dashboard (protected)",
                "messaging": "/api/v1/message, /api/v1/notification (protected)",
                "chat": "/ws (WebSocket, token cookie or ?token=)",
                "uploads": "/uploads/* (static)"
            }
        }
    }))
}

/// Database and cache status; 503 when the database is unreachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => "up".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            "down".to_string()
        }
    };
    let cache = match state.cache.ping().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!(error = %e, "Cache health check failed");
            "degraded"
        }
    };

    let status = if database == "up" { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status,
        Json(json!({
            "success": status == StatusCode::OK,
            "data": {
                "status": if status == StatusCode::OK { "ok" } else { "unavailable" },
                "database": database,
                "cache": { "status": cache, "backend": state.cache.backend() },
                "environment": format!("{:?}", state.config.environment).to_lowercase(),
                "version": env!("CARGO_PKG_VERSION"),
            }
        })),
    )
}
