//! # Kube Café API
//!
//! REST server for the storefront and the admin back office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Café API Routes                               │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Public        │  │  Customer      │  │  Admin (admin token)       ││
//! │  │                │  │  (user token)  │  │                            ││
//! │  │ • /health      │  │ • checkout     │  │ • dashboard                ││
//! │  │ • register     │  │ • orders (own) │  │ • menu CRUD (multipart)    ││
//! │  │ • login        │  │ • simple order │  │ • orders + status          ││
//! │  │ • menu (read)  │  │                │  │ • users CRUD               ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  SQLite      │  │  Uploads     │  │    JWT Auth              ││  │
//! │  │  │  (cafe-db)   │  │  UPLOAD_DIR  │  │  user + admin issuers    ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (a `.env` file is honoured):
//! - `PORT` - HTTP port (default: 5000)
//! - `DATABASE_URL` - SQLite path (default: ./cafe.db)
//! - `JWT_SECRET` / `JWT_ADMIN_SECRET` - token secrets, must differ
//! - `JWT_USER_LIFETIME_SECS` / `JWT_ADMIN_LIFETIME_SECS` - default 86400
//! - `APP_ENV` - `development` exposes error detail on 500s
//! - `UPLOAD_DIR` - menu images (default: uploads)
//! - `TAX_RATE_BPS` / `DELIVERY_FEE_CENTS` - checkout pricing
//! - `MAX_UPLOAD_BYTES` - request body cap (default: 5 MiB)

pub mod auth;
pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use cafe_core::PricingPolicy;
use cafe_db::Database;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use auth::{AuthAdmin, AuthUser, TokenIssuer, TokenKind};
pub use config::{ApiConfig, AppEnv, ConfigError};
pub use error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub user_tokens: TokenIssuer,
    pub admin_tokens: TokenIssuer,
    pub pricing: PricingPolicy,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            user_tokens: TokenIssuer::new(
                TokenKind::User,
                &config.jwt_secret,
                config.jwt_user_lifetime_secs,
            ),
            admin_tokens: TokenIssuer::new(
                TokenKind::Admin,
                &config.jwt_admin_secret,
                config.jwt_admin_lifetime_secs,
            ),
            pricing: config.pricing(),
            db,
            config,
        }
    }
}

/// Builds the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error::expose_error_detail,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
