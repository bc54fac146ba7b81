//! # Mercato Inventory API
//!
//! HTTP pass-through over [`mercato_db::InventoryService`].
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Inventory API Server                               │
//! │                                                                         │
//! │  Dashboard ───► axum (8080) ───► api/* handlers ───► InventoryService   │
//! │                                       │                     │           │
//! │                                       ▼                     ▼           │
//! │                               camelCase DTOs          SQLite (WAL)      │
//! │                               ApiError {code,message}                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers hold no business logic: they decode the request, read the
//! owning vendor's sync setting when the call mutates stock, call the
//! service and map the result.

pub mod api;
pub mod config;
pub mod dto;
pub mod error;
pub mod state;

pub use api::create_router;
pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;
