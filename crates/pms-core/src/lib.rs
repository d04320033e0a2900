//! PMS Core - session lifecycle and API client for the property management backend.
//!
//! This crate provides:
//! - `api`: HTTP client for the backend REST API
//! - `auth`: token pair, persistent token storage, session store and refresher
//! - `routes`: client routes and the guards in front of them
//! - `models`: the backend's JSON shapes
//! - `config`: application configuration
//! - `app`: wiring of all of the above

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod models;
pub mod routes;

pub use api::{ApiClient, ApiError, ApiResult};
pub use app::App;
pub use auth::{
    Credentials, Identity, LoginError, RefreshOutcome, Session, SessionRefresher, SessionStatus,
    SessionStore, TokenPair, TokenStorage, TokenStore,
};
pub use config::Config;
pub use routes::{gate, Access, GateDecision, Route};
