//! REST API client module for the property management backend.
//!
//! This module provides the `ApiClient` for the authentication endpoints
//! (login, refresh, registration, password reset) and for the landlord and
//! tenant resources (properties, applications, maintenance requests,
//! notifications, vacate notices).
//!
//! Authenticated calls carry `Authorization: Bearer <access>`. The session
//! store decides which token that is; the client only forwards it.

pub mod client;
pub mod error;
pub mod resources;

pub use client::{ApiClient, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::{ApiError, ApiResult};
