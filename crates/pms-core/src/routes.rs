//! Client routes and the guards that decide whether a route may be shown.

use std::fmt;

use crate::auth::{Identity, Session};

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Login, registration and password reset: only while logged out
    GuestOnly,
    AuthenticatedOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Register,
    /// Target of the emailed reset link
    ResetPassword { uidb64: String, token: String },
    Dashboard,
    NotFound,
}

const RESET_PREFIX: &str = "reset-password";
const UIDB64_KEY: &str = "uidb64=";
const TOKEN_KEY: &str = "token=";

impl Route {
    /// Match a path (query string and trailing slash ignored).
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Landing,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["dashboard"] => Route::Dashboard,
            [RESET_PREFIX, uid, token] => {
                let uidb64 = uid.strip_prefix(UIDB64_KEY).unwrap_or(*uid);
                let token = token.strip_prefix(TOKEN_KEY).unwrap_or(*token);
                if uidb64.is_empty() || token.is_empty() {
                    Route::NotFound
                } else {
                    Route::ResetPassword {
                        uidb64: uidb64.to_string(),
                        token: token.to_string(),
                    }
                }
            }
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::ResetPassword { uidb64, token } => {
                format!("/{}/{}{}/{}{}", RESET_PREFIX, UIDB64_KEY, uidb64, TOKEN_KEY, token)
            }
            Route::Dashboard => "/dashboard".to_string(),
            Route::NotFound => "/404".to_string(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Landing | Route::NotFound => Access::Public,
            Route::Login | Route::Register | Route::ResetPassword { .. } => Access::GuestOnly,
            Route::Dashboard => Access::AuthenticatedOnly,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// What to do with a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Render,
    Redirect(Route),
    /// Session still loading; show a placeholder
    Pending,
}

pub fn require_authenticated(identity: &Identity) -> GateDecision {
    if identity.is_guest() {
        GateDecision::Redirect(Route::Login)
    } else {
        GateDecision::Render
    }
}

pub fn require_guest(identity: &Identity) -> GateDecision {
    if identity.is_guest() {
        GateDecision::Render
    } else {
        GateDecision::Redirect(Route::Landing)
    }
}

/// Decide whether `route` may be shown for the given session.
pub fn gate(session: &Session, route: &Route) -> GateDecision {
    if session.is_loading() {
        return GateDecision::Pending;
    }
    match route.access() {
        Access::Public => GateDecision::Render,
        Access::GuestOnly => require_guest(&session.identity),
        Access::AuthenticatedOnly => require_authenticated(&session.identity),
    }
}
