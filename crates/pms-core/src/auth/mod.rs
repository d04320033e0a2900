//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `TokenPair`, `Credentials`, `Identity`: the data the session is made of
//! - `TokenStore`: durable persistence of the token pair (file, encrypted file, OS keychain)
//! - `SessionStore`: the single source of truth for who is logged in
//! - `SessionRefresher`: background renewal of the access token
//!
//! Access tokens live for a few minutes; the refresher renews them every
//! four minutes by default and the session ends when renewal is refused.

pub mod refresher;
pub mod service;
pub mod session;
pub mod storage;
pub mod tokens;

pub use refresher::{SessionRefresher, DEFAULT_REFRESH_INTERVAL};
pub use service::AuthService;
pub use session::{LoginError, RefreshOutcome, Session, SessionStatus, SessionStore};
pub use storage::{
    EncryptedFileTokenStore, FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStorage,
    TokenStore, STORAGE_KEY,
};
pub use tokens::{decode_claims, Claims, Credentials, Identity, TokenError, TokenPair, GUEST_USERNAME};
