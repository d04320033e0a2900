use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request rejected: {0}")]
    BadRequest(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 => ApiError::BadRequest(truncated),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// True when the server looked at the credentials and said no.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ApiError::BadRequest(_) | ApiError::Unauthorized | ApiError::AccessDenied(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_maps_auth_failures() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, "{\"detail\":\"No active account\"}"),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "nope"),
            ApiError::AccessDenied(ref body) if body == "nope"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, "short"),
            ApiError::InvalidResponse(ref msg) if msg.contains("418")
        ));
    }

    #[test]
    fn test_truncate_body_respects_limit() {
        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
        assert!(truncated.len() < long.len());
    }

    #[test]
    fn test_is_rejection() {
        assert!(ApiError::Unauthorized.is_rejection());
        assert!(ApiError::BadRequest("bad".into()).is_rejection());
        assert!(!ApiError::RateLimited.is_rejection());
        assert!(!ApiError::ServerError("boom".into()).is_rejection());
    }
}
