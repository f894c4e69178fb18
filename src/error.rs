use crate::store::StoreError;

/// Error taxonomy for the core. Every kind maps to a stable wire code; the
/// boundary decides status codes and retries (`upstream_failed` is the only
/// kind it may retry, once).
#[derive(Debug)]
pub enum CoreError {
    NotFound(String),
    Conflict(String),
    AuthFailure(String),
    Upstream(String),
    BadParams(String),
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "not_found",
            CoreError::Conflict(_) => "conflict",
            CoreError::AuthFailure(_) => "auth_failed",
            CoreError::Upstream(_) => "upstream_failed",
            CoreError::BadParams(_) => "bad_params",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CoreError::NotFound(m)
            | CoreError::Conflict(m)
            | CoreError::AuthFailure(m)
            | CoreError::Upstream(m)
            | CoreError::BadParams(m) => m,
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for CoreError {}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        CoreError::Upstream(e.to_string())
    }
}
