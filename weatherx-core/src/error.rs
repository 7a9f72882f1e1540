use reqwest::StatusCode;
use thiserror::Error;

/// Why a forecast download failed. The previous snapshot is kept in every case.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network Error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API Error ({status}): {reason}")]
    Api { status: StatusCode, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
