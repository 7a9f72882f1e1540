use async_trait::async_trait;
use std::fmt::Debug;
use url::Url;

use crate::error::FetchError;

pub mod openmeteo;

pub use openmeteo::{OpenMeteoProvider, forecast_url};

/// Downloads the raw forecast document. Retries, fallbacks and timeouts are
/// the provider's business; callers only see the body or an error.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Body shortened for error messages and logs.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
