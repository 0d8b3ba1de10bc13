//! Fetch Utilities
//!
//! Download and error-formatting helpers that providers and the resolver call
//! explicitly.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::AvatarError;

/// Builds the HTTP client used for avatar downloads.
pub fn http_client(timeout_ms: u64) -> Result<Client, AvatarError> {
    Ok(Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?)
}

// == Download Image ==
/// Downloads an image body.
///
/// Returns `None` for any non-200 answer or transport failure; a missing
/// image is not an error for the caller.
pub async fn download_image(client: &Client, url: &str) -> Option<Vec<u8>> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Avatar download from {} failed: {}", url, e);
            return None;
        }
    };

    if response.status() != StatusCode::OK {
        debug!("Avatar download from {} answered {}", url, response.status());
        return None;
    }

    match response.bytes().await {
        Ok(body) => Some(body.to_vec()),
        Err(e) => {
            warn!("Avatar body from {} could not be read: {}", url, e);
            None
        }
    }
}

// == Upstream Error ==
/// Maps a provider's HTTP status to a caller-facing error.
pub fn upstream_error(provider: &str, status: u16) -> AvatarError {
    let message = match status {
        404 => format!("User not found on {}", provider),
        400 => format!("Invalid parameters for {}", provider),
        429 => format!("Rate limited by {}", provider),
        503 => format!("{} service is unavailable", provider),
        500 => format!("Internal server error while accessing {}", provider),
        _ => format!("Error accessing {}", provider),
    };

    AvatarError::Upstream {
        provider: provider.to_string(),
        status,
        message,
    }
}
