//! Analysis client error types.

use thiserror::Error;

/// Errors from one conversation's analysis exchange.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No API key configured (config or `OPENAI_API_KEY`).
    #[error("no API key configured for the analysis endpoint")]
    MissingApiKey,

    /// HTTP transport error, including per-request timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the endpoint.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The endpoint returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The completion came back without any usable text.
    #[error("empty completion from the analysis endpoint")]
    EmptyResponse,

    /// Every attempt failed; carries the final cause.
    #[error("analysis failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl ClientError {
    /// Whether another attempt could reasonably succeed.
    ///
    /// Transport failures (including timeouts), rate limits, and 5xx
    /// responses are retryable; everything else fails immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::MissingApiKey | Self::EmptyResponse | Self::Exhausted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_retry_but_client_errors_do_not() {
        assert!(
            ClientError::Api {
                status: 503,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ClientError::Api {
                status: 401,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(ClientError::RateLimited { retry_after_secs: 5 }.is_retryable());
        assert!(!ClientError::EmptyResponse.is_retryable());
    }
}
