use reqwest::StatusCode;
use thiserror::Error;

/// Why the listing (or the reachability probe) could not be fetched.
///
/// Every variant is treated as "network unavailable" by the refresh cycle;
/// the distinction only shows up in logs.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No response within {0}s")]
    Timeout(u64),

    #[error("Still rate limited after backing off")]
    RateLimited,

    #[error("HTTP {status}: {excerpt}")]
    Status { status: u16, excerpt: String },

    #[error("Connection failed: {0}")]
    Connection(#[from] reqwest::Error),
}

/// Characters of a failed response body kept for the log line
const EXCERPT_CHARS: usize = 120;

impl FetchError {
    /// Non-success response other than 429, which the fetcher retries.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        FetchError::Status {
            status: status.as_u16(),
            excerpt: excerpt(body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Whitespace-collapsed start of an HTML error page.
fn excerpt(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_keeps_code() {
        let err = FetchError::from_status(StatusCode::BAD_GATEWAY, "<h1>Bad\n  Gateway</h1>");
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.to_string(), "HTTP 502: <h1>Bad Gateway</h1>");
        assert_eq!(FetchError::Timeout(5).status(), None);
    }

    #[test]
    fn test_excerpt_cuts_on_char_boundary() {
        let long = "ä".repeat(400);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("short"), "short");
    }
}
