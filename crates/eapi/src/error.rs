use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `eapi` crate.
///
/// Transport- and protocol-level failures are raised directly from
/// `login`/`logout`/`call`. Device-reported command failures are *not*
/// errors at this level -- they surface as a nonzero code on
/// [`Response`](crate::Response) and only become [`Error::Command`]
/// through an explicit `raise_for_error()`.
#[derive(Debug, Error)]
pub enum Error {
    // ── Caller input ────────────────────────────────────────────────
    /// Malformed target string or components (bad scheme, empty host,
    /// out-of-range port).
    #[error("invalid target: {message}")]
    InvalidTarget { message: String },

    /// Unrecognized output-encoding token.
    #[error("unknown encoding '{value}' (expected json or text)")]
    InvalidEncoding { value: String },

    /// No session parameters recorded for this domain -- the caller
    /// never logged in and supplied no ad-hoc credentials.
    #[error("unknown target '{domain}': log in before sending commands")]
    UnknownTarget { domain: String },

    // ── Authentication ──────────────────────────────────────────────
    /// HTTP 401 at login or call time, or a call attempted with
    /// neither a session cookie nor fallback credentials.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Non-2xx, non-401 HTTP status.
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// Connect or read deadline exceeded. Retryable at the caller's
    /// discretion; nothing is retried internally.
    #[error("request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Generic transport failure: DNS, refused connection, TLS
    /// handshake, broken pipe.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction failed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration problem (unreadable certificate, bad PEM).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Protocol ────────────────────────────────────────────────────
    /// The device returned more results than commands were submitted.
    #[error("device returned {results} results for {commands} commands")]
    MismatchedLength { commands: usize, results: usize },

    /// The reply body was not a recognizable JSON-RPC response.
    #[error("failed to decode reply: {message}")]
    Deserialization { message: String, body: String },

    // ── Device ──────────────────────────────────────────────────────
    /// Device-reported command failure, escalated from a `Response`
    /// via `raise_for_error()`.
    #[error("command failed (code {code}): {message}")]
    Command { code: i64, message: String },
}

impl Error {
    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient failure worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` if the device answered 404 (endpoint missing).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}
