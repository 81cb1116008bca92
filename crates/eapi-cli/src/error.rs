//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Exit codes, grouped by failure class.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Invalid target '{target}'")]
    #[diagnostic(
        code(eapi::invalid_target),
        help("Targets look like: veos1, 192.0.2.1:8080, https://sw1.example.com")
    )]
    InvalidTarget { target: String, reason: String },

    #[error("Authentication failed for {target}")]
    #[diagnostic(
        code(eapi::auth_failed),
        help("Check the username/password (-u / -p), or use --cert for channel auth.")
    )]
    AuthFailed { target: String },

    #[error("Could not reach {target}")]
    #[diagnostic(
        code(eapi::connection_failed),
        help(
            "Check that the device is up and eAPI is enabled\n\
             (`management api http-commands` / `no shutdown`).\n\
             For self-signed certificates, add --insecure (-k)."
        )
    )]
    ConnectionFailed {
        target: String,
        #[source]
        source: eapi::Error,
    },

    #[error("Request to {target} timed out")]
    #[diagnostic(
        code(eapi::timeout),
        help("Slow commands may need a larger --timeout.")
    )]
    Timeout { target: String },

    #[error("Device at {target} answered HTTP {status}")]
    #[diagnostic(code(eapi::http_error))]
    Http {
        target: String,
        status: u16,
        reason: String,
    },

    #[error("Command failed (code {code}): {message}")]
    #[diagnostic(
        code(eapi::command_failed),
        help("The device stopped at the first failing command; earlier results are printed above.")
    )]
    CommandFailed { code: i64, message: String },

    #[error("Failed to read password from the terminal")]
    #[diagnostic(code(eapi::password_prompt))]
    PasswordPrompt {
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(eapi::error))]
    Api(eapi::Error),
}

impl CliError {
    /// Wrap a library error, attaching the target for context.
    pub fn from_api(target: &str, err: eapi::Error) -> Self {
        match err {
            eapi::Error::InvalidTarget { message } | eapi::Error::InvalidEncoding { value: message } => {
                Self::InvalidTarget {
                    target: target.to_owned(),
                    reason: message,
                }
            }
            eapi::Error::Authentication { .. } | eapi::Error::UnknownTarget { .. } => {
                Self::AuthFailed {
                    target: target.to_owned(),
                }
            }
            eapi::Error::Timeout { .. } => Self::Timeout {
                target: target.to_owned(),
            },
            eapi::Error::Http { status, reason } => Self::Http {
                target: target.to_owned(),
                status,
                reason,
            },
            e @ (eapi::Error::Transport(_) | eapi::Error::Tls(_)) => Self::ConnectionFailed {
                target: target.to_owned(),
                source: e,
            },
            e => Self::Api(e),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Http { status: 404, .. } => exit_code::NOT_FOUND,
            _ => exit_code::GENERAL,
        }
    }
}
