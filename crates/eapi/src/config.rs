// Session configuration.
//
// One explicit config value per session -- no process-wide mutable
// defaults, so independent sessions can carry independent settings.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::request::Encoding;
use crate::target::Transport;
use crate::transport::{TlsMode, TransportConfig};

/// Username/password pair for credential-based authentication.
///
/// The default is `admin` with an empty password -- the factory setting
/// on these devices.
#[derive(Debug, Clone)]
pub struct Auth {
    pub username: String,
    pub password: SecretString,
}

impl Auth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl Default for Auth {
    fn default() -> Self {
        Self::new("admin", "")
    }
}

/// Process defaults for a session, applied wherever a call or login
/// does not override them.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Scheme assumed when a target string carries none.
    pub transport: Transport,
    /// Credentials used by `login` when none are supplied.
    pub auth: Auth,
    /// Output encoding when a call does not pick one.
    pub encoding: Encoding,
    /// Request per-command timestamps in every reply.
    pub timestamps: bool,
    /// TLS / timeout settings for the underlying clients.
    pub http: TransportConfig,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn tls(mut self, tls: TlsMode) -> Self {
        self.http.tls = tls;
        self
    }

    /// Connect and execute (read) deadlines. Defaults: 5 s / 30 s.
    pub fn timeouts(mut self, connect: Duration, execute: Duration) -> Self {
        self.http.connect_timeout = connect;
        self.http.timeout = execute;
        self
    }
}

/// Options consumed by `login`. Everything is optional; the session
/// config supplies defaults.
#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    /// Credentials to POST to `/login`. Falls back to the configured
    /// default auth when unset.
    pub auth: Option<Auth>,
    /// Client certificate + key PEM. Forces https and skips the
    /// credential login entirely -- the server authenticates the
    /// channel itself.
    pub certificate: Option<PathBuf>,
    /// Per-target TLS override (e.g. accept a self-signed cert on one
    /// lab device only).
    pub tls: Option<TlsMode>,
    /// Per-target execute-timeout override, reused by every call
    /// against this target.
    pub timeout: Option<Duration>,
}

impl LoginOptions {
    /// Shorthand for a plain credential login.
    pub fn credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            auth: Some(Auth::new(username, password)),
            ..Self::default()
        }
    }
}

/// Per-call overrides, merged onto the stored session parameters
/// (per-call wins).
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Ad-hoc credentials. Also bypasses the session store for targets
    /// that never logged in (one-shot use).
    pub auth: Option<Auth>,
    /// Execute-timeout override for this call only.
    pub timeout: Option<Duration>,
    /// Scheme override for this call only.
    pub transport: Option<Transport>,
    /// Output-encoding override for this call only.
    pub encoding: Option<Encoding>,
}
