// Transport configuration for building reqwest clients.
//
// The async and blocking sessions share TLS, timeout, and cookie-jar
// settings through this module. One client is built per target at login
// time; all clients built from one session share its cookie jar so the
// device-side session cookie is reused across calls.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store. The default.
    #[default]
    System,
    /// Trust a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed device certs).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
///
/// The timeout pair follows eAPI convention: a short connect timeout
/// and a longer execute (read) timeout, since some commands -- `show
/// running-config` on a loaded device -- take a while to render.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Deadline for establishing the TCP/TLS connection.
    pub connect_timeout: Duration,
    /// Total per-request deadline; per-call overrides replace it.
    pub timeout: Duration,
    /// Client certificate + key PEM for channel authentication.
    pub identity: Option<PathBuf>,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
            identity: None,
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Attach a shared cookie jar (session-cookie reuse across calls).
    pub fn with_cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    /// Build an async `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        builder = self.apply_tls(builder)?;

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Build a `reqwest::blocking::Client` for the synchronous session.
    pub fn build_blocking_client(&self) -> Result<reqwest::blocking::Client, Error> {
        let mut builder = reqwest::blocking::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        builder = self.apply_blocking_tls(builder)?;

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    fn apply_tls(
        &self,
        mut builder: reqwest::ClientBuilder,
    ) -> Result<reqwest::ClientBuilder, Error> {
        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                builder = builder.add_root_certificate(read_certificate(path)?);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(path) = &self.identity {
            builder = builder.identity(read_identity(path)?);
        }

        Ok(builder)
    }

    fn apply_blocking_tls(
        &self,
        mut builder: reqwest::blocking::ClientBuilder,
    ) -> Result<reqwest::blocking::ClientBuilder, Error> {
        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                builder = builder.add_root_certificate(read_certificate(path)?);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(path) = &self.identity {
            builder = builder.identity(read_identity(path)?);
        }

        Ok(builder)
    }
}

const USER_AGENT: &str = concat!("eapi-rs/", env!("CARGO_PKG_VERSION"));

fn read_certificate(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem =
        std::fs::read(path).map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
    reqwest::Certificate::from_pem(&pem).map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))
}

fn read_identity(path: &Path) -> Result<reqwest::Identity, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("failed to read client certificate: {e}")))?;
    reqwest::Identity::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("invalid client certificate: {e}")))
}
