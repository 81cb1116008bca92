// Async session orchestration.
//
// One `Session` owns a shared cookie jar and the domain-keyed store of
// per-target connection parameters. Any number of calls may be in
// flight concurrently; each suspends only on network I/O. Login must
// complete before calls against the same domain are issued -- it
// establishes the cookie/auth state the store depends on.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::cookie::{CookieStore, Jar};
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::command::Command;
use crate::config::{CallOptions, LoginOptions, SessionConfig};
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::store::{EapiSession, SessionStore};
use crate::target::{IntoTarget, Target, Transport};

/// Async eAPI session.
///
/// Per target domain the session is in one of three states:
/// *anonymous* (never logged in), *cookie-session* (device issued a
/// `Session` cookie held in the shared jar), or *fallback-credentials*
/// (device lacks cookie support; credentials ride along on every call).
pub struct Session {
    config: SessionConfig,
    jar: Arc<Jar>,
    store: SessionStore<reqwest::Client>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            jar: Arc::new(Jar::default()),
            store: SessionStore::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Establish session state for a target.
    ///
    /// With a client certificate the channel authenticates itself:
    /// transport is forced to https and no credential login happens.
    /// Otherwise credentials are POSTed to `/login`; a 404 (endpoint
    /// unsupported) or a success without a usable `Session` cookie
    /// downgrades to fallback credentials without failing. Logging in
    /// an already-cookie-authenticated target is a no-op success.
    pub async fn login(
        &self,
        target: impl IntoTarget,
        opts: LoginOptions,
    ) -> Result<(), Error> {
        let target = target.into_target(self.config.transport)?;

        if has_session_cookie(&self.jar, &target) && self.store.contains(&target) {
            debug!(domain = %target.domain(), "already logged in");
            return Ok(());
        }

        let mut http_cfg = self
            .config
            .http
            .clone()
            .with_cookie_jar(Arc::clone(&self.jar));
        if let Some(tls) = opts.tls.clone() {
            http_cfg.tls = tls;
        }
        if let Some(timeout) = opts.timeout {
            http_cfg.timeout = timeout;
        }

        let mut transport = target.transport();
        let mut fallback_auth = None;

        if let Some(certificate) = opts.certificate.clone() {
            transport = Transport::Https;
            http_cfg.identity = Some(certificate);
        }

        let http = http_cfg.build_client()?;

        if opts.certificate.is_none() {
            let auth = opts.auth.unwrap_or_else(|| self.config.auth.clone());
            let url = format!("{}/login", target.url_with(transport));
            debug!(url = %url, username = %auth.username, "credential login");

            let payload = json!({
                "username": auth.username,
                "password": auth.password.expose_secret(),
            });

            let resp = http
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| Error::from_send(e, http_cfg.timeout))?;

            match resp.status() {
                StatusCode::UNAUTHORIZED => {
                    return Err(Error::Authentication {
                        message: format!("login rejected by {url}"),
                    });
                }
                StatusCode::NOT_FOUND => {
                    // Device predates session cookies; credentials ride
                    // along on every call instead.
                    debug!("no /login endpoint; using per-call credentials");
                    fallback_auth = Some(auth);
                }
                status if !status.is_success() => {
                    return Err(Error::from_status(status));
                }
                _ => match resp.cookies().find(|c| c.name() == "Session") {
                    None => {
                        warn!(
                            "login succeeded but no 'Session' cookie in response; \
                             using fallback auth"
                        );
                        fallback_auth = Some(auth);
                    }
                    Some(cookie) if cookie.value() == "None" => {
                        warn!("got cookie Session='None' in response; using fallback auth");
                        fallback_auth = Some(auth);
                    }
                    Some(_) => {
                        debug!(domain = %target.domain(), "session cookie established");
                    }
                },
            }
        }

        self.store.set(
            &target,
            EapiSession {
                transport,
                http,
                options: CallOptions {
                    auth: fallback_auth,
                    timeout: opts.timeout,
                    ..CallOptions::default()
                },
            },
        );

        Ok(())
    }

    /// `true` iff the shared jar holds a usable `Session` cookie scoped
    /// to the target's host.
    pub fn logged_in(&self, target: impl IntoTarget) -> Result<bool, Error> {
        let target = target.into_target(self.config.transport)?;
        Ok(has_session_cookie(&self.jar, &target))
    }

    /// End the session for a target.
    ///
    /// Best-effort: the logout POST is issued only when a session
    /// cookie exists, and its failure is ignored (the device may
    /// already have dropped the session). The store entry is purged
    /// either way; a never-registered target is a no-op.
    pub async fn logout(&self, target: impl IntoTarget) -> Result<(), Error> {
        let target = target.into_target(self.config.transport)?;

        let Some(entry) = self.store.remove(&target) else {
            debug!(domain = %target.domain(), "logout of unregistered target ignored");
            return Ok(());
        };

        if has_session_cookie(&self.jar, &target) {
            let url = format!("{}/logout", target.url_with(entry.transport));
            match entry.http.post(&url).json(&json!({})).send().await {
                Ok(resp) => debug!(status = %resp.status(), "logged out"),
                Err(e) => debug!(error = %e, "logout request failed (ignored)"),
            }
        }

        Ok(())
    }

    /// Run an ordered list of commands against a target.
    ///
    /// Session parameters recorded at login are reused; per-call
    /// options win where both are set. A target that never logged in
    /// fails with [`Error::UnknownTarget`] unless ad-hoc credentials
    /// are supplied in `opts`.
    pub async fn call<I, C>(
        &self,
        target: impl IntoTarget,
        commands: I,
        opts: CallOptions,
    ) -> Result<Response, Error>
    where
        I: IntoIterator<Item = C>,
        C: Into<Command>,
    {
        let target = target.into_target(self.config.transport)?;

        let entry = match self.store.get(&target) {
            Ok(entry) => entry,
            // one-shot credential use bypasses the store
            Err(Error::UnknownTarget { .. }) if opts.auth.is_some() => {
                let http = self
                    .config
                    .http
                    .clone()
                    .with_cookie_jar(Arc::clone(&self.jar))
                    .build_client()?;
                EapiSession {
                    transport: target.transport(),
                    http,
                    options: CallOptions::default(),
                }
            }
            Err(e) => return Err(e),
        };

        // per-call overrides win over stored defaults
        let transport = opts.transport.unwrap_or(entry.transport);
        let auth = opts.auth.or(entry.options.auth);
        let timeout = opts.timeout.or(entry.options.timeout);
        let encoding = opts
            .encoding
            .or(entry.options.encoding)
            .unwrap_or(self.config.encoding);

        let cookie_auth = has_session_cookie(&self.jar, &target);
        if !cookie_auth && auth.is_none() {
            // fail fast rather than let the device 401
            return Err(Error::Authentication {
                message: format!(
                    "no session cookie and no credentials for '{}'",
                    target.domain()
                ),
            });
        }

        let request =
            Request::new(commands, encoding).with_timestamps(self.config.timestamps);
        let url = format!("{}/command-api", target.url_with(transport));
        debug!(id = %request.id, url = %url, "runCmds");

        let mut builder = entry.http.post(&url).json(&request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if !cookie_auth {
            if let Some(auth) = &auth {
                builder = builder.basic_auth(&auth.username, Some(auth.password.expose_secret()));
            }
        }

        let effective_timeout = timeout.unwrap_or(self.config.http.timeout);
        let resp = builder
            .send()
            .await
            .map_err(|e| Error::from_send(e, effective_timeout))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("device at {url} rejected the request"),
            });
        }
        if !status.is_success() {
            return Err(Error::from_status(status));
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let reply: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })?;

        Response::from_rpc_response(&target, &request, reply)
    }

    /// Tear down all per-target state. Cookies die with the session
    /// value itself.
    pub fn shutdown(&self) {
        self.store.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Error {
    pub(crate) fn from_status(status: StatusCode) -> Self {
        Self::Http {
            status: status.as_u16(),
            reason: status
                .canonical_reason()
                .unwrap_or("unrecognized status")
                .to_owned(),
        }
    }

    pub(crate) fn from_send(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            Self::Timeout { timeout }
        } else {
            Self::Transport(e)
        }
    }
}

/// Does the jar hold a usable `Session` cookie for this target?
///
/// A literal `"None"` value counts as absent -- some firmware revisions
/// emit it on otherwise-successful logins.
pub(crate) fn has_session_cookie(jar: &Jar, target: &Target) -> bool {
    let Ok(url) = Url::parse(&target.url()) else {
        return false;
    };
    let Some(header) = jar.cookies(&url) else {
        return false;
    };
    let Ok(cookies) = header.to_str() else {
        return false;
    };

    cookies.split("; ").any(|pair| {
        matches!(
            pair.split_once('='),
            Some(("Session", value)) if !value.is_empty() && value != "None"
        )
    })
}
