// Blocking session.
//
// Synchronous mirror of [`crate::Session`] with the same per-target
// state machine and error mapping, built on `reqwest::blocking`. One
// call in flight at a time per session; callers needing concurrency
// create more sessions or add their own synchronization.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::cookie::Jar;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::command::Command;
use crate::config::{CallOptions, LoginOptions, SessionConfig};
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::session::has_session_cookie;
use crate::store::{EapiSession, SessionStore};
use crate::target::{IntoTarget, Target, Transport};

/// Blocking eAPI session. Same contract as the async [`crate::Session`].
pub struct Session {
    config: SessionConfig,
    jar: Arc<Jar>,
    store: SessionStore<reqwest::blocking::Client>,
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

    /// See [`crate::Session::login`].
    pub fn login(&self, target: impl IntoTarget, opts: LoginOptions) -> Result<(), Error> {
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

        let http = http_cfg.build_blocking_client()?;

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
                .map_err(|e| Error::from_send(e, http_cfg.timeout))?;

            match resp.status() {
                StatusCode::UNAUTHORIZED => {
                    return Err(Error::Authentication {
                        message: format!("login rejected by {url}"),
                    });
                }
                StatusCode::NOT_FOUND => {
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

    /// See [`crate::Session::logged_in`].
    pub fn logged_in(&self, target: impl IntoTarget) -> Result<bool, Error> {
        let target = target.into_target(self.config.transport)?;
        Ok(has_session_cookie(&self.jar, &target))
    }

    /// See [`crate::Session::logout`].
    pub fn logout(&self, target: impl IntoTarget) -> Result<(), Error> {
        let target = target.into_target(self.config.transport)?;

        let Some(entry) = self.store.remove(&target) else {
            debug!(domain = %target.domain(), "logout of unregistered target ignored");
            return Ok(());
        };

        if has_session_cookie(&self.jar, &target) {
            let url = format!("{}/logout", target.url_with(entry.transport));
            match entry.http.post(&url).json(&json!({})).send() {
                Ok(resp) => debug!(status = %resp.status(), "logged out"),
                Err(e) => debug!(error = %e, "logout request failed (ignored)"),
            }
        }

        Ok(())
    }

    /// See [`crate::Session::call`].
    pub fn call<I, C>(
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
            Err(Error::UnknownTarget { .. }) if opts.auth.is_some() => {
                let http = self
                    .config
                    .http
                    .clone()
                    .with_cookie_jar(Arc::clone(&self.jar))
                    .build_blocking_client()?;
                EapiSession {
                    transport: target.transport(),
                    http,
                    options: CallOptions::default(),
                }
            }
            Err(e) => return Err(e),
        };

        let transport = opts.transport.unwrap_or(entry.transport);
        let auth = opts.auth.or(entry.options.auth);
        let timeout = opts.timeout.or(entry.options.timeout);
        let encoding = opts
            .encoding
            .or(entry.options.encoding)
            .unwrap_or(self.config.encoding);

        let cookie_auth = has_session_cookie(&self.jar, &target);
        if !cookie_auth && auth.is_none() {
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

        let body = resp.text().map_err(Error::Transport)?;
        let reply: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })?;

        Response::from_rpc_response(&target, &request, reply)
    }

    /// See [`crate::Session::shutdown`].
    pub fn shutdown(&self) {
        self.store.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// A session scoped to one target: login on acquisition, best-effort
/// logout on every exit path (normal return, panic unwind, early `?`).
pub struct ScopedSession {
    session: Session,
    target: Target,
}

impl ScopedSession {
    /// Log in and return a guard that logs out when dropped.
    pub fn login(
        config: SessionConfig,
        target: impl IntoTarget,
        opts: LoginOptions,
    ) -> Result<Self, Error> {
        let session = Session::new(config);
        let target = target.into_target(session.config.transport)?;
        session.login(&target, opts)?;
        Ok(Self { session, target })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run commands against the scoped target.
    pub fn call<I, C>(&self, commands: I, opts: CallOptions) -> Result<Response, Error>
    where
        I: IntoIterator<Item = C>,
        C: Into<Command>,
    {
        self.session.call(&self.target, commands, opts)
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        if let Err(e) = self.session.logout(&self.target) {
            debug!(error = %e, "scoped logout failed (ignored)");
        }
        self.session.shutdown();
    }
}
