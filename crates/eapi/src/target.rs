// Target parsing and normalization.
//
// A target is a (transport, host, port) triple identifying one device.
// Targets are built fresh per call from a string or a pre-built value
// and are immutable once constructed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Transport scheme for reaching a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Plain HTTP. The factory default on most devices.
    #[default]
    Http,
    /// HTTPS. Forced when a client certificate is in play.
    Https,
}

impl Transport {
    /// URL scheme token.
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Conventional TCP port for the scheme, omitted from canonical URLs.
    pub fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(Error::InvalidTarget {
                message: format!("unknown scheme '{other}' (expected http or https)"),
            }),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// A normalized device address: scheme, hostname, optional port.
///
/// Parsed from strings of the form `[scheme://]hostname[:port][/]`.
/// `Display` renders the canonical URL, so parsing is idempotent:
/// `Target::parse(t.to_string())` reproduces `t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    transport: Transport,
    host: String,
    port: Option<u16>,
}

impl Target {
    /// Parse a target, applying `Transport::default()` when the scheme
    /// is omitted. Session methods use the configured default instead;
    /// see [`Target::parse_with`].
    pub fn parse(input: impl IntoTarget) -> Result<Self, Error> {
        input.into_target(Transport::default())
    }

    /// Parse a target string, applying `default` when no scheme is given.
    pub fn parse_with(s: &str, default: Transport) -> Result<Self, Error> {
        let s = s.trim();

        let (scheme, rest) = match s.split_once("://") {
            Some((scheme, rest)) => (Some(scheme), rest),
            None => (None, s),
        };

        let transport = match scheme {
            Some(scheme) => scheme.parse()?,
            None => default,
        };

        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let (host, port) = match rest.split_once(':') {
            Some((host, port)) => (host, Some(parse_port(port)?)),
            None => (rest, None),
        };

        if host.is_empty() {
            return Err(Error::InvalidTarget {
                message: format!("no hostname in '{s}'"),
            });
        }

        if host.contains(['/', ':', '@', ' ']) {
            return Err(Error::InvalidTarget {
                message: format!("invalid hostname '{host}'"),
            });
        }

        Ok(Self {
            transport,
            host: host.to_owned(),
            port,
        })
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Canonical URL: `scheme://host[:port]`, with the port omitted when
    /// it equals the scheme's conventional default.
    pub fn url(&self) -> String {
        self.url_with(self.transport)
    }

    /// Canonical URL under a different scheme (per-call transport
    /// override). Default-port elision follows the overriding scheme.
    pub fn url_with(&self, transport: Transport) -> String {
        match self.port {
            Some(port) if port != transport.default_port() => {
                format!("{}://{}:{}", transport.scheme(), self.host, port)
            }
            _ => format!("{}://{}", transport.scheme(), self.host),
        }
    }

    /// Cookie-scoping key for this target.
    ///
    /// Bare hostnames are not valid cookie domains, so a synthetic
    /// `.local` suffix is appended when the hostname contains no dot.
    /// Used to bucket session state; never transmitted.
    pub fn domain(&self) -> String {
        if self.host.contains('.') {
            self.host.clone()
        } else {
            format!("{}.local", self.host)
        }
    }
}

fn parse_port(s: &str) -> Result<u16, Error> {
    let port: u16 = s.parse().map_err(|_| Error::InvalidTarget {
        message: format!("invalid port '{s}'"),
    })?;
    if port == 0 {
        return Err(Error::InvalidTarget {
            message: "port 0 is out of range".into(),
        });
    }
    Ok(port)
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with(s, Transport::default())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Conversion into a [`Target`] with a context-supplied default scheme.
///
/// Implemented for strings (parsed) and for `Target` itself (returned
/// unchanged -- the default scheme is ignored for pre-built targets).
pub trait IntoTarget {
    fn into_target(self, default: Transport) -> Result<Target, Error>;
}

impl IntoTarget for Target {
    fn into_target(self, _default: Transport) -> Result<Target, Error> {
        Ok(self)
    }
}

impl IntoTarget for &Target {
    fn into_target(self, _default: Transport) -> Result<Target, Error> {
        Ok(self.clone())
    }
}

impl IntoTarget for &str {
    fn into_target(self, default: Transport) -> Result<Target, Error> {
        Target::parse_with(self, default)
    }
}

impl IntoTarget for String {
    fn into_target(self, default: Transport) -> Result<Target, Error> {
        Target::parse_with(&self, default)
    }
}

impl IntoTarget for &String {
    fn into_target(self, default: Transport) -> Result<Target, Error> {
        Target::parse_with(self, default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_hostname() {
        let t = Target::parse("veos1").unwrap();
        assert_eq!(t.host(), "veos1");
        assert_eq!(t.transport(), Transport::Http);
        assert_eq!(t.port(), None);
        assert_eq!(t.url(), "http://veos1");
    }

    #[test]
    fn parses_scheme_host_port() {
        let t = Target::parse("https://switch.example.com:8443").unwrap();
        assert_eq!(t.transport(), Transport::Https);
        assert_eq!(t.host(), "switch.example.com");
        assert_eq!(t.port(), Some(8443));
        assert_eq!(t.url(), "https://switch.example.com:8443");
    }

    #[test]
    fn strips_trailing_slash() {
        let t = Target::parse("http://veos1/").unwrap();
        assert_eq!(t.url(), "http://veos1");
    }

    #[test]
    fn omits_default_port_from_url() {
        assert_eq!(Target::parse("http://veos1:80").unwrap().url(), "http://veos1");
        assert_eq!(
            Target::parse("https://veos1:443").unwrap().url(),
            "https://veos1"
        );
        assert_eq!(
            Target::parse("https://veos1:80").unwrap().url(),
            "https://veos1:80"
        );
    }

    #[test]
    fn url_with_override_uses_overriding_default_port() {
        let t = Target::parse("http://veos1:443").unwrap();
        assert_eq!(t.url_with(Transport::Https), "https://veos1");
    }

    #[test]
    fn parse_roundtrip_is_idempotent() {
        for s in ["veos1", "https://veos1", "veos1:8080", "https://sw.lab:9443/"] {
            let once = Target::parse(s).unwrap();
            let twice = Target::parse(once.to_string()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn prebuilt_target_passes_through() {
        let t = Target::parse("https://veos1:8443").unwrap();
        let again = Target::parse(t.clone()).unwrap();
        assert_eq!(t, again);
    }

    #[test]
    fn domain_appends_local_for_dotless_hosts() {
        let t = Target::parse("veos1").unwrap();
        assert_eq!(t.domain(), "veos1.local");
        // never doubled on repeated access
        assert_eq!(t.domain(), "veos1.local");

        let t = Target::parse("sw1.example.com").unwrap();
        assert_eq!(t.domain(), "sw1.example.com");

        let t = Target::parse("192.168.1.10").unwrap();
        assert_eq!(t.domain(), "192.168.1.10");
    }

    #[test]
    fn rejects_malformed_targets() {
        for s in ["", "ssh://veos1", "http://", "veos1:0", "veos1:99999", "veos1:abc"] {
            assert!(
                matches!(Target::parse(s), Err(Error::InvalidTarget { .. })),
                "expected InvalidTarget for {s:?}"
            );
        }
    }

    #[test]
    fn default_scheme_is_configurable() {
        let t = Target::parse_with("veos1", Transport::Https).unwrap();
        assert_eq!(t.url(), "https://veos1");
        // explicit scheme wins over the default
        let t = Target::parse_with("http://veos1", Transport::Https).unwrap();
        assert_eq!(t.url(), "http://veos1");
    }
}
