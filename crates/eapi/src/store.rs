// Per-target session store.
//
// Keyed by `Target::domain()`, never by the raw target string -- two
// spellings of the same host resolve to the same entry. Entries live
// until explicit logout or store teardown; there is no expiry.

use dashmap::DashMap;

use crate::config::CallOptions;
use crate::error::Error;
use crate::target::{Target, Transport};

/// Connection parameters recorded at login and reused by every
/// subsequent call against the same domain.
///
/// Generic over the client type so the async and blocking sessions
/// share the store (`reqwest::Client` / `reqwest::blocking::Client`,
/// both cheap to clone).
#[derive(Debug, Clone)]
pub struct EapiSession<C> {
    /// Transport recorded at login.
    pub transport: Transport,
    /// Client built at login with this target's TLS settings, sharing
    /// the session-wide cookie jar.
    pub http: C,
    /// Default call options: fallback credentials when no session
    /// cookie was established, plus any timeout override.
    pub options: CallOptions,
}

/// Domain-keyed map of [`EapiSession`] entries.
///
/// A concurrent map so many async calls can read it without blocking
/// each other; concurrent logins against the same domain race with
/// last-writer-wins semantics.
#[derive(Debug)]
pub struct SessionStore<C> {
    entries: DashMap<String, EapiSession<C>>,
}

impl<C: Clone> SessionStore<C> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Overwrite-or-insert the entry for the target's domain.
    pub fn set(&self, target: &Target, entry: EapiSession<C>) {
        self.entries.insert(target.domain(), entry);
    }

    /// Fetch the entry for the target's domain.
    ///
    /// Fails with [`Error::UnknownTarget`] when no prior `set` exists:
    /// the caller must log in before sending commands.
    pub fn get(&self, target: &Target) -> Result<EapiSession<C>, Error> {
        let domain = target.domain();
        self.entries
            .get(&domain)
            .map(|entry| entry.value().clone())
            .ok_or(Error::UnknownTarget { domain })
    }

    pub fn contains(&self, target: &Target) -> bool {
        self.entries.contains_key(&target.domain())
    }

    /// Remove and return the entry for the target's domain, if any.
    pub fn remove(&self, target: &Target) -> Option<EapiSession<C>> {
        self.entries.remove(&target.domain()).map(|(_, entry)| entry)
    }

    /// Drop every entry (session shutdown).
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<C: Clone> Default for SessionStore<C> {
    fn default() -> Self {
        Self::new()
    }
}
