// eapi: Async Rust client for the Arista eAPI command-execution
// interface (JSON-RPC over HTTP).
//
// The library manages per-target session state (cookie-based auth with
// a basic-auth fallback), request framing, and normalization of the
// device's heterogeneous success/error reply shapes into one ordered,
// iterable `Response`. Commands and their results are opaque payloads
// at this layer.

pub mod blocking;
pub mod command;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod session;
pub mod store;
pub mod target;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, configure, enable, normalize};
pub use config::{Auth, CallOptions, LoginOptions, SessionConfig};
pub use error::Error;
pub use request::{Encoding, Request};
pub use response::{CommandResult, Response, ResponseElem};
pub use session::Session;
pub use store::{EapiSession, SessionStore};
pub use target::{IntoTarget, Target, Transport};
pub use transport::{TlsMode, TransportConfig};
