// JSON-RPC request envelope.
//
// Every call sends a `runCmds` request with a fresh UUIDv4 id. The id
// exists for diagnostic correlation only -- it is never reused across
// retries and never used for deduplication.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::command::Command;
use crate::error::Error;

/// Output encoding requested from the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Structured per-command results.
    #[default]
    Json,
    /// Human-readable text, one `output` blob per command.
    Text,
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(Error::InvalidEncoding {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Text => "text",
        })
    }
}

/// `runCmds` parameters: protocol version 1, output encoding, ordered
/// command list. Timestamps are serialized only when requested.
#[derive(Debug, Clone, Serialize)]
pub struct Params {
    pub version: u32,
    pub format: Encoding,
    pub cmds: Vec<Command>,
    #[serde(skip_serializing_if = "is_false")]
    pub timestamps: bool,
}

/// The JSON-RPC envelope POSTed to `/command-api`.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    jsonrpc: &'static str,
    method: &'static str,
    pub params: Params,
    pub id: String,
}

impl Request {
    /// Build a request for an ordered command list.
    pub fn new<I, C>(commands: I, encoding: Encoding) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Command>,
    {
        Self {
            jsonrpc: "2.0",
            method: "runCmds",
            params: Params {
                version: 1,
                format: encoding,
                cmds: crate::command::normalize(commands),
                timestamps: false,
            },
            id: Uuid::new_v4().to_string(),
        }
    }

    /// Include per-command timestamps in the reply.
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.params.timestamps = timestamps;
        self
    }

    /// The normalized command list, in submission order.
    pub fn commands(&self) -> &[Command] {
        &self.params.cmds
    }

    /// The requested output encoding.
    pub fn encoding(&self) -> Encoding {
        self.params.format
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_run_cmds_envelope() {
        let req = Request::new(["show hostname"], Encoding::Json);
        let v = serde_json::to_value(&req).unwrap();

        assert_eq!(v["jsonrpc"], "2.0");
        assert_eq!(v["method"], "runCmds");
        assert_eq!(
            v["params"],
            json!({
                "version": 1,
                "format": "json",
                "cmds": [{"cmd": "show hostname", "input": ""}],
            })
        );
        // id is a parseable UUID
        Uuid::parse_str(v["id"].as_str().unwrap()).unwrap();
    }

    #[test]
    fn request_ids_are_unique_per_call() {
        let a = Request::new(["show version"], Encoding::Json);
        let b = Request::new(["show version"], Encoding::Json);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn timestamps_serialized_only_when_enabled() {
        let req = Request::new(["show clock"], Encoding::Text);
        let v = serde_json::to_value(&req).unwrap();
        assert!(v["params"].get("timestamps").is_none());

        let req = req.with_timestamps(true);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["params"]["timestamps"], true);
    }

    #[test]
    fn encoding_parses_from_str() {
        assert_eq!("json".parse::<Encoding>().unwrap(), Encoding::Json);
        assert_eq!("text".parse::<Encoding>().unwrap(), Encoding::Text);
        assert!("xml".parse::<Encoding>().is_err());
    }
}
