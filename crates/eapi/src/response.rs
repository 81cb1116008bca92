// Response model.
//
// Maps the two JSON-RPC reply shapes (clean `result` array, or `error`
// with partial `data`) onto one ordered, iterable structure with the
// result list padded to the command-list length. Devices stop executing
// after the first failed command, so an errored reply may carry fewer
// results than commands -- never more.

use std::fmt;
use std::slice;

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::command::Command;
use crate::error::Error;
use crate::request::{Encoding, Request};
use crate::target::Target;

/// One command's result: structured key/value data or trimmed text.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Json(Map<String, Value>),
    Text(String),
}

impl CommandResult {
    /// Empty placeholder used to pad truncated result arrays.
    fn empty(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Json => Self::Json(Map::new()),
            Encoding::Text => Self::Text(String::new()),
        }
    }

    fn from_raw(raw: Value, encoding: Encoding) -> Self {
        match encoding {
            Encoding::Text => {
                let output = raw
                    .get("output")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Self::Text(output.trim().to_owned())
            }
            Encoding::Json => match raw {
                Value::Object(map) => Self::Json(map),
                _ => Self::Json(Map::new()),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Json(map) => Some(map),
            Self::Text(_) => None,
        }
    }

    /// JSON projection: the map itself, or the text as a string value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Json(map) => Value::Object(map.clone()),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Json(map) => {
                let rendered = serde_json::to_string_pretty(map).unwrap_or_default();
                f.write_str(&rendered)
            }
        }
    }
}

/// One command paired with its result, matched by position.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseElem {
    pub command: Command,
    pub result: CommandResult,
}

impl ResponseElem {
    pub fn to_value(&self) -> Value {
        json!({
            "command": self.command.cmd,
            "result": self.result.to_value(),
        })
    }
}

impl fmt::Display for ResponseElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.result.fmt(f)
    }
}

/// Parsed reply for one call: status plus ordered per-command elements.
///
/// A nonzero `code` is a device-reported error; it is surfaced as data,
/// not raised -- escalate explicitly with [`Response::raise_for_error`].
#[derive(Debug, Clone)]
pub struct Response {
    /// Canonical URL of the originating target.
    pub target: String,
    /// 0 on success; a device error code otherwise. Negative codes are
    /// JSON-RPC-level failures not attributable to any one command.
    pub code: i64,
    pub message: String,
    pub elements: Vec<ResponseElem>,
}

#[derive(Deserialize)]
struct RawReply {
    result: Option<Vec<Value>>,
    error: Option<RawError>,
}

#[derive(Deserialize)]
struct RawError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Vec<Value>,
}

impl Response {
    /// Parse a raw decoded JSON-RPC reply against the originating
    /// request (which supplies the command list and encoding).
    pub fn from_rpc_response(
        target: &Target,
        request: &Request,
        reply: Value,
    ) -> Result<Self, Error> {
        let raw: RawReply =
            serde_json::from_value(reply.clone()).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: reply.to_string(),
            })?;

        let encoding = request.encoding();
        let commands = request.commands();

        let (code, message, results) = match raw.error {
            Some(err) => (err.code, err.message, err.data),
            None => match raw.result {
                Some(results) => (0, "OK".to_owned(), results),
                None => {
                    return Err(Error::Deserialization {
                        message: "reply carries neither 'result' nor 'error'".into(),
                        body: reply.to_string(),
                    });
                }
            },
        };

        if results.len() > commands.len() {
            return Err(Error::MismatchedLength {
                commands: commands.len(),
                results: results.len(),
            });
        }

        // Pad to the command-list length, then zip by position.
        let mut results = results.into_iter();
        let elements = commands
            .iter()
            .map(|command| {
                let result = match results.next() {
                    Some(raw) => CommandResult::from_raw(raw, encoding),
                    None => CommandResult::empty(encoding),
                };
                ResponseElem {
                    command: command.clone(),
                    result,
                }
            })
            .collect();

        Ok(Self {
            target: target.url(),
            code,
            message,
            elements,
        })
    }

    /// `true` when the device reported an error for this call.
    pub fn errored(&self) -> bool {
        self.code != 0
    }

    /// Escalate a device-reported error into [`Error::Command`].
    pub fn raise_for_error(&self) -> Result<(), Error> {
        if self.errored() {
            return Err(Error::Command {
                code: self.code,
                message: self.message.clone(),
            });
        }
        Ok(())
    }

    /// Substring search over the full human-readable rendering (target,
    /// status, each command and its rendered result). A quick pattern
    /// check, not structured inspection.
    pub fn contains(&self, needle: &str) -> bool {
        self.to_string().contains(needle)
    }

    pub fn iter(&self) -> slice::Iter<'_, ResponseElem> {
        self.elements.iter()
    }

    /// JSON projection: `{"status": [code, message], "responses": [...]}`.
    pub fn to_value(&self) -> Value {
        json!({
            "status": [self.code, self.message],
            "responses": self.elements.iter().map(ResponseElem::to_value).collect::<Vec<_>>(),
        })
    }
}

impl<'a> IntoIterator for &'a Response {
    type Item = &'a ResponseElem;
    type IntoIter = slice::Iter<'a, ResponseElem>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "target: {}", self.target)?;
        writeln!(f, "status: [{}] {}", self.code, self.message)?;
        writeln!(f)?;
        writeln!(f, "responses:")?;

        for elem in &self.elements {
            writeln!(f, "- command: {}", elem.command)?;
            writeln!(f, "  result: |")?;
            writeln!(f, "{}", indent("    ", &elem.result.to_string()))?;
        }

        Ok(())
    }
}

fn indent(prefix: &str, text: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(commands: &[&str], encoding: Encoding) -> Request {
        Request::new(commands.iter().copied(), encoding)
    }

    fn target() -> Target {
        Target::parse("localhost").unwrap()
    }

    #[test]
    fn parses_clean_text_reply() {
        let req = request(&["show hostname", "show version"], Encoding::Text);
        let reply = json!({
            "jsonrpc": "2.0",
            "id": "45e8f5f4-7620-43c9-8407-da0a03bbcc50",
            "result": [
                {"output": "Hostname: rbf153\nFQDN:     rbf153.sjc.example.com\n"},
                {"output": "Arista DCS-7280CR2M-30-F\nSoftware image version: 4.23.2.1F\n"},
            ]
        });

        let resp = Response::from_rpc_response(&target(), &req, reply).unwrap();
        assert_eq!(resp.code, 0);
        assert_eq!(resp.message, "OK");
        assert_eq!(resp.elements.len(), 2);
        // surrounding whitespace is trimmed
        assert_eq!(
            resp.elements[0].result.as_text(),
            Some("Hostname: rbf153\nFQDN:     rbf153.sjc.example.com")
        );
        assert!(resp.contains("FQDN"));
    }

    #[test]
    fn parses_clean_json_reply() {
        let req = request(&["show hostname"], Encoding::Json);
        let reply = json!({
            "jsonrpc": "2.0",
            "id": "532c456f-0b5a-4e20-885b-0e838aa1bb57",
            "result": [{"fqdn": "rbf153.sjc.example.com", "hostname": "rbf153"}]
        });

        let resp = Response::from_rpc_response(&target(), &req, reply).unwrap();
        assert_eq!(resp.code, 0);
        let map = resp.elements[0].result.as_json().unwrap();
        assert_eq!(map["hostname"], "rbf153");
        assert!(resp.contains("fqdn"));
    }

    #[test]
    fn errored_reply_keeps_partial_data_aligned() {
        let req = request(&["show hostname", "show bogus"], Encoding::Json);
        let reply = json!({
            "jsonrpc": "2.0",
            "id": "6585432e-2214-43d8-be6b-06bf68617aba",
            "error": {
                "data": [
                    {"fqdn": "veos3-782f", "hostname": "veos3-782f"},
                    {"errors": ["Invalid input (at token 1: 'bogus')"]},
                ],
                "message": "CLI command 2 of 2 'show bogus' failed: invalid command",
                "code": 1002
            }
        });

        let resp = Response::from_rpc_response(&target(), &req, reply).unwrap();
        assert_eq!(resp.code, 1002);
        assert_eq!(resp.elements.len(), 2);
        let second = resp.elements[1].result.as_json().unwrap();
        assert!(second.contains_key("errors"));
        assert!(resp.contains("Invalid input"));
        assert!(resp.raise_for_error().is_err());
    }

    #[test]
    fn short_result_array_is_padded_to_command_count() {
        let req = request(&["bad command", "show hostname", "show version"], Encoding::Json);
        let reply = json!({
            "error": {
                "code": 1002,
                "message": "CLI command 1 of 3 'bad command' failed: invalid command",
                "data": [{"errors": ["Invalid input"]}]
            }
        });

        let resp = Response::from_rpc_response(&target(), &req, reply).unwrap();
        assert_eq!(resp.elements.len(), 3);
        assert_eq!(resp.elements[1].result, CommandResult::Json(Map::new()));
        assert_eq!(resp.elements[2].result, CommandResult::Json(Map::new()));
    }

    #[test]
    fn rpc_level_error_without_data_pads_everything() {
        let req = request(&["show hostname"], Encoding::Json);
        let reply = json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": {"message": "Expected field 'jsonrpc' not specified", "code": -32600}
        });

        let resp = Response::from_rpc_response(&target(), &req, reply).unwrap();
        assert_eq!(resp.code, -32600);
        assert_eq!(resp.elements.len(), 1);
    }

    #[test]
    fn overlong_result_array_is_a_protocol_violation() {
        let req = request(&["show hostname"], Encoding::Json);
        let reply = json!({"result": [{"a": 1}, {"b": 2}]});

        let err = Response::from_rpc_response(&target(), &req, reply).unwrap_err();
        assert!(matches!(
            err,
            Error::MismatchedLength { commands: 1, results: 2 }
        ));
    }

    #[test]
    fn reply_with_neither_result_nor_error_is_rejected() {
        let req = request(&["show hostname"], Encoding::Json);
        let err =
            Response::from_rpc_response(&target(), &req, json!({"jsonrpc": "2.0"})).unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn errored_text_reply_renders_output_field() {
        let req = request(&["show hostname", "show bogus"], Encoding::Text);
        let reply = json!({
            "error": {
                "data": [
                    {"output": "Hostname: veos3-782f\n"},
                    {"output": "% Invalid input (at token 1: 'bogus')\n",
                     "errors": ["Invalid input (at token 1: 'bogus')"]},
                ],
                "message": "CLI command 2 of 2 'show bogus' failed: invalid command",
                "code": 1002
            }
        });

        let resp = Response::from_rpc_response(&target(), &req, reply).unwrap();
        assert_eq!(resp.code, 1002);
        assert_eq!(
            resp.elements[1].result.as_text(),
            Some("% Invalid input (at token 1: 'bogus')")
        );
        assert!(resp.contains("Invalid input"));
    }

    #[test]
    fn to_value_projects_status_and_responses() {
        let req = request(&["show hostname"], Encoding::Json);
        let reply = json!({"result": [{"hostname": "veos1"}]});
        let resp = Response::from_rpc_response(&target(), &req, reply).unwrap();

        let v = resp.to_value();
        assert_eq!(v["status"], json!([0, "OK"]));
        assert_eq!(v["responses"][0]["command"], "show hostname");
        assert_eq!(v["responses"][0]["result"]["hostname"], "veos1");
    }

    #[test]
    fn display_renders_block_format() {
        let req = request(&["show hostname"], Encoding::Text);
        let reply = json!({"result": [{"output": "Hostname: veos1\n"}]});
        let resp = Response::from_rpc_response(&target(), &req, reply).unwrap();

        let rendered = resp.to_string();
        assert!(rendered.starts_with("target: http://localhost\n"));
        assert!(rendered.contains("status: [0] OK"));
        assert!(rendered.contains("- command: show hostname"));
        assert!(rendered.contains("    Hostname: veos1"));
    }
}
