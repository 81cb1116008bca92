// Command normalization.
//
// Commands are opaque to this layer: an instruction string plus an
// optional private input (e.g. an enable-mode secret). Bare strings are
// promoted to the pair form before transmission.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One CLI-style instruction, in the wire form `{"cmd", "input"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub cmd: String,
    #[serde(default)]
    pub input: String,
}

impl Command {
    /// A command with no private input.
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            input: String::new(),
        }
    }

    /// A command paired with a private input value.
    pub fn with_input(cmd: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            input: input.into(),
        }
    }
}

impl From<&str> for Command {
    fn from(cmd: &str) -> Self {
        Self::new(cmd)
    }
}

impl From<String> for Command {
    fn from(cmd: String) -> Self {
        Self::new(cmd)
    }
}

impl From<(&str, &str)> for Command {
    fn from((cmd, input): (&str, &str)) -> Self {
        Self::with_input(cmd, input)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cmd)
    }
}

/// Normalize a mixed list of bare strings and command pairs,
/// preserving order.
pub fn normalize<I, C>(commands: I) -> Vec<Command>
where
    I: IntoIterator<Item = C>,
    C: Into<Command>,
{
    commands.into_iter().map(Into::into).collect()
}

/// Prepend an `enable` command carrying the privileged-mode secret.
pub fn enable<I, C>(commands: I, secret: &str) -> Vec<Command>
where
    I: IntoIterator<Item = C>,
    C: Into<Command>,
{
    let mut prepared = vec![Command::with_input("enable", secret)];
    prepared.extend(commands.into_iter().map(Into::into));
    prepared
}

/// Wrap commands in a `configure` / `end` block.
pub fn configure<I, C>(commands: I) -> Vec<Command>
where
    I: IntoIterator<Item = C>,
    C: Into<Command>,
{
    let mut prepared = vec![Command::new("configure")];
    prepared.extend(commands.into_iter().map(Into::into));
    prepared.push(Command::new("end"));
    prepared
}
