//! Endpoint launch table in the common `mcpServers` JSON layout.
//!
//! ```rust
//! use toolwire::ServersFile;
//!
//! let file = ServersFile::parse(
//!     r#"{"mcpServers": {"math": {"command": "toolwire-server", "env": {"KEY": "${HOME_DIR}"}}}}"#,
//! )
//! .expect("valid servers file");
//!
//! let commands = file.commands(|key| (key == "HOME_DIR").then(|| "/home/me".to_string()));
//! assert_eq!(commands[0].0, "math");
//! assert_eq!(commands[0].1.env["KEY"], "/home/me");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tchannel::ServerCommand;

use crate::SetupError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServersFile {
    #[serde(rename = "mcpServers")]
    pub servers: BTreeMap<String, ServerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerEntry {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ServersFile {
    pub fn parse(text: &str) -> Result<Self, SetupError> {
        let file: Self = serde_json::from_str(text)
            .map_err(|error| SetupError::config(format!("invalid servers file: {error}")))?;

        if let Some((name, _)) = file
            .servers
            .iter()
            .find(|(_, entry)| entry.command.trim().is_empty())
        {
            return Err(SetupError::config(format!(
                "server '{name}' has an empty command"
            )));
        }

        Ok(file)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|error| {
            SetupError::config(format!(
                "cannot read servers file {}: {error}",
                path.display()
            ))
        })?;

        Self::parse(&text)
    }

    /// Launch commands in name order, with `${VAR}` placeholders in env
    /// values expanded through `lookup`.
    pub fn commands<F>(&self, lookup: F) -> Vec<(String, ServerCommand)>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.servers
            .iter()
            .map(|(name, entry)| {
                let command = entry.env.iter().fold(
                    ServerCommand::new(&entry.command).args(entry.args.iter().cloned()),
                    |command, (key, value)| command.env(key, expand_placeholders(value, &lookup)),
                );
                (name.clone(), command)
            })
            .collect()
    }
}

/// Replaces each `${NAME}` with the looked-up value. Unknown names and
/// unterminated placeholders are left as written.
pub fn expand_placeholders<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => output.push_str(&value),
                    None => {
                        output.push_str("${");
                        output.push_str(name);
                        output.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                output.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    output.push_str(rest);
    output
}
