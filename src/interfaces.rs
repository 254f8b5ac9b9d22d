//! The interface description the client validates requests against.
//!
//! The file maps resource names to endpoint descriptors:
//!
//! ```json
//! {
//!   "forums": {
//!     "listThreads": { "method": "GET", "required": ["forum"] }
//!   },
//!   "posts": {
//!     "list": { "method": "GET", "required": [] }
//!   }
//! }
//! ```
//!
//! A `required` entry may itself be a list, in which case any one of its
//! names satisfies it.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::{error::Error, models::Params, result::Result};

/// Parsed interface description file.
#[derive(Debug, Clone, Default)]
pub struct Interfaces {
    root: Value,
}

/// Description of a single endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Interface {
    /// HTTP method the endpoint is called with.
    #[serde(default)]
    pub method: Option<String>,
    /// Parameters that must be present on every call.
    #[serde(default)]
    pub required: Vec<Value>,
}

impl Interfaces {
    /// Wraps an already parsed description.
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Reads and parses the description file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read(path.as_ref()).await?;
        let root = serde_json::from_slice(&raw)?;
        log::debug!("loaded interfaces from {}", path.as_ref().display());
        Ok(Self { root })
    }

    /// Looks up a dotted endpoint name such as `forums.listThreads`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEndpoint`] if no descriptor exists.
    pub fn lookup(&self, endpoint: &str) -> Result<Interface> {
        let unknown = || Error::UnknownEndpoint(endpoint.to_string());

        let node = endpoint
            .split('.')
            .try_fold(&self.root, |node, part| node.get(part))
            .filter(|node| is_descriptor(node))
            .ok_or_else(unknown)?;

        Interface::deserialize(node).map_err(|_| unknown())
    }
}

impl Interface {
    /// Checks that every required parameter is present in `params`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] naming the first absent parameter.
    pub fn check(&self, endpoint: &str, params: &Params) -> Result<()> {
        for requirement in &self.required {
            let satisfied = match requirement {
                Value::String(name) => params.contains_key(name),
                Value::Array(any) => any
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|name| params.contains_key(name)),
                _ => true,
            };
            if !satisfied {
                return Err(Error::MissingParameter {
                    endpoint: endpoint.to_string(),
                    parameter: requirement_name(requirement),
                });
            }
        }
        Ok(())
    }
}

/// Endpoint descriptors are leaves: objects that nest no further objects.
fn is_descriptor(node: &Value) -> bool {
    node.as_object()
        .map_or(false, |fields| !fields.values().any(Value::is_object))
}

fn requirement_name(requirement: &Value) -> String {
    match requirement {
        Value::String(name) => name.clone(),
        Value::Array(any) => any
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("|"),
        other => other.to_string(),
    }
}
