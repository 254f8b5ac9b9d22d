use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::de_opt_token;

/// Pagination state returned alongside every list response.
///
/// Only `id` and `more` drive the walk, any other keys the API sends
/// (`next`, `prev`, `hasNext`, `total`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Continuation token for the following page.
    #[serde(default, deserialize_with = "de_opt_token")]
    id: Option<String>,
    /// Whether another page exists.
    #[serde(default)]
    more: bool,
}

impl Cursor {
    /// Constructs a cursor from its token and `more` flag.
    pub fn new(id: Option<String>, more: bool) -> Self {
        Self { id, more }
    }

    /// Returns the continuation token (if any).
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns whether the API reports more pages.
    pub fn more(&self) -> bool {
        self.more
    }
}

/// One batch of records from a paginated endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T = Value> {
    records: Vec<T>,
    cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// Constructs a page.
    pub fn new(records: Vec<T>, cursor: Option<Cursor>) -> Self {
        Self { records, cursor }
    }

    /// Returns the records held by this page.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Returns the page's cursor (if the API sent one).
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Splits the page into its records and cursor.
    pub fn into_parts(self) -> (Vec<T>, Option<Cursor>) {
        (self.records, self.cursor)
    }
}

/// Response envelope wrapping every API answer.
///
/// On success `response` holds the records, on failure it holds the
/// error message and `code` is non-zero.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub(crate) code: u16,
    #[serde(default)]
    pub(crate) cursor: Option<Cursor>,
    #[serde(default)]
    pub(crate) response: Value,
}

impl Envelope {
    pub(crate) fn message(&self) -> String {
        match &self.response {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}
