use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::token;

const UNTITLED: &str = "<untitled>";

/// A discussion thread as returned by `forums.listThreads`.
///
/// The raw object is kept untouched so the export reproduces
/// exactly what the API sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thread(Value);

impl Thread {
    /// Wraps a raw thread object.
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Returns the thread id as the token the API expects back.
    ///
    /// Numeric ids are rendered as their decimal string.
    pub fn id(&self) -> Option<String> {
        self.0.get("id").and_then(token)
    }

    /// Returns a printable title for progress output.
    ///
    /// Prefers `clean_title`, falls back to `title`, and to a placeholder
    /// when neither is a string. Control characters are escaped.
    pub fn display_title(&self) -> Cow<'_, str> {
        let title = ["clean_title", "title"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str));

        match title {
            Some(t) if t.chars().any(char::is_control) => {
                let mut escaped = String::with_capacity(t.len());
                for c in t.chars() {
                    if c.is_control() {
                        escaped.extend(c.escape_default());
                    } else {
                        escaped.push(c);
                    }
                }
                Cow::Owned(escaped)
            }
            Some(t) => Cow::Borrowed(t),
            None => Cow::Borrowed(UNTITLED),
        }
    }
}

impl std::ops::Deref for Thread {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Value> for Thread {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

/// A single comment as returned by `posts.list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Post(Value);

impl Post {
    /// Wraps a raw post object.
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }
}

impl std::ops::Deref for Post {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Value> for Post {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

/// The unit written to disk: one thread and all of its posts.
///
/// Serializes to `{"thread": {...}, "posts": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// The thread exactly as fetched.
    pub thread: Thread,
    /// Every post of the thread in the order the API returned them.
    pub posts: Vec<Post>,
}

impl ExportRecord {
    /// Constructs a record from a thread and its complete post list.
    pub fn new(thread: Thread, posts: Vec<Post>) -> Self {
        Self { thread, posts }
    }
}
