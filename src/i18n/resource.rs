//! Resource trees and dotted-path lookup.
//!
//! A [`Resource`] is one language's translation tree. Leaves are literal
//! strings or [`Message`]s; inner nodes are nested resources. Trees are
//! immutable once built and shared behind `Arc` by the registry.

use crate::i18n::error::ResourceError;
use crate::i18n::message::{Message, MESSAGE_KEY};
use std::collections::HashMap;

/// A node in a resource tree.
#[derive(Debug, Clone)]
pub enum Entry {
    Text(String),
    Message(Message),
    Tree(Resource),
}

/// A terminal value found by [`Resource::find`].
#[derive(Debug, Clone, Copy)]
pub enum Leaf<'a> {
    Text(&'a str),
    Message(&'a Message),
}

/// One language's translation tree.
#[derive(Debug, Clone, Default)]
pub struct Resource {
    entries: HashMap<String, Entry>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style literal entry.
    pub fn text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), Entry::Text(value.into()));
        self
    }

    /// Builder-style message entry.
    pub fn message(mut self, key: impl Into<String>, message: Message) -> Self {
        self.entries.insert(key.into(), Entry::Message(message));
        self
    }

    /// Builder-style nested subtree.
    pub fn tree(mut self, key: impl Into<String>, child: Resource) -> Self {
        self.entries.insert(key.into(), Entry::Tree(child));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Walk the tree along a dot-separated path.
    ///
    /// Returns `None` when a segment is missing, when traversal reaches a leaf
    /// before the path is consumed, or when the path ends on a subtree.
    pub fn find(&self, path: &str) -> Option<Leaf<'_>> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.entries.get(first)?;

        for segment in segments {
            current = match current {
                Entry::Tree(child) => child.entries.get(segment)?,
                Entry::Text(_) | Entry::Message(_) => return None,
            };
        }

        match current {
            Entry::Text(text) => Some(Leaf::Text(text)),
            Entry::Message(message) => Some(Leaf::Message(message)),
            Entry::Tree(_) => None,
        }
    }

    /// Parse a resource from JSON text.
    ///
    /// Objects become subtrees, strings become literals, and objects holding a
    /// `"$message"` key become messages (see [`Message`] for `"$formats"`).
    pub fn from_json_str(json: &str) -> Result<Resource, ResourceError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Resource::from_json(&value)
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Resource, ResourceError> {
        match value {
            serde_json::Value::Object(map) => Resource::from_object("", map),
            other => Err(ResourceError::InvalidEntry {
                path: String::new(),
                found: json_kind(other),
            }),
        }
    }

    fn from_object(
        prefix: &str,
        map: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Resource, ResourceError> {
        let mut resource = Resource::new();

        for (key, value) in map {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };

            let entry = match value {
                serde_json::Value::String(text) => Entry::Text(text.clone()),
                serde_json::Value::Object(child) if child.contains_key(MESSAGE_KEY) => {
                    Entry::Message(Message::from_json(&path, child)?)
                }
                serde_json::Value::Object(child) => Entry::Tree(Resource::from_object(&path, child)?),
                other => {
                    return Err(ResourceError::InvalidEntry {
                        path,
                        found: json_kind(other),
                    })
                }
            };
            resource.entries.insert(key.clone(), entry);
        }

        Ok(resource)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
