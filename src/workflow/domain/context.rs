//! Caller-supplied routing context.

use super::RoutingContextError;
use crate::messaging::domain::MessagePriority;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Language used when the caller does not state one.
pub const DEFAULT_LANGUAGE: &str = "en";

const LANGUAGE_KEY: &str = "preferred_language";
const PRIORITY_KEY: &str = "priority";

/// Structured context travelling with a routed request.
///
/// `preferred_language` and `priority` are reserved keys with a fixed
/// schema; every other key is passed through to the primary agent
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingContext {
    preferred_language: String,
    priority: MessagePriority,
    attributes: Map<String, Value>,
}

impl Default for RoutingContext {
    fn default() -> Self {
        Self {
            preferred_language: DEFAULT_LANGUAGE.to_owned(),
            priority: MessagePriority::Normal,
            attributes: Map::new(),
        }
    }
}

impl RoutingContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the preferred language.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingContextError::InvalidLanguage`] unless `language` is
    /// a two or three letter primary tag with optional alphanumeric subtags.
    pub fn with_language(mut self, language: &str) -> Result<Self, RoutingContextError> {
        self.preferred_language = parse_language(language)?;
        Ok(self)
    }

    /// Sets the dispatch priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a pass-through attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Returns the preferred language tag.
    #[must_use]
    pub fn preferred_language(&self) -> &str {
        &self.preferred_language
    }

    /// Returns the dispatch priority.
    #[must_use]
    pub const fn priority(&self) -> MessagePriority {
        self.priority
    }

    /// Returns the pass-through attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Renders the context as the JSON object sent to agents.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = self.attributes.clone();
        object.insert(
            LANGUAGE_KEY.to_owned(),
            Value::String(self.preferred_language.clone()),
        );
        object.insert(
            PRIORITY_KEY.to_owned(),
            Value::String(self.priority.as_str().to_owned()),
        );
        Value::Object(object)
    }
}

impl TryFrom<Value> for RoutingContext {
    type Error = RoutingContextError;

    /// Validates a JSON context. `null` is treated as an empty object.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut attributes = match value {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            Value::Bool(_) => return Err(RoutingContextError::NotAnObject("boolean")),
            Value::Number(_) => return Err(RoutingContextError::NotAnObject("number")),
            Value::String(_) => return Err(RoutingContextError::NotAnObject("string")),
            Value::Array(_) => return Err(RoutingContextError::NotAnObject("array")),
        };

        let preferred_language = match attributes.remove(LANGUAGE_KEY) {
            None | Some(Value::Null) => DEFAULT_LANGUAGE.to_owned(),
            Some(Value::String(raw)) => parse_language(&raw)?,
            Some(_) => {
                return Err(RoutingContextError::WrongType {
                    field: LANGUAGE_KEY,
                    expected: "string",
                });
            }
        };
        let priority = match attributes.remove(PRIORITY_KEY) {
            None | Some(Value::Null) => MessagePriority::Normal,
            Some(Value::String(raw)) => MessagePriority::try_from(raw.as_str())
                .map_err(|_| RoutingContextError::InvalidPriority(raw))?,
            Some(_) => {
                return Err(RoutingContextError::WrongType {
                    field: PRIORITY_KEY,
                    expected: "string",
                });
            }
        };

        Ok(Self {
            preferred_language,
            priority,
            attributes,
        })
    }
}

fn parse_language(raw: &str) -> Result<String, RoutingContextError> {
    let tag = raw.trim().to_ascii_lowercase();
    let mut parts = tag.split('-');
    let primary_ok = parts
        .next()
        .is_some_and(|p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_lowercase()));
    let subtags_ok =
        parts.all(|p| (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()));
    if primary_ok && subtags_ok {
        Ok(tag)
    } else {
        Err(RoutingContextError::InvalidLanguage(raw.to_owned()))
    }
}
