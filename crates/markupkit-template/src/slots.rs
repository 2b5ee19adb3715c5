//! `{{ name }}` slot discovery and substitution.

use markupkit_common::{MarkupKitError, Result};
use markupkit_dom::escape_html;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::trace;

/// A slot value: text, or a nested mapping whose keys fill the same
/// placeholders as top-level keys.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Text(String),
    Nested(Slots),
}

impl From<&str> for SlotValue {
    fn from(value: &str) -> Self {
        SlotValue::Text(value.to_string())
    }
}

impl From<String> for SlotValue {
    fn from(value: String) -> Self {
        SlotValue::Text(value)
    }
}

impl From<Slots> for SlotValue {
    fn from(value: Slots) -> Self {
        SlotValue::Nested(value)
    }
}

macro_rules! slot_from_display {
    ($($ty:ty),*) => {
        $(impl From<$ty> for SlotValue {
            fn from(value: $ty) -> Self {
                SlotValue::Text(value.to_string())
            }
        })*
    };
}

slot_from_display!(bool, i32, i64, u32, u64, usize, f64);

/// Ordered name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slots {
    entries: Vec<(String, SlotValue)>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SlotValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace a value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<SlotValue>) {
        let (name, value) = (name.into(), value.into());
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SlotValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SlotValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build slots from a JSON object. Arrays become nested mappings keyed
    /// by index; scalars become text and `null` empty text.
    pub fn from_json_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_object(map)),
            other => Err(MarkupKitError::config(format!(
                "slots must be a JSON object, got {}",
                json_kind(other)
            ))),
        }
    }

    /// Parse slots from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| MarkupKitError::config(format!("invalid slots JSON: {e}")))?;
        Self::from_json_value(&value)
    }

    fn from_object(map: &Map<String, Value>) -> Self {
        let mut slots = Slots::new();
        for (name, value) in map {
            slots.insert(name.clone(), slot_from_json(value));
        }
        slots
    }

    /// JSON object form, as handed to external template hosts.
    pub fn to_json_value(&self) -> Value {
        let map = self
            .entries
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    SlotValue::Text(text) => Value::String(text.clone()),
                    SlotValue::Nested(nested) => nested.to_json_value(),
                };
                (name.clone(), value)
            })
            .collect();
        Value::Object(map)
    }

    /// Flatten into name to value, first occurrence winning; nested values
    /// are visited in place.
    fn collect_into<'a>(&'a self, out: &mut HashMap<&'a str, &'a str>) {
        for (name, value) in &self.entries {
            match value {
                SlotValue::Text(text) => {
                    out.entry(name.as_str()).or_insert(text.as_str());
                }
                SlotValue::Nested(nested) => nested.collect_into(out),
            }
        }
    }
}

fn slot_from_json(value: &Value) -> SlotValue {
    match value {
        Value::Null => SlotValue::Text(String::new()),
        Value::String(s) => SlotValue::Text(s.clone()),
        Value::Bool(_) | Value::Number(_) => SlotValue::Text(value.to_string()),
        Value::Array(items) => {
            let mut nested = Slots::new();
            for (index, item) in items.iter().enumerate() {
                nested.insert(index.to_string(), slot_from_json(item));
            }
            SlotValue::Nested(nested)
        }
        Value::Object(map) => SlotValue::Nested(Slots::from_object(map)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One `{{ ... }}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Byte range of the whole placeholder in the source text.
    pub start: usize,
    pub end: usize,
    /// Trimmed inner name.
    pub name: String,
}

/// Find every `{{ name }}` placeholder, in order.
///
/// Whitespace around the name is ignored; empty names and names containing
/// braces are not placeholders.
pub fn find_placeholders(text: &str) -> Vec<Placeholder> {
    let mut found = Vec::new();
    let mut offset = 0;
    while let Some(open) = text[offset..].find("{{") {
        let start = offset + open;
        let inner_start = start + 2;
        let Some(close) = text[inner_start..].find("}}") else {
            break;
        };
        let inner = &text[inner_start..inner_start + close];
        let name = inner.trim();
        if name.is_empty() || name.contains(['{', '}']) {
            // Retry from the next brace so `{{{{x}}` still finds `{{x}}`.
            offset = start + 1;
            continue;
        }
        let end = inner_start + close + 2;
        found.push(Placeholder {
            start,
            end,
            name: name.to_string(),
        });
        offset = end;
    }
    found
}

/// Replace every placeholder whose name has a value with the entity-escaped
/// value. Placeholders without a value are left verbatim.
pub fn substitute(text: &str, slots: &Slots) -> String {
    let placeholders = find_placeholders(text);
    if placeholders.is_empty() || slots.is_empty() {
        return text.to_string();
    }

    let mut values = HashMap::new();
    slots.collect_into(&mut values);

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for placeholder in &placeholders {
        match values.get(placeholder.name.as_str()) {
            Some(value) => {
                out.push_str(&text[last..placeholder.start]);
                out.push_str(&escape_html(value));
                last = placeholder.end;
            }
            None => trace!(slot = %placeholder.name, "leaving unmatched placeholder"),
        }
    }
    out.push_str(&text[last..]);
    out
}
