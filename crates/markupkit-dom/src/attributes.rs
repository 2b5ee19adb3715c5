//! # Attribute Store
//!
//! Ordered, case-sensitive attribute storage for element nodes, including the
//! `style` declaration merge and the `dir` value filter.

use std::fmt;
use tracing::trace;

/// An attribute value.
///
/// `Empty` is a valueless (boolean) attribute and renders as the bare name.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Valueless attribute, e.g. `disabled`.
    Empty,
    /// String value.
    Text(String),
    /// Integer value; rendered unquoted unless quoting is forced.
    Int(i64),
    /// Floating point value; rendered unquoted unless quoting is forced.
    Float(f64),
}

impl AttrValue {
    /// Check if this is a numeric value.
    pub fn is_numeric(&self) -> bool {
        matches!(self, AttrValue::Int(_) | AttrValue::Float(_))
    }

    /// Check if this is a valueless attribute.
    pub fn is_empty(&self) -> bool {
        matches!(self, AttrValue::Empty)
    }

    /// Get the string value, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Empty => Ok(()),
            AttrValue::Text(s) => f.write_str(s),
            AttrValue::Int(n) => write!(f, "{n}"),
            AttrValue::Float(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        AttrValue::Text(value.clone())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Text(if value { "true" } else { "false" }.to_string())
    }
}

macro_rules! int_attr_value {
    ($($ty:ty),*) => {
        $(impl From<$ty> for AttrValue {
            fn from(value: $ty) -> Self {
                AttrValue::Int(value as i64)
            }
        })*
    };
}

int_attr_value!(i8, i16, i32, i64, u8, u16, u32, usize, isize);

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        AttrValue::Float(value as f64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttrValue::Empty)
    }
}

/// Check an attribute name against the lexical rules.
///
/// Non-empty, must not start with a digit or `-`, and every character is
/// alphanumeric or one of `- _ : @ . # [ ]`. Wider than node names so that
/// framework attributes such as `@click` or `[value]` survive.
pub fn is_valid_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        None => return false,
        Some(first) if first.is_ascii_digit() || first == '-' => return false,
        Some(first) if !is_attribute_char(first) => return false,
        _ => {}
    }
    chars.all(is_attribute_char)
}

fn is_attribute_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':' | '@' | '.' | '#' | '[' | ']')
}

/// Split a `style` string into `(property, value)` declarations.
///
/// Fragments without a `:` or with an empty property or value are dropped.
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|fragment| {
            let (property, value) = fragment.split_once(':')?;
            let (property, value) = (property.trim(), value.trim());
            if property.is_empty() || value.is_empty() {
                trace!(fragment, "dropping malformed style declaration");
                return None;
            }
            Some((property.to_string(), value.to_string()))
        })
        .collect()
}

/// Serialize declarations as `prop:val;prop:val;` (trailing semicolon included).
pub fn serialize_style(declarations: &[(String, String)]) -> String {
    let mut out = String::new();
    for (property, value) in declarations {
        out.push_str(property);
        out.push(':');
        out.push_str(value);
        out.push(';');
    }
    out
}

/// Ordered mapping of attribute name to value.
///
/// Keys are case-sensitive; insertion order is preserved and overwriting an
/// existing key keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeStore {
    entries: Vec<(String, AttrValue)>,
}

impl AttributeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a value by exact name.
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Check for an attribute by exact name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Apply the attribute mutation contract.
    ///
    /// Returns `false` when the write was ignored: empty or invalid name, or a
    /// `dir` value other than `ltr`/`rtl`.
    pub fn set(&mut self, name: &str, value: AttrValue) -> bool {
        let name = name.trim();
        if !is_valid_attribute_name(name) {
            trace!(name, "ignoring invalid attribute name");
            return false;
        }

        match name.to_ascii_lowercase().as_str() {
            "style" => {
                match &value {
                    AttrValue::Empty => self.insert("style", AttrValue::Empty),
                    other => self.merge_style(parse_style(&other.to_string()), true),
                }
                true
            }
            "dir" => {
                let dir = value.to_string().trim().to_ascii_lowercase();
                if dir == "ltr" || dir == "rtl" {
                    self.insert("dir", AttrValue::Text(dir));
                    true
                } else {
                    trace!(value = %value, "ignoring dir value");
                    false
                }
            }
            _ => {
                let value = match value {
                    AttrValue::Text(s) => AttrValue::Text(s.trim().to_string()),
                    other => other,
                };
                self.insert(name, value);
                true
            }
        }
    }

    /// Insert or overwrite without validation.
    fn insert(&mut self, name: &str, value: AttrValue) {
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Remove an attribute by exact name.
    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        let index = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(index).1)
    }

    /// The current style declarations, parsed.
    pub fn style(&self) -> Vec<(String, String)> {
        match self.get("style") {
            Some(AttrValue::Text(style)) => parse_style(style),
            _ => Vec::new(),
        }
    }

    /// Merge declarations into the `style` attribute.
    ///
    /// Without `override_existing`, properties already present keep their
    /// value; with it, the result is built from the incoming declarations
    /// alone. An empty result removes the attribute.
    pub fn merge_style<K, V>(
        &mut self,
        declarations: impl IntoIterator<Item = (K, V)>,
        override_existing: bool,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged = if override_existing {
            Vec::new()
        } else {
            self.style()
        };

        for (property, value) in declarations {
            let (property, value) = (property.into(), value.into());
            match merged.iter_mut().find(|(p, _)| *p == property) {
                Some(existing) if override_existing => existing.1 = value,
                Some(_) => {}
                None => merged.push((property, value)),
            }
        }

        if merged.is_empty() {
            self.remove("style");
        } else {
            self.insert("style", AttrValue::Text(serialize_style(&merged)));
        }
    }

    /// Remove one property from the `style` attribute.
    pub fn remove_style(&mut self, property: &str) -> bool {
        let mut declarations = self.style();
        let before = declarations.len();
        declarations.retain(|(p, _)| p != property);
        if declarations.len() == before {
            return false;
        }
        self.merge_style(declarations, true);
        true
    }
}
