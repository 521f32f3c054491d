//! Declarative descriptions of interactively collected input fields.
//!
//! A [`FieldSpec`] only declares constraints; [`crate::collector`] enforces
//! them.

use std::fmt;

// ------------------------------------------------------------------ //
//  Types                                                              //
// ------------------------------------------------------------------ //

/// Primitive type a field's text is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Str => "string",
            FieldKind::Int => "int",
        }
    }
}

/// A typed value bound to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Str(String),
    Int(i64),
}

impl OptionValue {
    /// Empty means "no value": only an empty string qualifies.
    pub fn is_empty(&self) -> bool {
        matches!(self, OptionValue::Str(s) if s.is_empty())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Str(s) => write!(f, "{s}"),
            OptionValue::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Int(i)
    }
}

/// One input field: identifier, label, type, nullability, default and an
/// optional closed set of valid values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: String,
    pub kind: FieldKind,
    pub nullable: bool,
    pub default: Option<OptionValue>,
    pub valid: Vec<OptionValue>,
}

impl FieldSpec {
    fn new(key: &'static str, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key,
            label: label.into(),
            kind,
            nullable: true,
            default: None,
            valid: Vec::new(),
        }
    }

    /// A nullable text field with no default.
    pub fn string(key: &'static str, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Str)
    }

    /// A nullable integer field with no default.
    pub fn int(key: &'static str, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Int)
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default(mut self, value: impl Into<OptionValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn valid<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<OptionValue>,
    {
        self.valid = values.into_iter().map(Into::into).collect();
        self
    }

    /// Text shown after the label, e.g. ` [debug]`; empty brackets when the
    /// field has no default.
    pub fn default_hint(&self) -> String {
        match &self.default {
            Some(v) => format!(" [{v}]"),
            None => " []".to_string(),
        }
    }
}
