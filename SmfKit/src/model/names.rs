//! Validated attribute and schema names.

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Maximum length of an attribute or schema name, in characters.
pub const NAME_MAX_LENGTH: usize = 64;

/// The name of a vertex attribute.
///
/// One to 64 characters, each a letter, a digit, `_`, `-` or `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AttributeName(String);

impl AttributeName {
    /// Validate and wrap an attribute name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name.chars().count() > NAME_MAX_LENGTH {
            Some("name is longer than 64 characters")
        } else if !name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            Some("names may contain only letters, digits, '_', '-' and '.'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidAttributeName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for AttributeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AttributeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The name of a metadata or mesh schema, such as `com.example.skeleton`.
///
/// Dot-separated segments, each a letter followed by letters, digits or `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SchemaName(String);

impl SchemaName {
    /// Validate and wrap a schema name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        match schema_name_problem(&name) {
            Some(reason) => Err(Error::InvalidSchemaName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn schema_name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("name is empty");
    }
    if name.chars().count() > NAME_MAX_LENGTH {
        return Some("name is longer than 64 characters");
    }
    for segment in name.split('.') {
        let mut chars = segment.chars();
        match chars.next() {
            None => return Some("empty name segment"),
            Some(first) if !first.is_alphabetic() => {
                return Some("segments must start with a letter");
            }
            Some(_) => {}
        }
        if !chars.all(|c| c.is_alphanumeric() || c == '_') {
            return Some("segments may contain only letters, digits and '_'");
        }
    }
    None
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names() {
        for valid in ["POSITION", "uv.0", "bone-weights_2", "x"] {
            assert!(AttributeName::new(valid).is_ok(), "{valid}");
        }
        for invalid in ["", "has space", "tab\t", &"a".repeat(65)] {
            assert!(AttributeName::new(invalid).is_err(), "{invalid:?}");
        }
        assert!(AttributeName::new("a".repeat(64)).is_ok());
    }

    #[test]
    fn test_schema_names() {
        for valid in ["com.io7m.example", "a", "a1_b.c2"] {
            assert!(SchemaName::new(valid).is_ok(), "{valid}");
        }
        for invalid in ["", ".a", "a.", "a..b", "1abc", "a.b-c", "a._b"] {
            assert!(SchemaName::new(invalid).is_err(), "{invalid:?}");
        }
    }

    #[test]
    fn test_invalid_name_reports_input() {
        match AttributeName::new("bad name") {
            Err(Error::InvalidAttributeName { name, .. }) => assert_eq!(name, "bad name"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
