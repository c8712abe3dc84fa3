// ABOUTME: DNS-1123 label validation for services, namespaces and secrets.
// ABOUTME: Anything that ends up as a Kubernetes object name goes through ResourceName.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceNameError {
    #[error("name cannot be empty")]
    Empty,

    #[error("name '{0}' exceeds maximum length of 63 characters")]
    TooLong(String),

    #[error("name '{0}' must start and end with a letter or digit")]
    BadBoundary(String),

    #[error("name '{0}' must be lowercase")]
    NotLowercase(String),

    #[error("invalid character in name '{name}': '{found}'")]
    InvalidChar { name: String, found: char },
}

/// A Kubernetes-compatible object name (RFC 1123 label).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(value: &str) -> Result<Self, ResourceNameError> {
        if value.is_empty() {
            return Err(ResourceNameError::Empty);
        }

        if value.len() > 63 {
            return Err(ResourceNameError::TooLong(value.to_string()));
        }

        if value.starts_with('-') || value.ends_with('-') {
            return Err(ResourceNameError::BadBoundary(value.to_string()));
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(ResourceNameError::NotLowercase(value.to_string()));
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(ResourceNameError::InvalidChar {
                    name: value.to_string(),
                    found: c,
                });
            }
        }

        Ok(Self(value.to_string()))
    }

    /// Lowercase `value` and replace anything outside `[a-z0-9-]` with `-`.
    pub fn sanitized(value: &str) -> Result<Self, ResourceNameError> {
        let cleaned: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let cleaned: String = cleaned.trim_matches('-').chars().take(63).collect();
        Self::new(cleaned.trim_end_matches('-'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ResourceName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResourceName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        ResourceName::new(&value).map_err(serde::de::Error::custom)
    }
}
