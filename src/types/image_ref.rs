// ABOUTME: Container image reference parsing and composition.
// ABOUTME: Handles local refs (app:dev) and registry refs (myacr.azurecr.io/shop/api:tag).

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("invalid image reference format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if let Some(c) = input
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '/' | ':' | '.' | '-' | '_' | '@'))
        {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        let (without_digest, digest) = match input.split_once('@') {
            Some((before, after)) => (before, Some(after.to_string())),
            None => (input, None),
        };

        // A colon followed by a slash belongs to a registry port, not a tag.
        let (without_tag, tag) = match without_digest.rsplit_once(':') {
            Some((before, after)) if !after.contains('/') => (before, Some(after.to_string())),
            _ => (without_digest, None),
        };

        let (registry, name) = Self::split_registry(without_tag)?;

        let tag = match (&tag, &digest) {
            (None, None) => Some("latest".to_string()),
            _ => tag,
        };

        Ok(Self {
            registry,
            name,
            tag,
            digest,
        })
    }

    /// Compose a reference for pushing into `registry`.
    pub fn for_registry(
        registry: &str,
        repository: &str,
        tag: &str,
    ) -> Result<Self, ParseImageRefError> {
        let registry = registry.trim().trim_end_matches('/');
        if registry.is_empty() {
            return Err(ParseImageRefError::InvalidFormat(format!(
                "{repository}:{tag} (missing registry)"
            )));
        }
        let parsed = Self::parse(&format!("{registry}/{repository}:{tag}"))?;
        if parsed.registry.as_deref() != Some(registry) {
            return Err(ParseImageRefError::InvalidFormat(format!(
                "'{registry}' is not a registry host"
            )));
        }
        Ok(parsed)
    }

    fn split_registry(input: &str) -> Result<(Option<String>, String), ParseImageRefError> {
        match input.split_once('/') {
            None if input.is_empty() => Err(ParseImageRefError::InvalidFormat(input.to_string())),
            None => Ok((None, input.to_string())),
            Some((first, rest)) if rest.is_empty() || first.is_empty() => {
                Err(ParseImageRefError::InvalidFormat(input.to_string()))
            }
            // Registry hosts contain a dot or port, or are "localhost".
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                Ok((Some(first.to_string()), rest.to_string()))
            }
            Some(_) => Ok((None, input.to_string())),
        }
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}
