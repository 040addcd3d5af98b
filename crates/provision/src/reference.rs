//! Provider reference parsing
//!
//! A provider reference names the plugin that implements an instance:
//! `{image}/{resource|data}/{name}` or `{namespace}/{image}/{resource|data}/{name}`.
//! The three-segment form gets the default namespace prepended, so both
//! forms resolve to a fully-qualified container image.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Namespace prepended to three-segment references
pub const DEFAULT_NAMESPACE: &str = "gantry";

/// Lifecycle a provider implements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Full create/update/delete lifecycle
    Resource,
    /// Read-only `get` lifecycle
    Data,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Image reference used to launch a plugin in its isolated environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportIdentity {
    image: String,
}

impl TransportIdentity {
    fn new(namespace: &str, image: &str) -> Self {
        Self {
            image: format!("{namespace}/{image}"),
        }
    }

    /// Fully-qualified container image, e.g. `gantry/terraform`
    pub fn image(&self) -> &str {
        &self.image
    }
}

impl fmt::Display for TransportIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.image)
    }
}

/// Parsed form of a provider reference string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRef {
    /// The reference exactly as written; persisted in documents so destroy
    /// can resolve the same plugin later
    pub reference: String,
    pub identity: TransportIdentity,
    pub kind: ResourceKind,
    pub name: String,
}

impl ProviderRef {
    /// Parse `image/kind/name` or `namespace/image/kind/name`.
    pub fn parse(reference: &str) -> Result<Self> {
        let segments: Vec<&str> = reference.split('/').collect();

        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(invalid(reference, "empty segment"));
        }

        let (identity, kind, name) = match segments.as_slice() {
            [image, kind, name] => (TransportIdentity::new(DEFAULT_NAMESPACE, image), *kind, *name),
            [namespace, image, kind, name] => (TransportIdentity::new(namespace, image), *kind, *name),
            _ => {
                return Err(invalid(
                    reference,
                    "expected {image}/{resource|data}/{name} or {namespace}/{image}/{resource|data}/{name}",
                ));
            }
        };

        let kind = match kind {
            "resource" => ResourceKind::Resource,
            "data" => ResourceKind::Data,
            other => {
                return Err(invalid(
                    reference,
                    &format!("kind must be `resource` or `data`, got `{other}`"),
                ));
            }
        };

        Ok(Self {
            reference: reference.to_string(),
            identity,
            kind,
            name: name.to_string(),
        })
    }
}

impl FromStr for ProviderRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)
    }
}

fn invalid(reference: &str, reason: &str) -> Error {
    Error::InvalidReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_segments_get_default_namespace() {
        let provider = ProviderRef::parse("img/resource/name").unwrap();
        assert_eq!(provider.identity.image(), "gantry/img");
        assert_eq!(provider.kind, ResourceKind::Resource);
        assert_eq!(provider.name, "name");
    }

    #[test]
    fn four_segments_keep_their_namespace() {
        let provider = ProviderRef::parse("org/img/resource/name").unwrap();
        assert_eq!(provider.identity.image(), "org/img");
        assert_eq!(provider.kind, ResourceKind::Resource);
        assert_eq!(provider.name, "name");
    }

    #[test]
    fn data_kind_parses() {
        let provider = ProviderRef::parse("terraform/data/aws").unwrap();
        assert_eq!(provider.kind, ResourceKind::Data);
        assert_eq!(provider.identity.image(), "gantry/terraform");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = ProviderRef::parse("img/bogus/name").unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
    }

    #[test]
    fn wrong_segment_count_is_rejected() {
        for reference in ["img", "img/resource", "a/b/c/d/e"] {
            let err = ProviderRef::parse(reference).unwrap_err();
            assert!(matches!(err, Error::InvalidReference { .. }), "{reference}");
        }
    }

    #[test]
    fn empty_segments_are_rejected() {
        let err = ProviderRef::parse("img//name").unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
    }

    #[test]
    fn original_reference_is_preserved() {
        let provider = ProviderRef::parse("img/resource/name").unwrap();
        assert_eq!(provider.to_string(), "img/resource/name");
        assert_eq!(provider.reference, "img/resource/name");
    }
}
