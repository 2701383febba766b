//! Image reference parsing.
//!
//! References are split into `host`, `namespace`, `name` and `tag` with a
//! deliberately simple rule: a host is recognized only when a `.` appears
//! before the first `/`. A single-segment name containing a dot
//! (`my.image:1`) therefore never has a host, since there is no `/` to
//! split on.

use std::fmt;
use std::str::FromStr;

use dbuilder_common::error::{DbuilderError, Result};

/// A parsed image reference such as `docker.dev/library/szn-jessie:latest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    host: Option<String>,
    namespace: Option<String>,
    name: String,
    tag: Option<String>,
}

impl ImageReference {
    /// Parses a raw reference.
    ///
    /// # Errors
    ///
    /// Returns `DbuilderError::MalformedReference` if no image name remains
    /// after host, namespace and tag are split off.
    pub fn parse(reference: &str) -> Result<Self> {
        let (host, rest) = match (reference.find('.'), reference.find('/')) {
            (Some(dot), Some(slash)) if dot < slash => {
                (Some(&reference[..slash]), &reference[slash + 1..])
            }
            _ => (None, reference),
        };

        let (namespace, rest) = match rest.rfind('/') {
            Some(split) => (Some(&rest[..split]), &rest[split + 1..]),
            None => (None, rest),
        };

        let (name, tag) = match rest.split_once(':') {
            Some((name, tag)) => (name, Some(tag)),
            None => (rest, None),
        };

        if name.is_empty() {
            return Err(DbuilderError::MalformedReference {
                reference: reference.to_string(),
            });
        }

        Ok(Self {
            host: non_empty(host),
            namespace: non_empty(namespace),
            name: name.to_string(),
            tag: non_empty(tag),
        })
    }

    /// Returns a copy with `host` filled in if the reference has none.
    #[must_use]
    pub fn with_default_host(self, host: &str) -> Self {
        Self {
            host: self.host.or_else(|| Some(host.to_string())),
            ..self
        }
    }

    /// Registry host, if the reference names one.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Namespace path (everything between host and name), if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Image name. Never empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// `namespace/name`, or just `name` without a namespace.
    pub fn image_full_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}/{}", self.name),
            None => self.name.clone(),
        }
    }

    /// `host/`, or an empty string without a host.
    pub fn host_prefix(&self) -> String {
        self.host
            .as_ref()
            .map_or_else(String::new, |host| format!("{host}/"))
    }

    /// Host-prefixed full name, without the tag.
    pub fn image_path(&self) -> String {
        format!("{}{}", self.host_prefix(), self.image_full_name())
    }
}

/// Reassembles the canonical identifier from the non-empty parts.
impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.image_path())?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        Ok(())
    }
}

impl FromStr for ImageReference {
    type Err = DbuilderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn non_empty(part: Option<&str>) -> Option<String> {
    part.filter(|p| !p.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> ImageReference {
        ImageReference::parse(s).expect("parse failed")
    }

    #[test]
    fn bare_name() {
        let r = parse("debian");
        assert_eq!(r.host(), None);
        assert_eq!(r.namespace(), None);
        assert_eq!(r.name(), "debian");
        assert_eq!(r.tag(), None);
        assert_eq!(r.to_string(), "debian");
        assert_eq!(r.image_full_name(), "debian");
        assert_eq!(r.image_path(), "debian");
    }

    #[test]
    fn name_with_tag() {
        let r = parse("debian:latest");
        assert_eq!(r.host(), None);
        assert_eq!(r.namespace(), None);
        assert_eq!(r.name(), "debian");
        assert_eq!(r.tag(), Some("latest"));
        assert_eq!(r.to_string(), "debian:latest");
        assert_eq!(r.image_full_name(), "debian");
        assert_eq!(r.image_path(), "debian");
    }

    #[test]
    fn namespace_name_and_tag() {
        let r = parse("library/debian:latest");
        assert_eq!(r.host(), None);
        assert_eq!(r.namespace(), Some("library"));
        assert_eq!(r.name(), "debian");
        assert_eq!(r.tag(), Some("latest"));
        assert_eq!(r.to_string(), "library/debian:latest");
        assert_eq!(r.image_full_name(), "library/debian");
        assert_eq!(r.image_path(), "library/debian");
    }

    #[test]
    fn host_without_namespace() {
        let r = parse("docker.dev/szn-jessie:latest");
        assert_eq!(r.host(), Some("docker.dev"));
        assert_eq!(r.namespace(), None);
        assert_eq!(r.name(), "szn-jessie");
        assert_eq!(r.tag(), Some("latest"));
        assert_eq!(r.to_string(), "docker.dev/szn-jessie:latest");
        assert_eq!(r.image_full_name(), "szn-jessie");
        assert_eq!(r.image_path(), "docker.dev/szn-jessie");
    }

    #[test]
    fn host_namespace_name_and_tag() {
        let r = parse("docker.dev/library/szn-jessie:latest");
        assert_eq!(r.host(), Some("docker.dev"));
        assert_eq!(r.namespace(), Some("library"));
        assert_eq!(r.name(), "szn-jessie");
        assert_eq!(r.tag(), Some("latest"));
        assert_eq!(r.to_string(), "docker.dev/library/szn-jessie:latest");
        assert_eq!(r.image_full_name(), "library/szn-jessie");
        assert_eq!(r.image_path(), "docker.dev/library/szn-jessie");
    }

    #[test]
    fn nested_namespace_keeps_every_segment() {
        let r = parse("registry.example.com/team/sub/app:1.0");
        assert_eq!(r.host(), Some("registry.example.com"));
        assert_eq!(r.namespace(), Some("team/sub"));
        assert_eq!(r.name(), "app");
        assert_eq!(r.tag(), Some("1.0"));
    }

    #[test]
    fn dot_after_first_slash_is_not_a_host() {
        let r = parse("team/app.v2:1");
        assert_eq!(r.host(), None);
        assert_eq!(r.namespace(), Some("team"));
        assert_eq!(r.name(), "app.v2");
    }

    #[test]
    fn dotted_single_segment_never_has_a_host() {
        let r = parse("my.image:1");
        assert_eq!(r.host(), None);
        assert_eq!(r.namespace(), None);
        assert_eq!(r.name(), "my.image");
        assert_eq!(r.tag(), Some("1"));
    }

    #[test]
    fn empty_reference_is_malformed() {
        let err = ImageReference::parse("").unwrap_err();
        assert!(matches!(err, DbuilderError::MalformedReference { .. }));
    }

    #[test]
    fn empty_name_is_malformed() {
        for input in [":latest", "library/", "docker.dev/library/:1", "docker.dev/"] {
            assert!(
                matches!(
                    ImageReference::parse(input),
                    Err(DbuilderError::MalformedReference { .. })
                ),
                "{input} should be malformed"
            );
        }
    }

    #[test]
    fn canonical_identifier_round_trips() {
        for input in [
            "debian",
            "debian:latest",
            "library/debian:latest",
            "docker.dev/szn-jessie:latest",
            "docker.dev/library/szn-jessie:latest",
            "registry.example.com/team/sub/app",
        ] {
            let parsed = parse(input);
            assert_eq!(parsed.to_string(), input);
            assert_eq!(parse(&parsed.to_string()), parsed);
        }
    }

    #[test]
    fn default_host_only_fills_missing_host() {
        let defaulted = parse("debian").with_default_host("docker.io");
        assert_eq!(defaulted.image_path(), "docker.io/debian");
        assert_eq!(defaulted.host_prefix(), "docker.io/");

        let kept = parse("docker.dev/szn-jessie").with_default_host("docker.io");
        assert_eq!(kept.host(), Some("docker.dev"));
    }

    #[test]
    fn from_str_matches_parse() {
        let r: ImageReference = "library/debian:11".parse().expect("parse failed");
        assert_eq!(r, parse("library/debian:11"));
    }
}
