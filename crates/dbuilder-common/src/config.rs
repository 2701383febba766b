//! Build configuration model and YAML loader.
//!
//! A configuration file maps image references to the templates rendered for
//! them:
//!
//! ```yaml
//! packages:
//!   debian:
//!     templates:
//!       - file: templates/debian.jinja
//!         tags: ["10", "11"]
//!       - file: templates/debian-dev.jinja
//!         tags: all
//!         suffix: dev
//!         jinja_env:
//!           extra_packages: [build-essential]
//! dbuilder-namespace-mapping:
//!   docker.dev: builders
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::constants::{ALL_TAGS_KEYWORD, DEFAULT_BUILDER_NAMESPACE, VERIFY_CERTS_ENV};
use crate::error::{DbuilderError, Result};

/// Root of a configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildConfiguration {
    /// Packages in document order.
    #[serde(deserialize_with = "ordered_packages")]
    pub packages: Vec<PackageEntry>,
    /// Registry host to builder namespace overrides.
    #[serde(default)]
    pub dbuilder_namespace_mapping: HashMap<String, String>,
}

/// One `packages` entry: the raw image reference and its settings.
#[derive(Debug, Clone)]
pub struct PackageEntry {
    /// Image reference exactly as written in the configuration.
    pub reference: String,
    /// Settings declared for the reference.
    pub settings: PackageSettings,
}

/// Settings of a single package.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageSettings {
    /// Templates rendered for the package, in order.
    pub templates: Vec<TemplateSpec>,
}

/// A template and the tags it is rendered for.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSpec {
    /// Template path, relative to the configuration file.
    pub file: PathBuf,
    /// Which tags to render.
    pub tags: TagSelector,
    /// Optional suffix distinguishing several templates of one package.
    #[serde(default)]
    pub suffix: Option<String>,
    /// Extra variables exposed to the template as `jinja_env`.
    #[serde(default)]
    pub jinja_env: BTreeMap<String, serde_json::Value>,
}

/// Tag selection for a template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTags")]
pub enum TagSelector {
    /// Every tag the registry lists for the image.
    All,
    /// An explicit list, used verbatim.
    List(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    Keyword(String),
    List(Vec<serde_yaml::Value>),
}

impl TryFrom<RawTags> for TagSelector {
    type Error = String;

    fn try_from(raw: RawTags) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawTags::Keyword(keyword) if keyword.eq_ignore_ascii_case(ALL_TAGS_KEYWORD) => {
                Ok(Self::All)
            }
            RawTags::Keyword(other) => Err(format!(
                "tags must be a list or \"{ALL_TAGS_KEYWORD}\", got \"{other}\""
            )),
            RawTags::List(values) => values
                .into_iter()
                .map(scalar_tag)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Self::List),
        }
    }
}

/// Unquoted YAML tags such as `10` or `3.19` arrive as numbers.
fn scalar_tag(value: serde_yaml::Value) -> std::result::Result<String, String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("tag must be a scalar, got {other:?}")),
    }
}

fn ordered_packages<'de, D>(deserializer: D) -> std::result::Result<Vec<PackageEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PackagesVisitor;

    impl<'de> Visitor<'de> for PackagesVisitor {
        type Value = Vec<PackageEntry>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping of image references to package settings")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut packages = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((reference, settings)) = map.next_entry::<String, PackageSettings>()? {
                packages.push(PackageEntry {
                    reference,
                    settings,
                });
            }
            Ok(packages)
        }
    }

    deserializer.deserialize_map(PackagesVisitor)
}

impl BuildConfiguration {
    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| DbuilderError::io(path, e))?;
        Self::from_yaml(&content, path)
    }

    /// Parses configuration text; `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `DbuilderError::Yaml` if the text does not describe a
    /// configuration.
    pub fn from_yaml(content: &str, origin: &Path) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|source| DbuilderError::Yaml {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Returns the builder namespace configured for `host`, or `library`.
    #[must_use]
    pub fn builder_namespace(&self, host: &str) -> &str {
        self.dbuilder_namespace_mapping
            .get(host)
            .map_or(DEFAULT_BUILDER_NAMESPACE, String::as_str)
    }
}

/// Reads `VERIFY_CERTS`; see [`verify_certs`].
#[must_use]
pub fn verify_certs_from_env() -> bool {
    verify_certs(std::env::var(VERIFY_CERTS_ENV).ok().as_deref())
}

/// Verification stays on when the setting is absent; a present value must
/// be truthy to keep it on.
#[must_use]
pub fn verify_certs(value: Option<&str>) -> bool {
    value.is_none_or(is_truthy)
}

/// Returns whether `value` is one of `true`, `1` or `yes`, ignoring case.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<BuildConfiguration> {
        BuildConfiguration::from_yaml(yaml, Path::new("config.yaml"))
    }

    #[test]
    fn packages_keep_document_order() {
        let config = parse(
            r"
packages:
  zlib:
    templates: []
  debian:
    templates: []
  alpine:
    templates: []
",
        )
        .expect("parse failed");
        let names: Vec<_> = config.packages.iter().map(|p| p.reference.as_str()).collect();
        assert_eq!(names, ["zlib", "debian", "alpine"]);
    }

    #[test]
    fn template_fields_are_parsed() {
        let config = parse(
            r"
packages:
  docker.dev/library/szn-jessie:
    templates:
      - file: templates/jessie.jinja
        tags: [latest, '8']
        suffix: dev
        jinja_env:
          mirror: http://deb.example.com
",
        )
        .expect("parse failed");
        let template = &config.packages[0].settings.templates[0];
        assert_eq!(template.file, PathBuf::from("templates/jessie.jinja"));
        assert_eq!(
            template.tags,
            TagSelector::List(vec!["latest".into(), "8".into()])
        );
        assert_eq!(template.suffix.as_deref(), Some("dev"));
        assert_eq!(
            template.jinja_env.get("mirror"),
            Some(&serde_json::Value::String("http://deb.example.com".into()))
        );
    }

    #[test]
    fn all_keyword_is_case_insensitive() {
        for keyword in ["all", "ALL", "All"] {
            let config = parse(&format!(
                "packages:\n  debian:\n    templates:\n      - file: t\n        tags: {keyword}\n"
            ))
            .expect("parse failed");
            assert_eq!(config.packages[0].settings.templates[0].tags, TagSelector::All);
        }
    }

    #[test]
    fn unquoted_numeric_tags_become_strings() {
        let config = parse("packages:\n  debian:\n    templates:\n      - file: t\n        tags: [10, 11]\n")
            .expect("parse failed");
        assert_eq!(
            config.packages[0].settings.templates[0].tags,
            TagSelector::List(vec!["10".into(), "11".into()])
        );
    }

    #[test]
    fn string_other_than_all_is_rejected() {
        let result =
            parse("packages:\n  debian:\n    templates:\n      - file: t\n        tags: latest\n");
        assert!(matches!(result, Err(DbuilderError::Yaml { .. })));
    }

    #[test]
    fn missing_packages_is_rejected() {
        assert!(parse("dbuilder-namespace-mapping: {}\n").is_err());
    }

    #[test]
    fn builder_namespace_uses_mapping_then_default() {
        let config = parse(
            "packages: {}\ndbuilder-namespace-mapping:\n  docker.dev: builders\n",
        )
        .expect("parse failed");
        assert_eq!(config.builder_namespace("docker.dev"), "builders");
        assert_eq!(config.builder_namespace("docker.io"), "library");
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "packages:\n  debian:\n    templates: []\n").expect("write failed");
        let config = BuildConfiguration::load(&path).expect("load failed");
        assert_eq!(config.packages.len(), 1);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = BuildConfiguration::load(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(DbuilderError::Io { .. })));
    }

    #[test]
    fn truthy_values() {
        for value in ["true", "TRUE", "1", "yes", "Yes"] {
            assert!(is_truthy(value), "{value} should be truthy");
        }
        for value in ["false", "0", "no", "", "on"] {
            assert!(!is_truthy(value), "{value} should be falsy");
        }
    }

    #[test]
    fn verification_defaults_on_when_unset() {
        assert!(verify_certs(None));
        assert!(verify_certs(Some("TRUE")));
        assert!(verify_certs(Some("1")));
        assert!(!verify_certs(Some("false")));
        assert!(!verify_certs(Some("")));
        assert!(!verify_certs(Some("enabled")));
    }
}
