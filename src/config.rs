//! Generator configuration
//!
//! Settings come from a TOML document. Every key is optional; missing keys
//! take the values of the built-in default document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::kind::StructureKind;
use crate::syntax::ast::is_identifier;

/// Errors that can occur when loading or parsing configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Unknown data structure kind in [templates.paths]: {0}")]
    UnknownKind(String),
    #[error("Element placeholder '{0}' is not a valid identifier")]
    InvalidPlaceholder(String),
}

/// Where template files live
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateConfig {
    /// Directory relative template paths are resolved against
    pub dir: PathBuf,
    /// Template file per kind. Kinds without an entry have no template.
    pub paths: BTreeMap<StructureKind, PathBuf>,
}

impl TemplateConfig {
    /// Full path of the template for `kind`, if one is configured
    pub fn path_for(&self, kind: StructureKind) -> Option<PathBuf> {
        self.paths.get(&kind).map(|path| self.dir.join(path))
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Config::default().templates
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub templates: TemplateConfig,
    /// Sentinel type name standing for the element type in templates
    pub element_placeholder: String,
    /// Treat fallback templates as errors
    pub strict: bool,
}

/// TOML structure for deserializing configuration
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    templates: Option<TomlTemplates>,
    placeholders: Option<TomlPlaceholders>,
    output: Option<TomlOutput>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlTemplates {
    dir: Option<PathBuf>,
    paths: Option<BTreeMap<String, PathBuf>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlPlaceholders {
    element: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlOutput {
    strict: Option<bool>,
}

const DEFAULT_CONFIG: &str = r#"
[templates]
dir = "templates"

[templates.paths]
stack = "stack.rs"
heap = "heap.rs"

[placeholders]
element = "Element"

[output]
strict = false
"#;

impl Config {
    /// Load configuration from a TOML file. A relative template directory is
    /// resolved against the directory holding the file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        if config.templates.dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.templates.dir = parent.join(&config.templates.dir);
            }
        }
        Ok(config)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let defaults: TomlConfig = toml::from_str(DEFAULT_CONFIG)?;
        Self::resolve(parsed, defaults)
    }

    fn resolve(parsed: TomlConfig, defaults: TomlConfig) -> Result<Self, ConfigError> {
        let (templates, default_templates) = (parsed.templates, defaults.templates);
        let dir = templates
            .as_ref()
            .and_then(|t| t.dir.clone())
            .or_else(|| default_templates.as_ref().and_then(|t| t.dir.clone()))
            .unwrap_or_default();
        let raw_paths = templates
            .and_then(|t| t.paths)
            .or_else(|| default_templates.and_then(|t| t.paths))
            .unwrap_or_default();

        let mut paths = BTreeMap::new();
        for (name, path) in raw_paths {
            let kind =
                StructureKind::from_name(&name).ok_or_else(|| ConfigError::UnknownKind(name))?;
            paths.insert(kind, path);
        }

        let element_placeholder = parsed
            .placeholders
            .and_then(|p| p.element)
            .or_else(|| defaults.placeholders.and_then(|p| p.element))
            .unwrap_or_default();
        if !is_identifier(&element_placeholder) {
            return Err(ConfigError::InvalidPlaceholder(element_placeholder));
        }

        let strict = parsed
            .output
            .and_then(|o| o.strict)
            .or_else(|| defaults.output.and_then(|o| o.strict))
            .unwrap_or(false);

        Ok(Config {
            templates: TemplateConfig { dir, paths },
            element_placeholder,
            strict,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_str(DEFAULT_CONFIG).expect("Default config should be valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.templates.dir, PathBuf::from("templates"));
        assert_eq!(
            config.templates.path_for(StructureKind::Stack),
            Some(PathBuf::from("templates/stack.rs"))
        );
        assert_eq!(config.element_placeholder, "Element");
        assert!(!config.strict);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_str("[output]\nstrict = true\n").expect("Should parse");
        assert!(config.strict);
        assert_eq!(config.templates.paths.len(), 2);
        assert_eq!(config.element_placeholder, "Element");
    }

    #[test]
    fn test_paths_table_replaces_defaults() {
        let config = Config::from_str(
            r#"
[templates]
dir = "/opt/stencil"

[templates.paths]
Stack = "lifo.rs"
"#,
        )
        .expect("Should parse");
        assert_eq!(
            config.templates.path_for(StructureKind::Stack),
            Some(PathBuf::from("/opt/stencil/lifo.rs"))
        );
        assert_eq!(config.templates.path_for(StructureKind::Heap), None);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = Config::from_str("[templates.paths]\nqueue = \"queue.rs\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKind(name) if name == "queue"));
    }

    #[test]
    fn test_invalid_placeholder_rejected() {
        let err = Config::from_str("[placeholders]\nelement = \"not valid\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPlaceholder(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            Config::from_str("[output]\nstirct = true\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_from_file_resolves_relative_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stencil.toml");
        std::fs::write(&path, "[templates]\ndir = \"tpl\"\n").expect("write config");
        let config = Config::from_file(&path).expect("Should load");
        assert_eq!(config.templates.dir, dir.path().join("tpl"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file(Path::new("/nonexistent/stencil.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
