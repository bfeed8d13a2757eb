//! KDL configuration file.
//!
//! ```kdl
//! log-level "svglink=debug"
//! dialect "svg"
//! ```

use std::path::{Path, PathBuf};

use kdl::KdlDocument;
use miette::{IntoDiagnostic, Result, WrapErr};
use svglink_core::MarkupDialect;

/// Settings read from `config.kdl`. Every field is optional; command-line
/// flags and environment variables take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub log_level: Option<String>,
    pub dialect: Option<MarkupDialect>,
}

impl Config {
    /// `<config_dir>/svglink/config.kdl`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("svglink").join("config.kdl"))
    }

    /// Load `explicit`, or the default path if it exists.
    ///
    /// An explicitly given file must exist; a missing default file yields
    /// the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        let text = std::fs::read_to_string(&path)
            .into_diagnostic()
            .wrap_err_with(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).wrap_err_with(|| format!("in config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let doc: KdlDocument = text.parse()?;

        let log_level = string_value(&doc, "log-level").map(str::to_string);
        let dialect = string_value(&doc, "dialect")
            .map(str::parse::<MarkupDialect>)
            .transpose()?;

        Ok(Self { log_level, dialect })
    }
}

fn string_value<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?.entries().first()?.value().as_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let config = Config::parse("log-level \"svglink=trace\"\ndialect \"html\"\n").unwrap();
        assert_eq!(
            config,
            Config {
                log_level: Some("svglink=trace".to_string()),
                dialect: Some(MarkupDialect::Html),
            }
        );
    }

    #[test]
    fn test_parse_empty_and_unknown_nodes() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert_eq!(
            Config::parse("theme \"dark\"").unwrap(),
            Config::default()
        );
    }

    #[test]
    fn test_bad_dialect_is_error() {
        assert!(Config::parse("dialect \"latex\"").is_err());
    }

    #[test]
    fn test_malformed_kdl_is_error() {
        assert!(Config::parse("dialect \"svg").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let path = std::env::temp_dir().join("svglink-no-such-config.kdl");
        assert!(Config::load(Some(&path)).is_err());
    }
}
