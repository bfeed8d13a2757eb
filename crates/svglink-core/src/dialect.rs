//! Markup dialects and their tag-name rules.
//!
//! The dialect decides how tag names are compared when the walker checks a
//! matched child against the name observed in the preview, and which tags
//! never open a child scope.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// HTML elements that never have content or a closing tag.
const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// The markup family a source buffer is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarkupDialect {
    /// SVG documents. Case-sensitive names (`linearGradient`).
    #[default]
    Svg,
    /// Generic XML. Case-sensitive names.
    Xml,
    /// HTML. ASCII case-insensitive names, void elements.
    Html,
}

impl MarkupDialect {
    /// Pick a dialect from a file extension. Unknown extensions are `None`.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "svg" => Some(Self::Svg),
            "xml" | "xsl" | "xslt" | "xhtml" | "rss" | "atom" | "plist" => Some(Self::Xml),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    /// Whether two tag names refer to the same element in this dialect.
    pub fn names_match(&self, expected: &str, actual: &str) -> bool {
        match self {
            Self::Svg | Self::Xml => expected == actual,
            Self::Html => expected.eq_ignore_ascii_case(actual),
        }
    }

    /// Tags whose opening `>` does not push a nesting context.
    pub fn is_void_element(&self, name: &str) -> bool {
        match self {
            Self::Svg | Self::Xml => false,
            Self::Html => HTML_VOID_ELEMENTS
                .iter()
                .any(|void| void.eq_ignore_ascii_case(name)),
        }
    }

    /// Whether a session should show a live preview for this dialect.
    pub fn is_previewable(&self) -> bool {
        matches!(self, Self::Svg)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Xml => "xml",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for MarkupDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("unknown markup dialect `{0}`")]
#[diagnostic(code(svglink::dialect), help("expected one of: svg, xml, html"))]
pub struct UnknownDialect(pub String);

impl FromStr for MarkupDialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "xml" => Ok(Self::Xml),
            "html" | "htm" => Ok(Self::Html),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(MarkupDialect::from_path("icon.svg"), Some(MarkupDialect::Svg));
        assert_eq!(MarkupDialect::from_path("ICON.SVG"), Some(MarkupDialect::Svg));
        assert_eq!(MarkupDialect::from_path("feed.xml"), Some(MarkupDialect::Xml));
        assert_eq!(MarkupDialect::from_path("index.htm"), Some(MarkupDialect::Html));
        assert_eq!(MarkupDialect::from_path("main.rs"), None);
        assert_eq!(MarkupDialect::from_path("Makefile"), None);
    }

    #[test]
    fn test_names_match() {
        assert!(MarkupDialect::Svg.names_match("linearGradient", "linearGradient"));
        assert!(!MarkupDialect::Svg.names_match("lineargradient", "linearGradient"));
        assert!(!MarkupDialect::Xml.names_match("Item", "item"));
        assert!(MarkupDialect::Html.names_match("DIV", "div"));
    }

    #[test]
    fn test_void_elements() {
        assert!(MarkupDialect::Html.is_void_element("br"));
        assert!(MarkupDialect::Html.is_void_element("IMG"));
        assert!(!MarkupDialect::Html.is_void_element("div"));
        assert!(!MarkupDialect::Svg.is_void_element("br"));
    }

    #[test]
    fn test_parse() {
        assert_eq!("SVG".parse::<MarkupDialect>(), Ok(MarkupDialect::Svg));
        assert_eq!(" html ".parse::<MarkupDialect>(), Ok(MarkupDialect::Html));
        assert!("yaml".parse::<MarkupDialect>().is_err());
        assert_eq!(MarkupDialect::Xml.to_string(), "xml");
    }
}
