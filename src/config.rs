//! `code-pages.toml` configuration.
//!
//! Paths in the file are relative to the file itself, so a site can be rendered
//! from any working directory. The `[[rules]]` table is optional and falls back
//! to [`default_rules`] when left out.

use crate::annotation::{default_rules, AnnotationRule};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "code-pages.toml";

#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Debug, Default)]
pub enum SyntaxTheme {
    #[default]
    #[serde(rename = "base16-ocean.dark")]
    OceanDark,
    #[serde(rename = "base16-eighties.dark")]
    EightiesDark,
    #[serde(rename = "base16-mocha.dark")]
    MochaDark,
    #[serde(rename = "base16-ocean.light")]
    OceanLight,
    #[serde(rename = "InspiredGitHub")]
    InspiredGitHub,
    #[serde(rename = "Solarized (dark)")]
    SolarizedDark,
    #[serde(rename = "Solarized (light)")]
    SolarizedLight,
}

impl fmt::Display for SyntaxTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl SyntaxTheme {
    pub fn name(&self) -> &'static str {
        match self {
            SyntaxTheme::OceanDark => "base16-ocean.dark",
            SyntaxTheme::EightiesDark => "base16-eighties.dark",
            SyntaxTheme::MochaDark => "base16-mocha.dark",
            SyntaxTheme::OceanLight => "base16-ocean.light",
            SyntaxTheme::InspiredGitHub => "InspiredGitHub",
            SyntaxTheme::SolarizedDark => "Solarized (dark)",
            SyntaxTheme::SolarizedLight => "Solarized (light)",
        }
    }

    pub fn all() -> &'static [SyntaxTheme] {
        &[
            SyntaxTheme::OceanDark,
            SyntaxTheme::EightiesDark,
            SyntaxTheme::MochaDark,
            SyntaxTheme::OceanLight,
            SyntaxTheme::InspiredGitHub,
            SyntaxTheme::SolarizedDark,
            SyntaxTheme::SolarizedLight,
        ]
    }
}

/// Where pages come from, where they go and how they're labelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    /// Directory holding the source files, only its top level is read
    pub source_dir: PathBuf,
    /// Extension of the files to publish, without the dot
    pub extension: String,
    /// Language token handed to the highlighter (a syntax name or extension)
    pub language: String,
    /// Syntax highlighting theme
    #[serde(default)]
    pub theme: SyntaxTheme,
    /// Page template with `{{key}}` placeholders
    pub template: PathBuf,
    /// Directory the pages are written to
    pub output_dir: PathBuf,
    /// Name of the document published as `index.html`
    pub home: String,
    /// Prepended to every page title
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,
    /// Navigation markup shown on every page but the home page
    #[serde(default = "default_go_back")]
    pub go_back: String,
    /// Globs of source files to leave out
    #[serde(default)]
    pub block_globs: Vec<String>,
}

fn default_title_prefix() -> String {
    "Tecnologer | ".to_string()
}

pub fn default_go_back() -> String {
    r#"<a href="index.html" class="icon-link" title="return to home">
		<svg xmlns="http://www.w3.org/2000/svg" x="0px" y="0px" width="30" height="30" viewBox="0 -5 50 50">
    <path d="M 25 1.0507812 C 24.7825 1.0507812 24.565859 1.1197656 24.380859 1.2597656 L 1.3808594 19.210938 C 0.95085938 19.550938 0.8709375 20.179141 1.2109375 20.619141 C 1.5509375 21.049141 2.1791406 21.129062 2.6191406 20.789062 L 4 19.710938 L 4 46 C 4 46.55 4.45 47 5 47 L 19 47 L 19 29 L 31 29 L 31 47 L 45 47 C 45.55 47 46 46.55 46 46 L 46 19.710938 L 47.380859 20.789062 C 47.570859 20.929063 47.78 21 48 21 C 48.3 21 48.589063 20.869141 48.789062 20.619141 C 49.129063 20.179141 49.049141 19.550938 48.619141 19.210938 L 25.619141 1.2597656 C 25.434141 1.1197656 25.2175 1.0507812 25 1.0507812 z M 35 5 L 35 6.0507812 L 41 10.730469 L 41 5 L 35 5 z"></path>
</svg>
	</a>"#
        .to_string()
}

impl Default for Site {
    fn default() -> Self {
        Site {
            source_dir: PathBuf::from("about"),
            extension: "go".to_string(),
            language: "Go".to_string(),
            theme: SyntaxTheme::default(),
            template: PathBuf::from("template").join("template.html"),
            output_dir: PathBuf::from("page"),
            home: "me".to_string(),
            title_prefix: default_title_prefix(),
            go_back: default_go_back(),
            block_globs: Vec::new(),
        }
    }
}

/// Complete configuration for a code-pages site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub site: Site,
    #[serde(default = "default_rules")]
    pub rules: Vec<AnnotationRule>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            site: Site::default(),
            rules: default_rules(),
        }
    }
}

impl Configuration {
    /// Load the configuration at `path`, resolving its relative paths against
    /// the directory it lives in and reporting any rule problems.
    pub fn load(path: &Path) -> Result<Configuration> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to load {} contents", path.display()))?;
        let mut config: Configuration = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        config.report_rule_problems();

        Ok(config)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.site.source_dir,
            &mut self.site.template,
            &mut self.site.output_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    fn report_rule_problems(&self) {
        for (i, rule) in self.rules.iter().enumerate() {
            for problem in rule.validate() {
                log::warn!("Annotation rule {i}: {problem}");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn can_serialize_configuration() {
        let config = Configuration::default();
        toml::to_string(&config).expect("can serialize configuration to TOML");
    }

    #[test]
    fn can_roundtrip_configuration() {
        let config = Configuration::default();
        let toml_str = toml::to_string_pretty(&config).expect("can serialize");
        let deserialized: Configuration = toml::from_str(&toml_str).expect("can deserialize");
        assert_eq!(deserialized.rules, config.rules);
        assert_eq!(deserialized.site.home, "me");
        assert_eq!(deserialized.site.theme, SyntaxTheme::OceanDark);
        assert_eq!(deserialized.site.go_back, default_go_back());
    }

    #[test]
    fn missing_rules_fall_back_to_defaults() {
        let config: Configuration = toml::from_str(
            r#"
            [site]
            source_dir = "src"
            extension = "rs"
            language = "Rust"
            template = "page.html"
            output_dir = "out"
            home = "main"
            "#,
        )
        .expect("can parse minimal configuration");

        assert_eq!(config.rules, default_rules());
        assert_eq!(config.site.title_prefix, "Tecnologer | ");
        assert_eq!(config.site.theme, SyntaxTheme::OceanDark);
        assert!(config.site.block_globs.is_empty());
    }

    #[test]
    fn can_parse_custom_rules() {
        let config: Configuration = toml::from_str(
            r#"
            [site]
            source_dir = "src"
            extension = "rs"
            language = "Rust"
            theme = "InspiredGitHub"
            template = "page.html"
            output_dir = "out"
            home = "main"

            [[rules]]
            patterns = ['(todo)', '(fixme)']
            replacement = '<mark>$1</mark>'
            "#,
        )
        .expect("can parse configuration with rules");

        assert_eq!(config.site.theme, SyntaxTheme::InspiredGitHub);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].patterns.len(), 2);
        assert_eq!(config.rules[0].replacement, "<mark>$1</mark>");
    }

    #[test]
    fn load_resolves_paths_next_to_the_file() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let config = toml::to_string_pretty(&Configuration::default()).expect("can serialize");
        std::fs::write(&path, config).expect("can write config");

        let loaded = Configuration::load(&path).expect("can load config");
        assert_eq!(loaded.site.source_dir, dir.path().join("about"));
        assert_eq!(
            loaded.site.template,
            dir.path().join("template").join("template.html")
        );
        assert_eq!(loaded.site.output_dir, dir.path().join("page"));
    }

    #[test]
    fn theme_names_match_serde_names() {
        #[derive(Serialize)]
        struct Wrapper {
            theme: SyntaxTheme,
        }

        for theme in SyntaxTheme::all() {
            let toml_str = toml::to_string(&Wrapper { theme: *theme }).expect("can serialize");
            assert_eq!(toml_str.trim(), format!("theme = \"{}\"", theme.name()));
        }
    }
}
