//! `{{key}}` placeholder substitution.
//!
//! A template is plain text with `{{key}}` tokens. Rendering makes a single
//! left-to-right pass: each token whose key has a fragment is replaced by the
//! fragment verbatim (no escaping), every other token is copied through as-is.
//! Inserted fragments are never scanned again, so a fragment that happens to
//! contain something like `{{title}}` shows up literally in the output.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder regex is valid"));

/// The placeholders a page is assembled from.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Placeholder {
    /// Annotated, highlighted source
    Code,
    /// Document name, without extension
    File,
    /// Link back to the home page, empty on the home page itself
    GoBack,
    /// Build stamp
    Version,
    /// Page title
    Title,
}

impl Placeholder {
    pub fn key(&self) -> &'static str {
        match self {
            Placeholder::Code => "code",
            Placeholder::File => "file",
            Placeholder::GoBack => "go_back",
            Placeholder::Version => "version",
            Placeholder::Title => "title",
        }
    }

    pub fn all() -> &'static [Placeholder] {
        &[
            Placeholder::Code,
            Placeholder::File,
            Placeholder::GoBack,
            Placeholder::Version,
            Placeholder::Title,
        ]
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{{}}}}}", self.key())
    }
}

/// Named fragments for one rendering, keyed by the bare placeholder name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Fragments {
    values: BTreeMap<String, String>,
}

impl Fragments {
    pub fn new() -> Fragments {
        Fragments::default()
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn set<V: Into<String>>(&mut self, placeholder: Placeholder, value: V) -> &mut Self {
        self.insert(placeholder.key(), value)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// A template document, loaded once and rendered any number of times.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new<S: Into<String>>(source: S) -> Template {
        Template {
            source: source.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Template> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?;
        Ok(Template::new(source))
    }

    /// The keys of every placeholder in the template, in order of first use.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.source) {
            if let Some(key) = caps.get(1).map(|m| m.as_str()) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Substitute `fragments` into a copy of the template.
    pub fn render(&self, fragments: &Fragments) -> String {
        PLACEHOLDER
            .replace_all(&self.source, |caps: &Captures| match fragments.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Render `template` text with `fragments` without keeping the template around.
#[cfg(test)]
pub fn render(template: &str, fragments: &Fragments) -> String {
    Template::new(template).render(fragments)
}
