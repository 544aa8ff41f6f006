//! Syntax highlighting into class-tagged HTML.
//!
//! Tokens are wrapped in `<span>`s carrying short, Pygments-style class names
//! (`k`, `s`, `nf`, `nx`, ...) rather than syntect's full scope names, so that
//! annotation rules and stylesheets can target them with compact selectors.
//! The surrounding `<pre>` picks up the theme's foreground and background.

use crate::config::SyntaxTheme;
use anyhow::{anyhow, Context, Result};
use syntect::easy::ScopeRegionIterator;
use syntect::highlighting::{Color, Theme, ThemeSet};
use syntect::parsing::{ParseState, Scope, ScopeStack, SyntaxSet};
use syntect::util::LinesWithEndings;

pub const SERIALIZED_SYNTAX: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/syntaxes.bin"));
pub const SERIALIZED_THEMES: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/themes.bin"));

/// Scope prefixes and the class their tokens get. More specific prefixes come
/// before the general ones they share a root with.
pub const SCOPE_CLASSES: &[(&str, &str)] = &[
    ("comment", "c"),
    ("constant.character.escape", "se"),
    ("constant.numeric", "m"),
    ("constant.language", "kc"),
    ("string", "s"),
    ("keyword.operator", "o"),
    ("keyword", "k"),
    ("storage.type", "kt"),
    ("storage", "kd"),
    ("support.type", "kt"),
    ("entity.name.function", "nf"),
    ("variable.function", "nf"),
    ("support.function", "nf"),
    ("entity.name.type", "nc"),
    ("entity.name.class", "nc"),
    ("entity.name", "nx"),
    ("variable", "nx"),
    ("punctuation.separator", "p"),
    ("punctuation.section", "p"),
    ("punctuation.accessor", "p"),
    ("punctuation.terminator", "p"),
];

/// Turns source text into highlighted HTML.
pub trait Highlight {
    fn highlight(&self, source: &str, language: &str) -> Result<String>;
}

pub fn load_syntaxes() -> Result<SyntaxSet> {
    let (ss, _) = bincode::serde::decode_from_slice(SERIALIZED_SYNTAX, bincode::config::standard())
        .with_context(|| "Failed to deserialise syntax set")?;
    Ok(ss)
}

pub fn load_theme(theme: SyntaxTheme) -> Result<Theme> {
    let (mut themes, _): (ThemeSet, _) =
        bincode::serde::decode_from_slice(SERIALIZED_THEMES, bincode::config::standard())
            .with_context(|| "Failed to deserialise theme set")?;
    themes
        .themes
        .remove(theme.name())
        .ok_or_else(|| anyhow!("Theme `{}` isn't bundled", theme.name()))
}

/// The class for the innermost scope on the stack that has one.
pub fn class_for_stack(stack: &[Scope]) -> Option<&'static str> {
    stack.iter().rev().find_map(|scope| class_for_scope(&scope.build_string()))
}

fn class_for_scope(scope: &str) -> Option<&'static str> {
    SCOPE_CLASSES.iter().find_map(|(prefix, class)| {
        let matches = scope == *prefix
            || (scope.starts_with(prefix) && scope[prefix.len()..].starts_with('.'));
        matches.then_some(*class)
    })
}

pub(crate) fn css_rgb(colour: Color) -> String {
    format!("rgb({}, {}, {})", colour.r, colour.g, colour.b)
}

/// Highlighter backed by syntect's bundled grammars.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl SyntectHighlighter {
    pub fn new(theme: SyntaxTheme) -> Result<SyntectHighlighter> {
        Ok(SyntectHighlighter {
            syntaxes: load_syntaxes()?,
            theme: load_theme(theme)?,
        })
    }

    fn pre_style(&self) -> String {
        let mut style = Vec::new();
        if let Some(fg) = self.theme.settings.foreground {
            style.push(format!("color: {}", css_rgb(fg)));
        }
        if let Some(bg) = self.theme.settings.background {
            style.push(format!("background-color: {}", css_rgb(bg)));
        }
        style.join("; ")
    }
}

impl Highlight for SyntectHighlighter {
    fn highlight(&self, source: &str, language: &str) -> Result<String> {
        let syntax = self
            .syntaxes
            .find_syntax_by_token(language)
            .ok_or_else(|| anyhow!("No syntax available for language `{language}`"))?;

        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut code = String::with_capacity(source.len() * 4);

        // text waiting to be written, along with the class it was tagged with
        let mut pending = String::new();
        let mut pending_class: Option<&'static str> = None;

        for (line_num, line) in LinesWithEndings::from(source).enumerate() {
            let ops = state
                .parse_line(line, &self.syntaxes)
                .with_context(|| format!("Failed to parse line {}", line_num + 1))?;

            for (text, op) in ScopeRegionIterator::new(&ops, line) {
                stack
                    .apply(op)
                    .with_context(|| format!("Failed to apply scope on line {}", line_num + 1))?;
                if text.is_empty() {
                    continue;
                }

                let class = class_for_stack(stack.as_slice());
                if class != pending_class {
                    flush(&mut code, &mut pending, pending_class);
                    pending_class = class;
                }
                pending.push_str(text);
            }
        }
        flush(&mut code, &mut pending, pending_class);

        Ok(format!(
            r#"<pre class="chroma" style="{style}"><code>{code}</code></pre>"#,
            style = self.pre_style(),
        ))
    }
}

fn flush(code: &mut String, pending: &mut String, class: Option<&str>) {
    if pending.is_empty() {
        return;
    }
    let escaped = html_escape::encode_text(pending.as_str());
    match class {
        Some(class) => code.push_str(&format!(r#"<span class="{class}">{escaped}</span>"#)),
        None => code.push_str(&escaped),
    }
    pending.clear();
}

/// Highlight `source`, falling back to the original text if highlighting
/// fails so the page still shows the code.
pub fn highlight_or_original<H: Highlight + ?Sized>(
    highlighter: &H,
    source: &str,
    language: &str,
) -> String {
    match highlighter.highlight(source, language) {
        Ok(html) => html,
        Err(e) => {
            log::warn!("Failed to highlight as {language}, using plain text: {e:#}");
            source.to_string()
        }
    }
}
