//! CSS generation for highlighted pages.
//!
//! The highlighter only emits short class names, so the colours live in a
//! stylesheet. One rule is generated per class, styled the way the theme styles
//! the first scope mapped to that class, plus a rule for the `.chroma` block
//! itself.

use crate::config::SyntaxTheme;
use crate::highlight::{css_rgb, load_theme, SCOPE_CLASSES};
use anyhow::{Context, Result};
use syntect::highlighting::{FontStyle, Highlighter, Style, Theme};
use syntect::parsing::Scope;

/// Generate the stylesheet for `theme`.
pub fn generate_stylesheet(theme: &Theme) -> Result<String> {
    let mut css = String::with_capacity(2048);
    let highlighter = Highlighter::new(theme);
    let default_style = highlighter.get_default();

    css.push_str(&format!(
        "/* {} */\n",
        theme.name.as_deref().unwrap_or("syntax theme")
    ));
    css.push_str(&format!(
        ".chroma {{ color: {}; background-color: {}; }}\n",
        css_rgb(default_style.foreground),
        css_rgb(default_style.background)
    ));
    css.push_str(".chroma a { color: inherit; text-decoration: underline; }\n");

    let mut seen: Vec<&str> = Vec::new();
    for (scope_str, class_name) in SCOPE_CLASSES {
        if seen.contains(class_name) {
            continue;
        }
        seen.push(*class_name);

        let scope = Scope::new(scope_str)
            .map_err(|e| anyhow::anyhow!("{e:?}"))
            .with_context(|| format!("Invalid scope `{scope_str}`"))?;
        let style = highlighter.style_for_stack(&[scope]);
        css.push_str(&format_css_rule(class_name, &style, &default_style));
    }

    Ok(css)
}

/// Format a CSS rule for a syntax class, leaving out the background when it
/// matches the block's.
fn format_css_rule(class_name: &str, style: &Style, default_style: &Style) -> String {
    let mut props = vec![format!("color: {}", css_rgb(style.foreground))];

    if style.background != default_style.background {
        props.push(format!("background-color: {}", css_rgb(style.background)));
    }
    if style.font_style.intersects(FontStyle::BOLD) {
        props.push("font-weight: bold".to_string());
    }
    if style.font_style.intersects(FontStyle::ITALIC) {
        props.push("font-style: italic".to_string());
    }
    if style.font_style.intersects(FontStyle::UNDERLINE) {
        props.push("text-decoration: underline".to_string());
    }

    format!(".chroma .{} {{ {} }}\n", class_name, props.join("; "))
}

/// Write the stylesheet for `theme` to `outfile`.
pub fn write_stylesheet(theme: SyntaxTheme, outfile: &std::path::Path) -> Result<()> {
    let theme = load_theme(theme)?;
    let css = generate_stylesheet(&theme)?;
    std::fs::write(outfile, css)
        .with_context(|| format!("Failed to write stylesheet {}", outfile.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_generate_stylesheet() {
        let theme = load_theme(SyntaxTheme::InspiredGitHub).expect("can load theme");
        let css = generate_stylesheet(&theme).expect("can generate stylesheet");
        assert!(css.contains(".chroma {"));
        assert!(css.contains(".chroma .k {"));
        assert!(css.contains(".chroma .nf {"));
        assert_eq!(css.matches(".chroma .kt {").count(), 1);
    }

    #[test]
    fn can_load_all_themes() {
        for theme in SyntaxTheme::all() {
            load_theme(*theme).expect("theme is bundled");
        }
    }

    #[test]
    fn can_write_stylesheet() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join("style.css");
        write_stylesheet(SyntaxTheme::default(), &path).expect("can write stylesheet");
        let css = std::fs::read_to_string(&path).expect("can read stylesheet");
        assert!(css.starts_with("/* "));
    }
}
