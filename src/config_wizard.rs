//! Interactive configuration wizard for creating `code-pages.toml`.
//!
//! Asks for the site layout (sources, template, output), the language and
//! theme used for highlighting, and the page labels. The annotation rules are
//! written out as the default table so they can be edited in place afterwards.

use crate::config::{Configuration, Site, SyntaxTheme};
use anyhow::{anyhow, Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, FuzzySelect, Input};
use std::path::{Path, PathBuf};

/// Run the interactive configuration wizard, writing the result to `path`.
pub fn run(path: &Path) -> Result<()> {
    let theme = ColorfulTheme::default();
    let defaults = Site::default();

    let source_dir: String = Input::with_theme(&theme)
        .with_prompt("Source directory")
        .default(defaults.source_dir.display().to_string())
        .interact()
        .with_context(|| "Failed to obtain source directory")?;
    let source_dir = PathBuf::from(source_dir);
    if !source_dir.is_dir() {
        return Err(anyhow!("Path '{}' isn't a directory!", source_dir.display()));
    }

    let extension: String = Input::with_theme(&theme)
        .with_prompt("Extension of the files to publish")
        .default(defaults.extension.clone())
        .interact()?;
    let extension = extension.trim_start_matches('.').to_string();

    let language: String = Input::with_theme(&theme)
        .with_prompt("Language to highlight as")
        .default(defaults.language.clone())
        .interact()?;

    let syntax_theme = FuzzySelect::with_theme(&theme)
        .with_prompt("Syntax highlighting theme")
        .items(SyntaxTheme::all())
        .default(0)
        .interact()?;
    let syntax_theme = SyntaxTheme::all()[syntax_theme];

    let template: String = Input::with_theme(&theme)
        .with_prompt("Page template")
        .default(defaults.template.display().to_string())
        .interact()?;

    let output_dir: String = Input::with_theme(&theme)
        .with_prompt("Output directory")
        .default(defaults.output_dir.display().to_string())
        .interact()?;

    let home: String = Input::with_theme(&theme)
        .with_prompt("Document published as index.html (name without extension)")
        .default(defaults.home.clone())
        .interact()?;

    let title_prefix: String = Input::with_theme(&theme)
        .with_prompt("Page title prefix")
        .default(defaults.title_prefix.clone())
        .allow_empty(true)
        .interact()?;

    let config = Configuration {
        site: Site {
            source_dir,
            extension,
            language,
            theme: syntax_theme,
            template: PathBuf::from(template),
            output_dir: PathBuf::from(output_dir),
            home,
            title_prefix,
            ..defaults
        },
        ..Configuration::default()
    };

    let config =
        toml::to_string_pretty(&config).with_context(|| "Failed to convert configuration to TOML")?;

    if path.exists()
        && !Confirm::with_theme(&theme)
            .with_prompt(format!(
                "{} already exists, do you want to override it?",
                path.display()
            ))
            .interact()?
    {
        println!("Configuration:");
        println!("{}", config);
    } else {
        std::fs::write(path, config).with_context(|| "Failed to write configuration file")?;
        println!("{} written!", path.display());
    }

    Ok(())
}
