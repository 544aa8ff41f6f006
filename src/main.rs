use anyhow::{Context, Result};
use cli::Cli;
use config::Configuration;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod annotation;
mod cli;
mod config;
mod config_wizard;
mod highlight;
mod site;
mod styles;
mod template;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("code_pages=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = try_main() {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Config => config_wizard::run(&cli.config),
        cli::Commands::Stylesheet { outfile } => {
            let config = Configuration::load(&cli.config)?;
            styles::write_stylesheet(config.site.theme, outfile)?;
            println!("Stylesheet written to {}", outfile.display());
            Ok(())
        }
        cli::Commands::Render => {
            println!("Loading configuration...");
            let config = Configuration::load(&cli.config)?;

            let progress = ProgressBar::new(0);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .expect("can parse progress style")
                    .progress_chars("#>-"),
            );
            progress.set_message("Rendering pages...");

            let stats = site::render_site(&config, &progress)
                .with_context(|| "Failed to render pages")?;
            progress.finish_with_message("done");

            println!();
            println!("  Pages written: {}", stats.written.len());
            println!("  Output:        {}", config.site.output_dir.display());
            if !stats.failed.is_empty() {
                println!(
                    "  {}: {}",
                    console::style("Failed").red(),
                    stats
                        .failed
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }

            Ok(())
        }
    }
}
