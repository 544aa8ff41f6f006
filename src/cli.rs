use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generates a code-pages.toml config file
    Config,
    /// Renders every page according to the contents of the config file
    Render,
    /// Writes the CSS for the configured syntax theme
    Stylesheet {
        /// Where to write the stylesheet
        #[clap(default_value = "style.css")]
        outfile: PathBuf,
    },
}

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    /// Path to the config file
    #[clap(long, short, global = true, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}
