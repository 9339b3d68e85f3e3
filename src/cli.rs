//! CLI definitions using clap derive API

use clap::Parser;
use clap::builder::{Styles, styling::AnsiColor};
use std::path::PathBuf;

use grindstone::Options;

/// Grindstone - incremental static bundler
///
/// Publishes every package found in the source folders into the destination folder.
#[derive(Parser, Debug)]
#[command(
    name = "grindstone",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Incremental static bundler for package.json source trees",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  grindstone src out                      \x1b[90m# Publish every package\x1b[0m\n   \
                  grindstone lib apps out --css           \x1b[90m# Two source folders, CSS in loaders\x1b[0m\n   \
                  grindstone src out --only app/app.js    \x1b[90m# Refresh one output path\x1b[0m\n   \
                  grindstone src out --jquery jquery.js   \x1b[90m# Ship jQuery with the loaders\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Source folders followed by the destination folder
    #[arg(required = true, num_args = 2.., value_name = "FOLDERS")]
    pub folders: Vec<PathBuf>,

    /// jQuery source copied into the destination and loaded by every HTML loader
    #[arg(long, env = "GRINDSTONE_JQUERY", value_name = "PATH")]
    pub jquery: Option<PathBuf>,

    /// Only bring this destination-relative path up to date
    #[arg(long, value_name = "PATH")]
    pub only: Option<String>,

    /// Packages whose outputs may be cached by HTTP clients
    #[arg(long, value_delimiter = ',', value_name = "PACKAGE")]
    pub cache: Vec<String>,

    /// Reference CSS assets of all dependencies from the HTML loaders
    #[arg(long, env = "GRINDSTONE_CSS")]
    pub css: bool,

    /// Enable verbose output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// Build publishing options; the last folder is the destination
    pub fn to_options(&self) -> Options {
        let mut sources = self.folders.clone();
        let dest = sources.pop().unwrap_or_default();
        Options {
            source_folders: sources,
            dest_folder: dest,
            jquery_source_path: self.jquery.clone(),
            inline_css: self.css,
            only_path: self.only.clone(),
            cache_package_names: self.cache.clone(),
        }
    }
}
