//! Command-line interface definitions.
//!
//! Every option can come from a flag or an environment variable; flags win.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Article extraction with a headless-browser fallback.
///
/// # Examples
///
/// ```sh
/// # List what is pending in the store
/// article_harvest -s ./store sites
///
/// # Extract one article and print the record
/// article_harvest scrape https://example.com/news/harbor
///
/// # Process every pending URL with a specific Chromium build
/// CHROMIUM_PATH=/usr/bin/chromium article_harvest scrape-all
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Store directory holding sites.json and the JSON-lines outputs
    #[arg(short, long, env = "ARTICLE_HARVEST_STORE", default_value = "./store")]
    pub store_dir: PathBuf,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Chromium or Chrome executable for the rendering fallback
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium_path: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the pending URLs as JSON
    Sites,
    /// Extract a single URL and print the stored record
    Scrape {
        /// Article URL
        url: String,
    },
    /// Process every pending URL in order
    ScrapeAll,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "article_harvest",
            "--store-dir",
            "/tmp/harvest",
            "scrape",
            "https://a.test/story",
        ]);

        assert_eq!(cli.store_dir, PathBuf::from("/tmp/harvest"));
        assert_eq!(
            cli.command,
            Command::Scrape {
                url: "https://a.test/story".to_string()
            }
        );
        assert!(!cli.headed);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "article_harvest",
            "-s",
            "/tmp/store",
            "-c",
            "/tmp/config.yaml",
            "scrape-all",
        ]);

        assert_eq!(cli.store_dir, PathBuf::from("/tmp/store"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.yaml")));
        assert_eq!(cli.command, Command::ScrapeAll);
    }

    #[test]
    fn test_browser_flags() {
        let cli = Cli::parse_from([
            "article_harvest",
            "--chromium-path",
            "/opt/chromium/chrome",
            "--headed",
            "sites",
        ]);

        assert_eq!(cli.chromium_path, Some(PathBuf::from("/opt/chromium/chrome")));
        assert!(cli.headed);
        assert_eq!(cli.command, Command::Sites);
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["article_harvest"]).is_err());
    }
}
