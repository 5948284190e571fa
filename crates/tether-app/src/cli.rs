use std::path::PathBuf;

use clap::Parser;
use tether_config::TetherConfig;

/// Tether: a native window hosting web content, with a call bridge between
/// the page and Rust.
#[derive(Parser, Debug)]
#[command(name = "tether", version, about)]
pub struct Args {
    /// URL to load instead of the configured page.
    #[arg(long)]
    pub url: Option<String>,

    /// Window title.
    #[arg(long)]
    pub title: Option<String>,

    /// Window width in logical pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height in logical pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level or filter directive override (e.g. debug, tether_bridge=trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Enable the web inspector.
    #[arg(long)]
    pub devtools: bool,

    /// Run the bridge round trip headless and exit.
    #[arg(long)]
    pub self_test: bool,
}

impl Args {
    /// Layer command-line values over `config`.
    pub fn apply(&self, config: &mut TetherConfig) {
        if let Some(url) = &self.url {
            config.window.url = Some(url.clone());
            config.window.html = None;
        }
        if let Some(title) = &self.title {
            config.window.title = title.clone();
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        if self.devtools {
            config.window.devtools = true;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
