//! Command-line interface definitions.

use clap::{Parser, Subcommand, ValueEnum};
use sitemapper_render::Stylesheet;
use std::path::PathBuf;

/// Paginated XML sitemaps for a content-managed site.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Configuration file (.toml, .yaml/.yml or .json)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render the sitemap index
    Index,
    /// Answer a request path the way the web server would
    Get {
        /// Request path, with optional query string (e.g. /sitemap-posts-post-1.xml)
        path: String,
    },
    /// Recompute the lastmod of every sitemap page
    Warm,
    /// Print one of the XSL stylesheets
    Stylesheet {
        #[arg(value_enum)]
        kind: StylesheetKind,
    },
    /// Print the robots.txt line advertising the sitemap index
    Robots,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylesheetKind {
    Index,
    Leaf,
}
impl From<StylesheetKind> for Stylesheet {
    fn from(kind: StylesheetKind) -> Self {
        match kind {
            StylesheetKind::Index => Stylesheet::Index,
            StylesheetKind::Leaf => Stylesheet::Leaf,
        }
    }
}
