use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;
use wren::fetch::{DiskFetcher, Fetch, HttpFetcher};
use wren::highlight::SyntectHighlighter;
use wren::{Site, SiteConfig};

/// Renders a page of a blog and prints the resulting HTML.
#[derive(Parser)]
#[command(name = "preview", version, about)]
struct Args {
    /// The site directory, holding `posts/posts.json`.
    #[arg(default_value = "demos/preview/site")]
    root: PathBuf,

    /// The URL of the page to render.
    #[arg(long, default_value = "http://localhost/")]
    url: Url,

    /// Read the site over HTTP from this origin instead of from `root`.
    #[arg(long)]
    origin: Option<Url>,

    /// A TOML config file. Defaults to `wren.toml` in the site directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Search the listing for this text.
    #[arg(long)]
    search: Option<String>,

    /// Show only listing posts with this tag.
    #[arg(long)]
    tag: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SiteConfig::load(path)?,
        None => {
            let path = args.root.join("wren.toml");
            if path.exists() {
                SiteConfig::load(&path)?
            } else {
                SiteConfig::default()
            }
        }
    };

    let html = match args.origin.clone() {
        Some(origin) => preview(HttpFetcher::new(origin), config, &args).await?,
        None => preview(DiskFetcher::new(&args.root), config, &args).await?,
    };

    println!("{html}");

    Ok(())
}

async fn preview<F: Fetch>(fetcher: F, config: SiteConfig, args: &Args) -> Result<String> {
    let site = Site::builder()
        .fetcher(fetcher)
        .config(config)
        .highlighter(SyntectHighlighter::default())
        .build();

    let mut visit = site.visit(&args.url).await;

    if let Some(query) = &args.search {
        let shown = visit.search(query)?;
        tracing::info!(query = %query, ?shown, "searched listing");
    }

    if let Some(tag) = &args.tag {
        let shown = visit.select_tag(tag)?;
        tracing::info!(tag = %tag, ?shown, "filtered listing by tag");
    }

    visit.html().context("failed to render page")
}
