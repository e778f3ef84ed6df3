use anyhow::Result;
use clap::Parser;
use shared::config::normalize_base_url;
use shared::feed::site_now;
use shared::{refresh_feeds, Config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "publish-feeds")]
#[command(about = "Regenerate feed.xml and sitemap.xml from articles.json")]
struct Args {
    /// Site root containing articles.json
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Public site URL; defaults to CNAME, then base_url in config.json
    #[arg(short, long)]
    base_url: Option<String>,

    /// Only write feed.xml
    #[arg(long, conflicts_with = "sitemap_only")]
    rss_only: bool,

    /// Only write sitemap.xml
    #[arg(long)]
    sitemap_only: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::load(&args.root)?;

    let base_url = match &args.base_url {
        Some(url) => normalize_base_url(url)?,
        None => config.resolve_base_url()?,
    };
    println!("🌐 Using site URL: {}", base_url);

    let rss = !args.sitemap_only;
    let sitemap = !args.rss_only;
    let summary = refresh_feeds(&config, &base_url, site_now(), rss, sitemap)?;

    if let Some(items) = summary.feed_items {
        println!("✅ RSS feed written: {} ({} articles)", config.feed_path().display(), items);
    }
    if let Some(urls) = summary.sitemap_urls {
        println!("✅ Sitemap written: {} ({} URLs)", config.sitemap_path().display(), urls);
    }

    Ok(())
}
