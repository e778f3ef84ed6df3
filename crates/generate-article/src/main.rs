use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{refresh_feeds, ArticleWriter, Config, Provider, Publisher, TopicCatalog};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Pause between consecutive API calls
const PAUSE_BETWEEN_ARTICLES: Duration = Duration::from_secs(3);

#[derive(Parser)]
#[command(name = "generate-article")]
#[command(about = "Generate new cat-care articles and publish them to the static site")]
struct Args {
    /// Site root containing config.json, articles.json and used_topics.json
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Content provider (openai, claude, zhipu, qwen, offline); overrides config.json
    #[arg(short, long)]
    provider: Option<String>,

    /// Number of articles to generate; overrides articles_per_day
    #[arg(short = 'n', long)]
    count: Option<u32>,

    /// Seed for topic selection, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Do not regenerate feed.xml and sitemap.xml afterwards
    #[arg(long)]
    skip_feeds: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.root)?;
    if let Some(name) = &args.provider {
        let provider = Provider::from_name(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid provider: {}. Use 'openai', 'claude', 'zhipu', 'qwen' or 'offline'",
                name
            )
        })?;
        config = config.with_provider(provider);
    }

    let count = args.count.unwrap_or(config.site.articles_per_day);
    println!("🐱 Generating {} article(s) with {}...", count, config.site.ai_provider.name());

    let catalog = TopicCatalog::builtin();
    let writer = ArticleWriter::new(&config)?;
    let mut publisher = Publisher::new(&config, &catalog, writer)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let now = shared::feed::site_now();
    let date = now.format("%Y-%m-%d").to_string();

    for i in 0..count {
        let published = publisher
            .publish_one(&mut rng, &date)
            .await
            .with_context(|| format!("Article {} of {} failed", i + 1, count))?;

        println!(
            "✅ Article {} published: {} ({})",
            i + 1,
            published.entry.title,
            published.page_path.display()
        );

        if i + 1 < count {
            tokio::time::sleep(PAUSE_BETWEEN_ARTICLES).await;
        }
    }

    println!(
        "🎉 Done. {} topic(s) used so far.",
        publisher.history().topic_keys.len()
    );

    if !args.skip_feeds {
        println!("\n📡 Refreshing feed and sitemap...");
        let base_url = config.resolve_base_url()?;
        let summary = refresh_feeds(&config, &base_url, now, true, true)?;
        println!(
            "✓ feed.xml: {} item(s), sitemap.xml: {} URL(s)",
            summary.feed_items.unwrap_or(0),
            summary.sitemap_urls.unwrap_or(0)
        );
    }

    Ok(())
}
