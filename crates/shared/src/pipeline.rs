use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use rand::Rng;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::catalog::TopicCatalog;
use crate::config::Config;
use crate::feed::FeedBuilder;
use crate::history::UsageHistory;
use crate::io::{load_index, prepend_entry, write_page};
use crate::markdown;
use crate::models::{ArticleEntry, ArticleIdea};
use crate::page::{article_slug, ArticlePage, PageRenderer};
use crate::selector::IdeaSelector;
use crate::sitemap::SitemapBuilder;
use crate::writer::ArticleWriter;

const EXCERPT_CHARS: usize = 120;

#[derive(Debug, Clone)]
pub struct PublishedArticle {
    pub idea: ArticleIdea,
    pub entry: ArticleEntry,
    pub page_path: PathBuf,
}

/// Drives one article at a time from idea to published page
pub struct Publisher<'a> {
    config: &'a Config,
    catalog: &'a TopicCatalog,
    writer: ArticleWriter,
    renderer: PageRenderer,
    history: UsageHistory,
}

impl<'a> Publisher<'a> {
    pub fn new(config: &'a Config, catalog: &'a TopicCatalog, writer: ArticleWriter) -> Result<Self> {
        let renderer = PageRenderer::new(config.resolve_base_url()?);
        let history = UsageHistory::load(&config.history_path());

        for dir in [config.output_dir(), config.images_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        Ok(Self {
            config,
            catalog,
            writer,
            renderer,
            history,
        })
    }

    pub fn history(&self) -> &UsageHistory {
        &self.history
    }

    /// Select an idea, write and render it, then update the index and history.
    ///
    /// The history is only touched once the page and index are on disk, so a
    /// failed generation leaves the topic available for the next run.
    pub async fn publish_one<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        date: &str,
    ) -> Result<PublishedArticle> {
        let idea = IdeaSelector::new(self.catalog).select(&self.history, rng);
        info!(title = %idea.title, key = %idea.topic_key, "selected idea");

        let content = self
            .writer
            .write(&idea)
            .await
            .with_context(|| format!("Failed to generate content for \"{}\"", idea.title))?;

        let slug = article_slug(self.catalog.slug_for(&idea.category), &idea.title);
        let html = self.renderer.render(&ArticlePage {
            title: &idea.title,
            category: &idea.category,
            date,
            slug: &slug,
            markdown: &content,
        });
        let page_path = write_page(&self.config.output_dir(), &slug, &html)?;

        let entry = ArticleEntry::new(
            &idea,
            markdown::extract_description(&content, EXCERPT_CHARS),
            date,
            markdown::read_time_minutes(&content),
            slug,
            self.catalog.icon_for(&idea.category),
        );
        prepend_entry(&self.config.index_path(), entry.clone())?;

        self.history.record(&idea);
        self.history.save(&self.config.history_path())?;
        info!(path = %page_path.display(), "article published");

        Ok(PublishedArticle {
            idea,
            entry,
            page_path,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSummary {
    pub feed_items: Option<usize>,
    pub sitemap_urls: Option<usize>,
}

/// Regenerate `feed.xml` and/or `sitemap.xml` from the current article index
pub fn refresh_feeds(
    config: &Config,
    base_url: &str,
    now: DateTime<FixedOffset>,
    rss: bool,
    sitemap: bool,
) -> Result<FeedSummary> {
    let entries = load_index(&config.index_path())?;

    let feed_items = if rss {
        let count = FeedBuilder::new(base_url).write(&config.feed_path(), &entries, now)?;
        info!(items = count, path = %config.feed_path().display(), "feed written");
        Some(count)
    } else {
        None
    };

    let sitemap_urls = if sitemap {
        let mut builder = SitemapBuilder::new(base_url, now.format("%Y-%m-%d").to_string());
        builder.add_static_pages();
        builder.add_articles(&entries);
        let count = builder.write(&config.sitemap_path())?;
        info!(urls = count, path = %config.sitemap_path().display(), "sitemap written");
        Some(count)
    } else {
        None
    };

    Ok(FeedSummary {
        feed_items,
        sitemap_urls,
    })
}
