// Public modules
pub mod catalog;
pub mod config;
pub mod feed;
pub mod history;
pub mod io;
pub mod markdown;
pub mod models;
pub mod page;
pub mod pipeline;
pub mod selector;
pub mod sitemap;
pub mod writer;

// Re-export commonly used types
pub use catalog::{Axis, CategoryTemplate, TopicCatalog};
pub use config::{ArticleLength, Config, Provider, SiteConfig};
pub use feed::FeedBuilder;
pub use history::UsageHistory;
pub use io::{load_index, prepend_entry, save_index, write_page};
pub use models::{ArticleEntry, ArticleIdea};
pub use page::PageRenderer;
pub use pipeline::{refresh_feeds, FeedSummary, PublishedArticle, Publisher};
pub use selector::IdeaSelector;
pub use sitemap::SitemapBuilder;
pub use writer::ArticleWriter;
