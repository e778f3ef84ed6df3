use serde::{Deserialize, Serialize};

/// A topic chosen for the next article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleIdea {
    pub title: String,
    pub category: String,
    pub outline: Vec<String>,
    /// Identifies the category and sampled subject, independent of phrasing
    pub topic_key: String,
}

/// One record in `articles.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleEntry {
    pub title: String,
    pub category: String,
    pub excerpt: String,
    pub date: String,
    #[serde(rename = "readTime")]
    pub read_time: String,
    pub slug: String,
    pub icon: String,
}

impl ArticleEntry {
    pub fn new(
        idea: &ArticleIdea,
        excerpt: impl Into<String>,
        date: impl Into<String>,
        read_minutes: u32,
        slug: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            title: idea.title.clone(),
            category: idea.category.clone(),
            excerpt: excerpt.into(),
            date: date.into(),
            read_time: format!("{} min", read_minutes),
            slug: slug.into(),
            icon: icon.into(),
        }
    }
}
