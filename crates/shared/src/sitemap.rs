use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::path::Path;

use crate::models::ArticleEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

/// Collects site URLs and writes them out as `sitemap.xml`
pub struct SitemapBuilder {
    base_url: String,
    today: String,
    urls: Vec<SitemapUrl>,
}

impl SitemapBuilder {
    /// `today` (`YYYY-MM-DD`) is the lastmod for pages without a date of their own
    pub fn new(base_url: impl Into<String>, today: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            today: today.into(),
            urls: Vec::new(),
        }
    }

    /// Add a page; relative paths are resolved against the base URL
    pub fn add_url(
        &mut self,
        path: &str,
        lastmod: Option<&str>,
        changefreq: &'static str,
        priority: &'static str,
    ) {
        let loc = if path.starts_with("http") {
            path.to_string()
        } else if path == "/" {
            format!("{}/", self.base_url)
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        };

        self.urls.push(SitemapUrl {
            loc,
            lastmod: lastmod.unwrap_or(self.today.as_str()).to_string(),
            changefreq,
            priority,
        });
    }

    pub fn add_static_pages(&mut self) {
        self.add_url("/", None, "daily", "1.0");
        self.add_url("/index.html", None, "daily", "1.0");
        self.add_url("/feed.xml", None, "daily", "0.5");
    }

    pub fn add_articles(&mut self, entries: &[ArticleEntry]) {
        for entry in entries {
            self.add_url(
                &format!("/articles/{}.html", entry.slug),
                Some(entry.date.as_str()),
                "monthly",
                "0.7",
            );
        }
    }

    pub fn urls(&self) -> &[SitemapUrl] {
        &self.urls
    }

    pub fn render(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut urlset = BytesStart::new("urlset");
        urlset.push_attribute(("xmlns", "http://www.sitemaps.org/schemas/sitemap/0.9"));
        urlset.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
        urlset.push_attribute((
            "xsi:schemaLocation",
            "http://www.sitemaps.org/schemas/sitemap/0.9 http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd",
        ));
        writer.write_event(Event::Start(urlset))?;

        for url in &self.urls {
            writer.write_event(Event::Start(BytesStart::new("url")))?;
            for (name, value) in [
                ("loc", url.loc.as_str()),
                ("lastmod", url.lastmod.as_str()),
                ("changefreq", url.changefreq),
                ("priority", url.priority),
            ] {
                writer.write_event(Event::Start(BytesStart::new(name)))?;
                writer.write_event(Event::Text(BytesText::new(value)))?;
                writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
            writer.write_event(Event::End(BytesEnd::new("url")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("urlset")))?;

        String::from_utf8(writer.into_inner()).context("Sitemap XML is not valid UTF-8")
    }

    /// Render and save the sitemap, returning the number of URLs
    pub fn write(&self, path: &Path) -> Result<usize> {
        let xml = self.render()?;
        fs::write(path, xml)
            .with_context(|| format!("Failed to write sitemap: {}", path.display()))?;
        Ok(self.urls.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(slug: &str, date: &str) -> ArticleEntry {
        ArticleEntry {
            title: slug.to_string(),
            category: "Behavior Training".to_string(),
            excerpt: String::new(),
            date: date.to_string(),
            read_time: "2 min".to_string(),
            slug: slug.to_string(),
            icon: "🧠".to_string(),
        }
    }

    #[test]
    fn static_pages_then_articles() {
        let mut sitemap = SitemapBuilder::new("https://cats.example.com/", "2026-10-19");
        sitemap.add_static_pages();
        sitemap.add_articles(&[entry("behavior-training-aa11bb22", "2026-10-10")]);

        let locs: Vec<&str> = sitemap.urls().iter().map(|u| u.loc.as_str()).collect();
        assert_eq!(
            locs,
            vec![
                "https://cats.example.com/",
                "https://cats.example.com/index.html",
                "https://cats.example.com/feed.xml",
                "https://cats.example.com/articles/behavior-training-aa11bb22.html",
            ]
        );

        let article = &sitemap.urls()[3];
        assert_eq!(article.lastmod, "2026-10-10");
        assert_eq!(article.changefreq, "monthly");
        assert_eq!(article.priority, "0.7");
        assert_eq!(sitemap.urls()[0].lastmod, "2026-10-19");
    }

    #[test]
    fn absolute_urls_are_kept() {
        let mut sitemap = SitemapBuilder::new("https://cats.example.com", "2026-10-19");
        sitemap.add_url("https://elsewhere.example.com/page", None, "weekly", "0.8");
        assert_eq!(sitemap.urls()[0].loc, "https://elsewhere.example.com/page");
    }

    #[test]
    fn renders_urlset() {
        let mut sitemap = SitemapBuilder::new("https://cats.example.com", "2026-10-19");
        sitemap.add_static_pages();
        let xml = sitemap.render().unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\""));
        assert!(xml.contains("<loc>https://cats.example.com/feed.xml</loc>"));
        assert!(xml.contains("<priority>0.5</priority>"));
        assert_eq!(xml.matches("<url>").count(), 3);
    }
}
