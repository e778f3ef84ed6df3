use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use html_escape::encode_text;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::models::ArticleEntry;
use crate::page::SITE_NAME;

/// Articles are stamped at 10:00 in the site's home timezone (UTC+8)
const SITE_UTC_OFFSET_SECS: i32 = 8 * 3600;
const PUBLISH_HOUR: u32 = 10;

pub const SITE_DESCRIPTION: &str =
    "Practical cat care knowledge, updated daily: breed profiles, kitten care, product reviews and more";

/// Current time in the site's home timezone
pub fn site_now() -> DateTime<FixedOffset> {
    match FixedOffset::east_opt(SITE_UTC_OFFSET_SECS) {
        Some(offset) => Utc::now().with_timezone(&offset),
        None => Utc::now().into(),
    }
}

/// RFC 2822 publication date for an index date (`YYYY-MM-DD`), or the fallback if unparseable
pub fn pub_date(date: &str, fallback: DateTime<FixedOffset>) -> String {
    let Some(offset) = FixedOffset::east_opt(SITE_UTC_OFFSET_SECS) else {
        return fallback.to_rfc2822();
    };

    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(PUBLISH_HOUR, 0, 0))
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|dt| dt.to_rfc2822())
        .unwrap_or_else(|| fallback.to_rfc2822())
}

/// Newest `limit` entries by date. Entries sharing a date keep their index order.
pub fn latest_entries(entries: &[ArticleEntry], limit: usize) -> Vec<&ArticleEntry> {
    let mut sorted: Vec<&ArticleEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(limit);
    sorted
}

fn write_text_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// RSS 2.0 feed over the article index
pub struct FeedBuilder {
    base_url: String,
    author: String,
    max_items: usize,
}

impl FeedBuilder {
    pub const DEFAULT_MAX_ITEMS: usize = 20;

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            author: format!("noreply@example.com ({} Editorial Team)", SITE_NAME),
            max_items: Self::DEFAULT_MAX_ITEMS,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn render(&self, entries: &[ArticleEntry], built_at: DateTime<FixedOffset>) -> Result<String> {
        let build_date = built_at.to_rfc2822();
        let home = format!("{}/", self.base_url);

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        rss.push_attribute(("xmlns:atom", "http://www.w3.org/2005/Atom"));
        writer.write_event(Event::Start(rss))?;
        writer.write_event(Event::Start(BytesStart::new("channel")))?;

        write_text_element(&mut writer, "title", SITE_NAME)?;
        write_text_element(&mut writer, "link", &home)?;
        write_text_element(&mut writer, "description", SITE_DESCRIPTION)?;
        write_text_element(&mut writer, "language", "en")?;
        write_text_element(&mut writer, "managingEditor", &self.author)?;
        write_text_element(&mut writer, "webMaster", &self.author)?;
        write_text_element(&mut writer, "lastBuildDate", &build_date)?;
        write_text_element(&mut writer, "pubDate", &build_date)?;
        write_text_element(&mut writer, "ttl", "1440")?;

        let self_link = format!("{}/feed.xml", self.base_url);
        let mut atom = BytesStart::new("atom:link");
        atom.push_attribute(("href", self_link.as_str()));
        atom.push_attribute(("rel", "self"));
        atom.push_attribute(("type", "application/rss+xml"));
        writer.write_event(Event::Empty(atom))?;

        writer.write_event(Event::Start(BytesStart::new("image")))?;
        write_text_element(&mut writer, "title", SITE_NAME)?;
        write_text_element(&mut writer, "url", &format!("{}/assets/images/logo.png", self.base_url))?;
        write_text_element(&mut writer, "link", &home)?;
        write_text_element(&mut writer, "width", "144")?;
        write_text_element(&mut writer, "height", "144")?;
        write_text_element(&mut writer, "description", SITE_DESCRIPTION)?;
        writer.write_event(Event::End(BytesEnd::new("image")))?;

        for entry in latest_entries(entries, self.max_items) {
            let link = format!("{}/#/stories/{}", self.base_url, entry.slug);
            let summary = format!(
                "<p><strong>Category:</strong> {}</p>\n<p><strong>Reading time:</strong> {}</p>\n<p>{}</p>\n<p><a href=\"{}\">Read more →</a></p>",
                encode_text(&entry.category),
                encode_text(&entry.read_time),
                encode_text(&entry.excerpt),
                link
            );

            writer.write_event(Event::Start(BytesStart::new("item")))?;
            write_text_element(&mut writer, "title", &entry.title)?;
            write_text_element(&mut writer, "link", &link)?;
            writer.write_event(Event::Start(BytesStart::new("description")))?;
            writer.write_event(Event::CData(BytesCData::new(summary.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("description")))?;
            write_text_element(&mut writer, "pubDate", &pub_date(&entry.date, built_at))?;
            write_text_element(&mut writer, "guid", &link)?;
            write_text_element(&mut writer, "category", &entry.category)?;
            write_text_element(&mut writer, "author", &self.author)?;
            writer.write_event(Event::End(BytesEnd::new("item")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        String::from_utf8(writer.into_inner()).context("Feed XML is not valid UTF-8")
    }

    /// Render and save the feed, returning how many items it holds
    pub fn write(
        &self,
        path: &Path,
        entries: &[ArticleEntry],
        built_at: DateTime<FixedOffset>,
    ) -> Result<usize> {
        let xml = self.render(entries, built_at)?;
        fs::write(path, xml).with_context(|| format!("Failed to write feed: {}", path.display()))?;
        Ok(entries.len().min(self.max_items))
    }
}
