use html_escape::{encode_double_quoted_attribute, encode_text};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

use crate::markdown;

pub const SITE_NAME: &str = "Cat World";

/// URL slug for an article: category slug plus a short hash of the title
pub fn article_slug(category_slug: &str, title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    let mut hash = String::with_capacity(8);
    for b in digest.iter().take(4) {
        let _ = write!(hash, "{:02x}", b);
    }
    format!("{}-{}", category_slug, hash)
}

/// Everything needed to lay out one article page
#[derive(Debug, Clone)]
pub struct ArticlePage<'a> {
    pub title: &'a str,
    pub category: &'a str,
    pub date: &'a str,
    pub slug: &'a str,
    pub markdown: &'a str,
}

pub struct PageRenderer {
    base_url: String,
}

impl PageRenderer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn article_url(&self, slug: &str) -> String {
        format!("{}/#/stories/{}", self.base_url, slug)
    }

    pub fn render(&self, page: &ArticlePage) -> String {
        let description = markdown::extract_description(page.markdown, 160);
        let read_time = markdown::read_time_minutes(page.markdown);
        let url = self.article_url(page.slug);
        let keyword = page.title.split(':').next().unwrap_or(page.title).trim();

        let title_text = encode_text(page.title);
        let title_attr = encode_double_quoted_attribute(page.title);
        let desc_attr = encode_double_quoted_attribute(&description);
        let category_text = encode_text(page.category);
        let share_url = format!(
            "https://twitter.com/intent/tweet?url={}&text={}",
            urlencoding::encode(&url),
            urlencoding::encode(page.title)
        );

        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str(
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str(&format!("    <title>{} - {}</title>\n", title_text, SITE_NAME));
        html.push_str(&format!(
            "    <meta name=\"description\" content=\"{}\">\n",
            desc_attr
        ));
        html.push_str(&format!(
            "    <meta name=\"keywords\" content=\"cats,cat care,{},{}\">\n",
            encode_double_quoted_attribute(page.category),
            encode_double_quoted_attribute(keyword)
        ));
        html.push_str(&format!(
            "    <meta property=\"og:title\" content=\"{}\">\n",
            title_attr
        ));
        html.push_str(&format!(
            "    <meta property=\"og:description\" content=\"{}\">\n",
            desc_attr
        ));
        html.push_str("    <meta property=\"og:type\" content=\"article\">\n");
        html.push_str(&format!("    <meta property=\"og:url\" content=\"{}\">\n", url));
        html.push_str("    <meta name=\"twitter:card\" content=\"summary_large_image\">\n");
        html.push_str("    <link rel=\"stylesheet\" href=\"../assets/css/style.css\">\n");
        html.push_str(&format!("    <link rel=\"canonical\" href=\"{}\">\n", url));
        html.push_str("</head>\n<body>\n");

        html.push_str("    <header class=\"site-header\">\n");
        html.push_str("        <nav class=\"navbar\">\n");
        html.push_str(&format!(
            "            <div class=\"nav-logo\"><a href=\"/\">🐱 {}</a></div>\n",
            SITE_NAME
        ));
        html.push_str("            <ul class=\"nav-menu\">\n");
        for (href, label) in [
            ("/", "Home"),
            ("/#articles", "Articles"),
            ("/#breeds", "Breeds"),
            ("/#care", "Care"),
            ("/#products", "Products"),
        ] {
            html.push_str(&format!(
                "                <li><a href=\"{}\">{}</a></li>\n",
                href, label
            ));
        }
        html.push_str("            </ul>\n");
        html.push_str("        </nav>\n");
        html.push_str("    </header>\n\n");

        html.push_str("    <main class=\"main-content\">\n");
        html.push_str("        <article class=\"article-page\">\n");
        html.push_str("            <header class=\"article-header\">\n");
        html.push_str("                <div class=\"article-meta-top\">\n");
        html.push_str(&format!(
            "                    <span class=\"article-category\">{}</span>\n",
            category_text
        ));
        html.push_str(&format!(
            "                    <span class=\"article-date\">📅 {}</span>\n",
            encode_text(page.date)
        ));
        html.push_str(&format!(
            "                    <span class=\"read-time\">⏱️ {} min read</span>\n",
            read_time
        ));
        html.push_str("                </div>\n");
        html.push_str(&format!("                <h1>{}</h1>\n", title_text));
        html.push_str("            </header>\n\n");

        html.push_str("            <div class=\"article-body\">\n");
        html.push_str(&markdown::to_html(page.markdown));
        html.push_str("\n            </div>\n\n");

        html.push_str("            <footer class=\"article-footer\">\n");
        html.push_str("                <div class=\"article-tags\">\n");
        html.push_str(&format!(
            "                    <span class=\"tag\">{}</span>\n",
            category_text
        ));
        html.push_str("                    <span class=\"tag\">Cat Knowledge</span>\n");
        html.push_str("                    <span class=\"tag\">Pet Care</span>\n");
        html.push_str("                </div>\n");
        html.push_str("                <div class=\"article-share\">\n");
        html.push_str("                    <h4>Share this article</h4>\n");
        html.push_str("                    <div class=\"share-buttons\">\n");
        html.push_str(
            "                        <button class=\"share-btn\" onclick=\"shareArticle()\">Share</button>\n",
        );
        html.push_str(&format!(
            "                        <a href=\"{}\" target=\"_blank\" class=\"social-share twitter\">Twitter</a>\n",
            encode_double_quoted_attribute(&share_url)
        ));
        html.push_str(
            "                        <a href=\"javascript:void(0)\" onclick=\"copyLink()\" class=\"social-share copy\">Copy link</a>\n",
        );
        html.push_str("                    </div>\n");
        html.push_str("                </div>\n");
        html.push_str("            </footer>\n");
        html.push_str("        </article>\n\n");

        html.push_str("        <section class=\"related-articles\">\n");
        html.push_str("            <h3>Related articles</h3>\n");
        html.push_str("            <div class=\"related-grid\" id=\"related-articles\"></div>\n");
        html.push_str("        </section>\n");
        html.push_str("    </main>\n\n");

        html.push_str("    <footer class=\"site-footer\">\n");
        html.push_str("        <div class=\"footer-content\">\n");
        html.push_str(&format!(
            "            <div class=\"footer-section\"><h4>{}</h4><p>Practical cat care knowledge for every owner.</p></div>\n",
            SITE_NAME
        ));
        html.push_str("            <div class=\"footer-section\">\n");
        html.push_str("                <h4>Quick links</h4>\n");
        html.push_str("                <ul>\n");
        html.push_str("                    <li><a href=\"/\">Home</a></li>\n");
        html.push_str("                    <li><a href=\"/sitemap.xml\">Sitemap</a></li>\n");
        html.push_str("                    <li><a href=\"/feed.xml\">RSS</a></li>\n");
        html.push_str("                </ul>\n");
        html.push_str("            </div>\n");
        html.push_str("        </div>\n");
        html.push_str(&format!(
            "        <div class=\"footer-bottom\"><p>&copy; {}. All rights reserved.</p></div>\n",
            SITE_NAME
        ));
        html.push_str("    </footer>\n\n");

        // Title and description go through JSON so quotes cannot break the script
        html.push_str("    <script>\n");
        html.push_str(&format!(
            "        const ARTICLE = {{ title: {}, text: {} }};\n",
            js_string(page.title),
            js_string(&description)
        ));
        html.push_str("        function shareArticle() {\n");
        html.push_str("            if (navigator.share) {\n");
        html.push_str("                navigator.share({ title: ARTICLE.title, text: ARTICLE.text, url: window.location.href });\n");
        html.push_str("            } else {\n");
        html.push_str("                copyLink();\n");
        html.push_str("            }\n");
        html.push_str("        }\n");
        html.push_str("        function copyLink() {\n");
        html.push_str("            navigator.clipboard.writeText(window.location.href).then(() => alert('Link copied to clipboard'));\n");
        html.push_str("        }\n");
        html.push_str("    </script>\n");
        html.push_str("</body>\n</html>");

        html
    }
}

fn js_string(text: &str) -> String {
    serde_json::to_string(text)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page<'a>(title: &'a str, markdown: &'a str) -> ArticlePage<'a> {
        ArticlePage {
            title,
            category: "Breed Profiles",
            date: "2026-10-19",
            slug: "breed-0a1b2c3d",
            markdown,
        }
    }

    #[test]
    fn slug_is_stable_and_short() {
        let a = article_slug("breed", "Meet the Ragdoll: Breed Traits and Care Tips");
        let b = article_slug("breed", "Meet the Ragdoll: Breed Traits and Care Tips");
        let c = article_slug("breed", "Meet the Persian: Breed Traits and Care Tips");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("breed-"));
        assert_eq!(a.len(), "breed-".len() + 8);
        assert!(a["breed-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn renders_metadata_and_body() {
        let renderer = PageRenderer::new("https://cats.example.com/");
        let html = renderer.render(&page(
            "Meet the Ragdoll: Breed Traits",
            "## Temperament\n\nRagdolls are **calm**.",
        ));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Meet the Ragdoll: Breed Traits - Cat World</title>"));
        assert!(html.contains(
            "<link rel=\"canonical\" href=\"https://cats.example.com/#/stories/breed-0a1b2c3d\">"
        ));
        assert!(html.contains("<h2>Temperament</h2>"));
        assert!(html.contains("<strong>calm</strong>"));
        assert!(html.contains("⏱️ 1 min read"));
        assert!(html.contains("cats,cat care,Breed Profiles,Meet the Ragdoll"));
    }

    #[test]
    fn escapes_title_in_markup_and_script() {
        let renderer = PageRenderer::new("https://cats.example.com");
        let html = renderer.render(&page("Cats & \"Dogs\" </script>", "Body."));

        assert!(html.contains("<h1>Cats &amp; \"Dogs\" &lt;/script&gt;</h1>"));
        assert!(html.contains("content=\"Cats &amp; &quot;Dogs&quot; &lt;/script&gt;\""));
        assert!(html.contains(r#"title: "Cats & \"Dogs\" <\/script>""#));
        assert_eq!(html.matches("</script>").count(), 1);
    }

    #[test]
    fn share_link_keeps_both_query_parameters() {
        let renderer = PageRenderer::new("https://cats.example.com");
        let html = renderer.render(&page("Cats & Dogs: Living Together", "Body."));

        let line = html
            .lines()
            .find(|line| line.contains("social-share twitter"))
            .unwrap();
        let start = line.find("href=\"").unwrap() + "href=\"".len();
        let end = start + line[start..].find('"').unwrap();
        let href = line[start..end].replace("&amp;", "&");

        let parsed = url::Url::parse(&href).unwrap();
        assert_eq!(parsed.fragment(), None);
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                (
                    "url".to_string(),
                    "https://cats.example.com/#/stories/breed-0a1b2c3d".to_string()
                ),
                ("text".to_string(), "Cats & Dogs: Living Together".to_string()),
            ]
        );
    }
}
