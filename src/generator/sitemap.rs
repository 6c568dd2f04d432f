//! `sitemap.xml` listing the routes a build wrote and every published post.

use crate::{config::SiteConfig, metadata::Document};

use super::utils::escape_text;

pub(crate) const SITEMAP_FILE: &str = "sitemap.xml";
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

struct UrlEntry {
    loc: String,
    lastmod: Option<String>,
}

pub(crate) fn render_sitemap(config: &SiteConfig, documents: &[Document]) -> String {
    let routes = config.routes.iter().map(|route| UrlEntry {
        loc: config.page_url(&route.path),
        lastmod: None,
    });
    let posts = documents.iter().map(|doc| UrlEntry {
        loc: config.post_url(&doc.slug),
        lastmod: Some(doc.last_modified().format("%Y-%m-%d").to_string()),
    });

    let mut xml = String::with_capacity(4096);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">\n");

    for entry in routes.chain(posts) {
        xml.push_str("  <url>\n    <loc>");
        xml.push_str(&escape_text(&entry.loc));
        xml.push_str("</loc>\n");
        if let Some(lastmod) = entry.lastmod {
            xml.push_str("    <lastmod>");
            xml.push_str(&lastmod);
            xml.push_str("</lastmod>\n");
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SiteConfig {
        SiteConfig::from_lookup(|key| (key == "SITE_URL").then(|| "https://blog.test".to_string()))
    }

    #[test]
    fn lists_routes_without_posts() {
        let config = config();
        let xml = render_sitemap(&config, &[]);

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#)));
        assert!(xml.contains("<loc>https://blog.test/</loc>"));
        assert!(xml.contains("<loc>https://blog.test/resume</loc>"));
        assert_eq!(xml.matches("<url>").count(), config.routes.len());
        assert!(!xml.contains("<lastmod>"));
    }

    #[test]
    fn posts_carry_last_modified_date() {
        let docs = vec![
            Document::parse("fresh", "---\ntitle: F\ndate: 2024-01-01\nupdated: 2024-05-06\n---\n")
                .unwrap(),
            Document::parse("q&a", "---\ntitle: Q\ndate: 2024-02-03\n---\n").unwrap(),
        ];
        let xml = render_sitemap(&config(), &docs);

        assert!(xml.contains(
            "<loc>https://blog.test/writing/fresh</loc>\n    <lastmod>2024-05-06</lastmod>"
        ));
        assert!(xml.contains("<loc>https://blog.test/writing/q&amp;a</loc>"));
        assert!(xml.contains("<lastmod>2024-02-03</lastmod>"));
    }
}
