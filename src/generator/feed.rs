//! RSS 2.0 and Atom 1.0 feeds of published posts.
//!
//! Both renderers take the build date as a parameter; with the same documents
//! and build date the output is byte-identical.

use std::{collections::BTreeMap, path::Path};

use anyhow::{anyhow, Context};
use atom_syndication::{
    CategoryBuilder as AtomCategoryBuilder, EntryBuilder, Feed, FeedBuilder, GeneratorBuilder,
    LinkBuilder, Person, PersonBuilder, Text, WriteConfig,
};
use chrono::{DateTime, Utc};
use log::info;
use rss::{
    extension::atom::{AtomExtensionBuilder, Link as AtomLink, NAMESPACE as ATOM_NS},
    validation::Validate,
    CategoryBuilder, ChannelBuilder, GuidBuilder, Item, ItemBuilder,
};

use crate::{config::SiteConfig, metadata::Document};

pub(crate) const RSS_FILE: &str = "rss.xml";
pub(crate) const ATOM_FILE: &str = "atom.xml";

pub(crate) fn render_rss(
    config: &SiteConfig,
    documents: &[Document],
    build_date: DateTime<Utc>,
) -> anyhow::Result<String> {
    let mailbox = config.author.mailbox();

    let items: Vec<Item> = documents
        .iter()
        .map(|doc| {
            let url = config.post_url(&doc.slug);
            ItemBuilder::default()
                .title(Some(doc.meta.title.clone()))
                .description(Some(doc.description().to_string()))
                .link(Some(url.clone()))
                .guid(Some(GuidBuilder::default().value(url).permalink(true).build()))
                .pub_date(Some(doc.meta.date.with_timezone(&Utc).to_rfc2822()))
                .author(Some(mailbox.clone()))
                .categories(
                    doc.meta
                        .tags
                        .iter()
                        .map(|tag| CategoryBuilder::default().name(tag.as_str()).build())
                        .collect::<Vec<_>>(),
                )
                .build()
        })
        .collect();

    let self_link = AtomLink {
        href: config.page_url(&format!("/{RSS_FILE}")),
        rel: "self".to_string(),
        mime_type: Some("application/rss+xml".to_string()),
        ..Default::default()
    };

    let channel = ChannelBuilder::default()
        .title(config.title.as_str())
        .description(config.description.as_str())
        .link(config.url.as_str())
        .language(Some(config.language.to_string()))
        .last_build_date(Some(build_date.to_rfc2822()))
        .managing_editor(Some(mailbox.clone()))
        .webmaster(Some(mailbox))
        .namespaces(BTreeMap::from([("atom".to_string(), ATOM_NS.to_string())]))
        .atom_ext(Some(AtomExtensionBuilder::default().links(vec![self_link]).build()))
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("invalid RSS channel: {e}"))?;

    let buf = channel
        .pretty_write_to(Vec::new(), b' ', 2)
        .context("while writing RSS")?;
    Ok(String::from_utf8(buf)?)
}

pub(crate) fn render_atom(
    config: &SiteConfig,
    documents: &[Document],
    build_date: DateTime<Utc>,
) -> anyhow::Result<String> {
    let author: Person = PersonBuilder::default()
        .name(config.author.name.as_str())
        .email(Some(config.author.email.clone()))
        .build();

    let entries = documents
        .iter()
        .map(|doc| {
            let url = config.post_url(&doc.slug);
            EntryBuilder::default()
                .title(Text::plain(doc.meta.title.clone()))
                .links(vec![LinkBuilder::default().href(url.as_str()).build()])
                .id(url)
                .updated(doc.last_modified())
                .published(Some(doc.meta.date))
                .summary(Some(Text::plain(doc.description())))
                .authors(vec![author.clone()])
                .categories(
                    doc.meta
                        .tags
                        .iter()
                        .map(|tag| AtomCategoryBuilder::default().term(tag.as_str()).build())
                        .collect::<Vec<_>>(),
                )
                .build()
        })
        .collect::<Vec<_>>();

    let feed: Feed = FeedBuilder::default()
        .title(Text::plain(config.title.clone()))
        .subtitle(Some(Text::plain(config.description.clone())))
        .links(vec![
            LinkBuilder::default()
                .href(config.page_url(&format!("/{ATOM_FILE}")))
                .rel("self")
                .mime_type(Some("application/atom+xml".to_string()))
                .build(),
            LinkBuilder::default()
                .href(config.url.as_str())
                .rel("alternate")
                .build(),
        ])
        .id(config.page_url("/"))
        .updated(build_date.fixed_offset())
        .authors(vec![author])
        .generator(Some(
            GeneratorBuilder::default()
                .value(env!("CARGO_PKG_NAME"))
                .version(Some(env!("CARGO_PKG_VERSION").to_string()))
                .build(),
        ))
        .entries(entries)
        .build();

    let buf = feed
        .write_with_config(
            Vec::new(),
            WriteConfig {
                write_document_declaration: true,
                indent_size: Some(2),
            },
        )
        .context("while writing Atom")?;
    Ok(String::from_utf8(buf)?)
}

/// Writes `rss.xml` and `atom.xml` into `out_dir`.
pub(crate) fn write_feeds(
    out_dir: &Path,
    config: &SiteConfig,
    documents: &[Document],
    build_date: DateTime<Utc>,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("while creating {}", out_dir.display()))?;

    for (file, xml) in [
        (RSS_FILE, render_rss(config, documents, build_date)?),
        (ATOM_FILE, render_atom(config, documents, build_date)?),
    ] {
        let path = out_dir.join(file);
        std::fs::write(&path, xml).with_context(|| format!("while writing {}", path.display()))?;
        info!("Wrote {} ({} entries)", path.display(), documents.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::utils::filter_and_sort;
    use chrono::TimeZone;

    fn config() -> SiteConfig {
        SiteConfig::from_lookup(|key| match key {
            "SITE_URL" => Some("https://blog.test".to_string()),
            "SITE_TITLE" => Some("Test & Co".to_string()),
            "SITE_AUTHOR_NAME" => Some("Jane Doe".to_string()),
            "SITE_AUTHOR_EMAIL" => Some("jane@blog.test".to_string()),
            _ => None,
        })
    }

    fn build_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn doc(slug: &str, front_matter: &str) -> Document {
        Document::parse(slug, &format!("---\n{front_matter}\n---\nBody")).unwrap()
    }

    fn sample() -> Vec<Document> {
        filter_and_sort(vec![
            doc("a", "title: A\ndate: 2024-01-01\ndraft: false"),
            doc("b", "title: B\ndate: 2024-02-01\ndraft: true"),
            doc(
                "c",
                "title: \"C <&> 'quoted'\"\ndescription: Tips & \"tricks\"\ndate: 2024-01-15\nupdated: 2024-02-20\ntags: [Rust, I/O <fast>]",
            ),
        ])
    }

    #[test]
    fn rss_lists_published_posts_newest_first() {
        let xml = render_rss(&config(), &sample(), build_date()).unwrap();
        let channel = rss::Channel::read_from(xml.as_bytes()).unwrap();

        assert_eq!(channel.title(), "Test & Co");
        assert_eq!(channel.link(), "https://blog.test");
        assert_eq!(channel.language(), Some("en-us"));
        assert_eq!(channel.managing_editor(), Some("jane@blog.test (Jane Doe)"));
        let last_build = channel.last_build_date().expect("lastBuildDate");
        assert_eq!(DateTime::parse_from_rfc2822(last_build).unwrap(), build_date());

        let titles: Vec<_> = channel.items().iter().filter_map(|i| i.title()).collect();
        assert_eq!(titles, vec!["C <&> 'quoted'", "A"]);

        let first = &channel.items()[0];
        assert_eq!(first.link(), Some("https://blog.test/writing/c"));
        assert_eq!(first.description(), Some("Tips & \"tricks\""));
        assert_eq!(first.guid().map(|g| g.is_permalink()), Some(true));
        assert_eq!(first.guid().map(|g| g.value()), Some("https://blog.test/writing/c"));
        assert_eq!(first.author(), Some("jane@blog.test (Jane Doe)"));
        let categories: Vec<_> = first.categories().iter().map(|c| c.name()).collect();
        assert_eq!(categories, vec!["Rust", "I/O <fast>"]);
    }

    #[test]
    fn rss_escapes_user_text() {
        let xml = render_rss(&config(), &sample(), build_date()).unwrap();
        assert!(!xml.contains("C <&>"));
        assert!(xml.contains("&amp;"));
        assert!(xml.contains("&lt;"));
    }

    #[test]
    fn rss_self_link() {
        let xml = render_rss(&config(), &[], build_date()).unwrap();
        let channel = rss::Channel::read_from(xml.as_bytes()).unwrap();
        let ext = channel.atom_ext().expect("atom extension");
        assert_eq!(ext.links()[0].href(), "https://blog.test/rss.xml");
        assert_eq!(ext.links()[0].rel(), "self");
    }

    #[test]
    fn empty_feeds_are_well_formed() {
        let rss_xml = render_rss(&config(), &[], build_date()).unwrap();
        let channel = rss::Channel::read_from(rss_xml.as_bytes()).unwrap();
        assert!(channel.items().is_empty());

        let atom_xml = render_atom(&config(), &[], build_date()).unwrap();
        let feed = Feed::read_from(atom_xml.as_bytes()).unwrap();
        assert!(feed.entries().is_empty());
        assert_eq!(feed.id(), "https://blog.test/");
    }

    #[test]
    fn atom_entries_and_updated_fallback() {
        let xml = render_atom(&config(), &sample(), build_date()).unwrap();
        let feed = Feed::read_from(xml.as_bytes()).unwrap();

        assert_eq!(feed.title().as_str(), "Test & Co");
        assert_eq!(feed.updated().to_rfc3339(), "2024-03-01T12:00:00+00:00");
        assert_eq!(feed.entries().len(), 2);

        let c = &feed.entries()[0];
        assert_eq!(c.title().as_str(), "C <&> 'quoted'");
        assert_eq!(c.id(), "https://blog.test/writing/c");
        assert_eq!(c.links()[0].href(), "https://blog.test/writing/c");
        assert_eq!(c.updated().to_rfc3339(), "2024-02-20T00:00:00+00:00");
        assert_eq!(
            c.published().map(|p| p.to_rfc3339()).as_deref(),
            Some("2024-01-15T00:00:00+00:00")
        );
        let terms: Vec<_> = c.categories().iter().map(|t| t.term()).collect();
        assert_eq!(terms, vec!["Rust", "I/O <fast>"]);

        // no `updated` in front matter: falls back to the publication date
        let a = &feed.entries()[1];
        assert_eq!(Some(a.updated()), a.published());
    }

    #[test]
    fn rendering_is_deterministic() {
        let docs = sample();
        assert_eq!(
            render_rss(&config(), &docs, build_date()).unwrap(),
            render_rss(&config(), &docs, build_date()).unwrap()
        );
        assert_eq!(
            render_atom(&config(), &docs, build_date()).unwrap(),
            render_atom(&config(), &docs, build_date()).unwrap()
        );
    }

    #[test]
    fn writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("public");
        write_feeds(&out, &config(), &sample(), build_date()).unwrap();

        let rss_xml = std::fs::read_to_string(out.join(RSS_FILE)).unwrap();
        let atom_xml = std::fs::read_to_string(out.join(ATOM_FILE)).unwrap();
        assert_eq!(rss_xml.matches("<item>").count(), 2);
        assert_eq!(atom_xml.matches("<entry>").count(), 2);
    }
}
