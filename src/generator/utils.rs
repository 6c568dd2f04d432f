use std::{
    borrow::Borrow,
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::metadata::Document;

/// Escapes the five XML special characters.
pub(crate) fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Newest first.
pub(crate) fn sort_document<T: Borrow<Document>>(a: &T, b: &T) -> Ordering {
    b.borrow().meta.date.cmp(&a.borrow().meta.date)
}

/// Drops drafts and orders the rest newest first. Ties keep input order.
pub(crate) fn filter_and_sort(documents: Vec<Document>) -> Vec<Document> {
    let mut published: Vec<Document> = documents.into_iter().filter(|d| !d.meta.draft).collect();
    // `sort_by` is stable
    published.sort_by(sort_document);
    published
}

/// Lowercase, dash separated form of `s` for use in URLs.
pub(crate) fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// URL slug of every tag in `tags`. Tags whose slugs clash get a numeric
/// suffix in the order given (`C` -> `c`, `C++` -> `c-1`); tags without any
/// URL-safe character are left out.
pub(crate) fn tag_slugs(tags: &[String]) -> BTreeMap<String, String> {
    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut slugs = BTreeMap::new();
    for tag in tags {
        if slugs.contains_key(tag) {
            continue;
        }
        let base = slugify(tag);
        if base.is_empty() {
            continue;
        }
        let mut slug = base.clone();
        let mut n = 1;
        while used.contains(&slug) {
            slug = format!("{base}-{n}");
            n += 1;
        }
        used.insert(slug.clone());
        slugs.insert(tag.clone(), slug);
    }
    slugs
}

/// Renders Markdown to HTML, giving every heading an `id` derived from its text.
pub(crate) fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let events: Vec<Event> = Parser::new_ext(source, options).collect();
    let events = with_heading_ids(events);

    let mut body_html = String::new();
    html::push_html(&mut body_html, events.into_iter());
    body_html
}

fn with_heading_ids(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    // explicit `{#id}` attributes are taken first
    let mut used: Vec<String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();
    let mut i = 0;
    while i < events.len() {
        if let Event::Start(Tag::Heading { id: None, .. }) = events[i] {
            let mut text = String::new();
            for event in events[i + 1..].iter() {
                match event {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(t) | Event::Code(t) => text.push_str(t),
                    _ => {}
                }
            }

            let base = match slugify(&text) {
                s if s.is_empty() => "section".to_string(),
                s => s,
            };
            let mut id = base.clone();
            let mut n = 1;
            while used.contains(&id) {
                id = format!("{base}-{n}");
                n += 1;
            }
            used.push(id.clone());

            if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
                *slot = Some(CowStr::from(id));
            }
        }
        i += 1;
    }
    events
}
