use serde::Serialize;

use crate::{config::SiteConfig, metadata::Document};

/// Listing entry with the fields templates need besides the front matter.
#[derive(Serialize, Debug)]
pub(super) struct PostSummary<'a> {
    #[serde(flatten)]
    pub doc: &'a Document,
    pub url: String,
    pub reading_time: u32,
}

impl<'a> PostSummary<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            url: format!("/writing/{}/", doc.slug),
            reading_time: doc.reading_time(),
        }
    }
}

#[derive(Serialize, Debug)]
pub(super) struct TagLink {
    pub name: String,
    pub url: String,
}

#[derive(Serialize, Debug)]
pub(super) struct ArticlePageData<'a> {
    pub site: &'a SiteConfig,
    pub body: String,
    pub post: PostSummary<'a>,
    pub tags: Vec<TagLink>,
    /// Older neighbour.
    pub prev: Option<PostSummary<'a>>,
    /// Newer neighbour.
    pub next: Option<PostSummary<'a>>,
}

#[derive(Serialize, Debug)]
pub(super) struct ListPageData<'a> {
    pub site: &'a SiteConfig,
    pub title: String,
    pub path: String,
    pub posts: Vec<PostSummary<'a>>,
    pub tags: Vec<TagLink>,
}

/// Standalone page: the résumé or a Markdown page such as `/about`.
#[derive(Serialize, Debug)]
pub(super) struct PageData<'a> {
    pub site: &'a SiteConfig,
    pub title: String,
    pub description: Option<&'a str>,
    pub body: String,
}
