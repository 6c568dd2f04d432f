use std::collections::{BTreeMap, BTreeSet};

use crate::metadata::Document;

/// Filters a post listing by free-text search and tag.
#[derive(Debug, Default, Clone)]
pub(crate) struct PostQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl PostQuery {
    pub fn matches(&self, doc: &Document) -> bool {
        // only the empty string disables search; whitespace is matched as typed
        let matches_search = match self.search.as_deref() {
            None | Some("") => true,
            Some(search) => {
                let needle = search.to_lowercase();
                doc.meta.title.to_lowercase().contains(&needle)
                    || doc.description().to_lowercase().contains(&needle)
            }
        };
        let matches_tag = match &self.tag {
            None => true,
            Some(tag) => doc.meta.tags.iter().any(|t| t == tag),
        };

        matches_search && matches_tag
    }

    pub fn apply<'a>(&self, docs: &'a [Document]) -> Vec<&'a Document> {
        docs.iter().filter(|d| self.matches(d)).collect()
    }
}

/// Distinct tags across `docs`, sorted.
pub(crate) fn all_tags(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .flat_map(|d| d.meta.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Posts grouped by tag, each group in the order of `docs`.
pub(crate) fn tag_index(docs: &[Document]) -> BTreeMap<&str, Vec<&Document>> {
    let mut index: BTreeMap<&str, Vec<&Document>> = BTreeMap::new();
    for doc in docs {
        for tag in doc.meta.tags.iter() {
            let entries = index.entry(tag.as_str()).or_default();
            // a tag repeated in one post lists it once
            if !entries.iter().any(|d| d.slug == doc.slug) {
                entries.push(doc);
            }
        }
    }
    index
}
