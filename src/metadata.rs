use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::{bail, Context};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use log::debug;
use regex::{Regex, RegexBuilder};
use serde::{de, Deserialize, Deserializer, Serialize};

pub(crate) type Timestamp = DateTime<FixedOffset>;

const WORDS_PER_MINUTE: usize = 200;

// `---` block at the very start of the file, then the body.
static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)(.*)\z")
        .dot_matches_new_line(true)
        .build()
        .expect("front matter pattern")
});

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct FrontMatter {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub date: Timestamp,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub updated: Option<Timestamp>,
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub draft: bool,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default, rename(deserialize = "readingTime"), alias = "reading_time")]
    pub reading_time: Option<u32>,
}

/// Front matter of a standalone page such as `/about`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct PageMatter {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub(crate) struct Page {
    pub slug: String,
    pub meta: PageMatter,
    #[serde(skip_serializing)]
    pub body: String,
}

#[derive(Serialize, Debug, Clone)]
pub(crate) struct Document {
    pub slug: String,
    pub meta: FrontMatter,
    #[serde(skip_serializing)]
    pub body: String,
}

/// Splits `content` into its front matter block and body.
fn split_front_matter(content: &str) -> anyhow::Result<(&str, &str)> {
    let Some(caps) = FRONT_MATTER.captures(content) else {
        bail!("missing front matter block");
    };
    match (caps.get(1), caps.get(2)) {
        (Some(header), Some(body)) => Ok((header.as_str(), body.as_str())),
        _ => bail!("missing front matter block"),
    }
}

impl Page {
    pub fn parse(slug: impl Into<String>, content: &str) -> anyhow::Result<Self> {
        let (header, body) = split_front_matter(content)?;
        let meta: PageMatter = serde_yaml_ng::from_str(header).context("invalid front matter")?;

        Ok(Self {
            slug: slug.into(),
            meta,
            body: body.to_string(),
        })
    }

    /// Site path of the page: `/<slug>`.
    pub fn path(&self) -> String {
        format!("/{}", self.slug)
    }
}

impl Document {
    pub fn parse(slug: impl Into<String>, content: &str) -> anyhow::Result<Self> {
        let (header, body) = split_front_matter(content)?;
        let meta: FrontMatter = serde_yaml_ng::from_str(header).context("invalid front matter")?;

        Ok(Self {
            slug: slug.into(),
            meta,
            body: body.to_string(),
        })
    }

    /// Last modification time: `updated` when present, else the publication date.
    pub fn last_modified(&self) -> Timestamp {
        self.meta.updated.unwrap_or(self.meta.date)
    }

    pub fn description(&self) -> &str {
        self.meta.description.as_deref().unwrap_or_default()
    }

    /// Minutes to read: the front matter value, or estimated from the word count.
    pub fn reading_time(&self) -> u32 {
        self.meta.reading_time.unwrap_or_else(|| {
            let words = self.body.split_whitespace().count();
            words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
        })
    }
}

fn is_content_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md" | "mdx" | "markdown")
    )
}

/// Markdown files directly under `dir`, in file name order.
fn content_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = vec![];
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("while reading {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && is_content_file(&path) {
            paths.push(path);
        } else {
            debug!("Skipping {path:?}");
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_each<T>(
    dir: &Path,
    parse: impl Fn(String, &str) -> anyhow::Result<T>,
) -> anyhow::Result<Vec<T>> {
    let mut loaded = vec![];
    for path in content_files(dir)? {
        let slug = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("while reading {}", path.display()))?;
        let item = parse(slug, &content)
            .with_context(|| format!("while parsing {}", path.display()))?;
        loaded.push(item);
    }
    Ok(loaded)
}

/// Reads every Markdown file directly under `dir`, in file name order.
pub(crate) fn load_documents(dir: &Path) -> anyhow::Result<Vec<Document>> {
    load_each(dir, |slug, content| Document::parse(slug, content))
}

/// Reads the standalone pages under `dir`. A missing directory means no pages.
pub(crate) fn load_pages(dir: &Path) -> anyhow::Result<Vec<Page>> {
    if !dir.exists() {
        debug!("Pages directory {} does not exist", dir.display());
        return Ok(vec![]);
    }
    load_each(dir, |slug, content| Page::parse(slug, content))
}

pub(crate) fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().fixed_offset())
}

/// A key present with no value (`draft:`) counts as missing.
fn deserialize_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        de::Error::custom(format!(
            "invalid date `{raw}`: expected YYYY-MM-DD or RFC 3339"
        ))
    })
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw).map(Some).ok_or_else(|| {
            de::Error::custom(format!(
                "invalid date `{raw}`: expected YYYY-MM-DD or RFC 3339"
            ))
        }),
        None => Ok(None),
    }
}
