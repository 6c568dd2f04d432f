use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    path::Path,
};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use fs_extra::dir::CopyOptions;
use log::{info, warn};

use crate::{
    config::{Route, SiteConfig},
    context::Context,
    metadata::{load_documents, load_pages, Document, Page},
    query::{all_tags, tag_index},
    resume::{load_resume, render_resume, Resume},
};

use data::{ArticlePageData, ListPageData, PageData, PostSummary, TagLink};
use utils::{filter_and_sort, render_markdown, tag_slugs};

mod data;
pub(crate) mod feed;
pub(crate) mod sitemap;
pub(crate) mod utils;

/// Top-level paths the generator writes itself.
const RESERVED_PAGES: &[&str] = &["writing", "resume"];

fn create_page(out_dir: &Path, relative: &Path) -> anyhow::Result<File> {
    let path = out_dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .with_context(|| format!("while creating {}", path.display()))
}

/// Links for `tags`; tags without a page are left out.
fn tag_links(tags: &[String], slugs: &BTreeMap<String, String>) -> Vec<TagLink> {
    tags.iter()
        .filter_map(|tag| {
            slugs.get(tag).map(|slug| TagLink {
                name: tag.clone(),
                url: format!("/writing/tags/{slug}/"),
            })
        })
        .collect()
}

/// `documents` is newest first; `index` selects the post to render.
fn generate_article(
    ctx: &Context,
    site: &SiteConfig,
    documents: &[Document],
    slugs: &BTreeMap<String, String>,
    index: usize,
) -> anyhow::Result<()> {
    let doc = &documents[index];

    let data = ArticlePageData {
        site,
        body: render_markdown(&doc.body),
        post: PostSummary::new(doc),
        tags: tag_links(&doc.meta.tags, slugs),
        prev: documents.get(index + 1).map(PostSummary::new),
        next: index
            .checked_sub(1)
            .and_then(|i| documents.get(i))
            .map(PostSummary::new),
    };

    let relative = Path::new("writing").join(&doc.slug).join("index.html");
    let fd = create_page(&ctx.out_dir, &relative)?;
    ctx.handlebars
        .render_to_write("post", &data, fd)
        .with_context(|| format!("while generating {:?}", relative))?;
    Ok(())
}

fn generate_home(ctx: &Context, site: &SiteConfig, documents: &[Document]) -> anyhow::Result<()> {
    let data = ListPageData {
        site,
        title: "Home".to_string(),
        path: "/".to_string(),
        posts: documents.iter().map(PostSummary::new).collect(),
        tags: vec![],
    };

    let fd = create_page(&ctx.out_dir, Path::new("index.html"))?;
    ctx.handlebars
        .render_to_write("index", &data, fd)
        .context("while generating index.html")?;
    Ok(())
}

fn generate_writing_index(
    ctx: &Context,
    site: &SiteConfig,
    documents: &[Document],
    slugs: &BTreeMap<String, String>,
) -> anyhow::Result<()> {
    let data = ListPageData {
        site,
        title: "Writing".to_string(),
        path: "/writing/".to_string(),
        posts: documents.iter().map(PostSummary::new).collect(),
        tags: tag_links(&all_tags(documents), slugs),
    };

    let fd = create_page(&ctx.out_dir, Path::new("writing/index.html"))?;
    ctx.handlebars
        .render_to_write("list", &data, fd)
        .context("while generating writing/index.html")?;
    Ok(())
}

fn generate_tag_pages(
    ctx: &Context,
    site: &SiteConfig,
    documents: &[Document],
    slugs: &BTreeMap<String, String>,
) -> anyhow::Result<()> {
    let mut count = 0;
    for (tag, posts) in tag_index(documents) {
        let Some(slug) = slugs.get(tag) else {
            warn!("Tag {tag:?} has no URL-safe characters; skipping its page.");
            continue;
        };

        let data = ListPageData {
            site,
            title: format!("Tag: {tag}"),
            path: format!("/writing/tags/{slug}/"),
            posts: posts.into_iter().map(PostSummary::new).collect(),
            tags: vec![],
        };

        let relative = Path::new("writing/tags").join(slug).join("index.html");
        let fd = create_page(&ctx.out_dir, &relative)?;
        ctx.handlebars
            .render_to_write("list", &data, fd)
            .with_context(|| format!("while generating for {:?}", tag))?;
        count += 1;
    }
    info!("Generated {count} tag pages");

    Ok(())
}

fn generate_page(ctx: &Context, site: &SiteConfig, page: &Page) -> anyhow::Result<()> {
    let data = PageData {
        site,
        title: page.meta.title.clone(),
        description: page.meta.description.as_deref(),
        body: render_markdown(&page.body),
    };

    let relative = Path::new(&page.slug).join("index.html");
    let fd = create_page(&ctx.out_dir, &relative)?;
    ctx.handlebars
        .render_to_write("page", &data, fd)
        .with_context(|| format!("while generating {:?}", relative))?;
    Ok(())
}

fn generate_resume(ctx: &Context, site: &SiteConfig, resume: &Resume) -> anyhow::Result<()> {
    let data = PageData {
        site,
        title: format!("Resume: {}", resume.basics.name),
        description: None,
        body: render_resume(resume).into_string(),
    };

    let fd = create_page(&ctx.out_dir, Path::new("resume/index.html"))?;
    ctx.handlebars
        .render_to_write("page", &data, fd)
        .context("while generating resume/index.html")?;
    Ok(())
}

fn write_sitemap(ctx: &Context, site: &SiteConfig, documents: &[Document]) -> anyhow::Result<()> {
    let path = ctx.out_dir.join(sitemap::SITEMAP_FILE);
    std::fs::write(&path, sitemap::render_sitemap(site, documents))
        .with_context(|| format!("while writing {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Markdown pages under `pages_dir`, minus the ones clashing with generated routes.
fn load_site_pages(pages_dir: &Path) -> anyhow::Result<Vec<Page>> {
    let mut pages = load_pages(pages_dir)?;
    pages.retain(|page| {
        let reserved = RESERVED_PAGES.contains(&page.slug.as_str());
        if reserved {
            warn!("Page {:?} clashes with a generated route; skipping.", page.slug);
        }
        !reserved
    });
    Ok(pages)
}

/// Loads the posts under `content_dir` and writes only the feeds into `out_dir`.
pub(crate) fn generate_feeds(
    content_dir: &Path,
    out_dir: &Path,
    site: &SiteConfig,
) -> anyhow::Result<()> {
    let documents = filter_and_sort(load_documents(content_dir)?);
    info!("Found {} published posts", documents.len());
    feed::write_feeds(out_dir, site, &documents, Utc::now())
}

pub(crate) fn generate() -> anyhow::Result<()> {
    generate_site(Context::instance()?, Utc::now())
}

pub(crate) fn generate_site(ctx: &Context, build_date: DateTime<Utc>) -> anyhow::Result<()> {
    // read every input before touching `out_dir`
    let documents = filter_and_sort(load_documents(&ctx.content_dir)?);
    info!("Found {} published posts", documents.len());
    let pages = load_site_pages(&ctx.pages_dir)?;
    let resume = if ctx.resume_path.exists() {
        Some(load_resume(&ctx.resume_path)?)
    } else {
        info!(
            "Resume ({}) does not exist. skipping...",
            ctx.resume_path.display()
        );
        None
    };

    // navigation and sitemap only name what this build writes
    let mut built = vec![Route::new("Home", "/"), Route::new("Writing", "/writing")];
    if resume.is_some() {
        built.push(Route::new("Resume", "/resume"));
    }
    built.extend(
        pages
            .iter()
            .map(|page| Route::new(page.meta.title.as_str(), page.path())),
    );
    let site = ctx.site.with_built_routes(&built);
    let slugs = tag_slugs(&all_tags(&documents));

    if ctx.out_dir.exists() {
        fs_extra::dir::remove(&ctx.out_dir)?;
    }
    std::fs::create_dir_all(&ctx.out_dir)?;

    // copy `public_dir`
    if ctx.public_dir.is_dir() {
        let mut cp_opts = CopyOptions::new();
        cp_opts.content_only = true;
        cp_opts.overwrite = true;
        fs_extra::dir::copy(&ctx.public_dir, &ctx.out_dir, &cp_opts)
            .with_context(|| format!("while copying {}", ctx.public_dir.display()))?;
    } else {
        warn!("{} is not a directory; nothing copied.", ctx.public_dir.display());
    }

    for index in 0..documents.len() {
        generate_article(ctx, &site, &documents, &slugs, index)?;
    }
    generate_home(ctx, &site, &documents)?;
    generate_writing_index(ctx, &site, &documents, &slugs)?;
    generate_tag_pages(ctx, &site, &documents, &slugs)?;
    for page in pages.iter() {
        generate_page(ctx, &site, page)?;
    }
    info!("Generated {} pages", pages.len());
    if let Some(resume) = &resume {
        generate_resume(ctx, &site, resume)?;
    }

    feed::write_feeds(&ctx.out_dir, &site, &documents, build_date)?;
    write_sitemap(ctx, &site, &documents)?;

    Ok(())
}
