use std::path::PathBuf;

use anyhow::{bail, Context as _};
use clap::{command, Arg, ArgAction, ArgMatches, Command};
use config::SiteConfig;
use context::Context;
use log::info;
use metadata::load_documents;
use query::PostQuery;

mod config;
mod context;
mod generator;
mod metadata;
mod query;
mod renderer;
mod resume;

fn content_dir_arg() -> Arg {
    Arg::new("content_dir")
        .help("Directory of Markdown posts")
        .value_parser(clap::value_parser!(PathBuf))
        .default_value("content/posts")
}

fn build_command() -> Command {
    Command::new("build")
        .about("Build the whole site: home, posts, listings, pages, resume, feeds and sitemap")
        .args([
            content_dir_arg(),
            Arg::new("out_dir")
                .help("Directory path of output. Existing contents will be removed.")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("out"),
            Arg::new("public_dir")
                .help("Directory path of public. Contents will be copied as it is.")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("public"),
            Arg::new("template_dir")
                .help("Directory of template")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("template"),
            Arg::new("pages")
                .long("pages")
                .help("Directory of Markdown pages, each rendered to /<file stem>")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("content/pages"),
            Arg::new("resume")
                .long("resume")
                .help("Resume JSON rendered to /resume when present")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("data/resume.json"),
        ])
}

fn cli() -> Command {
    command!()
        .subcommand(build_command())
        .subcommand(
            Command::new("feeds")
                .about("Write rss.xml and atom.xml only")
                .args([
                    content_dir_arg(),
                    Arg::new("out_dir")
                        .help("Directory the feeds are written to")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value("public"),
                ]),
        )
        .subcommand(
            Command::new("list")
                .about("List posts, optionally filtered by tag and search text")
                .args([
                    content_dir_arg(),
                    Arg::new("tag").long("tag").help("Only posts with this exact tag"),
                    Arg::new("search")
                        .long("search")
                        .help("Case-insensitive match on title or description"),
                    Arg::new("drafts")
                        .long("drafts")
                        .help("Include drafts")
                        .action(ArgAction::SetTrue),
                ]),
        )
        .subcommand(
            Command::new("sync-resume")
                .about("Fetch the resume JSON from a remote URL")
                .args([
                    Arg::new("dest")
                        .help("Where the resume is stored")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value("data/resume.json"),
                    Arg::new("url")
                        .long("url")
                        .env("RESUME_URL")
                        .help("Location of the resume document"),
                ]),
        )
}

fn path_arg<'a>(matches: &'a ArgMatches, name: &str) -> anyhow::Result<&'a PathBuf> {
    matches
        .get_one::<PathBuf>(name)
        .with_context(|| format!("{name} is required"))
}

fn build(matches: &ArgMatches) -> anyhow::Result<()> {
    let content_dir = path_arg(matches, "content_dir")?;
    if !content_dir.is_dir() {
        bail!("content_dir must be a directory.");
    }
    let out_dir = path_arg(matches, "out_dir")?;
    if out_dir.exists() && !out_dir.is_dir() {
        bail!("if out_dir exists, it must be directory.");
    }
    let public_dir = path_arg(matches, "public_dir")?;
    if !public_dir.is_dir() {
        bail!("public_dir must be a directory.")
    }
    let template_dir = path_arg(matches, "template_dir")?;
    if !template_dir.is_dir() {
        bail!("template_dir must be a directory.")
    }

    Context::init(Context {
        content_dir: content_dir.to_owned(),
        out_dir: out_dir.to_owned(),
        public_dir: public_dir.to_owned(),
        pages_dir: path_arg(matches, "pages")?.to_owned(),
        resume_path: path_arg(matches, "resume")?.to_owned(),
        site: SiteConfig::from_env(),
        handlebars: renderer::generate_renderer(template_dir)?,
    })?;

    generator::generate()?;
    info!("Built site into {}", out_dir.display());
    Ok(())
}

fn list(matches: &ArgMatches) -> anyhow::Result<()> {
    let documents = load_documents(path_arg(matches, "content_dir")?)?;
    let documents = if matches.get_flag("drafts") {
        let mut documents = documents;
        documents.sort_by(generator::utils::sort_document);
        documents
    } else {
        generator::utils::filter_and_sort(documents)
    };

    let query = PostQuery {
        search: matches.get_one::<String>("search").cloned(),
        tag: matches.get_one::<String>("tag").cloned(),
    };
    for doc in query.apply(&documents) {
        println!(
            "{}  {}{}  [{}]",
            doc.meta.date.format("%Y-%m-%d"),
            doc.slug,
            if doc.meta.draft { " (draft)" } else { "" },
            doc.meta.tags.join(", ")
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("feeds", sub)) => generator::generate_feeds(
            path_arg(sub, "content_dir")?,
            path_arg(sub, "out_dir")?,
            &SiteConfig::from_env(),
        ),
        Some(("list", sub)) => list(sub),
        Some(("sync-resume", sub)) => {
            let Some(url) = sub.get_one::<String>("url") else {
                bail!("no resume URL: pass --url or set RESUME_URL");
            };
            resume::sync_resume(url, path_arg(sub, "dest")?)
        }
        Some(("build", sub)) => build(sub),
        // no subcommand: build with defaults
        _ => build(&build_command().get_matches_from(["build"])),
    }
}
