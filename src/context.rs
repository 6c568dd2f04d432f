use std::{path::PathBuf, sync::OnceLock};

use crate::config::SiteConfig;

#[derive(Debug)]
pub(crate) struct Context {
    pub content_dir: PathBuf,
    pub out_dir: PathBuf,
    pub public_dir: PathBuf,
    /// Markdown pages rendered to `/<file stem>`; may be absent.
    pub pages_dir: PathBuf,
    /// Résumé JSON; the page is skipped when the file does not exist.
    pub resume_path: PathBuf,

    pub site: SiteConfig,

    pub handlebars: handlebars::Handlebars<'static>,
}

static CONTEXT: OnceLock<Context> = OnceLock::new();

impl Context {
    pub fn init(context: Context) -> anyhow::Result<&'static Context> {
        CONTEXT
            .set(context)
            .map_err(|_| anyhow::anyhow!("build context initialized twice"))?;
        Self::instance()
    }

    pub fn instance() -> anyhow::Result<&'static Context> {
        CONTEXT
            .get()
            .ok_or_else(|| anyhow::anyhow!("build context is not initialized"))
    }
}
