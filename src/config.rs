use log::warn;
use serde::Serialize;

const DEFAULT_TITLE: &str = "folio";
const DEFAULT_DESCRIPTION: &str = "Notes on building software that lasts.";
const DEFAULT_URL: &str = "https://example.com";
const DEFAULT_AUTHOR_NAME: &str = "Site Author";
const DEFAULT_AUTHOR_EMAIL: &str = "author@example.com";
const LANGUAGE: &str = "en-us";

/// Navigation order of the site's pages. Only the ones a build produces are
/// linked; see [`SiteConfig::with_built_routes`].
const ROUTES: &[(&str, &str)] = &[
    ("Home", "/"),
    ("About", "/about"),
    ("Projects", "/projects"),
    ("Work", "/work"),
    ("Writing", "/writing"),
    ("Now", "/now"),
    ("Uses", "/uses"),
    ("Contact", "/contact"),
    ("Press", "/press"),
    ("Resume", "/resume"),
];

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    /// RFC 822 style mailbox used by RSS: `email (name)`.
    pub fn mailbox(&self) -> String {
        format!("{} ({})", self.email, self.name)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Route {
    pub name: String,
    pub path: String,
}

impl Route {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Analytics {
    pub website_id: String,
    pub src: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Comments {
    pub repo: String,
    pub repo_id: String,
    pub category: String,
    pub category_id: String,
}

#[derive(Serialize, Debug, Clone)]
pub(crate) struct SiteConfig {
    pub title: String,
    pub description: String,
    /// Base URL without trailing slash.
    pub url: String,
    pub language: &'static str,
    pub author: Author,
    pub routes: Vec<Route>,

    pub analytics: Option<Analytics>,
    pub comments: Option<Comments>,
}

impl SiteConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from a variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let url = get("SITE_URL").unwrap_or_else(|| DEFAULT_URL.to_string());

        let analytics = match (get("UMAMI_WEBSITE_ID"), get("UMAMI_SRC")) {
            (Some(website_id), Some(src)) => Some(Analytics { website_id, src }),
            (None, None) => None,
            _ => {
                warn!("UMAMI_WEBSITE_ID and UMAMI_SRC must both be set; analytics disabled.");
                None
            }
        };

        let comments = match (
            get("GISCUS_REPO"),
            get("GISCUS_REPO_ID"),
            get("GISCUS_CATEGORY"),
            get("GISCUS_CATEGORY_ID"),
        ) {
            (Some(repo), Some(repo_id), Some(category), Some(category_id)) => Some(Comments {
                repo,
                repo_id,
                category,
                category_id,
            }),
            (None, None, None, None) => None,
            _ => {
                warn!("GISCUS_* variables are partially set; comments disabled.");
                None
            }
        };

        Self {
            title: get("SITE_TITLE").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: get("SITE_DESCRIPTION").unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            url: url.trim_end_matches('/').to_string(),
            language: LANGUAGE,
            author: Author {
                name: get("SITE_AUTHOR_NAME").unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
                email: get("SITE_AUTHOR_EMAIL").unwrap_or_else(|| DEFAULT_AUTHOR_EMAIL.to_string()),
            },
            routes: ROUTES
                .iter()
                .map(|&(name, path)| Route::new(name, path))
                .collect(),
            analytics,
            comments,
        }
    }

    /// Config whose routes are the configured ones present in `built`, in
    /// navigation order, followed by the built routes the navigation lacks.
    pub fn with_built_routes(&self, built: &[Route]) -> Self {
        let mut routes: Vec<Route> = self
            .routes
            .iter()
            .filter(|route| built.iter().any(|b| b.path == route.path))
            .cloned()
            .collect();
        for route in built {
            if !routes.iter().any(|r| r.path == route.path) {
                routes.push(route.clone());
            }
        }

        Self {
            routes,
            ..self.clone()
        }
    }

    /// Absolute URL of a site path such as `/about`.
    pub fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    pub fn post_url(&self, slug: &str) -> String {
        self.page_url(&format!("/writing/{slug}"))
    }
}
