//! Résumé document in the JSON Resume shape.

use std::{path::Path, time::Duration};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use log::info;
use maud::{html, Markup};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Resume {
    pub basics: Basics,
    #[serde(default)]
    pub work: Vec<Work>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Basics {
    pub name: String,
    pub label: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub location: Option<Location>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Location {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Profile {
    pub network: String,
    pub username: Option<String>,
    pub url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Work {
    pub name: String,
    pub position: Option<String>,
    pub url: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Education {
    pub institution: String,
    pub area: Option<String>,
    pub study_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Skill {
    pub name: String,
    pub level: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Project {
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Location {
    fn display(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.region, &self.country_code]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

pub(crate) fn parse_resume(json: &str) -> anyhow::Result<Resume> {
    serde_json::from_str(json).context("invalid resume document")
}

pub(crate) fn load_resume(path: &Path) -> anyhow::Result<Resume> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("while reading {}", path.display()))?;
    parse_resume(&json).with_context(|| format!("while parsing {}", path.display()))
}

/// Fetches the résumé at `url` and stores it at `dest`. Non-success statuses
/// and documents that are not résumés are errors; `dest` is left untouched.
pub(crate) fn sync_resume(url: &str, dest: &Path) -> anyhow::Result<()> {
    info!("Syncing {} from {url}", dest.display());

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("while fetching {url}"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("HTTP {status} from {url}");
    }

    let json = response
        .text()
        .with_context(|| format!("while reading response from {url}"))?;
    parse_resume(&json).with_context(|| format!("{url} did not return a resume"))?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(dest, json).with_context(|| format!("while writing {}", dest.display()))?;

    info!("Synced {}", dest.display());
    Ok(())
}

/// `2019-04-01` / `2019-04` -> `Apr 2019`; a bare year stays as is.
fn format_month(date: &str) -> String {
    let full = match date.len() {
        7 => format!("{date}-01"),
        _ => date.to_string(),
    };
    match NaiveDate::parse_from_str(&full, "%Y-%m-%d") {
        Ok(d) => d.format("%b %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

fn format_period(start: Option<&str>, end: Option<&str>) -> Option<String> {
    let start = start.filter(|s| !s.is_empty())?;
    let end = match end.filter(|s| !s.is_empty()) {
        Some(end) => format_month(end),
        None => "Present".to_string(),
    };
    Some(format!("{} – {}", format_month(start), end))
}

pub(crate) fn render_resume(resume: &Resume) -> Markup {
    let basics = &resume.basics;
    html! {
        article.resume {
            header.resume-header {
                h1 { (basics.name) }
                @if let Some(label) = &basics.label {
                    p.resume-label { (label) }
                }
                ul.resume-contact {
                    @if let Some(email) = &basics.email {
                        li { a href={ "mailto:" (email) } { (email) } }
                    }
                    @if let Some(phone) = &basics.phone {
                        li { (phone) }
                    }
                    @if let Some(url) = &basics.url {
                        li { a href=(url) { (url) } }
                    }
                    @if let Some(location) = basics.location.as_ref().and_then(Location::display) {
                        li { (location) }
                    }
                    @for profile in &basics.profiles {
                        li {
                            @if let Some(url) = &profile.url {
                                a href=(url) rel="noopener noreferrer" { (profile.network) }
                            } @else {
                                (profile.network)
                                @if let Some(username) = &profile.username { ": " (username) }
                            }
                        }
                    }
                }
                @if let Some(summary) = &basics.summary {
                    p.resume-summary { (summary) }
                }
            }

            @if !resume.work.is_empty() {
                section.resume-work {
                    h2 { "Experience" }
                    @for job in &resume.work {
                        div.resume-entry {
                            h3 {
                                @if let Some(position) = &job.position { (position) " · " }
                                @if let Some(url) = &job.url {
                                    a href=(url) { (job.name) }
                                } @else {
                                    (job.name)
                                }
                            }
                            @if let Some(period) = format_period(job.start_date.as_deref(), job.end_date.as_deref()) {
                                p.resume-period { (period) }
                            }
                            @if let Some(summary) = &job.summary {
                                p { (summary) }
                            }
                            @if !job.highlights.is_empty() {
                                ul {
                                    @for highlight in &job.highlights { li { (highlight) } }
                                }
                            }
                        }
                    }
                }
            }

            @if !resume.projects.is_empty() {
                section.resume-projects {
                    h2 { "Projects" }
                    @for project in &resume.projects {
                        div.resume-entry {
                            h3 {
                                @if let Some(url) = &project.url {
                                    a href=(url) { (project.name) }
                                } @else {
                                    (project.name)
                                }
                            }
                            @if let Some(description) = &project.description {
                                p { (description) }
                            }
                            @if !project.highlights.is_empty() {
                                ul {
                                    @for highlight in &project.highlights { li { (highlight) } }
                                }
                            }
                            @if !project.keywords.is_empty() {
                                p.resume-keywords { (project.keywords.join(", ")) }
                            }
                        }
                    }
                }
            }

            @if !resume.skills.is_empty() {
                section.resume-skills {
                    h2 { "Skills" }
                    dl {
                        @for skill in &resume.skills {
                            dt { (skill.name) @if let Some(level) = &skill.level { " (" (level) ")" } }
                            dd { (skill.keywords.join(", ")) }
                        }
                    }
                }
            }

            @if !resume.education.is_empty() {
                section.resume-education {
                    h2 { "Education" }
                    @for school in &resume.education {
                        div.resume-entry {
                            h3 { (school.institution) }
                            @let degree = [school.study_type.as_deref(), school.area.as_deref()]
                                .into_iter()
                                .flatten()
                                .collect::<Vec<_>>()
                                .join(", ");
                            @if !degree.is_empty() {
                                p { (degree) }
                            }
                            @if let Some(period) = format_period(school.start_date.as_deref(), school.end_date.as_deref()) {
                                p.resume-period { (period) }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread,
    };

    const RESUME: &str = r#"{
        "basics": {
            "name": "Jane Doe",
            "label": "Senior Engineer",
            "email": "jane@example.com",
            "location": {"city": "Edmonton", "countryCode": "CA"},
            "profiles": [{"network": "GitHub", "url": "https://github.com/jane"}]
        },
        "work": [{
            "name": "Acme <Corp>",
            "position": "Engineer",
            "startDate": "2019-04-01",
            "highlights": ["Shipped things"]
        }],
        "skills": [{"name": "Rust", "level": "Expert", "keywords": ["tokio", "serde"]}],
        "education": [{"institution": "University", "studyType": "BSc", "area": "CS", "startDate": "2010", "endDate": "2014"}]
    }"#;

    /// Serves one canned HTTP response on a local port.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}/resume.json")
    }

    #[test]
    fn parses_json_resume() {
        let resume = parse_resume(RESUME).unwrap();
        assert_eq!(resume.basics.name, "Jane Doe");
        assert_eq!(resume.work[0].start_date.as_deref(), Some("2019-04-01"));
        assert_eq!(resume.education[0].study_type.as_deref(), Some("BSc"));
        assert!(resume.projects.is_empty());
    }

    #[test]
    fn name_is_required() {
        assert!(parse_resume(r#"{"basics": {}}"#).is_err());
        assert!(parse_resume("[]").is_err());
    }

    #[test]
    fn renders_sections_escaped() {
        let html = render_resume(&parse_resume(RESUME).unwrap()).into_string();
        assert!(html.contains("<h1>Jane Doe</h1>"));
        assert!(html.contains("Edmonton, CA"));
        assert!(html.contains("Acme &lt;Corp&gt;"));
        assert!(html.contains("Apr 2019 – Present"));
        assert!(html.contains("2010 – 2014"));
        assert!(html.contains("BSc, CS"));
        assert!(html.contains("tokio, serde"));
        assert!(!html.contains("Projects"));
    }

    #[test]
    fn period_formatting() {
        assert_eq!(format_period(None, Some("2020")), None);
        assert_eq!(
            format_period(Some("2019-04"), Some("2021-12-31")).as_deref(),
            Some("Apr 2019 – Dec 2021")
        );
    }

    #[test]
    fn sync_writes_fetched_document() {
        let url = serve_once("200 OK", r#"{"basics": {"name": "Jane"}}"#);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("data").join("resume.json");

        sync_resume(&url, &dest).unwrap();
        assert_eq!(load_resume(&dest).unwrap().basics.name, "Jane");
    }

    #[test]
    fn sync_fails_on_error_status() {
        let url = serve_once("404 Not Found", "");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("resume.json");

        let err = sync_resume(&url, &dest).unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(!dest.exists());
    }

    #[test]
    fn sync_rejects_non_resume_body() {
        let url = serve_once("200 OK", "<html>oops</html>");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("resume.json");

        assert!(sync_resume(&url, &dest).is_err());
        assert!(!dest.exists());
    }
}
