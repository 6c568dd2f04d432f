use std::path::Path;

use anyhow::Context;
use chrono::DateTime;
use handlebars::{handlebars_helper, Handlebars};

// "2024-01-15T00:00:00+00:00" -> "January 15, 2024"
handlebars_helper!(format_date: |date: str| {
    match DateTime::parse_from_rfc3339(date) {
        Ok(d) => d.format("%B %-d, %Y").to_string(),
        Err(_) => date.to_string(),
    }
});

// machine readable variant for <time datetime=...>
handlebars_helper!(iso_date: |date: str| {
    match DateTime::parse_from_rfc3339(date) {
        Ok(d) => d.format("%Y-%m-%d").to_string(),
        Err(_) => date.to_string(),
    }
});

handlebars_helper!(slice_until: |lst: array, upper: usize| lst[..upper.min(lst.len())].to_owned());

pub(crate) const TEMPLATES: &[&str] = &["index", "post", "list", "page"];

pub(crate) fn generate_renderer(template_dir: &Path) -> anyhow::Result<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(false);
    handlebars.register_helper("format_date", Box::new(format_date));
    handlebars.register_helper("iso_date", Box::new(iso_date));
    handlebars.register_helper("slice_until", Box::new(slice_until));

    for name in TEMPLATES {
        let file = format!("{name}.hbs");
        handlebars
            .register_template_file(name, template_dir.join(&file))
            .context(file)?;
    }
    handlebars.register_partial(
        "layout",
        std::fs::read_to_string(template_dir.join("layout.hbs")).context("layout.hbs")?,
    )?;

    Ok(handlebars)
}
