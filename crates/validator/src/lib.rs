// Site validation: content integrity checks that do not abort a build

use folio_core::routes::tag_path;
use folio_core::{
    ContentFilter, ContentQuery, ContentScope, Result, Site, TagGroup, is_valid_link,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_site(site: &Site) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    let materializer = site.materializer();

    check_documents(site, &mut report)?;

    let tag_groups = site.store.tag_groups(materializer.tags_filter())?;
    check_tag_collisions(&tag_groups, &mut report);

    if site.config.content.tag_scope != site.config.content.posts_scope {
        let post_tags: BTreeSet<String> = site
            .store
            .tag_groups(materializer.posts_filter())?
            .into_iter()
            .map(|g| g.name)
            .collect();
        let outside: Vec<&str> = tag_groups
            .iter()
            .map(|g| g.name.as_str())
            .filter(|name| !post_tags.contains(*name))
            .collect();
        if !outside.is_empty() {
            report.info.push(format!(
                "Tags used only outside the posts scope still get pages: {}",
                outside.join(", ")
            ));
        }
    }

    let posts = site.store.documents(materializer.posts_filter())?;
    let routes = site.routes()?;
    report.info.push(format!(
        "{} posts, {} tags, {} routes",
        posts.len(),
        tag_groups.len(),
        routes.len()
    ));

    debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validation finished"
    );
    Ok(report)
}

fn check_documents(site: &Site, report: &mut ValidationReport) -> Result<()> {
    let filter = ContentFilter::new(site.config.content.content_type, ContentScope::All);
    for document in site.store.find_documents(&filter)? {
        let path = document
            .absolute_path
            .strip_prefix(site.store.root())
            .unwrap_or(document.absolute_path.as_path())
            .display();

        if document.frontmatter.title.trim().is_empty() {
            report.warnings.push(format!("{}: empty title", path));
        }

        let fm = &document.frontmatter;
        for (field, value) in [("link", &fm.link), ("demo", &fm.demo), ("source", &fm.source)] {
            if let Some(link) = value
                && !is_valid_link(link)
            {
                report.errors.push(format!(
                    "{}: {} '{}' must be an http(s) URL or start with '/'",
                    path, field, link
                ));
            }
        }
    }

    for project in site.store.find_documents(&site.projects_filter())? {
        if project.frontmatter.summary.is_none() {
            report.warnings.push(format!(
                "Project '{}' has no summary",
                project.frontmatter.title
            ));
        }
    }
    Ok(())
}

/// Tags that differ only by case share one page; the last one wins
fn check_tag_collisions(groups: &[TagGroup], report: &mut ValidationReport) {
    let mut by_path: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for group in groups {
        by_path
            .entry(tag_path(&group.name))
            .or_default()
            .push(&group.name);
    }

    for (path, variants) in by_path {
        if variants.len() > 1 {
            let winner = variants[variants.len() - 1];
            report.warnings.push(format!(
                "Tags {} share {}; the page uses '{}'",
                variants.join(", "),
                path,
                winner
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site_with(config_extra: &str, posts: &[(&str, &str)]) -> (TempDir, Site) {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "folio.toml",
            &format!("[site]\ntitle = \"Blog\"\nauthor = \"Me\"\n{}", config_extra),
        );
        for (rel, content) in posts {
            write(dir.path(), rel, content);
        }
        let site = Site::load(dir.path()).unwrap();
        (dir, site)
    }

    #[test]
    fn test_clean_site_has_no_errors_or_warnings() {
        let (_dir, site) = site_with(
            "",
            &[(
                "content/posts/a.mdx",
                "---\ntitle: A\ndate: 2021-01-01\ntags: [Rust]\n---\n",
            )],
        );
        let report = validate_site(&site).unwrap();
        assert!(report.is_ok());
        assert!(report.warnings.is_empty());
        assert!(report.info.iter().any(|i| i == "1 posts, 1 tags, 3 routes"));
    }

    #[test]
    fn test_warns_on_tag_case_collision() {
        let (_dir, site) = site_with(
            "",
            &[(
                "content/posts/a.mdx",
                "---\ntitle: A\ndate: 2021-01-01\ntags: [Go, go]\n---\n",
            )],
        );
        let report = validate_site(&site).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Go, go"));
        assert!(report.warnings[0].contains("/t/go"));
        assert!(report.warnings[0].contains("'go'"));
    }

    #[test]
    fn test_reports_out_of_scope_tags() {
        let (_dir, site) = site_with(
            "",
            &[
                (
                    "content/posts/a.mdx",
                    "---\ntitle: A\ndate: 2021-01-01\ntags: [Rust]\n---\n",
                ),
                (
                    "content/projects/tool.mdx",
                    "---\ntitle: Tool\ndate: 2021-01-01\ntags: [Cli]\n---\n",
                ),
            ],
        );
        let report = validate_site(&site).unwrap();
        assert!(
            report
                .info
                .iter()
                .any(|i| i.contains("outside the posts scope") && i.contains("Cli"))
        );
    }

    #[test]
    fn test_posts_tag_scope_skips_scope_notice() {
        let (_dir, site) = site_with(
            "[content]\ntag_scope = \"posts\"\n",
            &[(
                "content/projects/tool.mdx",
                "---\ntitle: Tool\ndate: 2021-01-01\ntags: [Cli]\n---\n",
            )],
        );
        let report = validate_site(&site).unwrap();
        assert!(!report.info.iter().any(|i| i.contains("outside")));
    }

    #[test]
    fn test_rejects_relative_link() {
        let (_dir, site) = site_with(
            "",
            &[(
                "content/posts/a.mdx",
                "---\ntitle: A\ndate: 2021-01-01\nlink: example.com\n---\n",
            )],
        );
        let report = validate_site(&site).unwrap();
        assert!(!report.is_ok());
        assert!(report.errors[0].contains("example.com"));
    }

    #[test]
    fn test_rejects_script_source_link() {
        let (_dir, site) = site_with(
            "",
            &[(
                "content/posts/a.mdx",
                "---\ntitle: A\ndate: 2021-01-01\nsource: \"javascript:alert(1)\"\n---\n",
            )],
        );
        let report = validate_site(&site).unwrap();
        assert!(report.errors[0].contains("source 'javascript:alert(1)'"));
    }

    #[test]
    fn test_warns_on_project_without_summary() {
        let (_dir, site) = site_with(
            "",
            &[
                (
                    "content/projects/tool.mdx",
                    "---\ntitle: Tool\ndate: 2021-01-01\n---\n",
                ),
                (
                    "content/projects/lib.mdx",
                    "---\ntitle: Lib\ndate: 2021-01-01\nsummary: A library\n---\n",
                ),
            ],
        );
        let report = validate_site(&site).unwrap();
        assert_eq!(report.warnings, vec!["Project 'Tool' has no summary"]);
    }

    #[test]
    fn test_warns_on_blank_title() {
        let (_dir, site) = site_with(
            "",
            &[(
                "content/posts/a.mdx",
                "---\ntitle: \"  \"\ndate: 2021-01-01\n---\n",
            )],
        );
        let report = validate_site(&site).unwrap();
        assert!(report.warnings.iter().any(|w| w.contains("empty title")));
    }
}
