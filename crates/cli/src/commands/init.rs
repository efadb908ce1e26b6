use anyhow::{Context, Result};
use chrono::Local;
use folio_core::config::{CONFIG_FILE, parse_site_toml_str};
use std::fs;
use std::path::{Path, PathBuf};

/// Escape a string for safe inclusion in a TOML basic string
///
/// The config is written from a commented template rather than serialized,
/// so user-provided values are escaped by hand.
///
/// See: https://toml.io/en/v1.0.0#string
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Escape a string for a double-quoted YAML scalar
fn yaml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Initialize a new site directory.
///
/// Creates the directory if needed, then writes:
/// - folio.toml with defaults
/// - content/posts/hello-world.mdx, a first post
/// - content/pages/about.md, a page outside the posts scope
/// - content/projects/folio.mdx, a project card
///
/// # Errors
///
/// Returns an error if folio.toml already exists or a file cannot be written.
pub async fn run(path: PathBuf, title: Option<String>, author: Option<String>) -> Result<()> {
    println!("Initializing site: {}", path.display());

    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists at {}\nHint: Delete it first or use a different directory",
            CONFIG_FILE,
            config_path.display()
        );
    }

    create_directory_structure(&path)?;
    generate_site_toml(&path, title.as_deref(), author.as_deref())?;
    generate_sample_content(&path)?;

    println!("\n✓ Initialization complete!");
    println!("\nGenerated structure:");
    println!("  {}/", path.display());
    println!("  ├── {}             ← Site title, author, scopes", CONFIG_FILE);
    println!("  └── content/");
    println!("      ├── pages/");
    println!("      │   └── about.md");
    println!("      ├── posts/");
    println!("      │   └── hello-world.mdx  ← Your first post");
    println!("      └── projects/");
    println!("          └── folio.mdx        ← Shown on /projects/");

    println!("\nNext steps:");
    println!("  1. Edit {} (title, author, description)", CONFIG_FILE);
    println!("  2. Write posts in content/posts/ and projects in content/projects/");
    println!("  3. Preview: folio preview {}", path.display());

    Ok(())
}

fn create_directory_structure(base: &Path) -> Result<()> {
    fs::create_dir_all(base.join("content").join("posts"))
        .context("Failed to create content/posts")?;
    fs::create_dir_all(base.join("content").join("pages"))
        .context("Failed to create content/pages")?;
    fs::create_dir_all(base.join("content").join("projects"))
        .context("Failed to create content/projects")?;
    Ok(())
}

fn generate_site_toml(base: &Path, title: Option<&str>, author: Option<&str>) -> Result<()> {
    let title = toml_escape_string(title.unwrap_or("My Blog"));
    let author = toml_escape_string(author.unwrap_or("Your Name"));

    let toml = format!(
        r#"# Site configuration for folio

[site]
title = "{title}"
author = "{author}"
description = ""
# url = "https://example.com"
# Card image for posts and projects without their own image
# default_image = "/images/default.png"

[content]
dir = "content"
# Documents of this type get slugs and routes ("mdx" or "markdown")
content_type = "mdx"
# Regex matched against absolute source paths; selects what counts as a post
posts_pattern = "/content/posts/"
# "all": tags from every document get pages; "posts": only tags used by posts
tag_scope = "all"
# Documents listed on the /projects/ page
projects_pattern = "/content/projects/"

[build]
output = "public"
top_tags = 10
"#
    );

    // The template must stay loadable by the real parser
    parse_site_toml_str(&toml)
        .context("Generated folio.toml is invalid - this is a bug in the template generator")?;

    fs::write(base.join(CONFIG_FILE), toml)?;
    Ok(())
}

fn generate_sample_content(base: &Path) -> Result<()> {
    let today = Local::now().format("%Y-%m-%d").to_string();

    let post = format!(
        r#"---
title: "{title}"
date: {today}
tags: [meta]
---

Welcome to your new blog. This post lives in `content/posts/`, so it gets a
page at `/post/hello-world`. Its slug comes from the file name.

## Writing posts

Add a file to `content/posts/` with a frontmatter block like the one above.

## Tags

Every tag gets a listing page under `/t/`.
"#,
        title = yaml_escape_string("Hello, World"),
        today = today
    );
    fs::write(
        base.join("content").join("posts").join("hello-world.mdx"),
        post,
    )?;

    let about = format!(
        r#"---
title: About
date: {today}
---

Pages outside `content/posts/` are loaded but do not get post routes.
"#
    );
    fs::write(base.join("content").join("pages").join("about.md"), about)?;

    let project = format!(
        r#"---
title: folio
date: {today}
summary: "The static site generator building this site"
stack: [Rust]
source: https://github.com/folio-ssg/folio
---

Projects live in `content/projects/` and are listed as cards on `/projects/`.
"#
    );
    fs::write(
        base.join("content").join("projects").join("folio.mdx"),
        project,
    )?;

    Ok(())
}
