use chrono::NaiveDate;
use folio_core::config::SiteMetadata;
use folio_core::routes::{POST_PREFIX, TAG_PREFIX, post_path};
use folio_core::{Document, TagGroup, TocEntry, is_valid_link, tag_path_segment};
use tracing::warn;

/// Path of the static projects page
pub const PROJECTS_PATH: &str = "/projects/";

/// HTML-escape a string to prevent XSS attacks
///
/// Escapes: & < > " '
pub fn html_escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#x27;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

/// Publish date as shown on cards and post headers, e.g. `Jan, 2021`
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b, %Y").to_string())
        .unwrap_or_default()
}

/// Tag groups sorted by size (largest first, ties by name), truncated to `limit`
pub fn top_tags(groups: &[TagGroup], limit: usize) -> Vec<&TagGroup> {
    let mut sorted: Vec<&TagGroup> = groups.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_count
            .cmp(&a.total_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted.truncate(limit);
    sorted
}

/// Link to a tag page, with the path segment percent-encoded
pub fn tag_href(tag: &str) -> String {
    format!(
        "{}{}",
        TAG_PREFIX,
        urlencoding::encode(&tag_path_segment(tag))
    )
}

/// Frontmatter link if it is safe to put in an `href`
fn checked_link<'a>(
    document: &Document,
    field: &str,
    link: Option<&'a str>,
) -> Option<&'a str> {
    let link = link?;
    if is_valid_link(link) {
        Some(link)
    } else {
        warn!(
            path = %document.absolute_path.display(),
            field,
            link,
            "link dropped"
        );
        None
    }
}

/// Listing order: pinned first, then newest, then title
pub fn sort_for_listing(documents: &mut [&Document]) {
    documents.sort_by(|a, b| {
        b.frontmatter
            .pinned
            .cmp(&a.frontmatter.pinned)
            .then_with(|| b.frontmatter.date.cmp(&a.frontmatter.date))
            .then_with(|| a.frontmatter.title.cmp(&b.frontmatter.title))
    });
}

fn tags_html(tags: &[String]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let links: String = tags
        .iter()
        .map(|tag| {
            format!(
                r#"<a class="tag" href="{}">{}</a>"#,
                html_escape(&tag_href(tag)),
                html_escape(tag)
            )
        })
        .collect();
    format!(r#"<div class="tags">{}</div>"#, links)
}

fn toc_html(entries: &[TocEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let items: String = entries
        .iter()
        .map(|entry| {
            format!(
                r#"<li><a href="{}">{}</a>{}</li>"#,
                html_escape(&entry.url),
                html_escape(&entry.title),
                toc_html(&entry.items)
            )
        })
        .collect();
    format!("<ul>{}</ul>", items)
}

fn card_image_html(document: &Document, default_image: Option<&str>) -> String {
    document
        .frontmatter
        .image
        .as_deref()
        .or(default_image)
        .map(|src| {
            format!(
                r#"<img src="{}" alt="" class="card-image" loading="lazy">"#,
                html_escape(src)
            )
        })
        .unwrap_or_default()
}

/// One post card for listings.
///
/// Cards link to the post's external `link` when it has one. Posts without
/// an image show `default_image`.
pub fn post_card(document: &Document, default_image: Option<&str>) -> String {
    let fm = &document.frontmatter;
    let link = checked_link(document, "link", fm.link.as_deref());
    let href = match (link, document.slug()) {
        (Some(link), _) => link.to_string(),
        (None, Some(slug)) => post_path(slug),
        (None, None) => POST_PREFIX.to_string(),
    };

    let image_html = card_image_html(document, default_image);

    let pinned = if fm.pinned {
        r#"<span class="pinned" title="Pinned">📌</span> "#
    } else {
        ""
    };

    format!(
        r#"<article class="card">
    <a href="{href}">{image}</a>
    <div class="card-body">
        <p class="publish-details"><span>{pinned}{date}</span><span>{minutes} min read</span></p>
        <h3 class="post-title"><a href="{href}">{title}</a></h3>
        {tags}
    </div>
</article>"#,
        href = html_escape(&href),
        image = image_html,
        pinned = pinned,
        date = format_date(fm.date),
        minutes = document.time_to_read,
        title = html_escape(&fm.title),
        tags = tags_html(&fm.tags),
    )
}

fn top_tags_html(groups: &[&TagGroup]) -> String {
    if groups.is_empty() {
        return String::new();
    }
    let rows: String = groups
        .iter()
        .map(|group| {
            format!(
                r#"<a class="top-tag" href="{}"><span>{}</span><span>{}</span></a>"#,
                html_escape(&tag_href(&group.name)),
                group.total_count,
                html_escape(&group.name)
            )
        })
        .collect();
    format!(
        r#"<aside class="top-tags"><h2>Top tags</h2>{}</aside>"#,
        rows
    )
}

/// Full page for a single post
pub fn post_page(site: &SiteMetadata, document: &Document, is_preview: bool) -> String {
    let fm = &document.frontmatter;

    let image_html = fm
        .image
        .as_deref()
        .map(|src| {
            format!(
                r#"<img src="{}" alt="" class="post-image">"#,
                html_escape(src)
            )
        })
        .unwrap_or_default();

    let mut links = Vec::new();
    if let Some(demo) = checked_link(document, "demo", fm.demo.as_deref()) {
        links.push(format!(r#"<a href="{}">Demo</a>"#, html_escape(demo)));
    }
    if let Some(source) = checked_link(document, "source", fm.source.as_deref()) {
        links.push(format!(r#"<a href="{}">Source</a>"#, html_escape(source)));
    }
    let links_html = if links.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="post-links">{}</p>"#, links.join(" · "))
    };

    let toc = toc_html(&document.table_of_contents);
    let toc_html = if toc.is_empty() {
        String::new()
    } else {
        format!(r#"<nav class="toc"><h2>Contents</h2>{}</nav>"#, toc)
    };

    // Body HTML comes from the markdown renderer and is inserted as-is
    let main = format!(
        r#"<article class="post">
    <header>
        <h1 class="post-title">{title}</h1>
        <p class="publish-details"><span>{date}</span><span>{minutes} min read</span></p>
        {tags}
        {links}
    </header>
    {image}
    {toc}
    <div class="post-body">{body}</div>
</article>"#,
        title = html_escape(&fm.title),
        date = format_date(fm.date),
        minutes = document.time_to_read,
        tags = tags_html(&fm.tags),
        links = links_html,
        image = image_html,
        toc = toc_html,
        body = document.body,
    );

    layout(site, &fm.title, &main, is_preview)
}

/// Listing of all posts with the top-tag sidebar
pub fn post_list_page(
    site: &SiteMetadata,
    posts: &[&Document],
    tags: &[&TagGroup],
    is_preview: bool,
) -> String {
    let default_image = site.default_image.as_deref();
    let cards: String = posts.iter().map(|d| post_card(d, default_image)).collect();
    let main = format!(
        r#"<div class="with-sidebar">
    <section>
        <h1>Posts</h1>
        <div class="card-list">{cards}</div>
    </section>
    {sidebar}
</div>"#,
        cards = cards,
        sidebar = top_tags_html(tags),
    );
    layout(site, "Posts", &main, is_preview)
}

/// Listing of the posts carrying one tag
pub fn tag_page(
    site: &SiteMetadata,
    tag: &str,
    posts: &[&Document],
    tags: &[&TagGroup],
    is_preview: bool,
) -> String {
    let default_image = site.default_image.as_deref();
    let cards: String = posts.iter().map(|d| post_card(d, default_image)).collect();
    let count = posts.len();
    let main = format!(
        r#"<div class="with-sidebar">
    <section>
        <h1>#{tag}</h1>
        <p class="tag-count">{count} post{plural}</p>
        <div class="card-list">{cards}</div>
    </section>
    {sidebar}
</div>"#,
        tag = html_escape(tag),
        count = count,
        plural = if count == 1 { "" } else { "s" },
        cards = cards,
        sidebar = top_tags_html(tags),
    );
    layout(site, &format!("#{}", tag), &main, is_preview)
}

/// Projects page order: newest first, then title
pub fn sort_projects(documents: &mut [&Document]) {
    documents.sort_by(|a, b| {
        b.frontmatter
            .date
            .cmp(&a.frontmatter.date)
            .then_with(|| a.frontmatter.title.cmp(&b.frontmatter.title))
    });
}

/// One project card: image, date, title, summary and stack
pub fn project_card(document: &Document, default_image: Option<&str>) -> String {
    let fm = &document.frontmatter;
    let href = checked_link(document, "link", fm.link.as_deref())
        .or_else(|| checked_link(document, "demo", fm.demo.as_deref()))
        .or_else(|| checked_link(document, "source", fm.source.as_deref()));

    let title = match href {
        Some(href) => format!(
            r#"<a href="{}">{}</a>"#,
            html_escape(href),
            html_escape(&fm.title)
        ),
        None => html_escape(&fm.title),
    };

    let summary = fm
        .summary
        .as_deref()
        .map(|summary| format!(r#"<p class="summary">{}</p>"#, html_escape(summary)))
        .unwrap_or_default();

    let stack = if fm.stack.is_empty() {
        String::new()
    } else {
        let items: String = fm
            .stack
            .iter()
            .map(|tech| format!("<li>{}</li>", html_escape(tech)))
            .collect();
        format!(r#"<ul class="stack">{}</ul>"#, items)
    };

    format!(
        r#"<article class="card project-card">
    {image}
    <div class="card-body">
        <p class="publish-details"><span>{date}</span></p>
        <h3 class="post-title">{title}</h3>
        {summary}
        {stack}
    </div>
</article>"#,
        image = card_image_html(document, default_image),
        date = format_date(fm.date),
        title = title,
        summary = summary,
        stack = stack,
    )
}

/// Grid of project cards
pub fn projects_page(site: &SiteMetadata, projects: &[&Document], is_preview: bool) -> String {
    let default_image = site.default_image.as_deref();
    let cards: String = projects
        .iter()
        .map(|d| project_card(d, default_image))
        .collect();
    let main = format!(
        r#"<section>
    <h1>Projects</h1>
    <div class="card-list">{}</div>
</section>"#,
        cards
    );
    layout(site, "Projects", &main, is_preview)
}

/// Redirect from the site root to the post listing
pub fn root_redirect() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta http-equiv="refresh" content="0; url={0}">
    <link rel="canonical" href="{0}">
</head>
<body><a href="{0}">Posts</a></body>
</html>"#,
        POST_PREFIX
    )
}

fn layout(site: &SiteMetadata, page_title: &str, main: &str, is_preview: bool) -> String {
    // Hot reload script only in preview mode
    let reload_script = if is_preview {
        r#"<script>
        const eventSource = new EventSource('/_reload');
        eventSource.onmessage = () => location.reload();
        eventSource.onerror = () => eventSource.close();
    </script>"#
    } else {
        ""
    };

    let description = if site.description.is_empty() {
        String::new()
    } else {
        format!(
            r#"<meta name="description" content="{}">"#,
            html_escape(&site.description)
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{page_title} | {site_title}</title>
    {description}
    <link rel="stylesheet" href="/style.css">
</head>
<body>
    <header class="site-header">
        <a class="site-title" href="{posts}">{site_title}</a>
        <nav><a href="{posts}">Posts</a><a href="{projects}">Projects</a></nav>
    </header>
    <main>
    {main}
    </main>
    <footer class="site-footer">© {author}</footer>
    {reload_script}
</body>
</html>"#,
        page_title = html_escape(page_title),
        site_title = html_escape(&site.title),
        description = description,
        posts = POST_PREFIX,
        projects = PROJECTS_PATH,
        main = main,
        author = html_escape(&site.author),
        reload_script = reload_script,
    )
}

/// Shared stylesheet written to `/style.css`
pub fn stylesheet() -> &'static str {
    r#":root {
    --text-brand: #f6c90e;
    --background-main: #fafafa;
    --background-card: #ffffff;
    --text-main: #000;
    --text-title: #303f9f;
    --text-light: #424242;
    --text-lighter: #757575;
    --text-lightest: #9e9e9e;
    --font-family-mono: ui-monospace, SFMono-Regular, Menlo, monospace;
}

@media (prefers-color-scheme: dark) {
    :root {
        --background-main: #303841;
        --background-card: #3a4750;
        --text-main: #fafafa;
        --text-title: #f6c90e;
        --text-light: rgba(255, 255, 255, 0.7);
        --text-lighter: rgba(255, 255, 255, 0.6);
        --text-lightest: rgba(255, 255, 255, 0.4);
    }
}

body {
    margin: 0 auto;
    max-width: 1100px;
    padding: 0 1rem;
    background: var(--background-main);
    color: var(--text-main);
    font-family: system-ui, sans-serif;
    line-height: 1.6;
}

a { color: inherit; text-decoration: none; }
.site-header { padding: 1.5rem 0; }
.site-title { font-weight: 700; font-size: 1.25rem; color: var(--text-title); }
.site-footer { padding: 2rem 0; color: var(--text-lightest); }

.with-sidebar { display: grid; grid-template-columns: 1fr 260px; gap: 2rem; }
@media (max-width: 768px) { .with-sidebar { grid-template-columns: 1fr; } }

.card-list {
    display: grid;
    gap: 2rem;
    grid-template-columns: repeat(auto-fill, minmax(min(300px, 100%), 1fr));
}
.card { background: var(--background-card); border-radius: 1rem; overflow: hidden; }
.card-image { width: 100%; height: 200px; object-fit: cover; }
.card-body { padding: 1.5rem 1rem; }
.post-title { color: var(--text-main); font-size: 1.25rem; font-weight: 500; margin: 0 0 1rem; }
.publish-details {
    display: flex;
    justify-content: space-between;
    font-size: 0.8rem;
    color: var(--text-lightest);
}

.tags { display: flex; flex-wrap: wrap; gap: 0.5rem; }
.tag { font-family: var(--font-family-mono); color: var(--text-title); font-size: 0.85rem; }

.top-tags { border: 1px solid var(--text-lightest); border-radius: 1rem; align-self: start; }
.top-tags h2 { font-size: 1rem; padding: 1rem 1rem 0; margin: 0; }
.top-tag {
    display: flex;
    justify-content: space-between;
    padding: 1rem;
    font-family: var(--font-family-mono);
    color: var(--text-light);
}
.top-tag + .top-tag { border-top: 1px solid var(--text-lightest); }
.top-tag:hover { color: var(--text-title); }

.post-image { width: 100%; border-radius: 1rem; }
.toc { font-size: 0.9rem; color: var(--text-light); }
.post-body pre { overflow-x: auto; padding: 1rem; background: var(--background-card); }

.site-header { display: flex; justify-content: space-between; align-items: center; }
.site-header nav a { margin-left: 1.5rem; color: var(--text-light); }
.site-header nav a:hover { color: var(--text-brand); }
.summary { color: var(--text-light); margin: 0 0 1rem; }
.stack { display: flex; flex-wrap: wrap; gap: 0.5rem; list-style: none; padding: 0; margin: 0; }
.stack li { font-family: var(--font-family-mono); font-size: 0.8rem; color: var(--text-lighter); }
"#
}
